//! 시뮬레이션 거래소 구현.
//!
//! 실거래 커넥터와 같은 `Exchange` 인터페이스를 로컬 상태로 구현합니다.
//! 지정가 주문은 제출 시 자금을 묶고, 시장가에 닿으면 즉시, 아니면
//! 이후 캔들이 지정가를 지날 때 체결됩니다.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, RwLock};
use serde_json::json;
use tracing::{debug, info, warn};
use trader_core::{
    filter_trades, Candle, DecimalExt, ExchangeCapabilities, Market, Order, OrderStatus,
    PaperTraderConfig, Portfolio, Side, Ticker, Trade, TradingPair,
};

use crate::traits::{CancelResult, Exchange, ExchangeResult};
use crate::ExchangeError;

use super::events::{EventBroadcaster, PaperTradeEvent};
use super::fee::FeeModel;
use super::portfolio::SimulatedPortfolio;

/// 내부 계정 상태.
#[derive(Debug)]
struct ExchangeState {
    /// 사용 가능한 잔고
    portfolio: SimulatedPortfolio,
    /// 매도 주문에 묶인 자산
    locked_asset: Decimal,
    /// 매수 주문에 묶인 통화
    locked_currency: Decimal,
    /// 마지막 캔들
    last_candle: Option<Candle>,
    /// 주문 (ID 순)
    orders: BTreeMap<String, Order>,
    /// 체결 내역 (밀리초, 체결)
    trades: Vec<(i64, Trade)>,
}

impl ExchangeState {
    fn now(&self) -> DateTime<Utc> {
        self.last_candle
            .as_ref()
            .map(|candle| candle.start)
            .unwrap_or_else(Utc::now)
    }

    /// 주문이 현재 가격에서 바로 체결 가능한지 확인합니다.
    fn is_marketable(&self, side: Side, price: Decimal) -> bool {
        match (&self.last_candle, side) {
            (Some(candle), Side::Buy) => price >= candle.close,
            (Some(candle), Side::Sell) => price <= candle.close,
            (None, _) => false,
        }
    }

    /// 묶인 자금을 정산하고 체결 기록을 남깁니다.
    ///
    /// 대기 중이 아닌 주문은 `None`. 정산 금액이 표현 범위를 넘으면 상태를
    /// 바꾸지 않고 치명적 에러를 반환합니다.
    fn settle(&mut self, order_id: &str, fee: &FeeModel) -> ExchangeResult<Option<Order>> {
        let at = self.now();
        let Some(order) = self.orders.get_mut(order_id) else {
            return Ok(None);
        };
        if order.status != OrderStatus::Pending {
            return Ok(None);
        }

        let overflow =
            || ExchangeError::fatal("settle", format!("fill of {} overflows", order_id));
        let notional = order.notional_value().ok_or_else(overflow)?;

        match order.side {
            Side::Buy => {
                let asset = fee
                    .checked_extract_fee(order.amount)
                    .and_then(|bought| self.portfolio.asset.checked_add(bought))
                    .ok_or_else(overflow)?;
                self.locked_currency -= notional;
                self.portfolio.asset = asset;
            }
            Side::Sell => {
                let currency = fee
                    .checked_extract_fee(notional)
                    .and_then(|sold| self.portfolio.currency.checked_add(sold))
                    .ok_or_else(overflow)?;
                self.locked_asset -= order.amount;
                self.portfolio.currency = currency;
            }
        }
        order.status = OrderStatus::Filled;
        let order = order.clone();

        self.trades.push((
            at.timestamp_millis(),
            Trade {
                side: order.side,
                timestamp_seconds: at.timestamp(),
                amount: order.amount.to_exact_string(),
                price: order.price.to_exact_string(),
                id: order.id.clone(),
            },
        ));

        Ok(Some(order))
    }
}

/// 백테스팅 및 모의투자를 위한 시뮬레이션 거래소.
pub struct SimulatedExchange {
    pair: TradingPair,
    fee: FeeModel,
    state: RwLock<ExchangeState>,
    broadcaster: EventBroadcaster<PaperTradeEvent>,
    next_order_id: AtomicU64,
}

impl SimulatedExchange {
    /// 새로운 시뮬레이션 거래소를 생성합니다.
    pub fn new(pair: TradingPair, config: &PaperTraderConfig) -> Self {
        Self {
            pair,
            fee: FeeModel::from(config),
            state: RwLock::new(ExchangeState {
                portfolio: SimulatedPortfolio::from(&config.simulation_balance),
                locked_asset: Decimal::ZERO,
                locked_currency: Decimal::ZERO,
                last_candle: None,
                orders: BTreeMap::new(),
                trades: Vec::new(),
            }),
            broadcaster: EventBroadcaster::new(),
            next_order_id: AtomicU64::new(1),
        }
    }

    /// 거래쌍.
    pub fn pair(&self) -> &TradingPair {
        &self.pair
    }

    /// `portfolioUpdate` 이벤트를 구독합니다.
    pub async fn subscribe(&self, buffer_size: usize) -> mpsc::Receiver<PaperTradeEvent> {
        self.broadcaster.subscribe(buffer_size).await
    }

    /// 사용 가능한 잔고의 복제본.
    pub async fn simulated_portfolio(&self) -> SimulatedPortfolio {
        self.state.read().await.portfolio.clone()
    }

    /// 새 캔들로 시장을 진행합니다. 이번 캔들에서 체결된 주문 ID를 반환합니다.
    pub async fn update_market(&self, candle: Candle) -> Vec<String> {
        let (filled, snapshot) = {
            let mut state = self.state.write().await;

            let crossed: Vec<String> = state
                .orders
                .values()
                .filter(|order| order.status == OrderStatus::Pending)
                .filter(|order| match order.side {
                    Side::Buy => candle.low <= order.price,
                    Side::Sell => candle.high >= order.price,
                })
                .map(|order| order.id.clone())
                .collect();

            state.last_candle = Some(candle);

            let filled: Vec<String> = crossed
                .into_iter()
                .filter_map(|id| match state.settle(&id, &self.fee) {
                    Ok(order) => order.map(|order| order.id),
                    Err(e) => {
                        warn!(order_id = %id, error = %e, "simulated fill skipped");
                        None
                    }
                })
                .collect();

            (filled, state.portfolio.clone())
        };

        if !filled.is_empty() {
            debug!(count = filled.len(), "orders filled on candle");
            self.broadcaster
                .broadcast(PaperTradeEvent::PortfolioUpdate(snapshot))
                .await;
        }

        filled
    }

    fn validate_order(amount: Decimal, price: Decimal) -> ExchangeResult<()> {
        if amount <= Decimal::ZERO || price <= Decimal::ZERO {
            return Err(ExchangeError::fatal(
                "addOrder",
                format!("invalid order: amount {} @ price {}", amount, price),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Exchange for SimulatedExchange {
    fn name(&self) -> &str {
        "simulated"
    }

    fn capabilities(&self) -> ExchangeCapabilities {
        ExchangeCapabilities {
            name: "Simulated".to_string(),
            slug: "simulated".to_string(),
            currencies: vec![self.pair.currency().to_string()],
            assets: vec![self.pair.asset().to_string()],
            markets: vec![Market::asset_minimum(
                self.pair.currency(),
                self.pair.asset(),
                Decimal::new(1, 8),
                8,
            )],
            requires: Vec::new(),
            provides_history: None,
            provides_full_history: false,
            max_history_age_days: None,
            tid: "date".to_string(),
            tradable: true,
        }
    }

    fn get_fee(&self) -> Decimal {
        Decimal::ONE - self.fee.factor()
    }

    async fn get_ticker(&self) -> ExchangeResult<Ticker> {
        let state = self.state.read().await;
        let candle = state
            .last_candle
            .as_ref()
            .ok_or_else(|| ExchangeError::fatal("getTicker", "no market data yet"))?;

        Ok(Ticker {
            ask: candle.close,
            bid: candle.close,
        })
    }

    async fn get_portfolio(&self) -> ExchangeResult<Portfolio> {
        let state = self.state.read().await;
        Ok(state.portfolio.to_portfolio(&self.pair))
    }

    async fn get_trades(
        &self,
        since: Option<DateTime<Utc>>,
        ascending: bool,
    ) -> ExchangeResult<Vec<Trade>> {
        let state = self.state.read().await;
        Ok(filter_trades(state.trades.iter().cloned(), since, ascending))
    }

    async fn add_order(
        &self,
        side: Side,
        amount: Decimal,
        price: Decimal,
    ) -> ExchangeResult<String> {
        Self::validate_order(amount, price)?;

        let (order_id, filled, snapshot) = {
            let mut state = self.state.write().await;

            match side {
                Side::Buy => {
                    let cost = amount.checked_mul(price).ok_or_else(|| {
                        ExchangeError::fatal(
                            "addOrder",
                            format!("order value overflows: {} @ {}", amount, price),
                        )
                    })?;
                    if state.portfolio.currency < cost {
                        return Err(ExchangeError::fatal(
                            "addOrder",
                            format!(
                                "insufficient {}: need {}, have {}",
                                self.pair.currency(),
                                cost,
                                state.portfolio.currency
                            ),
                        ));
                    }
                    state.portfolio.currency -= cost;
                    state.locked_currency += cost;
                }
                Side::Sell => {
                    if state.portfolio.asset < amount {
                        return Err(ExchangeError::fatal(
                            "addOrder",
                            format!(
                                "insufficient {}: need {}, have {}",
                                self.pair.asset(),
                                amount,
                                state.portfolio.asset
                            ),
                        ));
                    }
                    state.portfolio.asset -= amount;
                    state.locked_asset += amount;
                }
            }

            let order_id = format!("sim-{}", self.next_order_id.fetch_add(1, Ordering::SeqCst));
            let order = Order {
                id: order_id.clone(),
                pair: self.pair.clone(),
                side,
                price,
                amount,
                status: OrderStatus::Pending,
                created_at: state.now(),
            };
            state.orders.insert(order_id.clone(), order);

            let filled = state.is_marketable(side, price)
                && match state.settle(&order_id, &self.fee) {
                    Ok(order) => order.is_some(),
                    Err(e) => {
                        warn!(order_id = %order_id, error = %e, "order left resting");
                        false
                    }
                };

            (order_id, filled, state.portfolio.clone())
        };

        info!(
            order_id = %order_id,
            side = %side,
            amount = %amount,
            price = %price,
            filled,
            "simulated order placed"
        );

        self.broadcaster
            .broadcast(PaperTradeEvent::PortfolioUpdate(snapshot))
            .await;

        Ok(order_id)
    }

    async fn get_order(&self, order_id: &str) -> ExchangeResult<Option<Order>> {
        let state = self.state.read().await;
        let order = state.orders.get(order_id).cloned();
        if order.is_none() {
            debug!(order_id, "simulated order not found");
        }
        Ok(order)
    }

    async fn cancel_order(&self, order_id: &str) -> ExchangeResult<CancelResult> {
        let snapshot = {
            let mut state = self.state.write().await;

            let (side, amount, notional) = match state.orders.get(order_id) {
                None => {
                    return Err(ExchangeError::fatal(
                        "cancelOrder",
                        format!("order not found: {}", order_id),
                    ))
                }
                Some(order) if order.status != OrderStatus::Pending => {
                    return Err(ExchangeError::fatal(
                        "cancelOrder",
                        format!("order {} is already {}", order_id, order.status),
                    ))
                }
                Some(order) => (order.side, order.amount, order.notional_value()),
            };
            let notional = notional.ok_or_else(|| {
                ExchangeError::fatal("cancelOrder", format!("order {} value overflows", order_id))
            })?;

            match side {
                Side::Buy => {
                    state.locked_currency -= notional;
                    state.portfolio.currency += notional;
                }
                Side::Sell => {
                    state.locked_asset -= amount;
                    state.portfolio.asset += amount;
                }
            }
            if let Some(order) = state.orders.get_mut(order_id) {
                order.status = OrderStatus::Cancelled;
            }

            state.portfolio.clone()
        };

        info!(order_id, "simulated order cancelled");
        self.broadcaster
            .broadcast(PaperTradeEvent::PortfolioUpdate(snapshot))
            .await;
        Ok(CancelResult::from_body(json!({ "result": true })))
    }
}
