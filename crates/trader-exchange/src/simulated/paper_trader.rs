//! 모의투자기.
//!
//! 전략의 권고를 받아 로컬 포트폴리오에 모의 체결을 적용하고,
//! `trade` / `portfolioUpdate` 이벤트를 구독자에게 전달합니다.
//!
//! # 예제
//!
//! ```ignore
//! let mut trader = PaperTrader::new(&config.paper_trader);
//! let mut events = trader.subscribe(100).await;
//!
//! trader.relay_trade(&Advice::new("long", candle)).await;
//! if let Some(PaperTradeEvent::Trade(trade)) = events.recv().await {
//!     println!("{} @ {}", trade.action, trade.price);
//! }
//! ```

use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use trader_core::{Advice, PaperTraderConfig, Recommendation};

use super::events::{EventBroadcaster, PaperTradeEvent, TradeEvent};
use super::fee::FeeModel;
use super::portfolio::SimulatedPortfolio;

/// 로컬 모의투자기.
pub struct PaperTrader {
    fee: FeeModel,
    portfolio: SimulatedPortfolio,
    /// 마지막 권고 가격
    last_price: Option<Decimal>,
    /// 모의 체결 횟수
    trades: u64,
    broadcaster: EventBroadcaster<PaperTradeEvent>,
}

impl PaperTrader {
    /// 설정의 수수료와 시작 잔고로 생성합니다.
    pub fn new(config: &PaperTraderConfig) -> Self {
        Self {
            fee: FeeModel::from(config),
            portfolio: SimulatedPortfolio::from(&config.simulation_balance),
            last_price: None,
            trades: 0,
            broadcaster: EventBroadcaster::new(),
        }
    }

    /// 이벤트를 구독합니다.
    pub async fn subscribe(&self, buffer_size: usize) -> mpsc::Receiver<PaperTradeEvent> {
        self.broadcaster.subscribe(buffer_size).await
    }

    /// 현재 포트폴리오의 복제본.
    pub fn portfolio(&self) -> SimulatedPortfolio {
        self.portfolio.clone()
    }

    /// 수수료 계수.
    pub fn fee_factor(&self) -> Decimal {
        self.fee.factor()
    }

    /// 지금까지의 모의 체결 횟수.
    pub fn trade_count(&self) -> u64 {
        self.trades
    }

    /// 수수료 차감 후 수량 (소수점 8자리 내림).
    pub fn extract_fee(&self, amount: Decimal) -> Decimal {
        self.fee.extract_fee(amount)
    }

    /// 권고를 모의 체결로 전달합니다.
    ///
    /// long은 통화 전량을 자산으로, short는 자산 전량을 통화로 바꿉니다.
    /// long/short 외의 권고, 0 이하의 가격, 표현 범위를 넘는 체결은
    /// 포트폴리오를 바꾸지 않고 `None`을 반환합니다.
    pub async fn relay_trade(&mut self, advice: &Advice) -> Option<TradeEvent> {
        let Some(recommendation) = advice.recommendation() else {
            debug!(
                recommendation = %advice.recommendation,
                "ignoring unknown recommendation"
            );
            return None;
        };

        let price = advice.candle.close;
        if price <= Decimal::ZERO {
            warn!(price = %price, "ignoring advice with non-positive price");
            return None;
        }

        let Some(filled) = self.fill(recommendation, price) else {
            warn!(price = %price, "simulated fill overflows, advice ignored");
            return None;
        };
        self.portfolio = filled;
        self.last_price = Some(price);
        self.trades += 1;

        let event = TradeEvent {
            action: recommendation.side(),
            price,
            portfolio: self.portfolio.clone(),
            balance: self.portfolio.value_at(price),
            date: advice.candle.start,
        };

        info!(
            action = %event.action,
            price = %price,
            asset = %event.portfolio.asset,
            currency = %event.portfolio.currency,
            "paper trade"
        );

        self.broadcaster
            .broadcast(PaperTradeEvent::Trade(event.clone()))
            .await;
        Some(event)
    }

    /// 포트폴리오 복제본을 `portfolioUpdate`로 전달합니다.
    pub async fn relay_portfolio(&self) {
        self.broadcaster
            .broadcast(PaperTradeEvent::PortfolioUpdate(self.portfolio.clone()))
            .await;
    }

    /// 시작 평가액을 기록하고 포트폴리오를 전달합니다.
    pub async fn set_start_balance(&mut self, price: Decimal) {
        self.last_price = Some(price);
        let balance = self.portfolio.value_at(price);
        self.portfolio.balance = Some(balance);

        debug!(balance = %balance, "start balance recorded");
        self.relay_portfolio().await;
    }

    /// 마지막 권고 가격.
    pub fn last_price(&self) -> Option<Decimal> {
        self.last_price
    }

    /// 체결 후 포트폴리오를 계산합니다. 표현 범위를 넘으면 `None`.
    fn fill(&self, recommendation: Recommendation, price: Decimal) -> Option<SimulatedPortfolio> {
        let mut next = self.portfolio.clone();
        match recommendation {
            Recommendation::Long => {
                let bought = next
                    .currency
                    .checked_div(price)
                    .and_then(|amount| self.fee.checked_extract_fee(amount))?;
                next.asset = next.asset.checked_add(bought)?;
                next.currency = Decimal::ZERO;
            }
            Recommendation::Short => {
                let sold = next
                    .asset
                    .checked_mul(price)
                    .and_then(|amount| self.fee.checked_extract_fee(amount))?;
                next.currency = next.currency.checked_add(sold)?;
                next.asset = Decimal::ZERO;
            }
        }
        Some(next)
    }
}
