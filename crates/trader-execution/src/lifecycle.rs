//! 주문 생명주기 관리.
//!
//! 제출된 주문을 거래소 상태 조회로만 전이시키는 상태 기계입니다.
//!
//! ```text
//! Placed ──▶ Pending ──▶ Filled
//!               │  ▲
//!               │  └──── Unknown (조회 실패, 재조회 가능)
//!               └──────▶ Cancelled
//! ```
//!
//! `Filled`와 `Cancelled`가 최종 상태입니다. 최종 상태의 주문은 더 이상
//! 조회하거나 취소할 수 없습니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use trader_core::{Order, OrderStatus, Side};
use trader_exchange::{Exchange, ExchangeError};

/// 주문 생명주기 에러.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition {
        from: LifecycleState,
        to: LifecycleState,
    },

    #[error("Order is in final state: {0}")]
    Finalized(String),

    #[error("Cancel refused by exchange: {0}")]
    CancelRejected(String),
}

/// 생명주기 작업 Result 타입.
pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// 주문 생명주기 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// 거래소가 주문 ID를 반환함
    Placed,
    /// 미체결 대기 중
    Pending,
    /// 전량 체결됨
    Filled,
    /// 취소됨
    Cancelled,
    /// 거래소에서 주문을 찾지 못함
    Unknown,
}

impl LifecycleState {
    /// 최종 상태인지 확인합니다.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LifecycleState::Filled | LifecycleState::Cancelled)
    }

    /// `next`로 전이할 수 있는지 확인합니다.
    pub fn can_transition_to(&self, next: LifecycleState) -> bool {
        use LifecycleState::*;

        match (self, next) {
            (Placed, Pending) => true,
            (Pending, Filled | Cancelled | Unknown) => true,
            (Unknown, Pending | Filled | Cancelled) => true,
            _ => false,
        }
    }
}

impl From<OrderStatus> for LifecycleState {
    fn from(status: OrderStatus) -> Self {
        match status {
            OrderStatus::Pending => LifecycleState::Pending,
            OrderStatus::Filled => LifecycleState::Filled,
            OrderStatus::Cancelled => LifecycleState::Cancelled,
            OrderStatus::Unknown => LifecycleState::Unknown,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Placed => "placed",
            LifecycleState::Pending => "pending",
            LifecycleState::Filled => "filled",
            LifecycleState::Cancelled => "cancelled",
            LifecycleState::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}

/// 상태 전이 기록.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: LifecycleState,
    pub to: LifecycleState,
    pub at: DateTime<Utc>,
}

/// 추적 중인 주문.
#[derive(Debug, Clone)]
pub struct TrackedOrder {
    order_id: String,
    side: Side,
    amount: Decimal,
    price: Decimal,
    state: LifecycleState,
    history: Vec<StateTransition>,
    /// 마지막으로 조회한 거래소 주문
    last_seen: Option<Order>,
}

impl TrackedOrder {
    fn placed(order_id: String, side: Side, amount: Decimal, price: Decimal) -> Self {
        Self {
            order_id,
            side,
            amount,
            price,
            state: LifecycleState::Placed,
            history: Vec::new(),
            last_seen: None,
        }
    }

    /// 거래소 주문 ID.
    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    /// 주문 방향.
    pub fn side(&self) -> Side {
        self.side
    }

    /// 요청 수량.
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// 요청 가격.
    pub fn price(&self) -> Decimal {
        self.price
    }

    /// 현재 상태.
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// 최종 상태인지 확인합니다.
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// 전이 이력 (시간순).
    pub fn history(&self) -> &[StateTransition] {
        &self.history
    }

    /// 마지막으로 조회한 거래소 주문.
    pub fn last_seen(&self) -> Option<&Order> {
        self.last_seen.as_ref()
    }

    /// 상태를 전이합니다. 같은 상태로의 전이는 기록하지 않습니다.
    fn transition(&mut self, to: LifecycleState) -> LifecycleResult<()> {
        if self.state == to {
            return Ok(());
        }
        if self.state.is_terminal() {
            return Err(LifecycleError::Finalized(self.order_id.clone()));
        }
        if !self.state.can_transition_to(to) {
            return Err(LifecycleError::InvalidTransition {
                from: self.state,
                to,
            });
        }

        info!(
            order_id = %self.order_id,
            from = %self.state,
            to = %to,
            "order state transition"
        );

        self.history.push(StateTransition {
            from: self.state,
            to,
            at: Utc::now(),
        });
        self.state = to;
        Ok(())
    }

    fn ensure_active(&self) -> LifecycleResult<()> {
        if self.is_terminal() {
            return Err(LifecycleError::Finalized(self.order_id.clone()));
        }
        Ok(())
    }
}

/// 거래소 호출로 주문 생명주기를 진행하는 관리자.
///
/// 자체 네트워크 로직 없이 `Exchange` 구현만 호출합니다.
pub struct OrderLifecycle<'a, E: Exchange + ?Sized> {
    exchange: &'a E,
}

impl<'a, E: Exchange + ?Sized> OrderLifecycle<'a, E> {
    /// 새 관리자를 생성합니다.
    pub fn new(exchange: &'a E) -> Self {
        Self { exchange }
    }

    /// 주문을 제출하고 `Pending` 상태의 추적 주문을 반환합니다.
    pub async fn place(
        &self,
        side: Side,
        amount: Decimal,
        price: Decimal,
    ) -> LifecycleResult<TrackedOrder> {
        let order_id = self.exchange.add_order(side, amount, price).await?;

        let mut order = TrackedOrder::placed(order_id, side, amount, price);
        order.transition(LifecycleState::Pending)?;
        Ok(order)
    }

    /// 거래소 상태를 한 번 조회하여 전이합니다.
    ///
    /// 거래소가 주문을 찾지 못하면 `Unknown`으로 전이합니다. 호출자는 다시
    /// 조회할지 최종으로 볼지 결정할 수 있습니다.
    pub async fn poll(&self, order: &mut TrackedOrder) -> LifecycleResult<LifecycleState> {
        order.ensure_active()?;

        let next = match self.exchange.get_order(order.order_id()).await? {
            Some(remote) => {
                let state = LifecycleState::from(remote.status);
                order.last_seen = Some(remote);
                state
            }
            None => {
                warn!(
                    order_id = %order.order_id,
                    exchange = self.exchange.name(),
                    "order not found on exchange"
                );
                LifecycleState::Unknown
            }
        };

        order.transition(next)?;
        Ok(order.state())
    }

    /// 주문을 취소하고 `Cancelled`로 전이합니다.
    ///
    /// 거래소가 취소를 거절하면 상태를 유지하고 `CancelRejected`를 반환합니다.
    pub async fn cancel(&self, order: &mut TrackedOrder) -> LifecycleResult<()> {
        order.ensure_active()?;
        if !order.state.can_transition_to(LifecycleState::Cancelled) {
            return Err(LifecycleError::InvalidTransition {
                from: order.state,
                to: LifecycleState::Cancelled,
            });
        }

        let result = self.exchange.cancel_order(order.order_id()).await?;
        if !result.accepted {
            warn!(
                order_id = %order.order_id,
                state = %order.state,
                body = %result.body,
                "cancel refused, order still active"
            );
            return Err(LifecycleError::CancelRejected(order.order_id.clone()));
        }
        order.transition(LifecycleState::Cancelled)
    }

    /// 최종 상태가 되거나 조회 횟수를 소진할 때까지 주기적으로 조회합니다.
    ///
    /// 마지막으로 관측한 상태를 반환합니다.
    pub async fn await_settlement(
        &self,
        order: &mut TrackedOrder,
        interval: Duration,
        max_polls: u32,
    ) -> LifecycleResult<LifecycleState> {
        for poll in 1..=max_polls {
            let state = self.poll(order).await?;
            if state.is_terminal() {
                return Ok(state);
            }

            debug!(
                order_id = %order.order_id,
                poll,
                state = %state,
                "order not settled yet"
            );
            if poll < max_polls {
                tokio::time::sleep(interval).await;
            }
        }

        Ok(order.state())
    }
}
