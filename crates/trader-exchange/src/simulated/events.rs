//! 모의투자 이벤트와 브로드캐스터.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::warn;
use trader_core::Side;

use super::portfolio::SimulatedPortfolio;

/// 모의 체결 이벤트 (`trade`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeEvent {
    /// 체결 방향
    pub action: Side,
    /// 체결 가격
    pub price: Decimal,
    /// 체결 직후 포트폴리오 스냅샷
    pub portfolio: SimulatedPortfolio,
    /// 추정 평가액 (currency + price × asset)
    pub balance: Decimal,
    /// 체결 시각
    pub date: DateTime<Utc>,
}

/// 모의투자기가 발행하는 이벤트.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "camelCase")]
pub enum PaperTradeEvent {
    /// 모의 체결
    Trade(TradeEvent),
    /// 포트폴리오 갱신
    PortfolioUpdate(SimulatedPortfolio),
}

impl PaperTradeEvent {
    /// 이벤트 이름 (`trade`, `portfolioUpdate`).
    pub fn name(&self) -> &'static str {
        match self {
            PaperTradeEvent::Trade(_) => "trade",
            PaperTradeEvent::PortfolioUpdate(_) => "portfolioUpdate",
        }
    }
}

/// 구독자별 채널로 이벤트를 전달하는 브로드캐스터.
///
/// 구독자가 받지 않아 버퍼가 가득 차면 해당 이벤트는 그 구독자에게만 버려집니다.
/// 발행자는 구독자 때문에 대기하지 않습니다.
pub struct EventBroadcaster<T: Clone + Send> {
    /// 각 구독자의 송신기
    senders: Arc<RwLock<Vec<mpsc::Sender<T>>>>,
}

impl<T: Clone + Send> EventBroadcaster<T> {
    /// 새로운 이벤트 브로드캐스터를 생성합니다.
    pub fn new() -> Self {
        Self {
            senders: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// 이벤트를 구독하고 수신기를 가져옵니다.
    pub async fn subscribe(&self, buffer_size: usize) -> mpsc::Receiver<T> {
        let (tx, rx) = mpsc::channel(buffer_size.max(1));
        self.senders.write().await.push(tx);
        rx
    }

    /// 모든 구독자에게 이벤트를 브로드캐스트합니다.
    ///
    /// 닫힌 구독자는 이 시점에 제거됩니다.
    pub async fn broadcast(&self, event: T) {
        let mut senders = self.senders.write().await;
        senders.retain(|sender| match sender.try_send(event.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("event subscriber is lagging, dropping event");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
    }

    /// 현재 구독자 수.
    pub async fn subscriber_count(&self) -> usize {
        self.senders.read().await.len()
    }
}

impl<T: Clone + Send> Default for EventBroadcaster<T> {
    fn default() -> Self {
        Self::new()
    }
}
