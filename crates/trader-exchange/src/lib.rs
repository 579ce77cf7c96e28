//! 거래소 연결 및 모의투자.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - Exchange trait: 통합 거래소 인터페이스
//! - 에러 분류기: 원격 에러를 재시도 가능/치명적으로 분류
//! - 재시도 정책: Critical(제한) / Forever(무제한) 지수 백오프
//! - Transport trait: HTTP/서명 클라이언트와의 경계
//! - Coingi 커넥터
//! - 모의투자기 및 시뮬레이션 거래소

pub mod classifier;
pub mod connector;
pub mod error;
pub mod retry;
pub mod simulated;
pub mod traits;
pub mod transport;

pub use classifier::{ErrorClass, ErrorClassifier, ErrorRule, NO_DATA_MESSAGE};
pub use connector::{CoingiClient, COINGI_FEE};
pub use error::*;
pub use retry::{with_retry, with_retry_context, RetryConfig, RetryContext, RetryPolicy};
pub use simulated::{
    EventBroadcaster, FeeModel, PaperTradeEvent, PaperTrader, SimulatedExchange,
    SimulatedPortfolio, TradeEvent,
};
pub use traits::*;
pub use transport::{Transport, TransportError};

#[cfg(any(test, feature = "test-utils"))]
pub use transport::{RecordedCall, ScriptedTransport};
