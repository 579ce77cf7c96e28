//! 주문 생명주기 관리.
//!
//! 이 crate는 다음을 제공합니다:
//! - 주문 제출부터 최종 상태까지의 상태 기계
//! - 거래소 조회 기반 상태 전이와 전이 이력
//! - 체결 대기(`await_settlement`) 헬퍼
//!
//! # 예제
//!
//! ```rust,ignore
//! use trader_execution::OrderLifecycle;
//!
//! let lifecycle = OrderLifecycle::new(&exchange);
//! let mut order = lifecycle.place(Side::Buy, dec!(0.5), dec!(100)).await?;
//! let state = lifecycle
//!     .await_settlement(&mut order, Duration::from_secs(5), 12)
//!     .await?;
//! ```

pub mod lifecycle;

// 주요 타입 재내보내기
pub use lifecycle::{
    LifecycleError, LifecycleResult, LifecycleState, OrderLifecycle, StateTransition,
    TrackedOrder,
};
