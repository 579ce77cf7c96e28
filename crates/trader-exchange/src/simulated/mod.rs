//! 모의투자 및 시뮬레이션 거래소.
//!
//! 이 모듈은 원격 거래소 대신 로컬 상태로 동작하는 구성 요소를 제공합니다:
//! - `PaperTrader`: 전략 권고를 모의 체결로 바꾸고 이벤트를 발행
//! - `SimulatedExchange`: 지정가 주문 체결을 흉내내는 `Exchange` 구현
//! - 공통 수수료 모델(`FeeModel`)과 포트폴리오(`SimulatedPortfolio`)
//!
//! # 예제
//!
//! ```ignore
//! use trader_exchange::simulated::SimulatedExchange;
//!
//! let exchange = SimulatedExchange::new(pair, &config.paper_trader);
//! exchange.update_market(candle).await;
//!
//! // 이제 실제 거래소처럼 사용할 수 있습니다
//! let order_id = exchange.buy(dec!(0.5), dec!(100)).await?;
//! ```

mod events;
mod exchange;
mod fee;
mod paper_trader;
mod portfolio;

pub use events::{EventBroadcaster, PaperTradeEvent, TradeEvent};
pub use exchange::SimulatedExchange;
pub use fee::FeeModel;
pub use paper_trader::PaperTrader;
pub use portfolio::SimulatedPortfolio;
