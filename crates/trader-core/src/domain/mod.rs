//! 거래소 어댑터의 도메인 모델.

mod capabilities;
mod market_data;
mod order;
mod signal;
mod trade;

pub use capabilities::*;
pub use market_data::*;
pub use order::*;
pub use signal::*;
pub use trade::*;
