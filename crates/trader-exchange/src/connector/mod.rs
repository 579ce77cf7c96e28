//! 거래소 커넥터.

pub mod coingi;

pub use coingi::{CoingiClient, COINGI_FEE};
