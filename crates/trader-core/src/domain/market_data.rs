//! 시장 데이터 타입 및 구조체.
//!
//! 이 모듈은 시장 데이터 관련 타입을 정의합니다:
//! - `Ticker` - 최우선 호가
//! - `Candle` - OHLCV 캔들 (모의투자 시세 입력)
//! - `PortfolioEntry`, `Portfolio` - 자산별 잔고

use crate::types::{Price, Quantity};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 조회 시점의 최우선 매수/매도 호가.
///
/// ask ≥ bid 관계는 기대되지만 검증하지 않습니다 (거래소 데이터를 그대로 신뢰).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticker {
    /// 최우선 매도 호가
    pub ask: Price,
    /// 최우선 매수 호가
    pub bid: Price,
}

impl Ticker {
    /// 매수/매도 스프레드를 반환합니다.
    pub fn spread(&self) -> Decimal {
        self.ask - self.bid
    }
}

/// OHLCV 캔들.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// 캔들 시작 시간
    pub start: DateTime<Utc>,
    /// 시가
    pub open: Price,
    /// 고가
    pub high: Price,
    /// 저가
    pub low: Price,
    /// 종가
    pub close: Price,
    /// 거래량
    #[serde(default)]
    pub volume: Quantity,
}

impl Candle {
    /// 단일 가격으로 구성된 캔들을 생성합니다.
    pub fn flat(start: DateTime<Utc>, price: Price) -> Self {
        Self {
            start,
            open: price,
            high: price,
            low: price,
            close: price,
            volume: Decimal::ZERO,
        }
    }
}

/// 단일 자산 잔고.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioEntry {
    /// 대문자 자산 이름
    pub name: String,
    /// 사용 가능 수량 (≥ 0)
    pub amount: Quantity,
}

impl PortfolioEntry {
    /// 새 잔고 항목을 생성합니다. 이름은 대문자로 정규화합니다.
    pub fn new(name: impl Into<String>, amount: Quantity) -> Self {
        Self {
            name: name.into().to_uppercase(),
            amount,
        }
    }
}

/// 관심 자산별 잔고 목록 (거래소 응답 순서 유지).
pub type Portfolio = Vec<PortfolioEntry>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_ticker_spread() {
        let ticker = Ticker {
            ask: dec!(101),
            bid: dec!(99),
        };
        assert_eq!(ticker.spread(), dec!(2));
    }

    #[test]
    fn test_flat_candle() {
        let candle = Candle::flat(Utc::now(), dec!(100));
        assert_eq!(candle.low, dec!(100));
        assert_eq!(candle.high, dec!(100));
        assert_eq!(candle.volume, Decimal::ZERO);
    }

    #[test]
    fn test_portfolio_entry_uppercases_name() {
        let entry = PortfolioEntry::new("btc", dec!(0.5));
        assert_eq!(entry.name, "BTC");
        assert_eq!(entry.amount, dec!(0.5));
    }
}
