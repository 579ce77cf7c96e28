//! 주문 타입.
//!
//! 이 모듈은 거래소 어댑터의 주문 관련 타입을 정의합니다:
//! - `Side` - 주문 방향 (매수/매도)
//! - `OrderStatus` - 거래소가 보고한 주문 상태
//! - `Order` - 정규화된 주문 상세

use crate::error::TraderError;
use crate::types::{Price, Quantity, TradingPair};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 주문 방향 (매수 또는 매도).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// 매수
    Buy,
    /// 매도
    Sell,
}

impl Side {
    /// 거래소 전송용 정수 코드 (sell=0, buy=1).
    pub fn wire_code(&self) -> u8 {
        match self {
            Side::Sell => 0,
            Side::Buy => 1,
        }
    }

    /// 정수 코드에서 방향을 복원합니다. 0만 매도로 해석합니다.
    pub fn from_wire_code(code: u8) -> Self {
        if code == 0 {
            Side::Sell
        } else {
            Side::Buy
        }
    }
}

impl FromStr for Side {
    type Err = TraderError;

    /// "buy"/"sell"만 허용합니다 (대소문자 무시). 그 외 문자열은 강제 변환하지 않습니다.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "buy" => Ok(Side::Buy),
            "sell" => Ok(Side::Sell),
            _ => Err(TraderError::InvalidInput(format!(
                "알 수 없는 주문 방향: {}",
                s
            ))),
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// 주문 상태.
///
/// `Filled`와 `Cancelled`가 최종 상태입니다.
/// `Unknown`은 거래소가 주문 ID를 찾지 못한 경우로, 에러가 아닌 보고 대상입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// 미체결 대기 중
    Pending,
    /// 전량 체결됨
    Filled,
    /// 취소됨
    Cancelled,
    /// 거래소에서 찾을 수 없음
    Unknown,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "pending"),
            OrderStatus::Filled => write!(f, "filled"),
            OrderStatus::Cancelled => write!(f, "cancelled"),
            OrderStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// 거래소에서 조회한 주문 상세.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// 거래소 주문 ID
    pub id: String,
    /// 거래쌍
    pub pair: TradingPair,
    /// 주문 방향
    pub side: Side,
    /// 요청 가격
    pub price: Price,
    /// 요청 수량
    pub amount: Quantity,
    /// 현재 상태
    pub status: OrderStatus,
    /// 주문 생성 시각
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// 주문이 전량 체결되었는지 확인합니다.
    pub fn is_filled(&self) -> bool {
        self.status == OrderStatus::Filled
    }

    /// 주문의 명목 가치 (`가격 × 수량`). 표현 범위를 넘으면 `None`.
    pub fn notional_value(&self) -> Option<Price> {
        self.price.checked_mul(self.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_side_from_str_case_insensitive() {
        assert_eq!("buy".parse::<Side>().unwrap(), Side::Buy);
        assert_eq!("SELL".parse::<Side>().unwrap(), Side::Sell);
        assert_eq!("Sell".parse::<Side>().unwrap(), Side::Sell);
    }

    #[test]
    fn test_side_from_str_rejects_others() {
        assert!("long".parse::<Side>().is_err());
        assert!("".parse::<Side>().is_err());
        assert!(" buy".parse::<Side>().is_err());
    }

    #[test]
    fn test_side_wire_code() {
        assert_eq!(Side::Sell.wire_code(), 0);
        assert_eq!(Side::Buy.wire_code(), 1);
        assert_eq!(Side::from_wire_code(0), Side::Sell);
        assert_eq!(Side::from_wire_code(1), Side::Buy);
    }

    #[test]
    fn test_order_notional() {
        let order = Order {
            id: "abc".to_string(),
            pair: TradingPair::new("BTC", "EUR").unwrap(),
            side: Side::Buy,
            price: dec!(100),
            amount: dec!(1.5),
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        };
        assert_eq!(order.notional_value(), Some(dec!(150)));
        assert!(!order.is_filled());

        let huge = Order {
            price: dec!(1e15),
            amount: dec!(1e15),
            ..order
        };
        assert_eq!(huge.notional_value(), None);
    }
}
