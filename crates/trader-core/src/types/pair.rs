//! 거래쌍 정의.
//!
//! 이 모듈은 거래소 어댑터가 사용하는 거래쌍 타입을 정의합니다:
//! - `TradingPair` - 기준 자산(asset)과 결제 통화(currency)의 조합

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{TraderError, TraderResult};

/// 거래 가능한 자산/통화 쌍.
///
/// 두 심볼은 항상 대문자로 저장되며 서로 달라야 합니다.
/// 거래소별 경로 문자열은 전송 계층 경계에서만 생성합니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPair")]
pub struct TradingPair {
    /// 기준 자산 (예: BTC)
    asset: String,
    /// 결제 통화 (예: EUR)
    currency: String,
}

#[derive(Deserialize)]
struct RawPair {
    asset: String,
    currency: String,
}

impl TryFrom<RawPair> for TradingPair {
    type Error = TraderError;

    fn try_from(raw: RawPair) -> Result<Self, Self::Error> {
        Self::new(raw.asset, raw.currency)
    }
}

impl TradingPair {
    /// 새 거래쌍을 생성합니다.
    ///
    /// # Errors
    /// 심볼이 비어 있거나 asset과 currency가 같으면 `TraderError::InvalidInput`을 반환합니다.
    pub fn new(asset: impl Into<String>, currency: impl Into<String>) -> TraderResult<Self> {
        let asset = asset.into().trim().to_uppercase();
        let currency = currency.into().trim().to_uppercase();

        if asset.is_empty() || currency.is_empty() {
            return Err(TraderError::InvalidInput(
                "거래쌍 심볼은 비어 있을 수 없습니다".to_string(),
            ));
        }
        if asset == currency {
            return Err(TraderError::InvalidInput(format!(
                "asset과 currency가 같습니다: {}",
                asset
            )));
        }

        Ok(Self { asset, currency })
    }

    /// 기준 자산 심볼.
    pub fn asset(&self) -> &str {
        &self.asset
    }

    /// 결제 통화 심볼.
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// 구분자로 연결한 거래소 경로 문자열 (예: `btc-eur`).
    pub fn route(&self, separator: &str) -> String {
        format!("{}{}{}", self.asset, separator, self.currency).to_lowercase()
    }
}

impl fmt::Display for TradingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.asset, self.currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_creation_uppercases() {
        let pair = TradingPair::new("btc", " eur").unwrap();
        assert_eq!(pair.asset(), "BTC");
        assert_eq!(pair.currency(), "EUR");
        assert_eq!(pair.to_string(), "BTC/EUR");
    }

    #[test]
    fn test_pair_rejects_same_symbol() {
        assert!(TradingPair::new("BTC", "btc").is_err());
        assert!(TradingPair::new("", "EUR").is_err());
    }

    #[test]
    fn test_pair_route() {
        let pair = TradingPair::new("BTC", "EUR").unwrap();
        assert_eq!(pair.route("-"), "btc-eur");
    }

    #[test]
    fn test_pair_deserialize_validates() {
        let ok: TradingPair =
            serde_json::from_str(r#"{"asset":"ltc","currency":"btc"}"#).unwrap();
        assert_eq!(ok.asset(), "LTC");

        let err = serde_json::from_str::<TradingPair>(r#"{"asset":"BTC","currency":"BTC"}"#);
        assert!(err.is_err());
    }
}
