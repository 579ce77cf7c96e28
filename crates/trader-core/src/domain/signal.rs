//! 전략의 매매 권고.
//!
//! 이 모듈은 전략이 모의투자기에 전달하는 권고 타입을 정의합니다:
//! - `Recommendation` - long/short 권고
//! - `Advice` - 권고와 기준 캔들

use crate::domain::{Candle, Side};
use serde::{Deserialize, Serialize};

/// 전략 권고 유형.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
    /// 매수 포지션
    Long,
    /// 매도 포지션
    Short,
}

impl Recommendation {
    /// 권고 문자열을 해석합니다. long/short 외에는 `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "long" => Some(Recommendation::Long),
            "short" => Some(Recommendation::Short),
            _ => None,
        }
    }

    /// 권고에 대응하는 주문 방향.
    pub fn side(&self) -> Side {
        match self {
            Recommendation::Long => Side::Buy,
            Recommendation::Short => Side::Sell,
        }
    }
}

/// 전략이 생성한 매매 권고.
///
/// `recommendation`은 전략이 보낸 원문 그대로 보관합니다. 알 수 없는 값은
/// 모의투자기에서 무시됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Advice {
    /// 권고 원문 ("long", "short", ...)
    pub recommendation: String,
    /// 기준 캔들 (가격: close, 시각: start)
    pub candle: Candle,
}

impl Advice {
    /// 새 권고를 생성합니다.
    pub fn new(recommendation: impl Into<String>, candle: Candle) -> Self {
        Self {
            recommendation: recommendation.into(),
            candle,
        }
    }

    /// 해석된 권고.
    pub fn recommendation(&self) -> Option<Recommendation> {
        Recommendation::parse(&self.recommendation)
    }
}
