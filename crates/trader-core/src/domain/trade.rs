//! 거래 체결 기록.
//!
//! 이 모듈은 거래소 체결 내역 관련 타입을 정의합니다:
//! - `Trade` - 정규화된 체결 기록
//! - `filter_trades` - since 필터링 및 정렬

use crate::domain::Side;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 거래소 체결 기록.
///
/// 수량과 가격은 부동소수점 오차를 피하기 위해 정확한 10진 문자열로 보관합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// 체결 방향
    pub side: Side,
    /// 체결 시각 (유닉스 초)
    pub timestamp_seconds: i64,
    /// 체결 수량 (정확한 문자열)
    pub amount: String,
    /// 체결 가격 (정확한 문자열)
    pub price: String,
    /// 거래소 체결 ID
    pub id: String,
}

/// 밀리초 타임스탬프가 붙은 체결 목록을 since 기준으로 필터링하고 정렬합니다.
///
/// - `since`가 있으면 `since < timestamp`인 체결만 남깁니다 (밀리초 단위 비교).
/// - 입력은 시간 오름차순이라고 가정하며, 필터링 후에만 뒤집습니다.
pub fn filter_trades<I>(trades: I, since: Option<DateTime<Utc>>, ascending: bool) -> Vec<Trade>
where
    I: IntoIterator<Item = (i64, Trade)>,
{
    let cutoff_ms = since.map(|s| s.timestamp_millis());

    let mut filtered: Vec<Trade> = trades
        .into_iter()
        .filter(|(timestamp_ms, _)| cutoff_ms.map_or(true, |cutoff| cutoff < *timestamp_ms))
        .map(|(_, trade)| trade)
        .collect();

    if !ascending {
        filtered.reverse();
    }
    filtered
}
