//! 거래소 trait 정의.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use trader_core::{ExchangeCapabilities, Order, Portfolio, Side, Ticker, Trade};

use crate::ExchangeError;

/// 거래소 작업을 위한 Result 타입.
pub type ExchangeResult<T> = Result<T, ExchangeError>;

/// 주문 취소 응답.
///
/// 거래소가 돌려준 본문을 그대로 담고, 취소가 받아들여졌는지를 함께 보고합니다.
#[derive(Debug, Clone, PartialEq)]
pub struct CancelResult {
    /// 거래소가 취소를 수락했는지 여부
    pub accepted: bool,
    /// 원본 응답 본문
    pub body: Value,
}

impl CancelResult {
    /// 응답 본문에서 수락 여부를 판정합니다.
    ///
    /// `result` 필드가 있으면 그 값의 참/거짓을, 없으면 본문 자체의 참/거짓을 봅니다.
    pub fn from_body(body: Value) -> Self {
        let accepted = match body.get("result") {
            Some(result) => is_truthy(result),
            None => is_truthy(&body),
        };
        Self { accepted, body }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// 통합 거래소 인터페이스를 위한 Exchange trait.
///
/// 실거래 커넥터와 시뮬레이션 거래소가 모두 구현하므로, 상위 계층
/// (주문 생명주기 등)은 어느 쪽과 연결되어 있는지 알 필요가 없습니다.
#[async_trait]
pub trait Exchange: Send + Sync {
    /// 거래소 이름 반환.
    fn name(&self) -> &str;

    /// 거래소 기능 메타데이터.
    fn capabilities(&self) -> ExchangeCapabilities;

    /// 거래 수수료율 (네트워크 호출 없음).
    fn get_fee(&self) -> Decimal;

    // === 시장 데이터 ===

    /// 최우선 매도/매수 호가 조회.
    async fn get_ticker(&self) -> ExchangeResult<Ticker>;

    /// 자산/통화 잔고 조회.
    async fn get_portfolio(&self) -> ExchangeResult<Portfolio>;

    /// 체결 내역 조회.
    ///
    /// `since`보다 엄격하게 이후인 체결만 반환하며, 필터링 후에
    /// `ascending`에 따라 정렬합니다.
    async fn get_trades(
        &self,
        since: Option<DateTime<Utc>>,
        ascending: bool,
    ) -> ExchangeResult<Vec<Trade>>;

    // === 주문 작업 ===

    /// 지정가 주문 제출. 주문 ID를 반환합니다.
    async fn add_order(
        &self,
        side: Side,
        amount: Decimal,
        price: Decimal,
    ) -> ExchangeResult<String>;

    /// 매수 주문 제출.
    async fn buy(&self, amount: Decimal, price: Decimal) -> ExchangeResult<String> {
        self.add_order(Side::Buy, amount, price).await
    }

    /// 매도 주문 제출.
    async fn sell(&self, amount: Decimal, price: Decimal) -> ExchangeResult<String> {
        self.add_order(Side::Sell, amount, price).await
    }

    /// 주문 조회.
    ///
    /// 거래소가 주문을 찾지 못하면 에러가 아니라 `None`을 반환합니다.
    async fn get_order(&self, order_id: &str) -> ExchangeResult<Option<Order>>;

    /// 주문 체결 여부 확인. 찾지 못한 주문은 `false`.
    async fn check_order(&self, order_id: &str) -> ExchangeResult<bool> {
        Ok(self
            .get_order(order_id)
            .await?
            .map(|order| order.is_filled())
            .unwrap_or(false))
    }

    /// 주문 취소. 거래소 응답을 그대로 전달합니다.
    ///
    /// 거래소가 취소를 거절해도 에러가 아니며, `CancelResult::accepted`가 `false`입니다.
    async fn cancel_order(&self, order_id: &str) -> ExchangeResult<CancelResult>;
}

/// 문자열 주문 방향을 검증하여 주문을 제출합니다.
///
/// "buy"/"sell" 이외의 값(대소문자 무시)은 치명적 에러입니다.
pub async fn add_order_str<E: Exchange + ?Sized>(
    exchange: &E,
    side: &str,
    amount: Decimal,
    price: Decimal,
) -> ExchangeResult<String> {
    let side: Side = side
        .parse()
        .map_err(|e| ExchangeError::from_core("addOrder", e))?;
    exchange.add_order(side, amount, price).await
}
