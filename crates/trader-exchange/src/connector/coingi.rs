//! Coingi 거래소 커넥터.
//!
//! 각 작업은 "요청 구성 → 재시도 정책으로 실행 → 분류 → 정규화" 순서로 동작합니다.
//! HTTP 연결과 요청 서명은 `Transport` 구현이 담당합니다.
//!
//! | 작업 | 엔드포인트 | 정책 |
//! |------|-----------|------|
//! | get_ticker | `order-book` | Forever |
//! | get_portfolio | `balance` | Forever |
//! | get_trades | `transactions` | Forever |
//! | add_order | `add-order` | Critical |
//! | get_order / check_order | `get-order` | Critical |
//! | cancel_order | `cancel-order` | Forever |

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};
use trader_core::{
    filter_trades, Credentials, DecimalExt, ExchangeCapabilities, ExchangeConfig, HistoryMode,
    Market, Order, OrderStatus, Portfolio, PortfolioEntry, Side, Ticker, Trade, TraderResult,
    TradingPair,
};

use crate::classifier::ErrorClassifier;
use crate::retry::{with_retry, RetryConfig};
use crate::traits::{CancelResult, Exchange, ExchangeResult};
use crate::transport::Transport;
use crate::ExchangeError;

/// Coingi 고정 수수료율.
pub const COINGI_FEE: Decimal = dec!(0.002);

/// 체결 내역 한 페이지의 최대 건수.
const TRADES_PAGE_SIZE: u32 = 512;

/// 체결 완료를 나타내는 주문 상태 코드.
const STATUS_FILLED: u8 = 2;

// ============================================================================
// API 응답 타입
// ============================================================================

#[derive(Debug, Deserialize)]
struct CoingiOrderBookLevel {
    price: Decimal,
}

#[derive(Debug, Deserialize)]
struct CoingiOrderBook {
    asks: Vec<CoingiOrderBookLevel>,
    bids: Vec<CoingiOrderBookLevel>,
}

#[derive(Debug, Deserialize)]
struct CoingiCurrency {
    name: String,
}

#[derive(Debug, Deserialize)]
struct CoingiBalance {
    currency: CoingiCurrency,
    available: Decimal,
}

#[derive(Debug, Deserialize)]
struct CoingiTransaction {
    #[serde(rename = "type")]
    side: u8,
    /// 밀리초
    timestamp: i64,
    amount: Decimal,
    price: Decimal,
    #[serde(default)]
    id: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct CoingiAddOrderResponse {
    result: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CoingiOrder {
    #[serde(rename = "type")]
    side: u8,
    price: Decimal,
    base_amount: Decimal,
    /// 초
    timestamp: i64,
    status: u8,
}

impl CoingiOrder {
    fn order_status(&self) -> OrderStatus {
        match self.status {
            STATUS_FILLED => OrderStatus::Filled,
            3 | 4 => OrderStatus::Cancelled,
            _ => OrderStatus::Pending,
        }
    }
}

/// 체결 여부 확인에 필요한 상태 코드만 읽습니다.
#[derive(Debug, Deserialize)]
struct CoingiOrderStatus {
    status: u8,
}

/// 문자열 또는 숫자 ID를 문자열로 변환합니다.
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// ============================================================================
// Coingi 클라이언트
// ============================================================================

/// Coingi 거래소 클라이언트.
pub struct CoingiClient<T: Transport> {
    credentials: Credentials,
    pair: TradingPair,
    classifier: ErrorClassifier,
    critical: RetryConfig,
    forever: RetryConfig,
    transport: T,
}

impl<T: Transport> CoingiClient<T> {
    /// 새 클라이언트를 생성합니다.
    ///
    /// # Errors
    /// 키 또는 시크릿이 비어 있으면 `TraderError::Auth`를 반환합니다.
    pub fn new(credentials: Credentials, pair: TradingPair, transport: T) -> TraderResult<Self> {
        credentials.validate()?;

        Ok(Self {
            credentials,
            pair,
            classifier: ErrorClassifier::new("coingi"),
            critical: RetryConfig::critical(),
            forever: RetryConfig::forever(),
            transport,
        })
    }

    /// 거래소 설정에서 클라이언트를 생성합니다.
    pub fn from_config(config: &ExchangeConfig, transport: T) -> TraderResult<Self> {
        Self::new(config.credentials(), config.pair()?, transport)
    }

    /// 재시도 정책을 교체합니다.
    pub fn with_retry_configs(mut self, critical: RetryConfig, forever: RetryConfig) -> Self {
        self.critical = critical;
        self.forever = forever;
        self
    }

    /// 에러 분류기를 교체합니다.
    pub fn with_classifier(mut self, classifier: ErrorClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// 거래쌍.
    pub fn pair(&self) -> &TradingPair {
        &self.pair
    }

    /// 자격증명 (전송 계층의 서명용).
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// 전송 계층.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Coingi 기능 메타데이터.
    pub fn coingi_capabilities() -> ExchangeCapabilities {
        let standard = |currency: &str, asset: &str| {
            Market::asset_minimum(currency, asset, dec!(0.00001), 8)
        };

        ExchangeCapabilities {
            name: "Coingi".to_string(),
            slug: "coingi".to_string(),
            currencies: ["EUR", "USD", "BTC"].map(String::from).to_vec(),
            assets: ["BTC", "DASH", "DOGE", "EUR", "LTC", "NMC", "PPC", "VTC"]
                .map(String::from)
                .to_vec(),
            markets: vec![
                standard("USD", "BTC"),
                standard("EUR", "BTC"),
                standard("BTC", "DASH"),
                standard("BTC", "DOGE"),
                standard("USD", "DOGE"),
                Market::asset_minimum("USD", "EUR", dec!(0.01), 2),
                standard("BTC", "LTC"),
                standard("EUR", "LTC"),
                standard("USD", "LTC"),
                standard("BTC", "NMC"),
                standard("USD", "PPC"),
                standard("EUR", "PPC"),
                standard("BTC", "PPC"),
                standard("BTC", "VTC"),
            ],
            requires: vec!["key".to_string(), "secret".to_string()],
            provides_history: Some(HistoryMode::Date),
            provides_full_history: true,
            max_history_age_days: Some(30),
            tid: "date".to_string(),
            tradable: true,
        }
    }

    /// 거래소 경로용 거래쌍 (예: `btc-eur`).
    fn route(&self) -> String {
        self.pair.route("-")
    }

    /// 재시도 정책 아래에서 전송 호출을 수행하고 응답을 분류합니다.
    async fn request(
        &self,
        retry: &RetryConfig,
        operation: &str,
        endpoint: &str,
        params: Value,
        allow_null: bool,
    ) -> ExchangeResult<Value> {
        with_retry(retry, operation, || {
            let params = params.clone();
            async move {
                let response = self.transport.call(endpoint, params).await;
                if allow_null {
                    self.classifier.inspect_nullable(operation, response)
                } else {
                    self.classifier.inspect(operation, response)
                }
            }
        })
        .await
    }

    /// 응답 본문을 역직렬화합니다. 형식 불일치는 치명적 에러입니다.
    fn decode<D: DeserializeOwned>(operation: &str, body: Value) -> ExchangeResult<D> {
        serde_json::from_value(body).map_err(|e| {
            ExchangeError::fatal(operation, format!("[coingi] unexpected response shape: {}", e))
        })
    }

    async fn fetch_order<D: DeserializeOwned>(
        &self,
        operation: &str,
        order_id: &str,
    ) -> ExchangeResult<Option<D>> {
        let body = self
            .request(
                &self.critical,
                operation,
                "get-order",
                json!({ "orderId": order_id }),
                true,
            )
            .await?;

        if body.is_null() {
            error!(
                operation,
                order_id, "order couldn't be found in the result of get order"
            );
            return Ok(None);
        }

        Self::decode(operation, body).map(Some)
    }

    fn normalize_order(&self, order_id: &str, raw: &CoingiOrder) -> ExchangeResult<Order> {
        let created_at: DateTime<Utc> = DateTime::from_timestamp(raw.timestamp, 0)
            .ok_or_else(|| {
                ExchangeError::fatal(
                    "getOrder",
                    format!("[coingi] invalid order timestamp: {}", raw.timestamp),
                )
            })?;

        Ok(Order {
            id: order_id.to_string(),
            pair: self.pair.clone(),
            side: Side::from_wire_code(raw.side),
            price: raw.price,
            amount: raw.base_amount,
            status: raw.order_status(),
            created_at,
        })
    }
}

#[async_trait]
impl<T: Transport> Exchange for CoingiClient<T> {
    fn name(&self) -> &str {
        "coingi"
    }

    fn capabilities(&self) -> ExchangeCapabilities {
        Self::coingi_capabilities()
    }

    fn get_fee(&self) -> Decimal {
        COINGI_FEE
    }

    async fn get_ticker(&self) -> ExchangeResult<Ticker> {
        let path = format!("/{}/1/1/1", self.route());
        let body = self
            .request(&self.forever, "getTicker", "order-book", json!(path), false)
            .await?;
        let book: CoingiOrderBook = Self::decode("getTicker", body)?;

        let best = |levels: &[CoingiOrderBookLevel], side: &str| {
            levels.first().map(|level| level.price).ok_or_else(|| {
                ExchangeError::fatal("getTicker", format!("[coingi] order book has no {}", side))
            })
        };

        Ok(Ticker {
            ask: best(&book.asks, "asks")?,
            bid: best(&book.bids, "bids")?,
        })
    }

    async fn get_portfolio(&self) -> ExchangeResult<Portfolio> {
        let params = json!({
            "currencies": format!("{},{}", self.pair.asset(), self.pair.currency())
        });
        let body = self
            .request(&self.forever, "getPortfolio", "balance", params, false)
            .await?;
        let balances: Vec<CoingiBalance> = Self::decode("getPortfolio", body)?;

        debug!(entries = balances.len(), "balance received");

        Ok(balances
            .into_iter()
            .map(|b| PortfolioEntry::new(b.currency.name, b.available))
            .collect())
    }

    async fn get_trades(
        &self,
        since: Option<DateTime<Utc>>,
        ascending: bool,
    ) -> ExchangeResult<Vec<Trade>> {
        let mut path = format!("/{}/{}", self.route(), TRADES_PAGE_SIZE);
        if let Some(since) = since {
            path.push_str(&format!("/{}", since.timestamp_millis()));
        }

        let body = self
            .request(&self.forever, "getTrades", "transactions", json!(path), false)
            .await?;
        let mut transactions: Vec<CoingiTransaction> = Self::decode("getTrades", body)?;
        transactions.sort_by_key(|tx| tx.timestamp);

        let trades = transactions.into_iter().map(|tx| {
            let id = tx
                .id
                .as_ref()
                .and_then(id_string)
                .unwrap_or_else(|| tx.timestamp.to_string());
            let trade = Trade {
                side: Side::from_wire_code(tx.side),
                timestamp_seconds: tx.timestamp.div_euclid(1000),
                amount: tx.amount.to_exact_string(),
                price: tx.price.to_exact_string(),
                id,
            };
            (tx.timestamp, trade)
        });

        Ok(filter_trades(trades, since, ascending))
    }

    async fn add_order(
        &self,
        side: Side,
        amount: Decimal,
        price: Decimal,
    ) -> ExchangeResult<String> {
        debug!(
            side = %side,
            amount = %amount,
            price = %price,
            pair = %self.pair,
            "add-order"
        );

        let params = json!({
            "currencyPair": self.route(),
            "type": side.wire_code(),
            "price": price.to_exact_string(),
            "volume": amount.to_exact_string(),
        });
        let body = self
            .request(&self.critical, "addOrder", "add-order", params, false)
            .await?;
        let response: CoingiAddOrderResponse = Self::decode("addOrder", body)?;

        let order_id = id_string(&response.result).ok_or_else(|| {
            ExchangeError::fatal("addOrder", "[coingi] order id missing from response")
        })?;

        info!(order_id = %order_id, side = %side, "order placed");
        Ok(order_id)
    }

    async fn get_order(&self, order_id: &str) -> ExchangeResult<Option<Order>> {
        match self.fetch_order::<CoingiOrder>("getOrder", order_id).await? {
            Some(raw) => self.normalize_order(order_id, &raw).map(Some),
            None => Ok(None),
        }
    }

    async fn check_order(&self, order_id: &str) -> ExchangeResult<bool> {
        Ok(self
            .fetch_order::<CoingiOrderStatus>("checkOrder", order_id)
            .await?
            .map(|raw| raw.status == STATUS_FILLED)
            .unwrap_or(false))
    }

    async fn cancel_order(&self, order_id: &str) -> ExchangeResult<CancelResult> {
        let body = self
            .request(
                &self.forever,
                "cancelOrder",
                "cancel-order",
                json!({ "orderId": order_id }),
                false,
            )
            .await?;

        let result = CancelResult::from_body(body);
        if result.accepted {
            info!(order_id, "order cancelled");
        } else {
            warn!(order_id, body = %result.body, "cancel refused by exchange");
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ScriptedTransport;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn client() -> (CoingiClient<Arc<ScriptedTransport>>, Arc<ScriptedTransport>) {
        let transport = Arc::new(ScriptedTransport::new());
        let client = CoingiClient::new(
            Credentials::new("test-key", "test-secret"),
            TradingPair::new("btc", "eur").unwrap(),
            transport.clone(),
        )
        .unwrap();
        (client, transport)
    }

    #[test]
    fn test_rejects_missing_credentials() {
        let result = CoingiClient::new(
            Credentials::new("", "secret"),
            TradingPair::new("BTC", "EUR").unwrap(),
            ScriptedTransport::new(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_capabilities_table() {
        let caps = CoingiClient::<ScriptedTransport>::coingi_capabilities();
        assert_eq!(caps.slug, "coingi");
        assert_eq!(caps.markets.len(), 14);
        assert!(caps.requires_field("key"));
        assert!(caps.requires_field("secret"));
        assert_eq!(caps.provides_history, Some(HistoryMode::Date));
        assert_eq!(caps.max_history_age_days, Some(30));

        let usd_eur = caps.market_for("EUR", "USD").unwrap();
        assert_eq!(usd_eur.minimal_order.amount, dec!(0.01));
        assert_eq!(usd_eur.precision, 2);

        let btc_eur = caps.market_for("BTC", "EUR").unwrap();
        assert_eq!(btc_eur.minimal_order.amount, dec!(0.00001));
        assert_eq!(btc_eur.precision, 8);
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_ticker() {
        let (client, transport) = client();
        transport
            .push_body(json!({
                "asks": [{"price": 101.5, "baseAmount": 1}],
                "bids": [{"price": "100.25", "baseAmount": 2}]
            }))
            .await;

        let ticker = client.get_ticker().await.unwrap();
        assert_eq!(ticker.ask, dec!(101.5));
        assert_eq!(ticker.bid, dec!(100.25));

        let calls = transport.calls().await;
        assert_eq!(calls[0].endpoint, "order-book");
        assert_eq!(calls[0].params, json!("/btc-eur/1/1/1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_ticker_retries_transient_errors() {
        let (client, transport) = client();
        transport.push_error("ESOCKETTIMEDOUT").await;
        transport.push_error("Response code 502 (Bad Gateway)").await;
        transport
            .push_body(json!({"asks": [{"price": 2}], "bids": [{"price": 1}]}))
            .await;

        let ticker = client.get_ticker().await.unwrap();
        assert_eq!(ticker.spread(), dec!(1));
        assert_eq!(transport.call_count().await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_order_book_is_fatal() {
        let (client, transport) = client();
        transport.push_body(json!({"asks": [], "bids": []})).await;

        let err = client.get_ticker().await.unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(transport.call_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auth_failure_is_not_retried() {
        let (client, transport) = client();
        transport.push_error("Unauthorized: invalid signature").await;

        let err = client.get_portfolio().await.unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(err.operation(), "getPortfolio");
        assert_eq!(transport.call_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_portfolio() {
        let (client, transport) = client();
        transport
            .push_body(json!([
                {"currency": {"name": "btc", "crypto": true}, "available": "0.5"},
                {"currency": {"name": "eur", "crypto": false}, "available": 120}
            ]))
            .await;

        let portfolio = client.get_portfolio().await.unwrap();
        assert_eq!(portfolio[0], PortfolioEntry::new("BTC", dec!(0.5)));
        assert_eq!(portfolio[1], PortfolioEntry::new("EUR", dec!(120)));

        let calls = transport.calls().await;
        assert_eq!(calls[0].params, json!({"currencies": "BTC,EUR"}));
    }

    fn transactions() -> Value {
        json!([
            {"id": "c", "type": 1, "timestamp": 30_000, "amount": 0.3, "price": "103"},
            {"id": "b", "type": 0, "timestamp": 20_000, "amount": 0.2, "price": "102"},
            {"id": "a", "type": 1, "timestamp": 10_000, "amount": 0.1, "price": "101"}
        ])
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_trades_since_descending() {
        let (client, transport) = client();
        transport.push_body(transactions()).await;

        let since = Utc.timestamp_opt(15, 0).unwrap();
        let trades = client.get_trades(Some(since), false).await.unwrap();

        let stamps: Vec<i64> = trades.iter().map(|t| t.timestamp_seconds).collect();
        assert_eq!(stamps, vec![30, 20]);
        assert_eq!(trades[1].side, Side::Sell);
        assert_eq!(trades[1].amount, "0.2");
        assert_eq!(trades[1].id, "b");

        let calls = transport.calls().await;
        assert_eq!(calls[0].params, json!("/btc-eur/512/15000"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_trades_since_ascending() {
        let (client, transport) = client();
        transport.push_body(transactions()).await;

        let since = Utc.timestamp_opt(15, 0).unwrap();
        let trades = client.get_trades(Some(since), true).await.unwrap();

        let stamps: Vec<i64> = trades.iter().map(|t| t.timestamp_seconds).collect();
        assert_eq!(stamps, vec![20, 30]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_trades_empty_is_valid() {
        let (client, transport) = client();
        transport.push_body(json!([])).await;

        let trades = client.get_trades(None, true).await.unwrap();
        assert!(trades.is_empty());
        assert_eq!(transport.calls().await[0].params, json!("/btc-eur/512"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_order_encodes_side_and_exact_amount() {
        let (client, transport) = client();
        transport.push_body(json!({"result": "order-1"})).await;

        let id = crate::traits::add_order_str(&client, "sell", dec!(1.5), dec!(100))
            .await
            .unwrap();
        assert_eq!(id, "order-1");

        let calls = transport.calls().await;
        assert_eq!(calls[0].endpoint, "add-order");
        assert_eq!(calls[0].params["type"], json!(0));
        assert_eq!(calls[0].params["volume"], json!("1.5"));
        assert_eq!(calls[0].params["price"], json!("100"));
        assert_eq!(calls[0].params["currencyPair"], json!("btc-eur"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_buy_uses_buy_code() {
        let (client, transport) = client();
        transport.push_body(json!({"result": 42})).await;

        let id = client.buy(dec!(0.25), dec!(99.5)).await.unwrap();
        assert_eq!(id, "42");
        assert_eq!(transport.calls().await[0].params["type"], json!(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_order_rejects_unknown_side() {
        let (client, transport) = client();

        let err = crate::traits::add_order_str(&client, "hold", dec!(1), dec!(100))
            .await
            .unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(transport.call_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_order_recovers_from_invalid_nonce() {
        let (client, transport) = client();
        transport.push_error("API:Invalid nonce").await;
        transport.push_body(json!({"result": "order-2"})).await;

        let id = client.sell(dec!(1), dec!(100)).await.unwrap();
        assert_eq!(id, "order-2");
        assert_eq!(transport.call_count().await, 2);
    }

    fn raw_order(status: u8) -> Value {
        json!({
            "id": "order-1",
            "type": 1,
            "price": 100,
            "baseAmount": "1.5",
            "timestamp": 1_500_000_000,
            "status": status
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_order_true_only_when_filled() {
        let (client, transport) = client();
        transport.push_body(raw_order(2)).await;
        transport.push_body(raw_order(0)).await;
        transport.push_body(json!(null)).await;

        assert!(client.check_order("order-1").await.unwrap());
        assert!(!client.check_order("order-1").await.unwrap());
        assert!(!client.check_order("order-1").await.unwrap());

        let calls = transport.calls().await;
        assert_eq!(calls[0].endpoint, "get-order");
        assert_eq!(calls[0].params, json!({"orderId": "order-1"}));
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_order_reads_status_only() {
        let (client, transport) = client();
        transport.push_body(json!({"status": 2})).await;
        transport.push_body(json!({"status": 1})).await;

        assert!(client.check_order("order-1").await.unwrap());
        assert!(!client.check_order("order-1").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_order_normalizes() {
        let (client, transport) = client();
        transport.push_body(raw_order(1)).await;

        let order = client.get_order("order-1").await.unwrap().unwrap();
        assert_eq!(order.id, "order-1");
        assert_eq!(order.side, Side::Buy);
        assert_eq!(order.price, dec!(100));
        assert_eq!(order.amount, dec!(1.5));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.created_at.timestamp(), 1_500_000_000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_order_not_found_is_none() {
        let (client, transport) = client();
        transport.push_body(json!(null)).await;

        assert_eq!(client.get_order("missing").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_order() {
        let (client, transport) = client();
        transport.push_error("ECONNRESET").await;
        transport.push_body(json!({"result": true})).await;

        let result = client.cancel_order("order-1").await.unwrap();
        assert!(result.accepted);
        assert_eq!(result.body, json!({"result": true}));

        let calls = transport.calls().await;
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].endpoint, "cancel-order");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_order_refusal_is_passed_through() {
        let (client, transport) = client();
        transport.push_body(json!({"result": false})).await;

        let result = client.cancel_order("order-1").await.unwrap();
        assert!(!result.accepted);
        assert_eq!(result.body, json!({"result": false}));
        assert_eq!(transport.call_count().await, 1);
    }

    #[test]
    fn test_fee_is_constant() {
        let (client, _) = client();
        assert_eq!(client.get_fee(), dec!(0.002));
    }
}
