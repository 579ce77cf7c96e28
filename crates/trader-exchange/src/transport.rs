//! 원격 거래소 전송 계층 계약.
//!
//! 어댑터는 연결, TLS, 요청 서명을 직접 다루지 않습니다. 시도 한 번마다
//! `Transport::call`을 정확히 한 번 호출하고, 응답 본문 또는 원시 에러를 받습니다.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// 전송 계층이 보고한 원시 에러 (분류 전).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportError {
    /// 원본 메시지 (예: "ETIMEDOUT", "Response code 502")
    pub message: String,
}

impl TransportError {
    /// 새 전송 에러를 생성합니다.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// 거래소 HTTP/서명 클라이언트가 구현하는 단일 호출 인터페이스.
#[async_trait]
pub trait Transport: Send + Sync {
    /// 엔드포인트를 호출하고 JSON 본문을 반환합니다.
    async fn call(&self, endpoint: &str, params: Value) -> Result<Value, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn call(&self, endpoint: &str, params: Value) -> Result<Value, TransportError> {
        (**self).call(endpoint, params).await
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use scripted::{RecordedCall, ScriptedTransport};

/// 테스트용 스크립트 전송 계층 (`test-utils` feature).
#[cfg(any(test, feature = "test-utils"))]
mod scripted {
    use super::*;
    use std::collections::VecDeque;
    use tokio::sync::Mutex;

    /// 기록된 호출 한 건.
    #[derive(Debug, Clone, PartialEq)]
    pub struct RecordedCall {
        /// 호출한 엔드포인트
        pub endpoint: String,
        /// 전달한 파라미터
        pub params: Value,
    }

    /// 미리 준비한 응답을 순서대로 돌려주는 인메모리 전송 계층.
    ///
    /// 네트워크 없이 커넥터를 구동할 때 사용합니다. 준비된 응답이 소진되면
    /// 분류 테이블에 없는 메시지를 반환하므로 치명적 에러로 처리됩니다.
    #[derive(Debug, Default)]
    pub struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<Value, TransportError>>>,
        calls: Mutex<Vec<RecordedCall>>,
    }

    impl ScriptedTransport {
        /// 빈 스크립트로 생성합니다.
        pub fn new() -> Self {
            Self::default()
        }

        /// 성공 응답을 추가합니다.
        pub async fn push_body(&self, body: Value) {
            self.responses.lock().await.push_back(Ok(body));
        }

        /// 전송 에러를 추가합니다.
        pub async fn push_error(&self, message: impl Into<String>) {
            self.responses
                .lock()
                .await
                .push_back(Err(TransportError::new(message)));
        }

        /// 지금까지 기록된 호출 목록.
        pub async fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().await.clone()
        }

        /// 지금까지의 호출 횟수.
        pub async fn call_count(&self) -> usize {
            self.calls.lock().await.len()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn call(&self, endpoint: &str, params: Value) -> Result<Value, TransportError> {
            self.calls.lock().await.push(RecordedCall {
                endpoint: endpoint.to_string(),
                params,
            });

            self.responses
                .lock()
                .await
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::new("scripted transport exhausted")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_scripted_transport_replays_in_order() {
        let transport = ScriptedTransport::new();
        transport.push_error("ECONNRESET").await;
        transport.push_body(json!({"result": true})).await;

        let first = transport.call("balance", json!({})).await;
        assert_eq!(first, Err(TransportError::new("ECONNRESET")));

        let second = transport.call("balance", json!({})).await;
        assert_eq!(second, Ok(json!({"result": true})));

        assert!(transport.call("balance", json!({})).await.is_err());
        assert_eq!(transport.call_count().await, 3);
    }

    #[tokio::test]
    async fn test_scripted_transport_records_params() {
        let transport = ScriptedTransport::new();
        transport.push_body(json!([])).await;

        transport
            .call("balance", json!({"currencies": "BTC,EUR"}))
            .await
            .unwrap();

        let calls = transport.calls().await;
        assert_eq!(calls[0].endpoint, "balance");
        assert_eq!(calls[0].params["currencies"], "BTC,EUR");
    }
}
