//! 원격 호출 에러 분류기.
//!
//! 원시 에러 메시지를 선언적 규칙 테이블과 대조하여 재시도 가능/치명적으로 나눕니다.
//!
//! # 규칙 평가
//!
//! - 규칙은 테이블 순서대로 평가하며 처음 일치한 규칙이 결과를 결정합니다.
//! - `with_rule`로 추가한 규칙은 기존 규칙보다 먼저 평가됩니다.
//! - 어느 규칙에도 맞지 않으면 치명적 에러입니다.
//! - 인증/자격증명 관련 메시지는 기본 테이블 맨 앞의 치명적 규칙에 걸립니다.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use crate::error::ExchangeError;
use crate::traits::ExchangeResult;
use crate::transport::TransportError;

/// 응답 본문이 비어 있을 때 합성하는 메시지.
pub const NO_DATA_MESSAGE: &str = "NO DATA WAS RETURNED";

/// 분류 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// 일시적 장애 - 재시도
    Recoverable,
    /// 치명적 에러 - 즉시 중단
    Fatal,
}

/// (패턴, 분류) 규칙 한 건.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRule {
    /// 메시지에 포함되어야 하는 부분 문자열
    pub pattern: String,
    /// 일치 시 분류
    pub class: ErrorClass,
    /// 대소문자 무시 여부
    #[serde(default)]
    pub ignore_case: bool,
}

impl ErrorRule {
    /// 대소문자를 구분하는 규칙.
    pub fn new(pattern: impl Into<String>, class: ErrorClass) -> Self {
        Self {
            pattern: pattern.into(),
            class,
            ignore_case: false,
        }
    }

    /// 대소문자를 무시하는 규칙.
    pub fn ignoring_case(pattern: impl Into<String>, class: ErrorClass) -> Self {
        Self {
            pattern: pattern.into(),
            class,
            ignore_case: true,
        }
    }

    /// 메시지가 규칙과 일치하는지 확인합니다.
    pub fn matches(&self, message: &str) -> bool {
        if self.ignore_case {
            message
                .to_lowercase()
                .contains(&self.pattern.to_lowercase())
        } else {
            message.contains(&self.pattern)
        }
    }
}

/// 일시적 장애로 간주하는 메시지 패턴.
pub const RECOVERABLE_PATTERNS: [&str; 11] = [
    "SOCKETTIMEDOUT",
    "TIMEDOUT",
    "CONNRESET",
    "CONNREFUSED",
    "NOTFOUND",
    "API:Invalid nonce",
    "Service:Unavailable",
    "Request timed out",
    "Response code 520",
    "Response code 504",
    "Response code 502",
];

/// 재시도하면 안 되는 인증/자격증명 패턴 (대소문자 무시).
pub const AUTH_FATAL_PATTERNS: [&str; 8] = [
    "unauthorized",
    "unauthenticated",
    "authentication",
    "invalid api key",
    "invalid key",
    "invalid signature",
    "response code 401",
    "response code 403",
];

/// 원시 에러 분류기.
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    /// 로그에 표시할 거래소 이름
    exchange: String,
    /// 평가 순서대로 정렬된 규칙
    rules: Vec<ErrorRule>,
}

impl ErrorClassifier {
    /// 규칙 없는 분류기 (모든 에러가 치명적).
    pub fn empty(exchange: impl Into<String>) -> Self {
        Self {
            exchange: exchange.into(),
            rules: Vec::new(),
        }
    }

    /// 기본 규칙 테이블을 가진 분류기.
    pub fn new(exchange: impl Into<String>) -> Self {
        let auth = AUTH_FATAL_PATTERNS
            .iter()
            .map(|p| ErrorRule::ignoring_case(*p, ErrorClass::Fatal));
        let transient = RECOVERABLE_PATTERNS
            .iter()
            .map(|p| ErrorRule::new(*p, ErrorClass::Recoverable));

        Self {
            exchange: exchange.into(),
            rules: auth.chain(transient).collect(),
        }
    }

    /// 규칙을 추가합니다. 추가한 규칙은 기존 규칙보다 먼저 평가됩니다.
    pub fn with_rule(mut self, rule: ErrorRule) -> Self {
        self.rules.insert(0, rule);
        self
    }

    /// 현재 규칙 테이블.
    pub fn rules(&self) -> &[ErrorRule] {
        &self.rules
    }

    /// 거래소 이름.
    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    /// 메시지의 분류만 계산합니다 (로그 없음).
    pub fn class_of(&self, message: &str) -> ErrorClass {
        self.rules
            .iter()
            .find(|rule| rule.matches(message))
            .map(|rule| rule.class)
            .unwrap_or(ErrorClass::Fatal)
    }

    /// 원시 에러를 분류합니다.
    ///
    /// 에러가 없으면 `None`. 분류마다 진단 로그를 남깁니다
    /// (재시도 가능: debug, 치명적: error).
    pub fn classify(&self, operation: &str, raw: Option<&str>) -> Option<ExchangeError> {
        let message = raw?;

        match self.class_of(message) {
            ErrorClass::Recoverable => {
                debug!(
                    exchange = %self.exchange,
                    operation,
                    error = message,
                    "returned an error, retrying"
                );
                Some(ExchangeError::recoverable(
                    operation,
                    format!("[{}] {}", self.exchange, message),
                ))
            }
            ErrorClass::Fatal => {
                error!(
                    exchange = %self.exchange,
                    operation,
                    error = message,
                    "returned an irrecoverable error"
                );
                Some(ExchangeError::fatal(
                    operation,
                    format!("[{}] {}", self.exchange, message),
                ))
            }
        }
    }

    /// 전송 결과를 검사하여 본문 또는 분류된 에러를 반환합니다.
    ///
    /// - 전송 에러 → 분류
    /// - 빈 본문 → `NO DATA WAS RETURNED` 합성 후 분류
    /// - 본문에 내장된 에러 필드 → 해당 메시지로 분류
    pub fn inspect(
        &self,
        operation: &str,
        response: Result<Value, TransportError>,
    ) -> ExchangeResult<Value> {
        self.inspect_inner(operation, response, false)
    }

    /// `inspect`와 같지만 `null` 본문을 정상 결과로 통과시킵니다.
    ///
    /// 주문 조회처럼 "없음"이 정상 응답인 작업에 사용합니다.
    pub fn inspect_nullable(
        &self,
        operation: &str,
        response: Result<Value, TransportError>,
    ) -> ExchangeResult<Value> {
        self.inspect_inner(operation, response, true)
    }

    fn inspect_inner(
        &self,
        operation: &str,
        response: Result<Value, TransportError>,
        allow_null: bool,
    ) -> ExchangeResult<Value> {
        let raw = match &response {
            Err(e) => Some(e.message.clone()),
            Ok(Value::Null) if allow_null => None,
            Ok(body) if is_empty_body(body) => Some(NO_DATA_MESSAGE.to_string()),
            Ok(body) => embedded_error(body),
        };

        match self.classify(operation, raw.as_deref()) {
            Some(err) => Err(err),
            None => Ok(response.unwrap_or(Value::Null)),
        }
    }
}

/// 빈 본문 판정. 빈 배열은 "결과 없음"이라는 정상 응답으로 취급합니다.
fn is_empty_body(body: &Value) -> bool {
    match body {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// 본문에 내장된 에러 메시지를 추출합니다.
///
/// `{"error": "..."}`, `{"error": {"message": "..."}}`,
/// `{"errors": [{"message": "..."}]}` 형태를 지원합니다.
fn embedded_error(body: &Value) -> Option<String> {
    let object = body.as_object()?;

    if let Some(error) = object.get("error") {
        return match error {
            Value::Null | Value::Bool(false) => None,
            Value::String(s) => Some(s.clone()),
            Value::Object(inner) => Some(
                inner
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| error.to_string()),
            ),
            other => Some(other.to_string()),
        };
    }

    let first = object.get("errors")?.as_array()?.first()?;
    Some(
        first
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| first.to_string()),
    )
}
