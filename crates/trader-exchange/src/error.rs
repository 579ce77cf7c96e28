//! 거래소 에러 타입.
//!
//! 모든 원격 호출 실패는 두 가지로 분류됩니다:
//! - `Recoverable`: 일시적 장애 (타임아웃, 연결 끊김, nonce 오류, 5xx). 재시도 대상.
//! - `Fatal`: 그 외 전부 (인증 실패, 잘못된 요청, 응답 형식 오류). 즉시 호출자에게 전달.

use thiserror::Error;
use trader_core::TraderError;

/// 거래소 관련 에러.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExchangeError {
    /// 일시적 장애 (재시도 가능)
    #[error("({operation}) recoverable error: {message}")]
    Recoverable { operation: String, message: String },

    /// 치명적 에러 (재시도 금지)
    #[error("({operation}) fatal error: {message}")]
    Fatal { operation: String, message: String },
}

impl ExchangeError {
    /// 재시도 가능한 에러를 생성합니다.
    pub fn recoverable(operation: impl Into<String>, message: impl Into<String>) -> Self {
        ExchangeError::Recoverable {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// 치명적 에러를 생성합니다.
    pub fn fatal(operation: impl Into<String>, message: impl Into<String>) -> Self {
        ExchangeError::Fatal {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// 재시도 가능한 에러인지 확인.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExchangeError::Recoverable { .. })
    }

    /// 재시도하면 안 되는 치명적 에러인지 확인.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ExchangeError::Fatal { .. })
    }

    /// 에러가 발생한 작업 이름.
    pub fn operation(&self) -> &str {
        match self {
            ExchangeError::Recoverable { operation, .. } | ExchangeError::Fatal { operation, .. } => {
                operation
            }
        }
    }

    /// 원본 에러 메시지.
    pub fn message(&self) -> &str {
        match self {
            ExchangeError::Recoverable { message, .. } | ExchangeError::Fatal { message, .. } => {
                message
            }
        }
    }

    /// 코어 검증 에러를 작업 이름과 함께 치명적 에러로 변환합니다.
    pub fn from_core(operation: impl Into<String>, err: TraderError) -> Self {
        ExchangeError::fatal(operation, err.to_string())
    }
}
