//! 원격 호출 재시도 정책.
//!
//! 두 가지 정책을 제공합니다:
//! - `Critical`: 최대 10회 재시도, 지수 백오프 1초~30초 (주문 생성/조회)
//! - `Forever`: 무제한 재시도, 10ms~30ms 짧은 백오프 (시세, 잔고, 체결 내역, 주문 취소)
//!
//! 재시도 여부는 분류 결과만으로 결정합니다. `Recoverable`은 재시도하고
//! `Fatal`은 즉시 호출자에게 전달합니다.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ExchangeError;
use crate::traits::ExchangeResult;

/// 재시도 정책 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryPolicy {
    /// 제한된 재시도, 긴 백오프
    Critical,
    /// 무제한 재시도, 짧은 백오프
    Forever,
}

/// 재시도 설정.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// 정책 종류
    pub policy: RetryPolicy,
    /// 최대 재시도 횟수 (`None`이면 무제한). 총 호출 수는 재시도 횟수 + 1.
    pub max_retries: Option<u32>,
    /// 백오프 증가율
    pub factor: f64,
    /// 첫 재시도 전 대기 시간 (ms)
    pub min_delay_ms: u64,
    /// 최대 대기 시간 (ms)
    pub max_delay_ms: u64,
}

impl RetryConfig {
    /// 주문 생성/조회용 정책.
    pub fn critical() -> Self {
        Self {
            policy: RetryPolicy::Critical,
            max_retries: Some(10),
            factor: 1.2,
            min_delay_ms: 1_000,
            max_delay_ms: 30_000,
        }
    }

    /// 조회 및 주문 취소용 정책.
    pub fn forever() -> Self {
        Self {
            policy: RetryPolicy::Forever,
            max_retries: None,
            factor: 1.2,
            min_delay_ms: 10,
            max_delay_ms: 30,
        }
    }

    /// 정책 종류에 해당하는 기본 설정.
    pub fn for_policy(policy: RetryPolicy) -> Self {
        match policy {
            RetryPolicy::Critical => Self::critical(),
            RetryPolicy::Forever => Self::forever(),
        }
    }

    /// 최대 재시도 횟수를 변경합니다.
    pub fn with_max_retries(mut self, max_retries: Option<u32>) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// `attempt`번째 재시도(0부터) 전 대기 시간.
    ///
    /// `min(min_delay * factor^attempt, max_delay)`
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(i32::MAX as u32) as i32;
        let raw = self.min_delay_ms as f64 * self.factor.powi(exponent);
        let capped = raw.min(self.max_delay_ms as f64).max(0.0);
        Duration::from_millis(capped.round() as u64)
    }

    /// `retries`회 재시도한 뒤 한 번 더 시도할 수 있는지 확인.
    fn allows_retry(&self, retries: u32) -> bool {
        self.max_retries.map_or(true, |max| retries < max)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::critical()
    }
}

/// 재시도 진행 상황.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryContext {
    /// 적용된 정책
    pub policy: RetryPolicy,
    /// 지금까지의 시도 횟수 (첫 호출 포함)
    pub attempt: u32,
    /// 마지막으로 발생한 에러
    pub last_error: Option<ExchangeError>,
}

impl RetryContext {
    fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            attempt: 0,
            last_error: None,
        }
    }

    /// 재시도 횟수 (첫 호출 제외).
    pub fn retries(&self) -> u32 {
        self.attempt.saturating_sub(1)
    }
}

/// 정책에 따라 작업을 재시도합니다.
///
/// `f`는 시도마다 새 future를 만듭니다. 결과는 첫 성공 값, 첫 치명적 에러,
/// 또는 재시도 한도 소진 시 마지막 재시도 가능 에러입니다.
///
/// # 예제
///
/// ```ignore
/// let id = with_retry(&RetryConfig::critical(), "addOrder", || async {
///     client.place(side, amount, price).await
/// })
/// .await?;
/// ```
pub async fn with_retry<T, F, Fut>(
    config: &RetryConfig,
    operation: &str,
    f: F,
) -> ExchangeResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ExchangeResult<T>>,
{
    let (result, _) = with_retry_context(config, operation, f).await;
    result
}

/// `with_retry`와 같지만 재시도 진행 상황도 함께 반환합니다.
pub async fn with_retry_context<T, F, Fut>(
    config: &RetryConfig,
    operation: &str,
    mut f: F,
) -> (ExchangeResult<T>, RetryContext)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ExchangeResult<T>>,
{
    let mut ctx = RetryContext::new(config.policy);

    loop {
        ctx.attempt += 1;

        let err = match f().await {
            Ok(value) => {
                if ctx.attempt > 1 {
                    debug!(
                        operation,
                        attempt = ctx.attempt,
                        policy = ?config.policy,
                        "succeeded after retry"
                    );
                }
                return (Ok(value), ctx);
            }
            Err(err) => err,
        };

        if err.is_fatal() {
            ctx.last_error = Some(err.clone());
            return (Err(err), ctx);
        }

        let retries = ctx.retries();
        if !config.allows_retry(retries) {
            warn!(
                operation,
                attempt = ctx.attempt,
                policy = ?config.policy,
                error = %err,
                "retry limit exhausted"
            );
            ctx.last_error = Some(err.clone());
            return (Err(err), ctx);
        }

        let delay = config.delay_for_attempt(retries);
        debug!(
            operation,
            attempt = ctx.attempt,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "retrying"
        );
        ctx.last_error = Some(err);

        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_critical_delays() {
        let config = RetryConfig::critical();
        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(1_000));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(1_200));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(1_440));
        assert_eq!(config.delay_for_attempt(50), Duration::from_millis(30_000));
    }

    #[test]
    fn test_forever_delays_stay_short() {
        let config = RetryConfig::forever();
        for attempt in 0..100 {
            let delay = config.delay_for_attempt(attempt);
            assert!(delay >= Duration::from_millis(10));
            assert!(delay <= Duration::from_millis(30));
        }
    }

    #[test]
    fn test_for_policy() {
        assert_eq!(
            RetryConfig::for_policy(RetryPolicy::Forever).max_retries,
            None
        );
        assert_eq!(
            RetryConfig::for_policy(RetryPolicy::Critical).max_retries,
            Some(10)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_critical_gives_up_after_ten_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let started = tokio::time::Instant::now();

        let counter = calls.clone();
        let (result, ctx) =
            with_retry_context(&RetryConfig::critical(), "getOrder", || {
                let counter = counter.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                    Err::<(), _>(ExchangeError::recoverable(
                        "getOrder",
                        format!("ETIMEDOUT #{}", n),
                    ))
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 11);
        assert_eq!(ctx.attempt, 11);
        assert_eq!(ctx.retries(), 10);

        let err = result.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(err.message(), "ETIMEDOUT #11");

        // 1000 * (1.2^10 - 1) / 0.2 ≈ 25.96초
        assert!(started.elapsed() >= Duration::from_secs(25));
    }

    #[tokio::test(start_paused = true)]
    async fn test_forever_retries_until_success() {
        let calls = Arc::new(AtomicU32::new(0));

        let counter = calls.clone();
        let result = with_retry(&RetryConfig::forever(), "getTicker", || {
            let counter = counter.clone();
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if n <= 50 {
                    Err(ExchangeError::recoverable("getTicker", "API:Invalid nonce"))
                } else {
                    Ok("ticker")
                }
            }
        })
        .await;

        assert_eq!(result, Ok("ticker"));
        assert_eq!(calls.load(Ordering::SeqCst), 51);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_stops_immediately() {
        let calls = Arc::new(AtomicU32::new(0));

        let counter = calls.clone();
        let (result, ctx) = with_retry_context(&RetryConfig::forever(), "getPortfolio", || {
            let counter = counter.clone();
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if n == 1 {
                    Err::<(), _>(ExchangeError::recoverable("getPortfolio", "ECONNRESET"))
                } else {
                    Err(ExchangeError::fatal("getPortfolio", "Invalid API key"))
                }
            }
        })
        .await;

        assert!(result.unwrap_err().is_fatal());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(ctx.attempt, 2);
        assert!(ctx.last_error.unwrap().is_fatal());
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_success_has_no_retries() {
        let (result, ctx) =
            with_retry_context(&RetryConfig::critical(), "getTicker", || async { Ok(42) }).await;

        assert_eq!(result, Ok(42));
        assert_eq!(ctx.attempt, 1);
        assert!(ctx.last_error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_retry_limit() {
        let calls = Arc::new(AtomicU32::new(0));

        let counter = calls.clone();
        let config = RetryConfig::forever().with_max_retries(Some(2));
        let result = with_retry(&config, "cancelOrder", || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(ExchangeError::recoverable("cancelOrder", "ECONNREFUSED"))
            }
        })
        .await;

        assert!(result.unwrap_err().is_retryable());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
