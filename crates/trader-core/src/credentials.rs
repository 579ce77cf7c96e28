//! # 자격증명
//!
//! 거래소 API 키/시크릿을 보관합니다.
//!
//! ## 보안 고려사항
//! - 시크릿은 `secrecy::SecretString`으로 감싸 메모리 해제 시 zeroize
//! - `Debug` 출력은 키를 마스킹하고 시크릿을 노출하지 않음
//! - 로그에 자격증명을 남기지 않음

use secrecy::{ExposeSecret, SecretString};
use std::fmt;

use crate::error::{TraderError, TraderResult};

/// 거래소 인증 자격증명.
pub struct Credentials {
    key: String,
    secret: SecretString,
}

impl Credentials {
    /// 새 자격증명을 생성합니다.
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: SecretString::from(secret.into()),
        }
    }

    /// API 키.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// API 시크릿 (서명 시에만 사용).
    pub fn expose_secret(&self) -> &str {
        self.secret.expose_secret()
    }

    /// 키와 시크릿이 모두 채워져 있는지 검증합니다.
    ///
    /// # Errors
    /// 둘 중 하나라도 비어 있으면 `TraderError::Auth`를 반환합니다.
    pub fn validate(&self) -> TraderResult<()> {
        if self.key.trim().is_empty() {
            return Err(TraderError::Auth("API 키가 비어 있습니다".to_string()));
        }
        if self.secret.expose_secret().trim().is_empty() {
            return Err(TraderError::Auth("API 시크릿이 비어 있습니다".to_string()));
        }
        Ok(())
    }

    fn masked_key(&self) -> String {
        let chars: Vec<char> = self.key.chars().collect();
        if chars.len() > 8 {
            let head: String = chars[..4].iter().collect();
            let tail: String = chars[chars.len() - 4..].iter().collect();
            format!("{}...{}", head, tail)
        } else {
            "***REDACTED***".to_string()
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("key", &self.masked_key())
            .field("secret", &"***REDACTED***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_masks_secret() {
        let creds = Credentials::new("abcd1234efgh5678", "super-secret-value");
        let printed = format!("{:?}", creds);

        assert!(printed.contains("abcd...5678"));
        assert!(!printed.contains("super-secret-value"));
        assert!(!printed.contains("1234efgh"));
    }

    #[test]
    fn test_short_key_fully_masked() {
        let creds = Credentials::new("short", "s");
        assert!(!format!("{:?}", creds).contains("short"));
    }

    #[test]
    fn test_non_ascii_key_masked_by_char() {
        // 한글은 문자당 3바이트라 바이트 인덱스로 자르면 문자 경계가 깨짐
        let creds = Credentials::new("가나다라마바사아자", "secret");
        let printed = format!("{:?}", creds);
        assert!(printed.contains("가나다라...바사아자"));
    }

    #[test]
    fn test_validate() {
        assert!(Credentials::new("key", "secret").validate().is_ok());
        assert!(Credentials::new("", "secret").validate().is_err());
        assert!(Credentials::new("key", "  ").validate().is_err());
    }

    #[test]
    fn test_expose_secret() {
        let creds = Credentials::new("key", "secret");
        assert_eq!(creds.key(), "key");
        assert_eq!(creds.expose_secret(), "secret");
    }
}
