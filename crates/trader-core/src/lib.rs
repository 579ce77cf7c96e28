//! # Trader Core
//!
//! 거래소 어댑터 계층의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - 거래쌍, 시세, 포트폴리오, 체결, 주문 타입
//! - 거래소 기능 메타데이터
//! - 자격증명 보관 (시크릿 마스킹)
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod credentials;
pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use credentials::Credentials;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
