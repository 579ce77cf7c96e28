//! 설정 관리.
//!
//! 어댑터와 모의투자기는 전역 설정을 읽지 않고, 이 모듈의 설정 구조체를
//! 생성자 인자로 명시적으로 전달받습니다.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::credentials::Credentials;
use crate::error::TraderResult;
use crate::types::TradingPair;

/// 애플리케이션 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdapterConfig {
    /// 거래소 연결 설정
    pub exchange: ExchangeConfig,
    /// 모의투자 설정
    #[serde(default)]
    pub paper_trader: PaperTraderConfig,
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 거래소 연결 설정.
///
/// # 보안
/// - `Debug` 구현은 `key`, `secret`을 출력하지 않습니다.
#[derive(Clone, Deserialize, Serialize)]
pub struct ExchangeConfig {
    /// 거래소 슬러그 (예: "coingi")
    pub name: String,
    /// API 키
    #[serde(default)]
    pub key: String,
    /// API 시크릿
    #[serde(default)]
    pub secret: String,
    /// 기준 자산
    pub asset: String,
    /// 결제 통화
    pub currency: String,
}

impl fmt::Debug for ExchangeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeConfig")
            .field("name", &self.name)
            .field("key", &"***REDACTED***")
            .field("secret", &"***REDACTED***")
            .field("asset", &self.asset)
            .field("currency", &self.currency)
            .finish()
    }
}

impl ExchangeConfig {
    /// 검증된 거래쌍을 생성합니다.
    pub fn pair(&self) -> TraderResult<TradingPair> {
        TradingPair::new(&self.asset, &self.currency)
    }

    /// 자격증명을 생성합니다.
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.key.clone(), self.secret.clone())
    }
}

/// 모의투자 수수료 기준.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeSource {
    /// 메이커 수수료
    #[default]
    Maker,
    /// 테이커 수수료
    Taker,
}

/// 모의투자 시작 잔고.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SimulationBalance {
    /// 기준 자산 수량
    pub asset: Decimal,
    /// 결제 통화 수량
    pub currency: Decimal,
}

impl Default for SimulationBalance {
    fn default() -> Self {
        Self {
            asset: dec!(1),
            currency: dec!(100),
        }
    }
}

/// 모의투자 설정.
///
/// 수수료와 슬리피지는 퍼센트 단위입니다 (0.25 = 0.25%).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PaperTraderConfig {
    /// 메이커 수수료 (%)
    #[serde(default = "default_fee")]
    pub fee_maker: Decimal,
    /// 테이커 수수료 (%)
    #[serde(default = "default_fee")]
    pub fee_taker: Decimal,
    /// 적용할 수수료 기준
    #[serde(default)]
    pub fee_using: FeeSource,
    /// 슬리피지 (%)
    #[serde(default = "default_slippage")]
    pub slippage: Decimal,
    /// 시작 잔고
    #[serde(default)]
    pub simulation_balance: SimulationBalance,
}

fn default_fee() -> Decimal {
    dec!(0.25)
}
fn default_slippage() -> Decimal {
    dec!(0.05)
}

impl Default for PaperTraderConfig {
    fn default() -> Self {
        Self {
            fee_maker: default_fee(),
            fee_taker: default_fee(),
            fee_using: FeeSource::default(),
            slippage: default_slippage(),
            simulation_balance: SimulationBalance::default(),
        }
    }
}

impl PaperTraderConfig {
    /// 선택된 수수료 (%).
    pub fn selected_fee(&self) -> Decimal {
        match self.fee_using {
            FeeSource::Maker => self.fee_maker,
            FeeSource::Taker => self.fee_taker,
        }
    }

    /// 체결 금액에 곱할 수수료 계수: `1 - (선택 수수료 + 슬리피지) / 100`.
    pub fn fee_factor(&self) -> Decimal {
        Decimal::ONE - (self.selected_fee() + self.slippage) / Decimal::ONE_HUNDRED
    }

    /// 수수료 기준을 설정합니다.
    pub fn with_fee_using(mut self, source: FeeSource) -> Self {
        self.fee_using = source;
        self
    }

    /// 슬리피지를 설정합니다.
    pub fn with_slippage(mut self, slippage: Decimal) -> Self {
        self.slippage = slippage;
        self
    }

    /// 시작 잔고를 설정합니다.
    pub fn with_balance(mut self, asset: Decimal, currency: Decimal) -> Self {
        self.simulation_balance = SimulationBalance { asset, currency };
        self
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AdapterConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> TraderResult<Self> {
        let builder = config::Config::builder()
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            // 파일에서 로드
            .add_source(config::File::from(path.as_ref()))
            // 환경 변수로 오버라이드
            .add_source(
                config::Environment::with_prefix("TRADER")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        let config: Self = config.try_deserialize()?;
        config.exchange.pair()?;
        Ok(config)
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> TraderResult<Self> {
        Self::load("config/default.toml")
    }
}
