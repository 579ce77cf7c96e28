//! 모의 체결 수수료 모델.

use rust_decimal::Decimal;
use trader_core::{DecimalExt, PaperTraderConfig, SIMULATION_DECIMALS};

/// 체결 금액에 수수료와 슬리피지를 적용합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeModel {
    /// `1 - (수수료 + 슬리피지) / 100`
    factor: Decimal,
}

impl FeeModel {
    /// 수수료 계수로 생성합니다.
    pub fn new(factor: Decimal) -> Self {
        Self { factor }
    }

    /// 수수료율(비율, 0.002 = 0.2%)로 생성합니다.
    pub fn from_rate(rate: Decimal) -> Self {
        Self::new(Decimal::ONE - rate)
    }

    /// 수수료 계수.
    pub fn factor(&self) -> Decimal {
        self.factor
    }

    /// 수수료 차감 후 수량. 소수점 8자리에서 내림합니다.
    ///
    /// 곱이 표현 범위를 넘으면 최댓값/최솟값으로 포화합니다.
    pub fn extract_fee(&self, amount: Decimal) -> Decimal {
        amount
            .saturating_mul(self.factor)
            .floor_dp(SIMULATION_DECIMALS)
    }

    /// 체결 정산용 수수료 차감. 곱이 표현 범위를 넘으면 `None`.
    pub fn checked_extract_fee(&self, amount: Decimal) -> Option<Decimal> {
        amount
            .checked_mul(self.factor)
            .map(|net| net.floor_dp(SIMULATION_DECIMALS))
    }
}

impl From<&PaperTraderConfig> for FeeModel {
    fn from(config: &PaperTraderConfig) -> Self {
        Self::new(config.fee_factor())
    }
}
