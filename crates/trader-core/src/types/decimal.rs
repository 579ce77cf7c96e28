//! 정밀한 금융 계산을 위한 Decimal 유틸리티.

use rust_decimal::{Decimal, RoundingStrategy};

/// 금융 정밀도를 위한 가격 타입.
pub type Price = Decimal;

/// 주문 수량을 위한 타입.
pub type Quantity = Decimal;

/// 모의투자 금액 계산에 쓰는 소수점 자릿수.
pub const SIMULATION_DECIMALS: u32 = 8;

/// Decimal 연산을 위한 확장 트레이트.
pub trait DecimalExt {
    /// 지정된 소수점 자릿수에서 내림합니다 (반올림하지 않음).
    fn floor_dp(&self, dp: u32) -> Decimal;

    /// 정확한 10진 문자열로 변환합니다 (불필요한 0 제거).
    fn to_exact_string(&self) -> String;
}

impl DecimalExt for Decimal {
    fn floor_dp(&self, dp: u32) -> Decimal {
        self.round_dp_with_strategy(dp, RoundingStrategy::ToNegativeInfinity)
    }

    fn to_exact_string(&self) -> String {
        self.normalize().to_string()
    }
}
