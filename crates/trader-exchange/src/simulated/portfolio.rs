//! 모의 포트폴리오 상태.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use trader_core::{Portfolio, PortfolioEntry, SimulationBalance, TradingPair};

/// 모의투자 잔고.
///
/// 소유자(모의투자기/시뮬레이션 거래소)만 변경하며, 외부에는 복제본만 전달합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatedPortfolio {
    /// 기준 자산 수량
    pub asset: Decimal,
    /// 결제 통화 수량
    pub currency: Decimal,
    /// 시작 평가액 (`set_start_balance` 전에는 `None`)
    pub balance: Option<Decimal>,
}

impl SimulatedPortfolio {
    /// 새 포트폴리오를 생성합니다.
    pub fn new(asset: Decimal, currency: Decimal) -> Self {
        Self {
            asset,
            currency,
            balance: None,
        }
    }

    /// 평가액: `currency + price × asset`. 표현 범위를 넘으면 포화합니다.
    pub fn value_at(&self, price: Decimal) -> Decimal {
        self.currency.saturating_add(price.saturating_mul(self.asset))
    }

    /// 거래쌍 순서(자산, 통화)의 정규화된 포트폴리오.
    pub fn to_portfolio(&self, pair: &TradingPair) -> Portfolio {
        vec![
            PortfolioEntry::new(pair.asset(), self.asset),
            PortfolioEntry::new(pair.currency(), self.currency),
        ]
    }
}

impl From<&SimulationBalance> for SimulatedPortfolio {
    fn from(balance: &SimulationBalance) -> Self {
        Self::new(balance.asset, balance.currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_value_at() {
        let portfolio = SimulatedPortfolio::new(dec!(2), dec!(50));
        assert_eq!(portfolio.value_at(dec!(100)), dec!(250));

        let large = SimulatedPortfolio::new(dec!(1e15), dec!(0));
        assert_eq!(large.value_at(dec!(1e15)), Decimal::MAX);
    }

    #[test]
    fn test_to_portfolio_order() {
        let pair = TradingPair::new("BTC", "EUR").unwrap();
        let portfolio = SimulatedPortfolio::new(dec!(1), dec!(100)).to_portfolio(&pair);

        assert_eq!(portfolio[0], PortfolioEntry::new("BTC", dec!(1)));
        assert_eq!(portfolio[1], PortfolioEntry::new("EUR", dec!(100)));
    }

    #[test]
    fn test_from_simulation_balance() {
        let portfolio = SimulatedPortfolio::from(&SimulationBalance::default());
        assert_eq!(portfolio.asset, dec!(1));
        assert_eq!(portfolio.currency, dec!(100));
        assert_eq!(portfolio.balance, None);
    }
}
