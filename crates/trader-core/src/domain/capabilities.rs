//! 거래소 기능 메타데이터.
//!
//! 각 거래소 어댑터가 공개하는 지원 통화, 마켓, 최소 주문 단위 등의 정보입니다.
//! 어댑터 자체는 이 제약을 강제하지 않고 게시만 합니다. 설정 검증과 주문 라우팅은
//! 상위 애플리케이션의 몫입니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 최소 주문 수량의 단위.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderUnit {
    /// 기준 자산 단위
    Asset,
    /// 결제 통화 단위
    Currency,
}

/// 최소 주문 조건.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinimalOrder {
    /// 최소 수량
    pub amount: Decimal,
    /// 수량 단위
    pub unit: OrderUnit,
}

/// 거래 가능한 마켓.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    /// `[currency, asset]` 순서의 쌍
    pub pair: [String; 2],
    /// 최소 주문 조건
    pub minimal_order: MinimalOrder,
    /// 가격/수량 소수점 자릿수
    pub precision: u32,
}

impl Market {
    /// 기준 자산 단위 최소 주문을 갖는 마켓을 생성합니다.
    pub fn asset_minimum(
        currency: &str,
        asset: &str,
        amount: Decimal,
        precision: u32,
    ) -> Self {
        Self {
            pair: [currency.to_string(), asset.to_string()],
            minimal_order: MinimalOrder {
                amount,
                unit: OrderUnit::Asset,
            },
            precision,
        }
    }

    /// 마켓의 결제 통화.
    pub fn currency(&self) -> &str {
        &self.pair[0]
    }

    /// 마켓의 기준 자산.
    pub fn asset(&self) -> &str {
        &self.pair[1]
    }
}

/// 과거 체결 조회 방식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryMode {
    /// 날짜 기준 조회
    Date,
    /// 체결 ID 기준 조회
    Tid,
}

/// 거래소 어댑터 기능 선언.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeCapabilities {
    /// 표시 이름
    pub name: String,
    /// 식별용 슬러그
    pub slug: String,
    /// 지원 결제 통화
    pub currencies: Vec<String>,
    /// 지원 자산
    pub assets: Vec<String>,
    /// 마켓 목록
    pub markets: Vec<Market>,
    /// 필요한 자격증명 필드
    pub requires: Vec<String>,
    /// 과거 체결 제공 방식 (없으면 미제공)
    pub provides_history: Option<HistoryMode>,
    /// 전체 과거 이력 제공 여부
    pub provides_full_history: bool,
    /// 조회 가능한 최대 과거 일수
    pub max_history_age_days: Option<u32>,
    /// 체결 ID로 사용하는 필드
    pub tid: String,
    /// 실거래 가능 여부
    pub tradable: bool,
}

impl ExchangeCapabilities {
    /// 거래쌍에 해당하는 마켓을 찾습니다.
    pub fn market_for(&self, asset: &str, currency: &str) -> Option<&Market> {
        self.markets.iter().find(|market| {
            market.asset().eq_ignore_ascii_case(asset)
                && market.currency().eq_ignore_ascii_case(currency)
        })
    }

    /// 자격증명 필드가 필요한지 확인합니다.
    pub fn requires_field(&self, field: &str) -> bool {
        self.requires.iter().any(|f| f == field)
    }
}
