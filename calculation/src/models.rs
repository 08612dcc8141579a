use chrono::{DateTime, Utc};
use gex_common::OptionRight;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 가격 평가용으로 기본값이 모두 채워진 계약
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contract {
    pub underlying: String,
    pub expiry: DateTime<Utc>,
    pub strike: f64,
    pub right: OptionRight,
    pub iv: f64,
    pub oi: u64,
    pub rate: f64,
    pub dividend: f64,
    pub multiplier: u32,
    pub spot: f64,
    pub time_to_expiry: f64,
}

impl Contract {
    pub fn greeks_input(&self) -> GreeksInput {
        GreeksInput {
            spot: self.spot,
            strike: self.strike,
            time_to_expiry: self.time_to_expiry,
            rate: self.rate,
            dividend: self.dividend,
            volatility: self.iv,
            right: self.right,
        }
    }
}

/// Greeks 계산 파라미터
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GreeksInput {
    pub spot: f64,
    pub strike: f64,
    /// Years
    pub time_to_expiry: f64,
    pub rate: f64,
    pub dividend: f64,
    pub volatility: f64,
    pub right: OptionRight,
}

impl GreeksInput {
    /// Inputs for which every Greek saturates to zero
    pub fn is_degenerate(&self) -> bool {
        self.time_to_expiry <= 0.0
            || self.volatility <= 0.0
            || self.spot <= 0.0
            || self.strike <= 0.0
    }
}

/// Per-contract Black-Scholes sensitivities
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GreekSet {
    pub delta: f64,
    pub gamma: f64,
    pub vanna: f64,
    pub charm: f64,
    /// Per one vol point
    pub vega: f64,
    /// Per calendar day
    pub theta: f64,
}

/// Dealer notional exposure for one contract (sign flipped against customers)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ExposureSet {
    pub dealer_delta_exp: f64,
    pub dealer_gamma_exp: f64,
    pub dealer_vanna_exp: f64,
    pub dealer_charm_exp: f64,
}

/// A contract together with its Greeks and dealer exposure
#[derive(Debug, Clone, PartialEq)]
pub struct ContractExposure {
    pub contract: Contract,
    pub greeks: GreekSet,
    pub exposures: ExposureSet,
}

/// 행사가별 집계 행
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrikeRow {
    pub strike: f64,
    pub dealer_delta_exp: f64,
    pub dealer_gamma_exp: f64,
    pub dealer_vanna_exp: f64,
    pub dealer_charm_exp: f64,
    pub call_oi: u64,
    pub put_oi: u64,
    pub call_dealer_delta: f64,
    pub put_dealer_delta: f64,
}

impl StrikeRow {
    pub fn new(strike: f64) -> Self {
        Self {
            strike,
            dealer_delta_exp: 0.0,
            dealer_gamma_exp: 0.0,
            dealer_vanna_exp: 0.0,
            dealer_charm_exp: 0.0,
            call_oi: 0,
            put_oi: 0,
            call_dealer_delta: 0.0,
            put_dealer_delta: 0.0,
        }
    }
}

/// Net dealer exposure across the whole chain
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub net_dealer_delta: f64,
    pub net_dealer_gamma: f64,
    pub net_dealer_vanna: f64,
    pub net_dealer_charm: f64,
}

/// Market-maker positioning regime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Regime {
    #[serde(rename = "POS GAMMA / Mean Reversion")]
    PositiveGamma,
    #[serde(rename = "NEG GAMMA / Momentum")]
    NegativeGamma,
    #[serde(rename = "NEUTRAL GAMMA")]
    NeutralGamma,
}

impl Regime {
    pub fn label(&self) -> &'static str {
        match self {
            Regime::PositiveGamma => "POS GAMMA / Mean Reversion",
            Regime::NegativeGamma => "NEG GAMMA / Momentum",
            Regime::NeutralGamma => "NEUTRAL GAMMA",
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeResult {
    pub regime: Regime,
    pub notes: Vec<String>,
}

/// 체인 분석 결과
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainReport {
    pub symbol: String,
    pub spot: f64,
    pub expiry: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub rows: Vec<StrikeRow>,
    pub totals: Totals,
    pub regime: RegimeResult,
}
