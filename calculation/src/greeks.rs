use crate::models::{GreekSet, GreeksInput};
use gex_common::OptionRight;

/// Greeks 계산 인터페이스
pub trait GreeksEngine: Send + Sync {
    fn compute_greeks(&self, params: &GreeksInput) -> GreekSet;
}

/// Black-Scholes Greeks 엔진 (연속 배당 수익률 포함)
#[derive(Debug, Clone, Copy, Default)]
pub struct BlackScholesGreeks;

impl BlackScholesGreeks {
    pub fn new() -> Self {
        Self
    }

    /// d1 계산
    fn calculate_d1(&self, params: &GreeksInput) -> f64 {
        ((params.spot / params.strike).ln()
            + (params.rate - params.dividend + 0.5 * params.volatility.powi(2))
                * params.time_to_expiry)
            / (params.volatility * params.time_to_expiry.sqrt())
    }

    /// d2 계산
    fn calculate_d2(&self, d1: f64, params: &GreeksInput) -> f64 {
        d1 - params.volatility * params.time_to_expiry.sqrt()
    }
}

impl GreeksEngine for BlackScholesGreeks {
    fn compute_greeks(&self, params: &GreeksInput) -> GreekSet {
        if params.is_degenerate() {
            return GreekSet::default();
        }

        let s = params.spot;
        let k = params.strike;
        let t = params.time_to_expiry;
        let r = params.rate;
        let q = params.dividend;
        let sigma = params.volatility;
        let sqrt_t = t.sqrt();

        let d1 = self.calculate_d1(params);
        let d2 = self.calculate_d2(d1, params);

        let pdf_d1 = normal_pdf(d1);
        let cdf_d1 = normal_cdf(d1);
        let cdf_d2 = normal_cdf(d2);
        let cdf_neg_d1 = normal_cdf(-d1);
        let cdf_neg_d2 = normal_cdf(-d2);

        let dividend_discount = (-q * t).exp();
        let rate_discount = (-r * t).exp();

        let gamma = dividend_discount * pdf_d1 / (s * sigma * sqrt_t);
        let vanna = -pdf_d1 * d2 / sigma;
        let vega = s * dividend_discount * pdf_d1 * sqrt_t / 100.0;

        let carry_term = pdf_d1 * (r - q) / (sigma * sqrt_t);
        let decay_term = pdf_d1 * d2 / (2.0 * t);
        let time_value = -s * dividend_discount * pdf_d1 * sigma / (2.0 * sqrt_t);

        let (delta, charm, theta) = match params.right {
            OptionRight::Call => (
                dividend_discount * cdf_d1,
                -dividend_discount * (carry_term - q * cdf_d1 - decay_term),
                (time_value - r * k * rate_discount * cdf_d2
                    + q * s * dividend_discount * cdf_d1)
                    / 365.0,
            ),
            OptionRight::Put => (
                -dividend_discount * cdf_neg_d1,
                -dividend_discount * (carry_term + q * cdf_neg_d1 - decay_term),
                (time_value + r * k * rate_discount * cdf_neg_d2
                    - q * s * dividend_discount * cdf_neg_d1)
                    / 365.0,
            ),
        };

        GreekSet {
            delta,
            gamma,
            vanna,
            charm,
            vega,
            theta,
        }
    }
}

/// Closed-form Greeks for one contract.
///
/// Returns all zeros when `time_to_expiry`, `volatility`, `spot` or `strike`
/// is not positive.
pub fn compute_greeks(
    spot: f64,
    strike: f64,
    time_to_expiry: f64,
    rate: f64,
    dividend: f64,
    volatility: f64,
    right: OptionRight,
) -> GreekSet {
    BlackScholesGreeks.compute_greeks(&GreeksInput {
        spot,
        strike,
        time_to_expiry,
        rate,
        dividend,
        volatility,
        right,
    })
}

/// 표준정규분포 누적분포함수
pub fn normal_cdf(x: f64) -> f64 {
    (1.0 + libm::erf(x / std::f64::consts::SQRT_2)) / 2.0
}

/// 표준정규분포 확률밀도함수
pub fn normal_pdf(x: f64) -> f64 {
    (-x * x / 2.0).exp() / (2.0 * std::f64::consts::PI).sqrt()
}
