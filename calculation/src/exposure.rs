use crate::models::{ExposureSet, GreekSet};

/// Convert per-contract Greeks into dealer notional exposure.
///
/// Dealers are assumed short whatever customers hold open, so every term is
/// the negated customer exposure. Gamma scales with spot squared, the others
/// with spot.
pub fn compute_exposures(greeks: &GreekSet, oi: u64, multiplier: u32, spot: f64) -> ExposureSet {
    let contracts = oi as f64 * multiplier as f64;

    ExposureSet {
        dealer_delta_exp: -greeks.delta * contracts * spot,
        dealer_gamma_exp: -greeks.gamma * contracts * spot * spot,
        dealer_vanna_exp: -greeks.vanna * contracts * spot,
        dealer_charm_exp: -greeks.charm * contracts * spot,
    }
}
