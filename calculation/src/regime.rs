use crate::models::{Regime, RegimeResult, Totals};
use tracing::debug;

/// Net dealer delta above which a hedge-pressure note is raised
pub const DELTA_NOTE_THRESHOLD: f64 = 1e9;
/// Net dealer charm above which a pin/decay note is raised
pub const CHARM_NOTE_THRESHOLD: f64 = 1e8;
/// Net dealer vanna above which a vol/spot note is raised
pub const VANNA_NOTE_THRESHOLD: f64 = 1e8;
/// Growth in |net delta| versus the previous snapshot that counts as a trend
pub const TREND_GROWTH_RATIO: f64 = 1.1;

pub const LONG_DELTA_NOTE: &str =
    "Significant long dealer delta exposure → potential hedge pressure on downside";
pub const SHORT_DELTA_NOTE: &str =
    "Significant short dealer delta exposure → potential hedge pressure on upside";
pub const TREND_NOTE: &str = "Hedge pressure increasing";
pub const POSITIVE_CHARM_NOTE: &str = "Elevated pin/decay pressure into close (positive charm)";
pub const NEGATIVE_CHARM_NOTE: &str = "Elevated pin/decay pressure into close (negative charm)";
pub const POSITIVE_VANNA_NOTE: &str = "Vanna suggests vol-up supports spot moves higher";
pub const NEGATIVE_VANNA_NOTE: &str = "Vanna suggests vol-down supports spot moves lower";
pub const DEFAULT_NOTE: &str = "Monitoring dealer positioning...";

/// Classify market-maker positioning from chain totals.
///
/// The regime depends only on the sign of net dealer gamma. Notes are
/// evaluated in a fixed order (delta, trend, charm, vanna) and the default
/// note is used only when none fired. Thresholds are strict.
pub fn classify_regime(totals: &Totals, spot: f64, previous: Option<&Totals>) -> RegimeResult {
    let net_gamma = totals.net_dealer_gamma;
    let net_delta = totals.net_dealer_delta;
    let net_vanna = totals.net_dealer_vanna;
    let net_charm = totals.net_dealer_charm;

    let regime = if net_gamma > 0.0 {
        Regime::PositiveGamma
    } else if net_gamma < 0.0 {
        Regime::NegativeGamma
    } else {
        Regime::NeutralGamma
    };

    let mut notes = Vec::new();

    let abs_delta = net_delta.abs();
    if abs_delta > DELTA_NOTE_THRESHOLD {
        notes.push(if net_delta > 0.0 { LONG_DELTA_NOTE } else { SHORT_DELTA_NOTE });
    }

    if let Some(prev) = previous {
        if abs_delta > prev.net_dealer_delta.abs() * TREND_GROWTH_RATIO {
            notes.push(TREND_NOTE);
        }
    }

    if net_charm.abs() > CHARM_NOTE_THRESHOLD {
        notes.push(if net_charm > 0.0 { POSITIVE_CHARM_NOTE } else { NEGATIVE_CHARM_NOTE });
    }

    if net_vanna.abs() > VANNA_NOTE_THRESHOLD {
        notes.push(if net_vanna > 0.0 { POSITIVE_VANNA_NOTE } else { NEGATIVE_VANNA_NOTE });
    }

    if notes.is_empty() {
        notes.push(DEFAULT_NOTE);
    }

    debug!(spot, net_gamma, regime = %regime, notes = notes.len(), "classified dealer regime");

    RegimeResult {
        regime,
        notes: notes.into_iter().map(String::from).collect(),
    }
}
