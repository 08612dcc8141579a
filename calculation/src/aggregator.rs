use crate::models::{ContractExposure, StrikeRow, Totals};
use gex_common::OptionRight;
use std::collections::HashMap;

/// Bit pattern used as the grouping key; -0.0 and 0.0 share a bucket.
fn strike_key(strike: f64) -> u64 {
    if strike == 0.0 {
        0.0f64.to_bits()
    } else {
        strike.to_bits()
    }
}

/// Group per-contract exposure by exact strike.
///
/// Both legs feed the combined exposure sums; open interest and the raw
/// weighted delta (`delta * oi * multiplier`, not sign flipped) are split by
/// right. Rows come back in ascending strike order.
pub fn aggregate_by_strike(items: &[ContractExposure]) -> Vec<StrikeRow> {
    let mut by_strike: HashMap<u64, StrikeRow> = HashMap::new();

    for item in items {
        let contract = &item.contract;
        let row = by_strike
            .entry(strike_key(contract.strike))
            .or_insert_with(|| StrikeRow::new(contract.strike));

        row.dealer_delta_exp += item.exposures.dealer_delta_exp;
        row.dealer_gamma_exp += item.exposures.dealer_gamma_exp;
        row.dealer_vanna_exp += item.exposures.dealer_vanna_exp;
        row.dealer_charm_exp += item.exposures.dealer_charm_exp;

        let weighted_delta = item.greeks.delta * contract.oi as f64 * contract.multiplier as f64;
        match contract.right {
            OptionRight::Call => {
                row.call_oi += contract.oi;
                row.call_dealer_delta += weighted_delta;
            }
            OptionRight::Put => {
                row.put_oi += contract.oi;
                row.put_dealer_delta += weighted_delta;
            }
        }
    }

    let mut rows: Vec<StrikeRow> = by_strike.into_values().collect();
    rows.sort_by(|a, b| a.strike.total_cmp(&b.strike));
    rows
}

/// Sum the four dealer exposure columns across all rows.
pub fn calculate_totals(rows: &[StrikeRow]) -> Totals {
    rows.iter().fold(Totals::default(), |mut totals, row| {
        totals.net_dealer_delta += row.dealer_delta_exp;
        totals.net_dealer_gamma += row.dealer_gamma_exp;
        totals.net_dealer_vanna += row.dealer_vanna_exp;
        totals.net_dealer_charm += row.dealer_charm_exp;
        totals
    })
}
