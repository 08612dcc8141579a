pub mod aggregator;
pub mod exposure;
pub mod greeks;
pub mod models;
pub mod regime;
pub mod report_updater;
pub mod services;

pub use aggregator::{aggregate_by_strike, calculate_totals};
pub use exposure::compute_exposures;
pub use greeks::{compute_greeks, BlackScholesGreeks, GreeksEngine};
pub use models::*;
pub use regime::classify_regime;
pub use report_updater::ReportUpdater;
pub use services::*;
