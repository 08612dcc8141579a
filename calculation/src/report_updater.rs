use crate::greeks::{BlackScholesGreeks, GreeksEngine};
use crate::models::{ChainReport, Totals};
use crate::services::ChainAnalysisService;
use chrono::NaiveDate;
use gex_common::GexResult;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{interval, Duration};
use tracing::{info, warn};

/// Periodically recomputes a chain report and remembers the last totals per
/// symbol so trend notes can fire on the next pass.
pub struct ReportUpdater<E = BlackScholesGreeks> {
    service: Arc<ChainAnalysisService<E>>,
    last_totals: RwLock<HashMap<String, Totals>>,
}

impl<E> ReportUpdater<E>
where
    E: GreeksEngine,
{
    pub fn new(service: Arc<ChainAnalysisService<E>>) -> Self {
        Self {
            service,
            last_totals: RwLock::new(HashMap::new()),
        }
    }

    pub async fn previous_totals(&self, symbol: &str) -> Option<Totals> {
        self.last_totals.read().await.get(symbol).copied()
    }

    /// 보고서 1회 갱신
    pub async fn refresh(&self, symbol: &str, expiry: Option<NaiveDate>) -> GexResult<ChainReport> {
        let previous = self.previous_totals(symbol).await;
        let report = self.service.analyze(symbol, expiry, previous.as_ref()).await?;

        self.last_totals
            .write()
            .await
            .insert(symbol.to_string(), report.totals);

        Ok(report)
    }

    /// Refresh on every tick, `max_ticks` times (forever when `None`).
    /// Failed fetches are logged and skipped but still use up a tick.
    /// Returns the number of reports handed to `on_report`.
    pub async fn run<F>(
        &self,
        symbol: &str,
        expiry: Option<NaiveDate>,
        every: Duration,
        max_ticks: Option<usize>,
        mut on_report: F,
    ) -> usize
    where
        F: FnMut(&ChainReport),
    {
        let mut ticker = interval(every);
        let mut ticks = 0usize;
        let mut produced = 0usize;

        while max_ticks.map_or(true, |max| ticks < max) {
            ticker.tick().await;
            ticks += 1;

            match self.refresh(symbol, expiry).await {
                Ok(report) => {
                    info!(
                        "Updated {} report from {} provider: {}",
                        symbol,
                        self.service.provider_name(),
                        report.regime.regime
                    );
                    on_report(&report);
                    produced += 1;
                }
                Err(e) => {
                    warn!("Failed to update {} report: {}", symbol, e);
                }
            }
        }

        produced
    }
}
