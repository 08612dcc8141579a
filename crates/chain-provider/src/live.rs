use crate::provider::ChainProvider;
use async_trait::async_trait;
use chrono::NaiveDate;
use gex_common::{ChainSnapshot, GexError, GexResult};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Live feed provider
///
/// An upstream collaborator publishes chain snapshots as they arrive; fetches
/// return the most recent snapshot per underlying.
pub struct LiveChainProvider {
    snapshots: RwLock<HashMap<String, ChainSnapshot>>,
}

impl LiveChainProvider {
    pub fn new() -> Self {
        Self {
            snapshots: RwLock::new(HashMap::new()),
        }
    }

    /// 최신 스냅샷 등록 (같은 심볼은 덮어씀)
    pub async fn publish(&self, snapshot: ChainSnapshot) {
        let key = snapshot.symbol.to_ascii_uppercase();
        info!(
            "Live snapshot published for {} ({} contracts, spot ${:.2})",
            key,
            snapshot.contracts.len(),
            snapshot.spot
        );
        self.snapshots.write().await.insert(key, snapshot);
    }

    /// Symbols with at least one published snapshot
    pub async fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.snapshots.read().await.keys().cloned().collect();
        symbols.sort();
        symbols
    }
}

impl Default for LiveChainProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChainProvider for LiveChainProvider {
    async fn fetch_chain(&self, symbol: &str, expiry: Option<NaiveDate>) -> GexResult<ChainSnapshot> {
        let snapshots = self.snapshots.read().await;
        let snapshot = snapshots
            .get(&symbol.to_ascii_uppercase())
            .ok_or_else(|| GexError::chain_not_found(symbol))?;

        if let Some(date) = expiry {
            if snapshot.expiry.date_naive() != date {
                debug!(
                    "Live snapshot for {} expires {}, requested {}",
                    symbol,
                    snapshot.expiry.date_naive(),
                    date
                );
                return Err(GexError::chain_not_found(symbol));
            }
        }

        Ok(snapshot.clone())
    }

    fn name(&self) -> &str {
        "live"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn snapshot(symbol: &str, spot: f64) -> ChainSnapshot {
        ChainSnapshot {
            symbol: symbol.to_string(),
            spot,
            expiry: Utc::now(),
            updated_at: Utc::now(),
            contracts: vec![],
        }
    }

    #[tokio::test]
    async fn test_fetch_before_publish_fails() {
        let provider = LiveChainProvider::new();
        let result = provider.fetch_chain("SPY", None).await;
        assert!(matches!(result, Err(GexError::ChainNotFound { symbol }) if symbol == "SPY"));
    }

    #[tokio::test]
    async fn test_latest_snapshot_wins() {
        // Given
        let provider = LiveChainProvider::new();
        provider.publish(snapshot("SPY", 450.0)).await;
        provider.publish(snapshot("SPY", 452.5)).await;

        // When
        let fetched = provider.fetch_chain("spy", None).await.unwrap();

        // Then
        assert_eq!(fetched.spot, 452.5);
        assert_eq!(provider.symbols().await, vec!["SPY".to_string()]);
    }

    #[test]
    fn test_symbols_sorted_and_uppercased() {
        tokio_test::block_on(async {
            let provider = LiveChainProvider::new();
            provider.publish(snapshot("qqq", 380.0)).await;
            provider.publish(snapshot("SPX", 4500.0)).await;

            assert_eq!(provider.symbols().await, vec!["QQQ".to_string(), "SPX".to_string()]);
        });
    }

    #[tokio::test]
    async fn test_expiry_mismatch() {
        let provider = LiveChainProvider::new();
        let published = snapshot("QQQ", 380.0);
        let expiry_date = published.expiry.date_naive();
        provider.publish(published).await;

        assert!(provider.fetch_chain("QQQ", Some(expiry_date)).await.is_ok());

        let other_date = expiry_date + chrono::Duration::days(7);
        assert!(provider.fetch_chain("QQQ", Some(other_date)).await.is_err());
    }
}
