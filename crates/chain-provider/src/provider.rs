use async_trait::async_trait;
use chrono::NaiveDate;
use gex_common::{ChainSnapshot, GexError, GexResult};
use std::fmt;
use std::str::FromStr;

/// Options chain provider trait
#[async_trait]
pub trait ChainProvider: Send + Sync {
    /// Fetch the chain for `symbol`, optionally pinned to an expiry date
    async fn fetch_chain(&self, symbol: &str, expiry: Option<NaiveDate>) -> GexResult<ChainSnapshot>;

    /// Get the name of the provider
    fn name(&self) -> &str;
}

/// Provider variants the service can be started with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Mock,
    Live,
}

impl FromStr for ProviderKind {
    type Err = GexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(ProviderKind::Mock),
            "live" => Ok(ProviderKind::Live),
            _ => Err(GexError::UnknownProvider(s.to_string())),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Mock => f.write_str("mock"),
            ProviderKind::Live => f.write_str("live"),
        }
    }
}
