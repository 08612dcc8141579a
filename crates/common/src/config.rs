//! Runtime configuration
//!
//! Risk parameters (rate, dividend yield, fallback volatility) are passed
//! into the pipeline explicitly rather than read from globals.

use crate::error::{GexError, GexResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Defaults applied to contract fields the provider left empty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskDefaults {
    /// Risk-free rate (decimal)
    pub rate: f64,
    /// Dividend yield (decimal)
    pub dividend: f64,
    /// Implied volatility used when a contract carries none
    pub default_iv: f64,
    /// Contract multiplier
    pub multiplier: u32,
    /// Floor for time to expiry (years) once a contract is expired or same-day
    pub min_time_to_expiry: f64,
}

impl Default for RiskDefaults {
    fn default() -> Self {
        Self {
            rate: 0.05,
            dividend: 0.015,
            default_iv: 0.2,
            multiplier: 100,
            min_time_to_expiry: 1e-4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GexConfig {
    pub risk: RiskDefaults,
    /// Reject right codes other than C/P instead of folding them into puts
    pub strict_rights: bool,
    /// Contract count at which per-contract work moves onto the rayon pool
    pub parallel_threshold: usize,
    pub default_symbol: String,
    /// Snapshot file served by the mock provider
    pub snapshot_path: Option<PathBuf>,
}

impl Default for GexConfig {
    fn default() -> Self {
        Self {
            risk: RiskDefaults::default(),
            strict_rights: false,
            parallel_threshold: 512,
            default_symbol: "SPY".to_string(),
            snapshot_path: None,
        }
    }
}

impl GexConfig {
    pub fn from_toml_str(raw: &str) -> GexResult<Self> {
        toml::from_str(raw).map_err(|e| GexError::config(e.to_string()))
    }

    pub fn from_file(path: &Path) -> GexResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Load from `path` when given, otherwise fall back to defaults.
    pub fn load(path: Option<&Path>) -> GexResult<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }
}
