use crate::provider::ChainProvider;
use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use gex_common::{expiry_at_close, ChainSnapshot, GexResult, RawContract};
use std::path::PathBuf;
use tracing::{info, warn};

/// 모의 체인 기본 무위험 수익률
const MOCK_RATE: f64 = 0.05;
/// 모의 체인 기본 배당 수익률
const MOCK_DIVIDEND: f64 = 0.015;
const MOCK_MULTIPLIER: u32 = 100;

/// Mock provider: serves a snapshot file when one is configured, otherwise a
/// synthetic chain centred on a fixed spot.
pub struct MockChainProvider {
    snapshot_path: Option<PathBuf>,
}

impl MockChainProvider {
    pub fn new() -> Self {
        Self {
            snapshot_path: None,
        }
    }

    pub fn with_snapshot_file(path: impl Into<PathBuf>) -> Self {
        Self {
            snapshot_path: Some(path.into()),
        }
    }

    /// 스냅샷 파일 로드 (없거나 파싱 실패 시 None)
    async fn load_snapshot(&self) -> Option<ChainSnapshot> {
        let path = self.snapshot_path.as_ref()?;

        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Snapshot file {} unavailable: {}", path.display(), e);
                return None;
            }
        };

        match ChainSnapshot::from_json(&raw) {
            Ok(snapshot) => {
                info!(
                    "Loaded mock snapshot from {} ({} contracts)",
                    path.display(),
                    snapshot.contracts.len()
                );
                Some(snapshot)
            }
            Err(e) => {
                warn!("Error loading mock data from {}: {}", path.display(), e);
                None
            }
        }
    }
}

impl Default for MockChainProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChainProvider for MockChainProvider {
    async fn fetch_chain(&self, symbol: &str, expiry: Option<NaiveDate>) -> GexResult<ChainSnapshot> {
        match self.load_snapshot().await {
            Some(mut snapshot) => {
                if snapshot.symbol != symbol {
                    snapshot.symbol = symbol.to_string();
                }
                if let Some(date) = expiry {
                    snapshot.expiry = expiry_at_close(date);
                }
                Ok(snapshot)
            }
            None => Ok(generate_chain(symbol, expiry, Utc::now())),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Reference spot per underlying for synthetic chains
pub fn mock_spot(symbol: &str) -> f64 {
    match symbol {
        "SPX" => 4500.0,
        "QQQ" => 380.0,
        _ => 450.0,
    }
}

/// 다음 금요일 (오늘이 금요일이면 다음 주)
pub fn next_friday(today: NaiveDate) -> NaiveDate {
    let weekday = today.weekday().num_days_from_monday() as i64;
    let mut days_ahead = (4 - weekday).rem_euclid(7);
    if days_ahead == 0 {
        days_ahead = 7;
    }
    today + Duration::days(days_ahead)
}

/// Build a synthetic chain: 21 strikes at 1% spacing around spot, one call
/// and one put each, with OTM volatility and open interest rising away from spot.
pub fn generate_chain(symbol: &str, expiry: Option<NaiveDate>, now: DateTime<Utc>) -> ChainSnapshot {
    let expiry_date = expiry.unwrap_or_else(|| next_friday(now.date_naive()));
    let expiry = expiry_at_close(expiry_date);
    let spot = mock_spot(symbol);
    let expiry_code = expiry.format("%y%m%d").to_string();
    let expiry_iso = expiry.to_rfc3339();

    let mut contracts = Vec::with_capacity(42);
    for i in (-20..=20).step_by(2) {
        let strike = round_cents(spot + i as f64 * (spot * 0.01));
        let moneyness = (strike - spot).abs() / spot;
        let iv = 0.15 + moneyness * 0.1;
        let oi = (1000.0 + moneyness * 5000.0) as u64;

        for (code, intrinsic) in [("C", spot - strike), ("P", strike - spot)] {
            contracts.push(RawContract {
                symbol: Some(format!(
                    "{}{}{}{:08}",
                    symbol,
                    expiry_code,
                    code,
                    (strike * 1000.0) as u64
                )),
                underlying: Some(symbol.to_string()),
                expiry: Some(expiry_iso.clone()),
                strike,
                right: code.to_string(),
                iv: Some(iv),
                oi: Some(oi),
                bid: Some((intrinsic + 5.0).max(0.01)),
                ask: Some((intrinsic + 6.0).max(0.01)),
                mid: Some((intrinsic + 5.5).max(0.01)),
                last: Some((intrinsic + 5.5).max(0.01)),
                rate: Some(MOCK_RATE),
                dividend: Some(MOCK_DIVIDEND),
                multiplier: Some(MOCK_MULTIPLIER),
                spot: Some(spot),
            });
        }
    }

    ChainSnapshot {
        symbol: symbol.to_string(),
        spot,
        expiry,
        updated_at: now,
        contracts,
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use gex_common::parse_timestamp;

    fn wednesday() -> DateTime<Utc> {
        parse_timestamp("2024-01-03T15:00:00Z").unwrap()
    }

    #[test]
    fn test_next_friday() {
        let wed = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let fri = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let sat = NaiveDate::from_ymd_opt(2024, 1, 6).unwrap();

        assert_eq!(next_friday(wed), fri);
        // 금요일이면 다음 주 금요일
        assert_eq!(next_friday(fri), NaiveDate::from_ymd_opt(2024, 1, 12).unwrap());
        assert_eq!(next_friday(sat), NaiveDate::from_ymd_opt(2024, 1, 12).unwrap());
    }

    #[test]
    fn test_generated_chain_shape() {
        let snapshot = generate_chain("SPY", None, wednesday());

        assert_eq!(snapshot.symbol, "SPY");
        assert_eq!(snapshot.spot, 450.0);
        assert_eq!(snapshot.contracts.len(), 42);
        assert_eq!(snapshot.expiry, parse_timestamp("2024-01-05T16:00:00Z").unwrap());

        let calls = snapshot.contracts.iter().filter(|c| c.right == "C").count();
        assert_eq!(calls, 21);

        let first = &snapshot.contracts[0];
        let last = &snapshot.contracts[41];
        assert_eq!(first.strike, 360.0);
        assert_eq!(last.strike, 540.0);
    }

    #[test]
    fn test_generated_atm_contract() {
        let snapshot = generate_chain("SPY", None, wednesday());

        let atm_call = snapshot
            .contracts
            .iter()
            .find(|c| c.strike == 450.0 && c.right == "C")
            .unwrap();

        assert_eq!(atm_call.iv, Some(0.15));
        assert_eq!(atm_call.oi, Some(1000));
        assert_eq!(atm_call.multiplier, Some(100));
        assert_eq!(atm_call.dividend, Some(0.015));
        assert_eq!(atm_call.symbol.as_deref(), Some("SPY240105C00450000"));
    }

    #[test]
    fn test_generated_spot_by_symbol() {
        assert_eq!(generate_chain("SPX", None, wednesday()).spot, 4500.0);
        assert_eq!(generate_chain("QQQ", None, wednesday()).spot, 380.0);
        assert_eq!(generate_chain("IWM", None, wednesday()).spot, 450.0);
    }

    #[test]
    fn test_explicit_expiry() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 16).unwrap();
        let snapshot = generate_chain("SPY", Some(date), wednesday());
        assert_eq!(snapshot.expiry.date_naive(), date);
    }

    #[tokio::test]
    async fn test_fetch_without_file_generates() {
        let provider = MockChainProvider::new();
        let snapshot = provider.fetch_chain("QQQ", None).await.unwrap();

        assert_eq!(provider.name(), "mock");
        assert_eq!(snapshot.symbol, "QQQ");
        assert_eq!(snapshot.contracts.len(), 42);
    }
}
