use crate::aggregator::{aggregate_by_strike, calculate_totals};
use crate::exposure::compute_exposures;
use crate::greeks::{BlackScholesGreeks, GreeksEngine};
use crate::models::{ChainReport, Contract, ContractExposure, Totals};
use crate::regime::classify_regime;
use chain_provider::ChainProvider;
use chrono::{DateTime, NaiveDate, Utc};
use gex_common::{ChainSnapshot, GexConfig, GexResult, OptionRight, RawContract, RiskDefaults};
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 365.25일 기준 연간 초
const SECONDS_PER_YEAR: f64 = 365.25 * 24.0 * 3600.0;

/// Years from `now` to `expiry`, replaced by `floor` once the contract is
/// expired or expiring at this instant.
pub fn time_to_expiry_years(expiry: DateTime<Utc>, now: DateTime<Utc>, floor: f64) -> f64 {
    let seconds = (expiry - now).num_milliseconds() as f64 / 1000.0;
    let years = seconds / SECONDS_PER_YEAR;
    if years <= 0.0 {
        floor
    } else {
        years
    }
}

/// Fill provider gaps with configured defaults and decode the right code.
pub fn resolve_contract(
    raw: &RawContract,
    snapshot: &ChainSnapshot,
    time_to_expiry: f64,
    risk: &RiskDefaults,
    strict_rights: bool,
) -> GexResult<Contract> {
    let right = if strict_rights {
        OptionRight::parse_strict(&raw.right)?
    } else {
        OptionRight::from_code(&raw.right)
    };

    Ok(Contract {
        underlying: raw
            .underlying
            .clone()
            .unwrap_or_else(|| snapshot.symbol.clone()),
        expiry: snapshot.expiry,
        strike: raw.strike,
        right,
        iv: raw.iv.unwrap_or(risk.default_iv),
        oi: raw.oi.unwrap_or(0),
        rate: raw.rate.unwrap_or(risk.rate),
        dividend: raw.dividend.unwrap_or(risk.dividend),
        multiplier: raw.multiplier.unwrap_or(risk.multiplier),
        spot: snapshot.spot,
        time_to_expiry,
    })
}

/// Greeks → exposure → strike rows → totals → regime, for one snapshot.
pub struct ExposurePipeline<E = BlackScholesGreeks> {
    engine: E,
    config: GexConfig,
}

impl ExposurePipeline<BlackScholesGreeks> {
    pub fn new(config: GexConfig) -> Self {
        Self::with_engine(BlackScholesGreeks::new(), config)
    }
}

impl<E> ExposurePipeline<E>
where
    E: GreeksEngine,
{
    pub fn with_engine(engine: E, config: GexConfig) -> Self {
        Self { engine, config }
    }

    /// 계약 하나에 대한 Greeks와 딜러 익스포저
    pub fn evaluate(&self, contract: Contract) -> ContractExposure {
        let greeks = self.engine.compute_greeks(&contract.greeks_input());
        let exposures = compute_exposures(&greeks, contract.oi, contract.multiplier, contract.spot);

        ContractExposure {
            contract,
            greeks,
            exposures,
        }
    }

    pub fn resolve_all(&self, snapshot: &ChainSnapshot, now: DateTime<Utc>) -> GexResult<Vec<Contract>> {
        let time_to_expiry =
            time_to_expiry_years(snapshot.expiry, now, self.config.risk.min_time_to_expiry);

        let folded = snapshot
            .contracts
            .iter()
            .filter(|c| !OptionRight::is_known_code(&c.right))
            .count();
        if folded > 0 && !self.config.strict_rights {
            warn!(
                "{} contract(s) in {} carry unknown right codes, treated as puts",
                folded, snapshot.symbol
            );
        }

        snapshot
            .contracts
            .iter()
            .map(|raw| {
                resolve_contract(
                    raw,
                    snapshot,
                    time_to_expiry,
                    &self.config.risk,
                    self.config.strict_rights,
                )
            })
            .collect()
    }

    /// Per-contract stage; fans out on the rayon pool for large chains.
    pub fn evaluate_all(&self, contracts: Vec<Contract>) -> Vec<ContractExposure> {
        if contracts.len() >= self.config.parallel_threshold {
            debug!("Evaluating {} contracts in parallel", contracts.len());
            contracts.into_par_iter().map(|c| self.evaluate(c)).collect()
        } else {
            contracts.into_iter().map(|c| self.evaluate(c)).collect()
        }
    }

    pub fn run(
        &self,
        snapshot: &ChainSnapshot,
        now: DateTime<Utc>,
        previous: Option<&Totals>,
    ) -> GexResult<ChainReport> {
        let contracts = self.resolve_all(snapshot, now)?;
        let evaluated = self.evaluate_all(contracts);

        let rows = aggregate_by_strike(&evaluated);
        let totals = calculate_totals(&rows);
        let regime = classify_regime(&totals, snapshot.spot, previous);

        info!(
            "{}: {} contracts over {} strikes, net gamma {:.0}, regime {}",
            snapshot.symbol,
            evaluated.len(),
            rows.len(),
            totals.net_dealer_gamma,
            regime.regime
        );

        Ok(ChainReport {
            symbol: snapshot.symbol.clone(),
            spot: snapshot.spot,
            expiry: snapshot.expiry,
            updated_at: snapshot.updated_at,
            rows,
            totals,
            regime,
        })
    }
}

/// 체인 분석 서비스: provider 조회 후 파이프라인 실행
pub struct ChainAnalysisService<E = BlackScholesGreeks> {
    provider: Arc<dyn ChainProvider>,
    pipeline: ExposurePipeline<E>,
}

impl<E> ChainAnalysisService<E>
where
    E: GreeksEngine,
{
    pub fn new(provider: Arc<dyn ChainProvider>, pipeline: ExposurePipeline<E>) -> Self {
        Self { provider, pipeline }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub async fn analyze(
        &self,
        symbol: &str,
        expiry: Option<NaiveDate>,
        previous: Option<&Totals>,
    ) -> GexResult<ChainReport> {
        let snapshot = self.provider.fetch_chain(symbol, expiry).await?;
        debug!(
            "Fetched {} contracts for {} from {} provider",
            snapshot.contracts.len(),
            symbol,
            self.provider.name()
        );
        self.pipeline.run(&snapshot, Utc::now(), previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Regime;
    use async_trait::async_trait;
    use gex_common::{parse_timestamp, GexError};
    use mockall::mock;

    mock! {
        Provider {}

        #[async_trait]
        impl ChainProvider for Provider {
            async fn fetch_chain(&self, symbol: &str, expiry: Option<NaiveDate>) -> GexResult<ChainSnapshot>;
            fn name(&self) -> &str;
        }
    }

    fn now() -> DateTime<Utc> {
        parse_timestamp("2024-01-03T16:00:00Z").unwrap()
    }

    fn snapshot(contracts: Vec<RawContract>) -> ChainSnapshot {
        ChainSnapshot {
            symbol: "SPY".to_string(),
            spot: 450.0,
            expiry: parse_timestamp("2024-01-10T16:00:00Z").unwrap(),
            updated_at: now(),
            contracts,
        }
    }

    fn raw(strike: f64, right: &str) -> RawContract {
        RawContract {
            strike,
            right: right.to_string(),
            iv: Some(0.15),
            oi: Some(1000),
            ..RawContract::default()
        }
    }

    #[test]
    fn test_time_to_expiry() {
        let t = time_to_expiry_years(parse_timestamp("2024-01-10T16:00:00Z").unwrap(), now(), 1e-4);
        assert!((t - 7.0 / 365.25).abs() < 1e-12);
    }

    #[test]
    fn test_time_to_expiry_floor() {
        let expired = parse_timestamp("2024-01-02T16:00:00Z").unwrap();
        assert_eq!(time_to_expiry_years(expired, now(), 1e-4), 1e-4);
        assert_eq!(time_to_expiry_years(now(), now(), 1e-4), 1e-4);
    }

    #[test]
    fn test_resolve_applies_defaults() {
        let snapshot = snapshot(vec![]);
        let bare = RawContract {
            strike: 440.0,
            right: "p".to_string(),
            ..RawContract::default()
        };

        let contract = resolve_contract(&bare, &snapshot, 0.02, &RiskDefaults::default(), false).unwrap();

        assert_eq!(contract.right, OptionRight::Put);
        assert_eq!(contract.iv, 0.2);
        assert_eq!(contract.oi, 0);
        assert_eq!(contract.multiplier, 100);
        assert_eq!(contract.rate, 0.05);
        assert_eq!(contract.dividend, 0.015);
        assert_eq!(contract.spot, 450.0);
        assert_eq!(contract.underlying, "SPY");
        assert_eq!(contract.time_to_expiry, 0.02);
    }

    #[test]
    fn test_unknown_right_folds_into_put() {
        let pipeline = ExposurePipeline::new(GexConfig::default());
        let report = pipeline
            .run(&snapshot(vec![raw(450.0, "X")]), now(), None)
            .unwrap();

        assert_eq!(report.rows[0].put_oi, 1000);
        assert_eq!(report.rows[0].call_oi, 0);
    }

    #[test]
    fn test_strict_rights_reject_unknown_code() {
        let config = GexConfig {
            strict_rights: true,
            ..GexConfig::default()
        };
        let pipeline = ExposurePipeline::new(config);

        let result = pipeline.run(&snapshot(vec![raw(450.0, "C"), raw(450.0, "W")]), now(), None);

        assert!(matches!(result, Err(GexError::InvalidRight(code)) if code == "W"));
    }

    #[test]
    fn test_empty_chain_is_neutral() {
        let pipeline = ExposurePipeline::new(GexConfig::default());
        let report = pipeline.run(&snapshot(vec![]), now(), None).unwrap();

        assert!(report.rows.is_empty());
        assert_eq!(report.totals, Totals::default());
        assert_eq!(report.regime.regime, Regime::NeutralGamma);
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let contracts: Vec<RawContract> = (0..40)
            .flat_map(|i| {
                let strike = 400.0 + i as f64 * 2.5;
                vec![raw(strike, "C"), raw(strike, "P")]
            })
            .collect();
        let chain = snapshot(contracts);

        let sequential = ExposurePipeline::new(GexConfig {
            parallel_threshold: usize::MAX,
            ..GexConfig::default()
        });
        let parallel = ExposurePipeline::new(GexConfig {
            parallel_threshold: 1,
            ..GexConfig::default()
        });

        let a = sequential.run(&chain, now(), None).unwrap();
        let b = parallel.run(&chain, now(), None).unwrap();

        assert_eq!(a.rows.len(), 40);
        assert_eq!(a.rows, b.rows);
        assert_eq!(a.regime, b.regime);
    }

    #[tokio::test]
    async fn test_analysis_service_uses_provider() {
        // Given
        let mut provider = MockProvider::new();
        provider.expect_name().return_const("stub".to_string());
        provider
            .expect_fetch_chain()
            .withf(|symbol, expiry| symbol == "SPY" && expiry.is_none())
            .times(1)
            .returning(|_, _| Ok(snapshot(vec![raw(450.0, "C"), raw(450.0, "P")])));

        let service = ChainAnalysisService::new(
            Arc::new(provider),
            ExposurePipeline::new(GexConfig::default()),
        );

        // When
        let report = service.analyze("SPY", None, None).await.unwrap();

        // Then
        assert_eq!(service.provider_name(), "stub");
        assert_eq!(report.symbol, "SPY");
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].call_oi, 1000);
        assert_eq!(report.rows[0].put_oi, 1000);
    }

    #[tokio::test]
    async fn test_analysis_service_propagates_provider_error() {
        let mut provider = MockProvider::new();
        provider.expect_name().return_const("stub".to_string());
        provider
            .expect_fetch_chain()
            .returning(|symbol, _| Err(GexError::chain_not_found(symbol)));

        let service = ChainAnalysisService::new(
            Arc::new(provider),
            ExposurePipeline::new(GexConfig::default()),
        );

        let result = service.analyze("XYZ", None, None).await;
        assert!(matches!(result, Err(GexError::ChainNotFound { .. })));
    }
}
