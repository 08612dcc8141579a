use anyhow::{bail, Context, Result};
use chain_provider::{ChainProvider, LiveChainProvider, MockChainProvider, ProviderKind};
use clap::{Args, Parser, Subcommand};
use gex_calculation::{compute_greeks, ChainAnalysisService, ExposurePipeline, ReportUpdater};
use gex_common::{parse_expiry_date, ChainSnapshot, GexConfig, OptionRight};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "gex-calc")]
#[command(about = "옵션 체인 딜러 Greeks 익스포저 계산 도구")]
struct Cli {
    /// TOML 설정 파일
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// 기초자산 심볼 (기본값: 설정의 default_symbol)
    #[arg(long)]
    symbol: Option<String>,

    /// 만기일 (YYYY-MM-DD)
    #[arg(long)]
    expiry: Option<String>,

    /// 데이터 제공자: mock, live
    #[arg(long, default_value = "mock")]
    provider: String,

    /// 체인 스냅샷 JSON 파일
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// JSON 들여쓰기 출력
    #[arg(long)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// 체인 1회 분석 후 보고서 출력
    Chain {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// 주기적으로 보고서 갱신 (live: stdin에서 JSON 스냅샷을 한 줄씩 수신)
    Watch {
        #[command(flatten)]
        source: SourceArgs,

        /// 갱신 주기 (초)
        #[arg(long, default_value_t = 30)]
        interval_secs: u64,

        /// 갱신 횟수 (미지정 시 무한)
        #[arg(long)]
        count: Option<usize>,
    },

    /// 단일 계약 Greeks 계산
    Greeks {
        #[arg(long)]
        spot: f64,

        #[arg(long)]
        strike: f64,

        /// 만기까지 일수
        #[arg(long)]
        days: f64,

        /// 변동성 (소수)
        #[arg(long)]
        iv: f64,

        /// C 또는 P
        #[arg(long, default_value = "C")]
        right: String,

        #[arg(long)]
        rate: Option<f64>,

        #[arg(long)]
        dividend: Option<f64>,

        #[arg(long)]
        pretty: bool,
    },
}

/// Provider plus the live feed handle when the live variant was chosen
struct Source {
    provider: Arc<dyn ChainProvider>,
    live: Option<Arc<LiveChainProvider>>,
}

fn build_source(config: &GexConfig, args: &SourceArgs) -> Result<Source> {
    let kind: ProviderKind = args.provider.parse()?;

    let source = match kind {
        ProviderKind::Mock => {
            let provider = match args.snapshot.clone().or_else(|| config.snapshot_path.clone()) {
                Some(path) => MockChainProvider::with_snapshot_file(path),
                None => MockChainProvider::new(),
            };
            Source {
                provider: Arc::new(provider),
                live: None,
            }
        }
        ProviderKind::Live => {
            let live = Arc::new(LiveChainProvider::new());
            Source {
                provider: live.clone(),
                live: Some(live),
            }
        }
    };

    info!("Using {} chain provider", kind);
    Ok(source)
}

async fn load_snapshot(path: &Path) -> Result<ChainSnapshot> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    ChainSnapshot::from_json(&raw).with_context(|| format!("Failed to parse snapshot {}", path.display()))
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", out);
    Ok(())
}

async fn run_chain(config: GexConfig, args: SourceArgs) -> Result<()> {
    let source = build_source(&config, &args)?;
    let symbol = args.symbol.clone().unwrap_or_else(|| config.default_symbol.clone());
    let expiry = args.expiry.as_deref().map(parse_expiry_date).transpose()?;

    if let Some(live) = &source.live {
        let path = args
            .snapshot
            .as_deref()
            .context("--snapshot is required with the live provider")?;
        live.publish(load_snapshot(path).await?).await;
        info!("Live feed serving {:?}", live.symbols().await);
    }

    let service = ChainAnalysisService::new(source.provider, ExposurePipeline::new(config));
    let report = service
        .analyze(&symbol, expiry, None)
        .await
        .with_context(|| format!("Failed to analyze chain for {}", symbol))?;

    print_json(&report, args.pretty)
}

async fn run_watch(
    config: GexConfig,
    args: SourceArgs,
    interval_secs: u64,
    count: Option<usize>,
) -> Result<()> {
    let source = build_source(&config, &args)?;
    let symbol = args.symbol.clone().unwrap_or_else(|| config.default_symbol.clone());
    let expiry = args.expiry.as_deref().map(parse_expiry_date).transpose()?;

    if let Some(live) = source.live.clone() {
        if let Some(path) = args.snapshot.as_deref() {
            live.publish(load_snapshot(path).await?).await;
        }

        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) if line.trim().is_empty() => continue,
                    Ok(Some(line)) => match ChainSnapshot::from_json(&line) {
                        Ok(snapshot) => live.publish(snapshot).await,
                        Err(e) => warn!("Skipping malformed snapshot line: {}", e),
                    },
                    Ok(None) => {
                        info!("Snapshot feed closed");
                        break;
                    }
                    Err(e) => {
                        warn!("Failed to read snapshot feed: {}", e);
                        break;
                    }
                }
            }
        });
    }

    let service = ChainAnalysisService::new(source.provider, ExposurePipeline::new(config));
    let updater = ReportUpdater::new(Arc::new(service));
    let pretty = args.pretty;

    info!("Watching {} every {}s", symbol, interval_secs);
    let produced = updater
        .run(&symbol, expiry, Duration::from_secs(interval_secs), count, |report| {
            if let Err(e) = print_json(report, pretty) {
                warn!("Failed to write report: {}", e);
            }
        })
        .await;

    if let Some(attempts) = count {
        if produced == 0 {
            bail!("No report produced for {} in {} attempts", symbol, attempts);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let config = GexConfig::load(cli.config.as_deref()).context("Failed to load config")?;

    match cli.command {
        Commands::Chain { source } => run_chain(config, source).await,
        Commands::Watch {
            source,
            interval_secs,
            count,
        } => run_watch(config, source, interval_secs, count).await,
        Commands::Greeks {
            spot,
            strike,
            days,
            iv,
            right,
            rate,
            dividend,
            pretty,
        } => {
            let right = OptionRight::parse_strict(&right)?;
            let greeks = compute_greeks(
                spot,
                strike,
                days / 365.25,
                rate.unwrap_or(config.risk.rate),
                dividend.unwrap_or(config.risk.dividend),
                iv,
                right,
            );
            print_json(&greeks, pretty)
        }
    }
}
