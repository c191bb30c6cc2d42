mod config;
mod engine;
mod error;
mod feed;
mod forecast;
mod indicator;
mod model;
mod report;

use std::io::Read;
use std::path::PathBuf;

use chrono::DateTime;
use clap::Parser;
use derive_more::{Display, Error};
use error_stack::{Report, ResultExt};
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::AppConfig;
use engine::Analyzer;
use error::IngestError;
use model::BarSeries;

#[derive(Debug, Display, Error)]
pub enum AppError {
    #[display("configuration error")]
    Config,
    #[display("input error")]
    Input,
    #[display("analysis error")]
    Analysis,
}

#[derive(Parser)]
#[command(name = "trade-advisor", about = "Market analysis and trade signal engine")]
struct Cli {
    /// Path to the TOML configuration file (built-in defaults when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Trading pair identifier
    #[arg(short, long, default_value = "btc_usdt")]
    pair: String,

    /// JSON file of bar records, or "-" for stdin
    #[arg(short, long, default_value = "-")]
    input: String,

    /// Override for the latest price (defaults to the last ingested close)
    #[arg(long)]
    latest_price: Option<f64>,

    /// Emit the report as JSON instead of the text block
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() {
    if let Err(report) = run().await {
        eprintln!("{report:?}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Report<AppError>> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => config::load(path).change_context(AppError::Config)?,
        None => AppConfig::default(),
    };

    init_tracing(&config);

    let raw = read_input(&cli.input).change_context(AppError::Input)?;
    let bars = feed::parse_bars(&raw).change_context(AppError::Input)?;
    let series = BarSeries::ingest(bars).change_context(AppError::Input)?;

    let latest_price = cli.latest_price.unwrap_or_else(|| series.latest().close);

    info!(
        pair = %cli.pair,
        bars = series.len(),
        from = %format_ts(series.bars()[0].timestamp_ms),
        to = %format_ts(series.latest().timestamp_ms),
        latest_price,
        "analyzing market"
    );

    let analyzer = Analyzer::new(config.analysis.clone(), config.forecast.clone());
    let report = analyzer
        .analyze(&cli.pair, &series, latest_price)
        .await
        .change_context(AppError::Analysis)?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).change_context(AppError::Analysis)?;
        println!("{json}");
    } else {
        println!("{}", report.render_text());
    }

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::new(&config.general.log_level);
    match config.general.log_format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .init();
        }
        _ => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
}

fn read_input(path: &str) -> Result<String, Report<IngestError>> {
    if path == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .change_context(IngestError::ReadInput)
            .attach_printable("stdin")?;
        Ok(buffer)
    } else {
        std::fs::read_to_string(path)
            .change_context(IngestError::ReadInput)
            .attach_with(|| format!("path: {path}"))
    }
}

fn format_ts(timestamp_ms: i64) -> String {
    DateTime::from_timestamp_millis(timestamp_ms)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| timestamp_ms.to_string())
}
