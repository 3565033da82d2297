//! Coral heat-stress pipeline service.
//!
//! Derives daily bleaching-risk products from sea surface temperature:
//! - SST anomaly against a trend-corrected daily climatology
//! - Coral bleaching HotSpots
//! - Degree Heating Weeks over a sliding accumulation window
//! - Annual maximum DHW composites
//!
//! Products are exported as Zarr V3 arrays; a one-row-per-day JSONL
//! summary feeds downstream reporting.

mod config;
mod pipeline;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use reef_common::time::parse_date;
use reef_common::DateRange;

use config::PipelineConfig;
use pipeline::DhwPipeline;

#[derive(Parser, Debug)]
#[command(name = "dhw-pipeline")]
#[command(about = "Coral bleaching heat-stress products from daily SST")]
struct Args {
    /// Configuration file (YAML); defaults describe the GBR product
    #[arg(short, long)]
    config: Option<String>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Estimate the climatology baseline and persist it
    Precompute,

    /// Produce products for one day
    Run {
        /// Target date (YYYY-MM-DD); latest available day when omitted
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Produce products for an inclusive date range
    Backfill {
        /// First day (YYYY-MM-DD)
        #[arg(short, long)]
        start: String,

        /// Last day (YYYY-MM-DD)
        #[arg(short, long)]
        end: String,
    },

    /// Composite the annual maximum DHW from stored daily rasters
    AnnualMax {
        /// Year to composite
        #[arg(short, long)]
        year: i32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting heat-stress pipeline");

    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_yaml(path)?,
        None => PipelineConfig::default(),
    };
    config.apply_env();
    config.validate().context("invalid configuration")?;

    let pipeline = DhwPipeline::from_config(&config)?;

    match args.command {
        Command::Precompute => pipeline.precompute().await?,
        Command::Run { date } => {
            let date = match date {
                Some(s) => Some(parse_date(&s)?),
                None => None,
            };
            pipeline.run(date).await?;
        }
        Command::Backfill { start, end } => {
            let range = DateRange::new(parse_date(&start)?, parse_date(&end)?)?;
            pipeline.backfill(range).await?;
        }
        Command::AnnualMax { year } => pipeline.annual_max(year).await?,
    }

    Ok(())
}
