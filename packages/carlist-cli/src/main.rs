//! Carlist command line
//!
//! Scrapes listings into a CSV, trains the price model from it, and answers
//! predictions from the persisted artifacts, either once or over HTTP.

mod config;
mod server;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use listing_collector::{read_listings, CsvSink, HttpPageSource, ListingCollector};
use price_model::{
    clean_dataset, explore, ExploreReport, PredictionRequest, PredictionService, TrainingConfig,
    TrainingPipeline, Transmission, UnknownLocationPolicy,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AppConfig;
use crate::server::AppState;

#[derive(Parser)]
#[command(name = "carlist")]
#[command(about = "Used-car listing scraper and resale price model")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl the marketplace into the raw CSV
    Scrape {
        /// Output CSV (default: CARLIST_DATA_PATH)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Page ceiling (default: CARLIST_MAX_PAGES)
        #[arg(long)]
        max_pages: Option<u32>,
        /// Results page template; the page number is appended
        #[arg(long)]
        base_url: Option<String>,
        /// Per-page wait in seconds
        #[arg(long)]
        page_wait_secs: Option<u64>,
    },

    /// Train the model from the raw CSV and persist the artifacts
    Train {
        #[arg(long)]
        data: Option<PathBuf>,
        #[arg(long)]
        artifacts: Option<PathBuf>,
        #[arg(long, default_value_t = price_model::pipeline::DEFAULT_SEED)]
        seed: u64,
        #[arg(long, default_value_t = price_model::pipeline::DEFAULT_TEST_FRACTION)]
        test_fraction: f64,
    },

    /// Predict one price from the persisted artifacts
    Predict {
        #[arg(long)]
        mileage: f64,
        /// Manual or Automatic
        #[arg(long)]
        transmission: Transmission,
        #[arg(long)]
        location: String,
        /// Location code to use when the name is unknown
        #[arg(long)]
        default_location_code: Option<u32>,
        #[arg(long)]
        artifacts: Option<PathBuf>,
    },

    /// Print the statistics behind the exploratory charts
    Explore {
        #[arg(long)]
        data: Option<PathBuf>,
    },

    /// Serve predictions over HTTP
    Serve {
        #[arg(long)]
        port: Option<u16>,
        #[arg(long)]
        artifacts: Option<PathBuf>,
        /// Raw CSV for the /stats endpoint
        #[arg(long)]
        data: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,listing_collector=debug,price_model=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env().context("Failed to load configuration")?;

    match cli.command {
        Commands::Scrape {
            output,
            max_pages,
            base_url,
            page_wait_secs,
        } => {
            let mut collector = config.collector.clone();
            if let Some(pages) = max_pages {
                collector = collector.with_max_pages(pages);
            }
            if let Some(url) = base_url {
                collector = collector.with_base_url(url);
            }
            if let Some(secs) = page_wait_secs {
                collector = collector.with_page_wait(Duration::from_secs(secs));
            }
            let output = output.unwrap_or(config.data_path);
            scrape(collector, &output).await
        }
        Commands::Train {
            data,
            artifacts,
            seed,
            test_fraction,
        } => {
            let training = TrainingConfig::new()
                .with_seed(seed)
                .with_test_fraction(test_fraction);
            train(
                training,
                &data.unwrap_or(config.data_path),
                &artifacts.unwrap_or(config.artifacts_dir),
            )
        }
        Commands::Predict {
            mileage,
            transmission,
            location,
            default_location_code,
            artifacts,
        } => {
            let request = PredictionRequest {
                mileage,
                transmission,
                location_name: location,
            };
            predict(
                &request,
                default_location_code,
                &artifacts.unwrap_or(config.artifacts_dir),
            )
        }
        Commands::Explore { data } => {
            let report = load_stats(&data.unwrap_or(config.data_path))?;
            print_json(&report)
        }
        Commands::Serve {
            port,
            artifacts,
            data,
        } => {
            let service = PredictionService::load(&artifacts.unwrap_or(config.artifacts_dir));
            let data = data.unwrap_or(config.data_path);
            let stats = match load_stats(&data) {
                Ok(report) => Some(Arc::new(report)),
                Err(e) => {
                    tracing::warn!(path = %data.display(), error = %e, "Stats unavailable");
                    None
                }
            };
            server::serve(AppState { service, stats }, port.unwrap_or(config.port)).await
        }
    }
}

async fn scrape(config: listing_collector::CollectorConfig, output: &Path) -> Result<()> {
    let source = HttpPageSource::new(&config).context("Failed to build HTTP client")?;
    let collector = ListingCollector::new(source, config).context("Invalid collector config")?;
    let mut sink = CsvSink::create(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, finishing current page");
            trigger.cancel();
        }
    });

    let report = collector.run(&mut sink, &cancel).await;
    sink.finish()
        .with_context(|| format!("Failed to finalize {}", output.display()))?;
    let report = report.context("Crawl failed")?;

    tracing::info!(output = %output.display(), rows = report.rows_written, "Scrape finished");
    print_json(&report)
}

fn train(config: TrainingConfig, data: &Path, artifacts: &Path) -> Result<()> {
    let outcome = TrainingPipeline::new(config)
        .train_from_csv(data)
        .with_context(|| format!("Training on {} failed", data.display()))?;
    let written = outcome
        .persist(artifacts)
        .with_context(|| format!("Failed to write artifacts to {}", artifacts.display()))?;

    print_json(&serde_json::json!({
        "cleaning": outcome.cleaning,
        "train_rows": outcome.train_rows,
        "test_rows": outcome.test_rows,
        "evaluation": outcome.report,
        "artifacts": written,
    }))
}

fn predict(
    request: &PredictionRequest,
    default_location_code: Option<u32>,
    artifacts: &Path,
) -> Result<()> {
    let mut service = PredictionService::load(artifacts);
    if let Some(code) = default_location_code {
        service = service
            .with_unknown_location_policy(UnknownLocationPolicy::UseCode(code))
            .context("Invalid default location")?;
    }

    let response = service.predict(request).context("Prediction failed")?;
    print_json(&response)
}

fn load_stats(data: &Path) -> Result<ExploreReport> {
    let rows =
        read_listings(data).with_context(|| format!("Failed to read {}", data.display()))?;
    let (listings, cleaning) = clean_dataset(&rows);
    tracing::info!(%cleaning, "Dataset cleaned for exploration");
    Ok(explore(&listings))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to encode output")?;
    println!("{}", text);
    Ok(())
}
