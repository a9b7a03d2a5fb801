//! CLI entry point for the flight statistics tool.
//!
//! Provides subcommands for aggregating a corpus of flight-record batches
//! from a directory or a set of URLs, and for generating a synthetic corpus.

use anyhow::Result;
use clap::{Parser, Subcommand};
use flight_stats::analyzers::analyzer::{CancelToken, RunOptions, run};
use flight_stats::generate::{GeneratorConfig, generate};
use flight_stats::output::{SummaryRow, append_record, log_summary, print_json, write_json};
use flight_stats::source::{DirectorySource, HttpSource, RecordSource};
use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "flight_stats")]
#[command(about = "Aggregate operational statistics from flight-record batches", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate every batch in a directory (or a list of URLs) into a summary
    Process {
        /// Directory containing one JSON batch per file
        #[arg(value_name = "DIR", env = "FLIGHT_DATA_DIR", default_value = "/tmp/flights")]
        source: String,

        /// Fetch batches from these URLs instead of reading DIR
        #[arg(long = "url", value_name = "URL")]
        urls: Vec<String>,

        /// Number of batches read and decoded concurrently
        #[arg(short, long, default_value_t = 1)]
        concurrency: usize,

        /// Also log the full summary as pretty-printed JSON
        #[arg(long)]
        print_json: bool,

        /// Optional: write the summary as JSON to this path
        #[arg(long)]
        json: Option<String>,

        /// Optional: append a summary row to this CSV file
        #[arg(long)]
        csv: Option<String>,
    },
    /// Write a synthetic corpus of flight-record batches
    Generate {
        /// Directory to write batch files into
        #[arg(short, long, default_value = "/tmp/flights")]
        output_dir: String,

        /// Number of batch files
        #[arg(short, long, default_value_t = 5000)]
        files: usize,

        /// Number of distinct cities (random between 100 and 200 if omitted)
        #[arg(long)]
        cities: Option<usize>,

        /// Minimum records per file
        #[arg(long, default_value_t = 50)]
        min_records: usize,

        /// Maximum records per file
        #[arg(long, default_value_t = 100)]
        max_records: usize,

        /// Share of records to corrupt, between 0 and 1
        #[arg(long, default_value_t = 0.0)]
        dirty_ratio: f64,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/flight_stats.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("flight_stats.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            source,
            urls,
            concurrency,
            print_json: pretty,
            json,
            csv,
        } => {
            let record_source: Arc<dyn RecordSource> = if urls.is_empty() {
                info!(dir = %source, "Reading batches from directory");
                Arc::new(DirectorySource::new(&source))
            } else {
                info!(urls = urls.len(), "Fetching batches over HTTP");
                Arc::new(HttpSource::new(urls))
            };

            let cancel = CancelToken::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupt received, finishing in-flight batches");
                    on_signal.cancel();
                }
            });

            let summary = run(record_source, &RunOptions { concurrency }, cancel).await?;
            log_summary(&summary);
            if pretty {
                print_json(&summary)?;
            }

            if let Some(path) = json {
                write_json(&path, &summary)?;
                info!(path = %path, "Summary written");
            }
            if let Some(path) = csv {
                append_record(&path, &SummaryRow::from(&summary))?;
                info!(path = %path, "Summary row appended");
            }
        }
        Commands::Generate {
            output_dir,
            files,
            cities,
            min_records,
            max_records,
            dirty_ratio,
            seed,
        } => {
            let config = GeneratorConfig {
                files,
                cities,
                min_records,
                max_records,
                dirty_ratio,
                seed,
            };
            generate(Path::new(&output_dir), &config)?;
        }
    }

    Ok(())
}
