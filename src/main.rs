//! CLI entry point for the diet macronutrient analysis.
//!
//! `analyze` loads the recipe dataset from a file, URL or blob and writes
//! every table, text and chart artifact into an output directory.
//! `summarize` reads the dataset from blob storage and writes per-diet mean
//! macros as a JSON document, optionally uploading it back.

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use diet_macros::{
    analyzers::analyzer::{analyze, summarize_blob},
    chart::PlottersRenderer,
    config::{
        AnalysisConfig, DEFAULT_CONTAINER, DEFAULT_OUTPUT_DIR, DEFAULT_SOURCE,
        DEFAULT_SUMMARY_PATH, REQUIRED_COLUMNS,
    },
    fetch::{BasicClient, Source, read_source},
    infra::blob::{BlobStore, ConnectionString, S3BlobStore},
    parser::parse_table,
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "diet_macros")]
#[command(about = "Macronutrient analysis of recipes grouped by diet type", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full analysis and write all artifacts
    Analyze {
        /// File path, http(s) URL or blob://<container>/<blob>
        #[arg(short, long, default_value = DEFAULT_SOURCE)]
        source: String,

        /// Directory for tables, charts and the text summary
        #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
        output_dir: PathBuf,

        /// Recipes kept per diet in the protein ranking
        #[arg(short = 'n', long, default_value_t = 5)]
        top_n: usize,

        /// Cuisines kept per diet in the frequency ranking
        #[arg(short = 'k', long, default_value_t = 3)]
        top_k: usize,
    },
    /// Write per-diet mean macros from a blob as a JSON document
    Summarize {
        /// Blob container holding the dataset
        #[arg(short, long, default_value = DEFAULT_CONTAINER)]
        container: String,

        /// Dataset blob name
        #[arg(short, long, default_value = DEFAULT_SOURCE)]
        blob: String,

        /// Local path of the JSON document
        #[arg(short, long, default_value = DEFAULT_SUMMARY_PATH)]
        output: PathBuf,

        /// Optional: blob name to upload the document to, in the same container
        #[arg(long)]
        upload_key: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/diet_macros.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("diet_macros.log"));

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
        Commands::Analyze {
            source,
            output_dir,
            top_n,
            top_k,
        } => {
            let source: Source = source.parse()?;
            // Credentials are checked before anything is fetched.
            let store = if source.is_blob() {
                Some(blob_store().await?)
            } else {
                None
            };
            let http = BasicClient::new()?;

            let bytes = read_source(&source, &http, store.as_ref().map(|s| s as &dyn BlobStore)).await?;
            let table = parse_table(&bytes, &REQUIRED_COLUMNS)?;
            info!(source = %source, rows = table.len(), "Dataset loaded");

            let config = AnalysisConfig {
                top_n,
                top_k,
                ..AnalysisConfig::default().with_output_dir(output_dir)
            };
            let summary = analyze(table, &config, &PlottersRenderer)?;
            info!(cleaning = %serde_json::to_string(&summary.cleaning)?, "Cleaning report");

            if !summary.is_success() {
                for failure in &summary.failures {
                    error!(artifact = %failure.artifact, error = %failure.error, "Artifact not written");
                }
                bail!(
                    "{} of {} artifacts failed",
                    summary.failures.len(),
                    summary.failures.len() + summary.written.len()
                );
            }
        }
        Commands::Summarize {
            container,
            blob,
            output,
            upload_key,
        } => {
            let store = blob_store().await?;
            let summary =
                summarize_blob(&store, &container, &blob, &output, upload_key.as_deref()).await?;
            info!(diets = summary.len(), output = %output.display(), "Summary complete");
        }
    }

    Ok(())
}

/// Connects to the blob store named by the connection string in the environment.
async fn blob_store() -> Result<S3BlobStore> {
    let conn = ConnectionString::from_env()?;
    info!(endpoint = ?conn.endpoint, region = %conn.region, "Blob store configured");
    Ok(S3BlobStore::connect(&conn).await)
}
