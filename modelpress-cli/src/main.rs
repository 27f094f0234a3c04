//! modelpress: publish BERT checkpoints to object storage.
//!
//! Downloads weights from the HuggingFace Hub, converts them from the
//! PyTorch pickle container to safetensors, and uploads them under
//! versioned keys.

mod commands;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Checkpoint conversion and publishing for the BERT model family.
#[derive(Parser, Debug)]
#[command(name = "modelpress", version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Download, convert, and upload checkpoints
    Run {
        /// Publish only these models (repeatable; whole catalog if omitted)
        #[arg(short, long = "model", value_name = "NAME")]
        models: Vec<String>,

        /// Destination store URL (gs://bucket, s3://bucket, file:///path)
        #[arg(long)]
        store: Option<String>,

        /// Version segment of the object key
        #[arg(long)]
        version: Option<String>,

        /// Keep per-model scratch files after publishing
        #[arg(long)]
        keep_scratch: bool,

        /// Print the plan without downloading or uploading anything
        #[arg(long)]
        dry_run: bool,

        /// Write a JSON run report to this path
        #[arg(long, value_name = "PATH")]
        report: Option<PathBuf>,
    },
    /// Show the checkpoint catalog
    List {
        /// Destination store URL checked by --remote
        #[arg(long)]
        store: Option<String>,

        /// Version segment of the object key
        #[arg(long)]
        version: Option<String>,

        /// Check which artifacts already exist in the store
        #[arg(long)]
        remote: bool,
    },
    /// Convert a local checkpoint to safetensors
    Convert {
        /// Path to a PyTorch checkpoint
        source: PathBuf,
        /// Output safetensors path
        dest: PathBuf,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Create a default user configuration file
    Init,
    /// Show the effective configuration
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Set up tracing: human-readable stderr + JSON file logging
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    // Human-readable layer for stderr (always active)
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_filter(EnvFilter::new(filter));

    // JSON file layer for structured logging
    let log_dir = directories::ProjectDirs::from("dev", "modelpress", "modelpress")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "modelpress.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    commands::handle_command(cli.command, cli.config.as_deref(), cli.quiet).await
}
