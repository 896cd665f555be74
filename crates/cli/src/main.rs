use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fitsbatch_core::{load_config, run_batch, Config};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Convert a tree of FITS images to XISF.
#[derive(Debug, Parser)]
#[command(name = "fitsbatch", version)]
struct Cli {
    /// Configuration file.
    #[arg(short, long, env = "FITSBATCH_CONFIG", default_value = "config.toml")]
    config: PathBuf,

    /// Override the number of concurrent conversions.
    #[arg(short, long)]
    workers: Option<usize>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    /// Applies command-line overrides on top of the loaded configuration.
    fn apply(&self, config: &mut Config) {
        if let Some(workers) = self.workers {
            config.run.workers = workers;
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    if let Err(e) = run(cli).await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn run(cli: Cli) -> Result<()> {
    info!("fitsbatch {}", VERSION);

    info!("Loading configuration from {:?}", cli.config);
    let mut config = load_config(&cli.config)
        .with_context(|| format!("Failed to load config from {:?}", cli.config))?;
    cli.apply(&mut config);

    // run_batch validates before touching the filesystem.
    let report = run_batch(&config).await.context("Batch aborted")?;

    let summary = report.summary();
    info!(
        "Done: {} converted ({} without metadata), {} failed, {} skipped, {} copied, {} originals deleted",
        summary.converted,
        summary.converted_without_metadata,
        summary.failed,
        report.enumeration.skipped,
        report.enumeration.copied,
        summary.retired,
    );
    Ok(())
}
