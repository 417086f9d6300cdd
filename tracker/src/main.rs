//! aether-tracker - hand-gesture scroll and pointer tracker
//!
//! Reads landmark frames as s-expressions and writes gesture events.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

use aether_tracker::gesture::{GestureController, TrackerConfig};
use aether_tracker::ipc::run_stream;
use anyhow::Context;
use clap::Parser;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "aether-tracker", about = "Hand-gesture scroll and pointer tracker")]
struct Cli {
    /// Frame file to replay (default: stdin)
    #[arg(long)]
    input: Option<PathBuf>,

    /// Scroll warm-up after the pose appears, in milliseconds
    #[arg(long)]
    warmup_ms: Option<f64>,

    /// Minimum time between clicks, in milliseconds
    #[arg(long)]
    click_cooldown_ms: Option<f64>,

    /// Log every message to stderr
    #[arg(long)]
    trace: bool,

    /// Show version and exit
    #[arg(long)]
    version: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("aether-tracker {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // stdout carries the protocol; logs go to stderr.
    let default_filter = if cli.trace {
        "aether_tracker=debug"
    } else {
        "aether_tracker=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(io::stderr)
        .init();

    info!("aether-tracker v{} starting", env!("CARGO_PKG_VERSION"));

    let mut config = TrackerConfig::default();
    if let Some(warmup) = cli.warmup_ms {
        anyhow::ensure!(warmup >= 0.0, "--warmup-ms must be non-negative");
        config.warmup_ms = warmup;
    }
    if let Some(cooldown) = cli.click_cooldown_ms {
        anyhow::ensure!(cooldown >= 0.0, "--click-cooldown-ms must be non-negative");
        config.click.cooldown_ms = cooldown;
    }
    info!("config: {}", config.config_sexp());

    let mut controller = GestureController::new(config);
    let stdout = io::stdout();
    let output = stdout.lock();

    let stats = match &cli.input {
        Some(path) => {
            info!("replaying {}", path.display());
            let file = File::open(path)
                .with_context(|| format!("opening frame file {}", path.display()))?;
            run_stream(&mut controller, BufReader::new(file), output, cli.trace)?
        }
        None => run_stream(&mut controller, io::stdin().lock(), output, cli.trace)?,
    };

    info!(
        "done: {} messages, {} lines written, {} rejected",
        stats.messages, stats.lines_written, stats.rejected
    );
    Ok(())
}
