//! Adaptive pool simulator.
//!
//! Drives concurrent workers against an in-process bounded pool decorated with
//! the increment-on-timeout strategy, then prints a JSON report.

use std::path::PathBuf;
use std::sync::Arc;
use clap::Parser;

use adaptive_pool::config::{read_config, validate_config, AppConfig, ConfigError};
use adaptive_pool::observability::{logging::init_logging, metrics::init_metrics, MetricsRegistry};
use adaptive_pool::simulation;

#[derive(Parser)]
#[command(name = "adaptive-pool")]
#[command(about = "Simulate load against a pool that grows on acquire timeouts", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override simulation.workers.
    #[arg(short, long)]
    workers: Option<usize>,

    /// Override simulation.iterations.
    #[arg(short, long)]
    iterations: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => read_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(workers) = cli.workers {
        config.simulation.workers = workers;
    }
    if let Some(iterations) = cli.iterations {
        config.simulation.iterations = iterations;
    }

    init_logging(&config.observability.log_level);
    validate_config(&config).map_err(ConfigError::Validation)?;
    tracing::info!("adaptive-pool v{} starting", env!("CARGO_PKG_VERSION"));
    if config.growth_disabled() {
        tracing::info!(
            ceiling = config.strategy.ceiling,
            initial_capacity = config.pool.initial_capacity,
            increment = config.strategy.increment,
            "Ceiling leaves no room to grow, pool growth disabled"
        );
    }

    let registry = if config.observability.metrics_enabled {
        init_metrics(config.observability.metrics_address.parse()?)?;
        MetricsRegistry::mirrored()
    } else {
        MetricsRegistry::new()
    };

    let report = simulation::run(&config, Arc::new(registry)).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
