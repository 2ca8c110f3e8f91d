//! Switch agent entry point.
//!
//! Loads configuration, builds the agent on the simulated switch and runs
//! its actors until SIGINT.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::{debug, error, info, warn};
use swagent::config::{AgentConfig, ConfigOverrides, DEFAULT_CONFIG_PATH};
use swagent::daemon::{AgentDaemon, AgentDaemonConfig};
use swagent::fatal::{FatalPath, MetricsDumpHandler};
use swagent::metrics::AgentMetrics;
use swagent_common::shutdown_channel;
use swagent_hal::sim::{CompletionMode, SimSwitch};

/// Switch control-plane agent
#[derive(Parser, Debug)]
#[command(name = "swagent")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short = 'c', long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long)]
    log_level: Option<String>,

    /// Counter collection interval in milliseconds
    #[arg(long)]
    stats_interval_ms: Option<u64>,

    /// Give up on a synchronous send after this many milliseconds
    #[arg(long)]
    sync_send_timeout_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let mut config = match AgentConfig::load_or_default(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("swagent: {}", e);
            return ExitCode::FAILURE;
        }
    };
    config.apply_overrides(ConfigOverrides {
        log_level: args.log_level,
        stats_interval_ms: args.stats_interval_ms,
        sync_send_timeout_ms: args.sync_send_timeout_ms,
    });

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    if let Err(e) = config.validate() {
        error!("{}", e);
        return ExitCode::FAILURE;
    }

    info!("Starting switch agent");
    info!("Config file: {}", args.config.display());
    info!("Stats interval: {:?}", config.stats_interval());
    match config.sync_send_timeout() {
        Some(timeout) => info!("Sync send timeout: {:?}", timeout),
        None => info!("Sync send timeout: none"),
    }

    let metrics = match AgentMetrics::new() {
        Ok(metrics) => metrics,
        Err(e) => {
            error!("Failed to create metrics registry: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let hal = Arc::new(
        SimSwitch::new()
            .with_unit(config.sim.unit)
            .with_completion_mode(CompletionMode::Threaded)
            .with_cos_supported(config.sim.cos_supported)
            .with_cpu_queues(config.sim.cpu_queues),
    );
    info!("Running on simulated switch unit {}", config.sim.unit);

    let fatal = Arc::new(
        FatalPath::new().with_handler(Arc::new(MetricsDumpHandler::new(metrics.clone()))),
    );

    let mut daemon = match AgentDaemon::new(
        AgentDaemonConfig::from(&config),
        hal,
        metrics.clone(),
        fatal,
    ) {
        Ok(daemon) => daemon,
        Err(e) => {
            error!("Failed to initialize agent: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let (trigger, signal) = shutdown_channel();
    let shutdown_handle = tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("Received SIGINT, shutting down gracefully...");
                trigger.trigger();
            }
            Err(err) => {
                error!("Failed to listen for ctrl-c: {}", err);
            }
        }
    });

    daemon.run(signal).await;
    shutdown_handle.abort();

    match metrics.gather_text() {
        Ok(text) => debug!("final metrics:\n{}", text),
        Err(e) => warn!("Failed to render metrics: {}", e),
    }
    info!("Switch agent shutdown complete");

    ExitCode::SUCCESS
}
