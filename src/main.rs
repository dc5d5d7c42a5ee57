use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};

use focus_dispatch::config::Config;
use focus_dispatch::services::{
    create_focus_query,
    ExtensionFactory,
    FocusMonitor,
    MonitorSettings,
    PluginRegistry,
};

#[derive(Parser, Debug)]
#[command(name = "focus-dispatch")]
#[command(about = "Runs the extension mapped to whichever application has focus")]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "focus-dispatch.toml")]
    config: String,

    /// Emulate focus changes instead of querying the desktop
    #[arg(long)]
    dry_run: bool,

    /// Log level, overrides `logging.level` from the configuration
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(&args.config)?;

    let level = args.log_level.as_deref().unwrap_or(config.logging.level.as_str());
    init_tracing(level, &config.logging.format)?;

    info!("Starting focus-dispatch v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded from: {}", args.config);

    let mapping = config.extension_mapping();
    if mapping.is_empty() {
        warn!("No application mappings configured, no extension will be registered");
    } else {
        info!("{} application mapping(s) configured", mapping.len());
    }

    let factory = ExtensionFactory::with_builtins();
    let (registry, report) =
        PluginRegistry::load_all(&config.plugins.directory, &mapping, &factory);

    for (app, extension) in registry.entries() {
        info!("Registered extension: {} -> {}", app, extension);
    }
    if !report.issues.is_empty() {
        warn!(
            "{} problem(s) during extension discovery, see above",
            report.issues.len()
        );
    }

    let focus_query = create_focus_query(&config, args.dry_run)?;
    let monitor = FocusMonitor::new(
        Arc::new(registry),
        focus_query,
        MonitorSettings::from_config(&config),
    );

    let (stop_tx, stop_rx) = watch::channel(false);
    let monitor_handle = tokio::spawn(monitor.run(stop_rx));

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Received shutdown signal (Ctrl+C)");
        }
        Err(err) => {
            error!("Failed to listen for the shutdown signal: {}", err);
        }
    }

    info!("Shutting down...");
    let _ = stop_tx.send(true);

    // a running extension is not interrupted; give it a bounded grace period
    let shutdown_timeout = tokio::time::Duration::from_secs(5);
    match tokio::time::timeout(shutdown_timeout, monitor_handle).await {
        Ok(Ok(())) => info!("Focus monitor stopped cleanly"),
        Ok(Err(e)) => error!("Focus monitor task failed: {}", e),
        Err(_) => warn!("Timed out waiting for the focus monitor to stop"),
    }

    info!("focus-dispatch finished");
    Ok(())
}

fn init_tracing(level: &str, format: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))?;

    let registry = tracing_subscriber::registry().with(filter);
    if format == "pretty" {
        registry.with(tracing_subscriber::fmt::layer().pretty()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().compact()).init();
    }

    Ok(())
}
