//! Collector Launch CLI
//!
//! Usage:
//!   collector_launch --config collector.yaml
//!   collector_launch -c base.yaml -c prod.yaml --set exporters.nop=
//!   collector_launch --config collector.yaml --dry-run

use collector_launch::{builtin_factories, Collector, CollectorArgs, CollectorError, CollectorSettings};
use std::sync::Arc;
use tokio::sync::watch;

#[tokio::main]
async fn main() {
    let args = CollectorArgs::from_env();

    if args.version {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        return;
    }

    // Initialize logging
    let log_level = match args.log_level.to_lowercase().as_str() {
        "error" => "error",
        "warn" => "warn",
        "info" => "info",
        "debug" => "debug",
        "trace" => "trace",
        _ => "info",
    };
    let env = env_logger::Env::default().default_filter_or(log_level);
    env_logger::init_from_env(env);

    if let Err(e) = launch(args).await {
        log::error!("collector server run finished with error: {}", e);
        std::process::exit(1);
    }

    log::info!("Collector launcher exiting");
}

async fn launch(args: CollectorArgs) -> Result<(), CollectorError> {
    let factories = Arc::new(builtin_factories()?);
    let locators = args.source_list().into_locators();
    log::info!("Resolving {} configuration sources", locators.len());

    let collector = Collector::build(CollectorSettings::new(factories, locators))?;
    let collector = collector.dry_run()?;

    if args.dry_run {
        println!("{}", collector.graph());
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(());
    ctrlc::set_handler(move || {
        log::info!("Received Ctrl+C, initiating shutdown...");
        let _ = shutdown_tx.send(());
    })?;

    collector.run(shutdown_rx).await?;
    Ok(())
}
