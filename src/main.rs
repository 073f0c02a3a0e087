use std::process;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info};

use giveaway_engine::config::Config;
use giveaway_engine::db::JsonStore;
use giveaway_engine::error::Result;
use giveaway_engine::giveaway::{GiveawayEngine, LoggingConcludeHandler};
use giveaway_engine::scheduler::Scheduler;

#[tokio::main]
async fn main() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing_subscriber::fmt().init();
            error!("Invalid configuration: {}", err.to_string());
            process::exit(1);
        }
    };
    tracing_subscriber::fmt()
        .with_max_level(config.log_level())
        .init();

    if let Err(err) = run(config).await {
        error!("Giveaway engine stopped: {}", err.to_string());
        process::exit(1);
    }
}

async fn run(config: Config) -> Result<()> {
    info!("Opening the giveaway storage at {}", config.db_file.display());
    let store = Arc::new(JsonStore::open(&config.db_file)?);
    let engine = GiveawayEngine::new(store).with_handler(Arc::new(LoggingConcludeHandler::new()));
    let scheduler = Scheduler::new(Arc::new(engine), config.sweep_interval);

    let (shutdown_sender, shutdown_receiver) = watch::channel(false);
    let worker = tokio::spawn(async move { scheduler.run(shutdown_receiver).await });

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Got Ctrl-C, shutting down"),
        Err(err) => error!("Can't listen for Ctrl-C, shutting down: {}", err.to_string()),
    }
    // The receiver is gone only if the worker has already stopped.
    let _ = shutdown_sender.send(true);
    if let Err(err) = worker.await {
        error!("The scheduler has crashed: {}", err.to_string());
    }
    Ok(())
}
