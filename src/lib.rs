pub mod cli;
pub mod core;
pub mod providers;
pub mod service;
pub mod store;

use crate::core::config::AppConfig;
use crate::core::{Clock, SystemClock};
use crate::service::RateService;
use crate::store::{DiskStore, KeyValueStore};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Rates { json: bool },
    Status,
    ClearCache,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Metal rates starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let data_path = config.default_data_path()?;
    let store: Arc<dyn KeyValueStore> = Arc::new(
        DiskStore::open(&data_path)
            .with_context(|| format!("Failed to open data store at {}", data_path.display()))?,
    );
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new(config.utc_offset()?));
    let service = RateService::new(store, clock, &config)?;

    match command {
        AppCommand::Rates { json } => cli::rates::run(&service, json).await,
        AppCommand::Status => cli::status::run(&service).await,
        AppCommand::ClearCache => cli::status::clear_cache(&service).await,
    }
}
