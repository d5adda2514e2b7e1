pub mod cli;
pub mod core;
pub mod providers;
pub mod scheduler;
pub mod store;

use crate::core::config::AppConfig;
use crate::core::{KeyValueStorage, QuoteCache, SystemClock};
use crate::providers::AwesomeApiSource;
use crate::scheduler::QuoteScheduler;
use crate::store::{DiskStorage, MemoryStorage};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub enum AppCommand {
    Show,
    Watch,
    Refresh,
    Clear,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("quotewatch starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load_or_default()?,
    };
    debug!("Loaded config: {config:#?}");

    let cache = QuoteCache::new(open_storage(&config), Arc::new(SystemClock), config.cache_ttl());

    match command {
        AppCommand::Show => cli::quotes::show(&build_scheduler(&config, cache)?, false).await,
        AppCommand::Refresh => cli::quotes::show(&build_scheduler(&config, cache)?, true).await,
        AppCommand::Watch => cli::quotes::watch(&build_scheduler(&config, cache)?).await,
        AppCommand::Clear => {
            cache.clear();
            println!("Quote cache cleared");
            Ok(())
        }
    }
}

fn build_scheduler(config: &AppConfig, cache: QuoteCache) -> Result<QuoteScheduler> {
    let source = AwesomeApiSource::from_config(config)?;
    Ok(QuoteScheduler::new(
        Arc::new(source),
        cache,
        config.initial_quotes(),
    ))
}

/// Opens the persistent cache storage. An unavailable disk cache degrades to an
/// in-memory one rather than failing the command.
fn open_storage(config: &AppConfig) -> Arc<dyn KeyValueStorage> {
    match config
        .default_data_path()
        .and_then(|path| DiskStorage::open(&path))
    {
        Ok(storage) => Arc::new(storage),
        Err(e) => {
            warn!(error = ?e, "Persistent cache unavailable, falling back to memory");
            Arc::new(MemoryStorage::new())
        }
    }
}
