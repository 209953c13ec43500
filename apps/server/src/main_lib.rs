use std::sync::Arc;

use crate::config::Config;
use anyhow::Context;
use gemledger_core::{
    ledger::{LedgerService, LedgerServiceTrait},
    partitions::TopologyRegistry,
    settings::{SettingsService, SettingsServiceTrait},
    tabs::TabResolver,
};
use gemledger_storage_sqlite::{
    db::{self, spawn_writer},
    partitions::PartitionRepository,
    settings::SettingsRepository,
};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub struct AppState {
    pub ledger_service: Arc<dyn LedgerServiceTrait>,
    pub settings_service: Arc<dyn SettingsServiceTrait>,
    pub tab_resolver: TabResolver,
}

pub fn init_tracing() {
    let log_format = std::env::var("GL_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

fn load_topologies(config: &Config) -> anyhow::Result<TopologyRegistry> {
    match &config.topology_file {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read topology file {}", path))?;
            let registry = TopologyRegistry::from_json(&raw)?;
            tracing::info!(
                "Loaded {} topolog(ies) from {}",
                registry.topologies().len(),
                path
            );
            Ok(registry)
        }
        None => Ok(TopologyRegistry::builtin()),
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let db_path = db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = spawn_writer((*pool).clone());

    let partition_repo = Arc::new(PartitionRepository::new(pool.clone(), writer.clone()));
    let settings_repo = Arc::new(SettingsRepository::new(pool.clone(), writer.clone()));
    let settings_service: Arc<dyn SettingsServiceTrait> = Arc::new(SettingsService::new(
        settings_repo,
        partition_repo.clone(),
    ));
    tracing::info!(
        "Base currency: {}",
        settings_service.get_base_currency()?
    );

    let tab_resolver = TabResolver::new(Arc::new(load_topologies(config)?));
    let ledger_service: Arc<dyn LedgerServiceTrait> = Arc::new(LedgerService::new(
        partition_repo,
        tab_resolver.clone(),
        settings_service.clone(),
    ));

    Ok(Arc::new(AppState {
        ledger_service,
        settings_service,
        tab_resolver,
    }))
}
