use std::sync::Arc;

use compliance::ComplianceConfig;
use gateway::config::GatewayConfig;
use gateway::{create_router, AppState};
use persistence::{MemoryStore, PgStore, Store};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("Starting Gateway API service");

    let config = GatewayConfig::from_env()?;

    let compliance_config = match &config.compliance_config_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading compliance config");
            ComplianceConfig::from_file(path)?
        }
        None => ComplianceConfig::default(),
    }
    .with_env(|key| std::env::var(key).ok());

    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            let store = PgStore::connect(url, config.db_max_connections).await?;
            store.migrate().await?;
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store");
            Arc::new(MemoryStore::with_default_limits())
        }
    };

    let app = create_router(AppState::new(store, compliance_config));

    let listener = TcpListener::bind(config.addr).await?;
    tracing::info!("Listening on {}", config.addr);
    axum::serve(listener, app).await?;

    Ok(())
}
