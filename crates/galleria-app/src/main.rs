//! Galleria application binary - composition root.
//!
//! Ties the workspace crates into a single executable:
//! 1. Load configuration from TOML
//! 2. Open the SQLite store and run migrations
//! 3. Provision the tenant idempotently
//! 4. Build the completion collaborator client
//! 5. Start the axum API server

use std::path::PathBuf;
use std::sync::Arc;

use galleria_api::{routes, AppState};
use galleria_chat::AzureCompletionClient;
use galleria_core::config::GalleriaConfig;
use galleria_storage::Database;

/// Resolve the config file path (GALLERIA_CONFIG env, or ./galleria.toml).
fn config_path() -> PathBuf {
    std::env::var("GALLERIA_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("galleria.toml"))
}

/// Apply environment overrides for secrets so keys can stay out of the
/// config file.
fn apply_env_overrides(config: &mut GalleriaConfig) {
    if let Ok(key) = std::env::var("GALLERIA_COMPLETION_KEY") {
        config.completion.api_key = key;
    }
    if let Ok(key) = std::env::var("GALLERIA_SEARCH_KEY") {
        config.retrieval.api_key = key;
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting Galleria v{}", env!("CARGO_PKG_VERSION"));

    let config_file = config_path();
    let mut config = GalleriaConfig::load_or_default(&config_file);
    apply_env_overrides(&mut config);
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    let data_dir = PathBuf::from(&config.general.data_dir);
    std::fs::create_dir_all(&data_dir)?;

    let db_path = data_dir.join("galleria.db");
    let db = Database::new(&db_path)?;
    tracing::info!(path = %db_path.display(), "SQLite database opened");

    if config.completion.endpoint.is_empty() {
        tracing::warn!("No completion endpoint configured; replies will fail until one is set");
    }
    let completion = Arc::new(AzureCompletionClient::new(
        config.completion.clone(),
        config.retrieval.clone(),
        config.chat.system_prompt.clone(),
    ));

    let state = AppState::new(config, db, completion);

    // Tenant provisioning runs on every start; existing rows win.
    state
        .tenants()
        .provision(&state.config.tenant.to_tenant())?;
    tracing::info!(tenant = %state.tenant_id(), "Tenant provisioned");

    routes::start_server(state).await?;

    Ok(())
}
