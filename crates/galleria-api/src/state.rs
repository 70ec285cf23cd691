//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use galleria_chat::CompletionClient;
use galleria_core::config::GalleriaConfig;
use galleria_storage::{
    ConversationRepository, Database, MessageRepository, TenantRepository, UserRepository,
};

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks. Repositories
/// are constructed per call; they are stateless handles onto the database.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<GalleriaConfig>,
    /// SQLite database for persistent storage.
    pub database: Arc<Database>,
    /// Completion collaborator client.
    pub completion: Arc<dyn CompletionClient>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        config: GalleriaConfig,
        database: Database,
        completion: Arc<dyn CompletionClient>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            database: Arc::new(database),
            completion,
            start_time: Instant::now(),
        }
    }

    /// The tenant this deployment serves.
    pub fn tenant_id(&self) -> &str {
        &self.config.tenant.id
    }

    pub fn tenants(&self) -> TenantRepository {
        TenantRepository::new(Arc::clone(&self.database))
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(Arc::clone(&self.database))
    }

    pub fn messages(&self) -> MessageRepository {
        MessageRepository::new(Arc::clone(&self.database))
    }

    pub fn conversations(&self) -> ConversationRepository {
        ConversationRepository::new(Arc::clone(&self.database))
    }
}
