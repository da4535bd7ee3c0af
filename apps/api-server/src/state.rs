//! Application state - shared across all handlers.

use std::sync::Arc;

use forum_core::ForumService;
use forum_core::ports::ForumStore;
use forum_infra::{InMemoryEventBus, InMemoryForumStore};

use crate::config::{AppConfig, StoreBackend};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub forum: ForumService,
}

impl AppState {
    /// Build the application state with the configured store.
    pub async fn new(config: &AppConfig) -> Self {
        let store = build_store(&config.store).await;
        let events = Arc::new(InMemoryEventBus::new(config.event_buffer_size));

        tracing::info!("Application state initialized");

        Self {
            forum: ForumService::new(store, events),
        }
    }

    /// State over a fresh in-memory store.
    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self {
            forum: ForumService::without_events(Arc::new(InMemoryForumStore::new())),
        }
    }
}

#[cfg(feature = "postgres")]
async fn build_store(backend: &StoreBackend) -> Arc<dyn ForumStore> {
    use forum_infra::PostgresForumStore;
    use migration::{Migrator, MigratorTrait};

    let StoreBackend::Postgres(db_config) = backend else {
        tracing::info!("Using in-memory forum store");
        return Arc::new(InMemoryForumStore::new());
    };

    let db = match forum_infra::database::connect(db_config).await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!(
                "Failed to connect to database: {}. Using in-memory fallback.",
                e
            );
            return Arc::new(InMemoryForumStore::new());
        }
    };

    if let Err(e) = Migrator::up(&db, None).await {
        tracing::error!("Failed to run migrations: {}. Using in-memory fallback.", e);
        return Arc::new(InMemoryForumStore::new());
    }

    tracing::info!("Using PostgreSQL forum store");
    Arc::new(PostgresForumStore::new(db))
}

#[cfg(not(feature = "postgres"))]
async fn build_store(backend: &StoreBackend) -> Arc<dyn ForumStore> {
    if matches!(backend, StoreBackend::Postgres(_)) {
        tracing::warn!("Built without postgres feature - using in-memory forum store");
    } else {
        tracing::info!("Using in-memory forum store");
    }
    Arc::new(InMemoryForumStore::new())
}
