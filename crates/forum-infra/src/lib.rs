//! # Forum Infrastructure
//!
//! Concrete implementations of the ports defined in `forum-core`:
//! forum stores and event delivery.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external services, in-memory only
//! - `postgres` - PostgreSQL forum store via SeaORM

pub mod database;
pub mod events;
pub mod store;

// Re-exports - In-Memory
pub use events::InMemoryEventBus;
pub use store::InMemoryForumStore;

// Re-exports - PostgreSQL
pub use database::DatabaseConfig;
#[cfg(feature = "postgres")]
pub use database::PostgresForumStore;
