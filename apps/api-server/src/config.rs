//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;

use forum_infra::DatabaseConfig;

/// Which `ForumStore` implementation backs the server.
#[derive(Debug, Clone)]
pub enum StoreBackend {
    Memory,
    Postgres(DatabaseConfig),
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub store: StoreBackend,
    pub event_buffer_size: usize,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key lookup.
    ///
    /// `STORE_BACKEND=postgres` without a `DATABASE_URL` falls back to memory.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let store = match lookup("STORE_BACKEND").as_deref().map(str::to_lowercase) {
            Some(backend) if backend == "postgres" => match lookup("DATABASE_URL") {
                Some(url) => {
                    let mut db = DatabaseConfig::new(url);
                    if let Some(max) = parsed(&lookup, "DB_MAX_CONNECTIONS") {
                        db.max_connections = max;
                    }
                    if let Some(min) = parsed(&lookup, "DB_MIN_CONNECTIONS") {
                        db.min_connections = min;
                    }
                    StoreBackend::Postgres(db)
                }
                None => {
                    tracing::warn!("STORE_BACKEND=postgres but DATABASE_URL is not set");
                    StoreBackend::Memory
                }
            },
            _ => StoreBackend::Memory,
        };

        Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parsed(&lookup, "PORT").unwrap_or(8080),
            store,
            event_buffer_size: parsed(&lookup, "EVENT_BUFFER_SIZE").unwrap_or(100),
        }
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.event_buffer_size, 100);
        assert!(matches!(config.store, StoreBackend::Memory));
    }

    #[test]
    fn test_postgres_backend() {
        let config = config(&[
            ("STORE_BACKEND", "Postgres"),
            ("DATABASE_URL", "postgres://localhost/forum"),
            ("DB_MAX_CONNECTIONS", "50"),
        ]);

        match config.store {
            StoreBackend::Postgres(db) => {
                assert_eq!(db.url, "postgres://localhost/forum");
                assert_eq!(db.max_connections, 50);
                assert_eq!(db.min_connections, 2);
            }
            StoreBackend::Memory => panic!("expected postgres backend"),
        }
    }

    #[test]
    fn test_postgres_without_url_uses_memory() {
        let config = config(&[("STORE_BACKEND", "postgres")]);
        assert!(matches!(config.store, StoreBackend::Memory));
    }

    #[test]
    fn test_unparseable_values_fall_back() {
        let config = config(&[("PORT", "http"), ("EVENT_BUFFER_SIZE", "-1")]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.event_buffer_size, 100);
    }
}
