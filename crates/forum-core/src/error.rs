//! Domain-level error types.

use thiserror::Error;

/// Domain errors - every failure a store operation can report to its caller.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: &'static str, id: i64 },

    #[error("Comments are locked on post {post_id}")]
    Locked { post_id: i64 },

    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    #[error("Identifier space exhausted for {0}")]
    Exhausted(&'static str),

    #[error(transparent)]
    Repository(#[from] RepoError),
}

impl DomainError {
    pub fn post_not_found(id: i64) -> Self {
        Self::NotFound {
            entity_type: "post",
            id,
        }
    }

    pub fn comment_not_found(id: i64) -> Self {
        Self::NotFound {
            entity_type: "comment",
            id,
        }
    }
}

/// Repository-level errors raised by durable backends.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Transaction failed: {0}")]
    Transaction(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),
}
