//! # Forum Core
//!
//! The domain layer of the forum store.
//! Posts, comment trees, cursor pagination and the storage/event ports.
//! This crate has no infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod ids;
pub mod pagination;
pub mod ports;
pub mod service;
pub mod tree;

pub use error::{DomainError, RepoError};
pub use service::ForumService;
