//! # Forum Shared
//!
//! Types exchanged between the forum API and its clients.

pub mod dto;
pub mod response;

pub use response::{ApiResponse, ErrorResponse};
