//! SeaORM entities for the persisted layout.

pub mod comment;
pub mod post;
