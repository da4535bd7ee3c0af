//! Forum store implementations - in-memory, and PostgreSQL via `database`.

mod memory;

pub use memory::InMemoryForumStore;
