//! Ports - trait definitions for storage and event delivery.
//! Infrastructure crates provide the implementations.

mod events;
mod store;

pub use events::{EventPublisher, ForumEvent, NoopEventPublisher, PublishError};
pub use store::{DEFAULT_THREAD_LIMIT, ForumStore, LockOutcome, ThreadLimit};
