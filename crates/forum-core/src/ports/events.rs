//! Event publishing port - fan-out of successful writes to interested parties.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Comment, Post, PostId};

/// A change that has been committed to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ForumEvent {
    CommentCreated { comment: Comment },
    CommentsLocked { post: Post },
}

impl ForumEvent {
    /// The post this event belongs to. Subscribers are keyed by post.
    pub fn post_id(&self) -> PostId {
        match self {
            ForumEvent::CommentCreated { comment } => comment.post_id,
            ForumEvent::CommentsLocked { post } => post.id,
        }
    }
}

/// Publisher trait - abstraction over event delivery backends.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: ForumEvent) -> Result<(), PublishError>;
}

/// Publisher that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventPublisher;

#[async_trait]
impl EventPublisher for NoopEventPublisher {
    async fn publish(&self, _event: ForumEvent) -> Result<(), PublishError> {
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Failed to publish: {0}")]
    Publish(String),
}
