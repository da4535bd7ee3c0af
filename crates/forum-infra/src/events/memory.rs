//! In-memory event bus.
//!
//! Keeps one broadcast channel per post. Works within a single process only;
//! events published while a post has no subscribers are dropped.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{RwLock, broadcast};

use forum_core::domain::PostId;
use forum_core::ports::{EventPublisher, ForumEvent, PublishError};

/// Per-post broadcast registry implementing `EventPublisher`.
pub struct InMemoryEventBus {
    channels: Arc<RwLock<HashMap<PostId, broadcast::Sender<ForumEvent>>>>,
    buffer_size: usize,
}

impl InMemoryEventBus {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            buffer_size: buffer_size.max(1),
        }
    }

    /// Receive every event published for `post_id` from now on.
    pub async fn subscribe(&self, post_id: PostId) -> broadcast::Receiver<ForumEvent> {
        let mut channels = self.channels.write().await;
        let sender = channels
            .entry(post_id)
            .or_insert_with(|| broadcast::channel(self.buffer_size).0);

        tracing::debug!(post_id, "Subscribed to post events");
        sender.subscribe()
    }

    /// Drop the channel for `post_id`; existing receivers see it closed.
    pub async fn unsubscribe(&self, post_id: PostId) {
        if self.channels.write().await.remove(&post_id).is_some() {
            tracing::debug!(post_id, "Post event channel closed");
        }
    }

    pub async fn subscriber_count(&self, post_id: PostId) -> usize {
        self.channels
            .read()
            .await
            .get(&post_id)
            .map(|s| s.receiver_count())
            .unwrap_or(0)
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new(100)
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: ForumEvent) -> Result<(), PublishError> {
        let post_id = event.post_id();
        let mut channels = self.channels.write().await;

        let Some(sender) = channels.get(&post_id) else {
            tracing::debug!(post_id, "No subscribers for post");
            return Ok(());
        };

        // Every receiver has been dropped: forget the channel.
        if sender.receiver_count() == 0 {
            channels.remove(&post_id);
            tracing::debug!(post_id, "Pruned post event channel");
            return Ok(());
        }

        let delivered = sender.send(event).unwrap_or(0);
        tracing::debug!(post_id, delivered, "Event published");
        Ok(())
    }
}
