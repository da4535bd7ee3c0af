//! Forum service - the entry point the transport layer talks to.
//!
//! Delegates every operation to a `ForumStore` and, after a write has
//! committed, hands the resulting event to an `EventPublisher`. Delivery
//! failures are logged; they never undo or fail a committed write.

use std::sync::Arc;

use crate::domain::{Comment, CommentNode, CommentScope, NewComment, NewPost, Post, PostId, Thread};
use crate::error::DomainError;
use crate::pagination::{Connection, PageRequest};
use crate::ports::{EventPublisher, ForumEvent, ForumStore, NoopEventPublisher, ThreadLimit};

#[derive(Clone)]
pub struct ForumService {
    store: Arc<dyn ForumStore>,
    events: Arc<dyn EventPublisher>,
}

impl ForumService {
    pub fn new(store: Arc<dyn ForumStore>, events: Arc<dyn EventPublisher>) -> Self {
        Self { store, events }
    }

    /// Service without event fan-out.
    pub fn without_events(store: Arc<dyn ForumStore>) -> Self {
        Self::new(store, Arc::new(NoopEventPublisher))
    }

    pub async fn create_post(&self, new_post: NewPost) -> Result<Post, DomainError> {
        self.store.create_post(new_post).await
    }

    /// Lock a post. `CommentsLocked` is published only by the call that
    /// actually flipped the lock.
    pub async fn lock_comments(&self, post_id: PostId) -> Result<Post, DomainError> {
        let outcome = self.store.lock_comments(post_id).await?;
        if outcome.newly_locked {
            self.publish(ForumEvent::CommentsLocked {
                post: outcome.post.clone(),
            })
            .await;
        }
        Ok(outcome.post)
    }

    pub async fn get_post(&self, post_id: PostId) -> Result<Post, DomainError> {
        self.store.get_post(post_id).await
    }

    pub async fn list_posts(&self) -> Result<Vec<Post>, DomainError> {
        self.store.list_posts().await
    }

    pub async fn check_post_exists(&self, post_id: PostId) -> Result<bool, DomainError> {
        self.store.check_post_exists(post_id).await
    }

    pub async fn create_comment(&self, new_comment: NewComment) -> Result<Comment, DomainError> {
        let comment = self.store.create_comment(new_comment).await?;
        self.publish(ForumEvent::CommentCreated {
            comment: comment.clone(),
        })
        .await;
        Ok(comment)
    }

    pub async fn get_thread(&self, post_id: PostId, limit: ThreadLimit) -> Result<Thread, DomainError> {
        self.store.get_thread(post_id, limit).await
    }

    pub async fn get_children_page(
        &self,
        scope: CommentScope,
        page: PageRequest,
    ) -> Result<Connection<CommentNode>, DomainError> {
        self.store.get_children_page(scope, page).await
    }

    pub async fn shutdown(&self) -> Result<(), DomainError> {
        self.store.shutdown().await
    }

    async fn publish(&self, event: ForumEvent) {
        let post_id = event.post_id();
        if let Err(e) = self.events.publish(event).await {
            tracing::warn!(post_id, error = %e, "Failed to publish forum event");
        }
    }
}
