//! Storage port - the contract every forum backend implements.

use async_trait::async_trait;

use crate::domain::{Comment, CommentNode, CommentScope, NewComment, NewPost, Post, PostId, Thread};
use crate::error::DomainError;
use crate::pagination::{Connection, PageRequest};

/// Number of top-level comments `get_thread` returns when no limit is given.
pub const DEFAULT_THREAD_LIMIT: usize = 10;

/// Breadth cap for `get_thread`. Only top-level comments count against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadLimit(usize);

impl ThreadLimit {
    /// Validate a caller-supplied limit; `None` selects the default.
    pub fn new(limit: Option<i64>) -> Result<Self, DomainError> {
        match limit {
            None => Ok(Self(DEFAULT_THREAD_LIMIT)),
            Some(n) if n <= 0 => Err(DomainError::Validation(format!(
                "thread limit must be positive, got {n}"
            ))),
            Some(n) => usize::try_from(n)
                .map(Self)
                .map_err(|_| DomainError::Validation(format!("thread limit {n} is too large"))),
        }
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for ThreadLimit {
    fn default() -> Self {
        Self(DEFAULT_THREAD_LIMIT)
    }
}

/// Result of `ForumStore::lock_comments`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockOutcome {
    pub post: Post,
    /// False when the post was already locked and nothing changed.
    pub newly_locked: bool,
}

/// Forum storage - posts, comments and the tree/page queries over them.
///
/// Writes validate and mutate atomically: a failed write leaves no trace.
/// Reads return owned copies that later writes cannot affect.
#[async_trait]
pub trait ForumStore: Send + Sync {
    /// Create a post. Fails with `Validation` on title/content bounds.
    async fn create_post(&self, new_post: NewPost) -> Result<Post, DomainError>;

    /// Lock a post against new comments. Locking twice is not an error.
    async fn lock_comments(&self, post_id: PostId) -> Result<LockOutcome, DomainError>;

    async fn get_post(&self, post_id: PostId) -> Result<Post, DomainError>;

    /// All posts, ascending by id.
    async fn list_posts(&self) -> Result<Vec<Post>, DomainError>;

    /// Existence check that does not fetch post content.
    async fn check_post_exists(&self, post_id: PostId) -> Result<bool, DomainError>;

    /// Create a top-level comment or a reply.
    async fn create_comment(&self, new_comment: NewComment) -> Result<Comment, DomainError>;

    /// A post with up to `limit` top-level comments and their complete reply trees.
    async fn get_thread(&self, post_id: PostId, limit: ThreadLimit) -> Result<Thread, DomainError>;

    /// A page of the scope's direct children, each with its reply tree.
    async fn get_children_page(
        &self,
        scope: CommentScope,
        page: PageRequest,
    ) -> Result<Connection<CommentNode>, DomainError>;

    /// Release backend resources at process teardown.
    async fn shutdown(&self) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_limit() {
        assert_eq!(ThreadLimit::new(None).unwrap().get(), 10);
        assert_eq!(ThreadLimit::new(Some(1)).unwrap().get(), 1);
        assert!(matches!(
            ThreadLimit::new(Some(0)),
            Err(DomainError::Validation(_))
        ));
    }
}
