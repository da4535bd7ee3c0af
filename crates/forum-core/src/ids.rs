//! Monotonic identifier allocation.

use crate::domain::{CommentId, PostId};
use crate::error::DomainError;

/// Issues strictly increasing ids for posts and, separately, for comments.
///
/// Ids start at 1 and are never reused. Allocation is checked: once the
/// `i64` space is used up every further call returns `Exhausted` and the
/// allocator is left as it was.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next_post: i64,
    next_comment: i64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::starting_at(1, 1)
    }

    /// Allocator whose next post and comment ids are the given values.
    pub fn starting_at(next_post: PostId, next_comment: CommentId) -> Self {
        Self {
            next_post,
            next_comment,
        }
    }

    pub fn next_post_id(&mut self) -> Result<PostId, DomainError> {
        Self::advance(&mut self.next_post, "posts")
    }

    pub fn next_comment_id(&mut self) -> Result<CommentId, DomainError> {
        Self::advance(&mut self.next_comment, "comments")
    }

    fn advance(counter: &mut i64, space: &'static str) -> Result<i64, DomainError> {
        let id = *counter;
        let next = id.checked_add(1).ok_or(DomainError::Exhausted(space))?;
        *counter = next;
        Ok(id)
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
