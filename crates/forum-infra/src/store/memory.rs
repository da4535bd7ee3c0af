//! In-memory forum store.
//!
//! All state sits behind one async `RwLock`: writers hold it exclusively for
//! the whole validate-then-mutate sequence, readers share it and clone what
//! they return. Data is lost on process restart.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use forum_core::domain::{
    Comment, CommentId, CommentNode, CommentScope, NewComment, NewPost, Post, PostId, Thread,
};
use forum_core::error::DomainError;
use forum_core::ids::IdAllocator;
use forum_core::pagination::{Connection, PageRequest, close_window, window_after};
use forum_core::ports::{ForumStore, LockOutcome, ThreadLimit};
use forum_core::tree::TreeAssembler;

struct PostRecord {
    post: Post,
    /// Top-level comment ids in creation order.
    top_level: Vec<CommentId>,
}

struct CommentRecord {
    comment: Comment,
    /// Direct reply ids in creation order.
    children: Vec<CommentId>,
}

#[derive(Default)]
struct ForumState {
    ids: IdAllocator,
    posts: BTreeMap<PostId, PostRecord>,
    comments: HashMap<CommentId, CommentRecord>,
}

impl ForumState {
    fn post(&self, post_id: PostId) -> Result<&PostRecord, DomainError> {
        self.posts
            .get(&post_id)
            .ok_or_else(|| DomainError::post_not_found(post_id))
    }

    fn comment(&self, comment_id: CommentId) -> Result<&CommentRecord, DomainError> {
        self.comments
            .get(&comment_id)
            .ok_or_else(|| DomainError::comment_not_found(comment_id))
    }

    /// Ordered member ids of a scope.
    fn scope_members(&self, scope: CommentScope) -> Result<&[CommentId], DomainError> {
        match scope {
            CommentScope::Post(post_id) => Ok(&self.post(post_id)?.top_level),
            CommentScope::Replies(parent_id) => Ok(&self.comment(parent_id)?.children),
        }
    }

    /// One batched lookup: clone the comments with the given ids, in order.
    fn fetch(&self, ids: &[CommentId]) -> Vec<Comment> {
        ids.iter()
            .filter_map(|id| self.comments.get(id))
            .map(|record| record.comment.clone())
            .collect()
    }

    /// Attach full reply trees to `roots`, one level per lookup.
    fn assemble(&self, roots: Vec<Comment>) -> Vec<CommentNode> {
        let mut tree = TreeAssembler::new(roots);
        loop {
            let child_ids: Vec<CommentId> = tree
                .frontier()
                .iter()
                .filter_map(|c| self.comments.get(&c.id))
                .flat_map(|record| record.children.iter().copied())
                .collect();

            if !tree.push_level(self.fetch(&child_ids)) {
                break;
            }
        }
        tree.finish()
    }
}

/// In-memory implementation of `ForumStore`.
pub struct InMemoryForumStore {
    state: RwLock<ForumState>,
}

impl InMemoryForumStore {
    pub fn new() -> Self {
        Self::with_ids(IdAllocator::new())
    }

    /// Store whose ids are drawn from the given allocator.
    pub fn with_ids(ids: IdAllocator) -> Self {
        Self {
            state: RwLock::new(ForumState {
                ids,
                ..ForumState::default()
            }),
        }
    }
}

impl Default for InMemoryForumStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ForumStore for InMemoryForumStore {
    async fn create_post(&self, new_post: NewPost) -> Result<Post, DomainError> {
        new_post.validate()?;

        let mut state = self.state.write().await;
        let id = state.ids.next_post_id()?;
        let post = new_post.into_post(id);

        state.posts.insert(
            id,
            PostRecord {
                post: post.clone(),
                top_level: Vec::new(),
            },
        );

        tracing::debug!(post_id = id, locked = post.comments_locked, "Post created");
        Ok(post)
    }

    async fn lock_comments(&self, post_id: PostId) -> Result<LockOutcome, DomainError> {
        let mut state = self.state.write().await;
        let record = state
            .posts
            .get_mut(&post_id)
            .ok_or_else(|| DomainError::post_not_found(post_id))?;

        let newly_locked = !record.post.comments_locked;
        if newly_locked {
            record.post.comments_locked = true;
            tracing::debug!(post_id, "Comments locked");
        }

        Ok(LockOutcome {
            post: record.post.clone(),
            newly_locked,
        })
    }

    async fn get_post(&self, post_id: PostId) -> Result<Post, DomainError> {
        let state = self.state.read().await;
        Ok(state.post(post_id)?.post.clone())
    }

    async fn list_posts(&self) -> Result<Vec<Post>, DomainError> {
        let state = self.state.read().await;
        Ok(state.posts.values().map(|r| r.post.clone()).collect())
    }

    async fn check_post_exists(&self, post_id: PostId) -> Result<bool, DomainError> {
        let state = self.state.read().await;
        Ok(state.posts.contains_key(&post_id))
    }

    async fn create_comment(&self, new_comment: NewComment) -> Result<Comment, DomainError> {
        let mut state = self.state.write().await;

        // Every check runs before the first mutation.
        let post = &state.post(new_comment.post_id)?.post;
        if post.comments_locked {
            return Err(DomainError::Locked { post_id: post.id });
        }
        new_comment.validate()?;
        if let Some(parent_id) = new_comment.parent_id {
            let parent = state.comment(parent_id)?;
            if parent.comment.post_id != new_comment.post_id {
                return Err(DomainError::comment_not_found(parent_id));
            }
        }

        let id = state.ids.next_comment_id()?;
        let comment = new_comment.into_comment(id);

        match comment.parent_id {
            Some(parent_id) => {
                if let Some(parent) = state.comments.get_mut(&parent_id) {
                    parent.children.push(id);
                }
            }
            None => {
                if let Some(record) = state.posts.get_mut(&comment.post_id) {
                    record.top_level.push(id);
                }
            }
        }
        if let Some(record) = state.posts.get_mut(&comment.post_id) {
            record.post.has_comments = true;
        }
        state.comments.insert(
            id,
            CommentRecord {
                comment: comment.clone(),
                children: Vec::new(),
            },
        );

        tracing::debug!(
            comment_id = id,
            post_id = comment.post_id,
            parent_id = ?comment.parent_id,
            "Comment created"
        );
        Ok(comment)
    }

    async fn get_thread(&self, post_id: PostId, limit: ThreadLimit) -> Result<Thread, DomainError> {
        let state = self.state.read().await;
        let record = state.post(post_id)?;

        let window = window_after(&record.top_level, None, limit.get())?;
        let has_more_comments = window.len() > limit.get();
        let roots = state.fetch(&window[..window.len().min(limit.get())]);

        Ok(Thread {
            post: record.post.clone(),
            comments: state.assemble(roots),
            has_more_comments,
        })
    }

    async fn get_children_page(
        &self,
        scope: CommentScope,
        page: PageRequest,
    ) -> Result<Connection<CommentNode>, DomainError> {
        let page_size = page.page_size()?;

        let state = self.state.read().await;
        let members = state.scope_members(scope)?;
        let window = window_after(members, page.after_id()?, page_size)?;

        let page = close_window(state.fetch(window), page_size, |c| c.id);
        let nodes = state.assemble(page.nodes);

        Ok(Connection {
            nodes,
            page_info: page.page_info,
        })
    }

    async fn shutdown(&self) -> Result<(), DomainError> {
        tracing::debug!("In-memory store has nothing to release");
        Ok(())
    }
}
