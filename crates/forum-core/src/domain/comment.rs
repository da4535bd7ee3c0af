use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

use super::post::{Post, PostId};
use crate::error::DomainError;

/// Identifier of a comment. Unique across all posts.
pub type CommentId = i64;

pub const COMMENT_CONTENT_MIN_CHARS: usize = 3;
pub const COMMENT_CONTENT_MAX_CHARS: usize = 2000;

/// Comment entity - a top-level comment or a reply to another comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub parent_id: Option<CommentId>,
    pub content: String,
}

/// Arguments for creating a comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub post_id: PostId,
    pub parent_id: Option<CommentId>,
    pub content: String,
}

impl NewComment {
    pub fn top_level(post_id: PostId, content: impl Into<String>) -> Self {
        Self {
            post_id,
            parent_id: None,
            content: content.into(),
        }
    }

    pub fn reply(post_id: PostId, parent_id: CommentId, content: impl Into<String>) -> Self {
        Self {
            post_id,
            parent_id: Some(parent_id),
            content: content.into(),
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let len = self.content.chars().count();
        if len < COMMENT_CONTENT_MIN_CHARS {
            return Err(DomainError::Validation(format!(
                "comment must be at least {COMMENT_CONTENT_MIN_CHARS} characters, got {len}"
            )));
        }
        if len > COMMENT_CONTENT_MAX_CHARS {
            return Err(DomainError::Validation(format!(
                "comment must be at most {COMMENT_CONTENT_MAX_CHARS} characters, got {len}"
            )));
        }
        Ok(())
    }

    pub fn into_comment(self, id: CommentId) -> Comment {
        Comment {
            id,
            post_id: self.post_id,
            parent_id: self.parent_id,
            content: self.content,
        }
    }
}

/// Reply levels rendered below a top-level node when a tree is serialized.
///
/// Deeper replies are cut off and the last rendered node reports
/// `hasMoreReplies`; they stay reachable through the replies page of that node.
pub const MAX_RENDERED_DEPTH: usize = 32;

/// A comment together with its nested replies.
///
/// Trees may be arbitrarily deep, so dropping, cloning and comparing walk the
/// tree with an explicit stack instead of recursing per level.
#[derive(Deserialize)]
pub struct CommentNode {
    #[serde(flatten)]
    pub comment: Comment,
    #[serde(default)]
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    pub fn leaf(comment: Comment) -> Self {
        Self {
            comment,
            replies: Vec::new(),
        }
    }

    /// Number of comments in this subtree, including this one.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.replies.iter());
        }
        count
    }

    /// Pre-order walk of the subtree, each node paired with its depth.
    fn preorder(&self) -> Vec<(usize, &CommentNode)> {
        let mut out = Vec::new();
        let mut stack = vec![(0, self)];
        while let Some((depth, node)) = stack.pop() {
            out.push((depth, node));
            stack.extend(node.replies.iter().rev().map(|r| (depth + 1, r)));
        }
        out
    }
}

impl Drop for CommentNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.replies);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.replies);
        }
    }
}

impl Clone for CommentNode {
    fn clone(&self) -> Self {
        // `open` holds the path from the root to the node being filled.
        let mut open: Vec<CommentNode> = Vec::new();
        for (depth, node) in self.preorder() {
            while open.len() > depth {
                close_last(&mut open);
            }
            open.push(CommentNode {
                comment: node.comment.clone(),
                replies: Vec::with_capacity(node.replies.len()),
            });
        }
        while open.len() > 1 {
            close_last(&mut open);
        }
        open.pop().unwrap_or_else(|| CommentNode::leaf(self.comment.clone()))
    }
}

fn close_last(open: &mut Vec<CommentNode>) {
    if let Some(child) = open.pop() {
        if let Some(parent) = open.last_mut() {
            parent.replies.push(child);
        }
    }
}

impl PartialEq for CommentNode {
    fn eq(&self, other: &Self) -> bool {
        let (left, right) = (self.preorder(), other.preorder());
        left.len() == right.len()
            && left
                .iter()
                .zip(&right)
                .all(|((ld, l), (rd, r))| ld == rd && l.comment == r.comment)
    }
}

impl Eq for CommentNode {}

impl fmt::Debug for CommentNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommentNode")
            .field("comment", &self.comment)
            .field("replies", &self.replies.len())
            .field("subtree", &self.node_count())
            .finish()
    }
}

impl Serialize for CommentNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RenderedNode::new(self, MAX_RENDERED_DEPTH).serialize(serializer)
    }
}

/// Depth-limited serialized view of a node.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RenderedNode<'a> {
    #[serde(flatten)]
    comment: &'a Comment,
    replies: RenderedReplies<'a>,
    has_more_replies: bool,
}

impl<'a> RenderedNode<'a> {
    /// `levels` counts how many reply levels below `node` may still be rendered.
    fn new(node: &'a CommentNode, levels: usize) -> Self {
        let (nodes, has_more_replies) = match levels {
            0 => (&[][..], !node.replies.is_empty()),
            _ => (node.replies.as_slice(), false),
        };
        Self {
            comment: &node.comment,
            replies: RenderedReplies {
                nodes,
                levels: levels.saturating_sub(1),
            },
            has_more_replies,
        }
    }
}

struct RenderedReplies<'a> {
    nodes: &'a [CommentNode],
    levels: usize,
}

impl Serialize for RenderedReplies<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.nodes.iter().map(|n| RenderedNode::new(n, self.levels)))
    }
}

/// A post with a breadth-capped list of top-level comments and their full reply trees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    pub post: Post,
    pub comments: Vec<CommentNode>,
    /// More top-level comments exist beyond the requested limit.
    pub has_more_comments: bool,
}

/// The set of comments a children page is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentScope {
    /// Top-level comments of a post.
    Post(PostId),
    /// Direct replies to a comment.
    Replies(CommentId),
}

impl CommentScope {
    /// Whether `comment` is a direct member of this scope.
    pub fn contains(&self, comment: &Comment) -> bool {
        match *self {
            CommentScope::Post(post_id) => comment.post_id == post_id && comment.parent_id.is_none(),
            CommentScope::Replies(parent_id) => comment.parent_id == Some(parent_id),
        }
    }
}
