//! Level-by-level reconstruction of reply trees.
//!
//! Stores fetch a tree breadth-first: the roots, then all children of the
//! roots in one batched lookup, then all grandchildren, and so on until a
//! level comes back empty. The number of lookups is bounded by tree depth,
//! not by the number of comments. `TreeAssembler` collects those levels and
//! links them into nested `CommentNode`s.

use std::collections::HashMap;

use crate::domain::{Comment, CommentId, CommentNode};

#[derive(Debug, Default)]
pub struct TreeAssembler {
    levels: Vec<Vec<Comment>>,
}

impl TreeAssembler {
    /// Start assembly from the root level, in display order.
    pub fn new(roots: Vec<Comment>) -> Self {
        Self {
            levels: vec![roots],
        }
    }

    /// The deepest level collected so far.
    pub fn frontier(&self) -> &[Comment] {
        self.levels.last().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Ids of the frontier comments, i.e. the parents of the next level.
    pub fn frontier_ids(&self) -> Vec<CommentId> {
        self.frontier().iter().map(|c| c.id).collect()
    }

    /// Append the next level. Returns `false` when the level is empty,
    /// signalling that assembly is complete.
    pub fn push_level(&mut self, level: Vec<Comment>) -> bool {
        if level.is_empty() {
            return false;
        }
        self.levels.push(level);
        true
    }

    /// Link levels bottom-up into nested nodes.
    ///
    /// Within each parent, replies keep the order in which they appear in
    /// their level. A comment whose parent is missing from the level above is
    /// not reachable from any root and is dropped.
    pub fn finish(mut self) -> Vec<CommentNode> {
        let mut pending: HashMap<CommentId, Vec<CommentNode>> = HashMap::new();

        while let Some(level) = self.levels.pop() {
            let nodes: Vec<CommentNode> = level
                .into_iter()
                .map(|comment| {
                    let replies = pending.remove(&comment.id).unwrap_or_default();
                    CommentNode { comment, replies }
                })
                .collect();

            if self.levels.is_empty() {
                return nodes;
            }

            pending = HashMap::new();
            for node in nodes {
                if let Some(parent_id) = node.comment.parent_id {
                    pending.entry(parent_id).or_default().push(node);
                }
            }
        }

        Vec::new()
    }
}
