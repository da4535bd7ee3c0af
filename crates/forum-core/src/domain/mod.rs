//! Domain entities - posts, comments and the shapes queries return.

mod comment;
mod post;

pub use comment::{
    COMMENT_CONTENT_MAX_CHARS, COMMENT_CONTENT_MIN_CHARS, Comment, CommentId, CommentNode,
    CommentScope, MAX_RENDERED_DEPTH, NewComment, Thread,
};
pub use post::{NewPost, POST_CONTENT_MAX_CHARS, Post, PostId, TITLE_MAX_CHARS, TITLE_MIN_CHARS};
