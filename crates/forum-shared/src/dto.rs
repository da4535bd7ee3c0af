//! Data Transfer Objects - request/response types for the API.

use serde::{Deserialize, Serialize};

/// Request to create a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub comments_locked: Option<bool>,
}

/// Request to create a comment on a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    #[serde(default)]
    pub parent_id: Option<i64>,
    pub content: String,
}

/// Query string for a thread.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThreadQuery {
    pub limit: Option<i64>,
}

/// Query string for a page of comments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageQuery {
    pub first: Option<i64>,
    pub after: Option<String>,
}

/// Response of the post existence check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostExistsResponse {
    pub id: i64,
    pub exists: bool,
}
