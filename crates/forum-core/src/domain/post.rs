use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of a post.
pub type PostId = i64;

pub const TITLE_MIN_CHARS: usize = 3;
pub const TITLE_MAX_CHARS: usize = 255;
pub const POST_CONTENT_MAX_CHARS: usize = 2000;

/// Post entity - a discussion topic that comments attach to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub comments_locked: bool,
    pub has_comments: bool,
}

/// Arguments for creating a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub comments_locked: Option<bool>,
}

impl NewPost {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            comments_locked: None,
        }
    }

    pub fn locked(mut self, locked: bool) -> Self {
        self.comments_locked = Some(locked);
        self
    }

    /// Check title and content bounds. Lengths are counted in characters.
    pub fn validate(&self) -> Result<(), DomainError> {
        let title_len = self.title.chars().count();
        if !(TITLE_MIN_CHARS..=TITLE_MAX_CHARS).contains(&title_len) {
            return Err(DomainError::Validation(format!(
                "title must be between {TITLE_MIN_CHARS} and {TITLE_MAX_CHARS} characters, got {title_len}"
            )));
        }

        let content_len = self.content.chars().count();
        if content_len > POST_CONTENT_MAX_CHARS {
            return Err(DomainError::Validation(format!(
                "post content must be at most {POST_CONTENT_MAX_CHARS} characters, got {content_len}"
            )));
        }

        Ok(())
    }

    /// Build the post record for an allocated id.
    pub fn into_post(self, id: PostId) -> Post {
        Post {
            id,
            title: self.title,
            content: self.content,
            comments_locked: self.comments_locked.unwrap_or(false),
            has_comments: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_bounds() {
        assert!(NewPost::new("ab", "").validate().is_err());
        assert!(NewPost::new("abc", "").validate().is_ok());
        assert!(NewPost::new("a".repeat(255), "").validate().is_ok());
        assert!(NewPost::new("a".repeat(256), "").validate().is_err());
    }

    #[test]
    fn test_content_bound_counts_characters() {
        // 2000 multi-byte characters are still within bounds
        let content = "é".repeat(2000);
        assert!(NewPost::new("Hello", content).validate().is_ok());

        let too_long = "x".repeat(2001);
        assert!(matches!(
            NewPost::new("Hello", too_long).validate(),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn test_into_post_defaults_unlocked() {
        let post = NewPost::new("Hello", "World").into_post(7);
        assert_eq!(post.id, 7);
        assert!(!post.comments_locked);
        assert!(!post.has_comments);

        let locked = NewPost::new("Hello", "World").locked(true).into_post(8);
        assert!(locked.comments_locked);
    }
}
