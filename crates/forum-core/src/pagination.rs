//! Cursor-based pagination over creation-ordered comment ids.
//!
//! A cursor means "everything up to and including this comment has been
//! consumed". Pages are produced by fetching one item more than requested and
//! trimming, which answers `has_next_page` without a separate count query.

use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};

use crate::domain::CommentId;
use crate::error::DomainError;

/// Page size used when the caller does not specify one.
pub const DEFAULT_PAGE_SIZE: usize = 10;

const CURSOR_PREFIX: &str = "comment:";

/// Opaque cursor encoding: base64("comment:<id>").
pub struct CursorCodec;

impl CursorCodec {
    pub fn encode(id: CommentId) -> String {
        general_purpose::STANDARD.encode(format!("{CURSOR_PREFIX}{id}"))
    }

    pub fn decode(cursor: &str) -> Result<CommentId, DomainError> {
        let bytes = general_purpose::STANDARD
            .decode(cursor)
            .map_err(|e| DomainError::InvalidCursor(format!("not base64: {e}")))?;

        let text = String::from_utf8(bytes)
            .map_err(|_| DomainError::InvalidCursor("not valid UTF-8".to_string()))?;

        let id = text
            .strip_prefix(CURSOR_PREFIX)
            .ok_or_else(|| DomainError::InvalidCursor("unknown cursor format".to_string()))?
            .parse::<CommentId>()
            .map_err(|e| DomainError::InvalidCursor(format!("bad comment id: {e}")))?;

        if id <= 0 {
            return Err(DomainError::InvalidCursor(format!("bad comment id: {id}")));
        }
        Ok(id)
    }
}

/// Pagination arguments as supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    /// Number of items to return (default: 10).
    pub first: Option<i64>,
    /// Cursor to resume after.
    pub after: Option<String>,
}

impl PageRequest {
    pub fn new(first: Option<i64>, after: Option<String>) -> Self {
        Self { first, after }
    }

    pub fn first(first: i64) -> Self {
        Self::new(Some(first), None)
    }

    pub fn after(mut self, cursor: impl Into<String>) -> Self {
        self.after = Some(cursor.into());
        self
    }

    /// Effective page size; zero or negative sizes are rejected.
    pub fn page_size(&self) -> Result<usize, DomainError> {
        match self.first {
            None => Ok(DEFAULT_PAGE_SIZE),
            Some(n) if n <= 0 => Err(DomainError::Validation(format!(
                "page size must be positive, got {n}"
            ))),
            Some(n) => usize::try_from(n)
                .map_err(|_| DomainError::Validation(format!("page size {n} is too large"))),
        }
    }

    /// Decoded `after` cursor, if any. Scope membership is checked by the store.
    pub fn after_id(&self) -> Result<Option<CommentId>, DomainError> {
        self.after.as_deref().map(CursorCodec::decode).transpose()
    }
}

/// Pagination metadata for a page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

/// A page of ordered items plus pagination metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<T> {
    pub nodes: Vec<T>,
    pub page_info: PageInfo,
}

/// Trim a window fetched with up to `page_size + 1` items into a page.
///
/// `key` extracts the ordering id of an item; the last kept item becomes the
/// end cursor whenever the page is non-empty.
pub fn close_window<T>(
    mut fetched: Vec<T>,
    page_size: usize,
    key: impl Fn(&T) -> CommentId,
) -> Connection<T> {
    let has_next_page = fetched.len() > page_size;
    fetched.truncate(page_size);
    let end_cursor = fetched.last().map(|item| CursorCodec::encode(key(item)));

    Connection {
        nodes: fetched,
        page_info: PageInfo {
            has_next_page,
            end_cursor,
        },
    }
}

/// Select the fetch window from an ascending list of scope member ids.
///
/// Returns at most `page_size + 1` ids strictly after `after`. A cursor that
/// is not a member of `ordered` is rejected.
pub fn window_after(
    ordered: &[CommentId],
    after: Option<CommentId>,
    page_size: usize,
) -> Result<&[CommentId], DomainError> {
    let start = match after {
        None => 0,
        Some(id) => {
            let pos = ordered.binary_search(&id).map_err(|_| {
                DomainError::InvalidCursor(format!("comment {id} is not part of this listing"))
            })?;
            pos + 1
        }
    };

    let end = start.saturating_add(page_size.saturating_add(1)).min(ordered.len());
    Ok(&ordered[start..end])
}
