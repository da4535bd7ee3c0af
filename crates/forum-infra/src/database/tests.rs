use std::collections::BTreeMap;

use sea_orm::{DatabaseBackend, DatabaseConnection, DbErr, MockDatabase, RuntimeErr, Value};

use forum_core::domain::{CommentScope, NewComment, NewPost};
use forum_core::error::DomainError;
use forum_core::pagination::{CursorCodec, PageRequest};
use forum_core::ports::{ForumStore, ThreadLimit};

use crate::database::entity::{comment, post};
use crate::database::postgres_store::{LEVEL_BATCH_SIZE, PostgresForumStore};

fn post_model(id: i64, locked: bool, has_comments: bool) -> post::Model {
    post::Model {
        id,
        title: "Hello".to_owned(),
        content: "World".to_owned(),
        comments_locked: locked,
        has_comments,
    }
}

fn comment_model(id: i64, post_id: i64, parent_id: Option<i64>) -> comment::Model {
    comment::Model {
        id,
        post_id,
        parent_id,
        content: format!("comment {id}"),
    }
}

fn no_posts() -> Vec<post::Model> {
    Vec::new()
}

fn no_comments() -> Vec<comment::Model> {
    Vec::new()
}

/// Row shape of an id-only select.
fn id_row(id: i64) -> BTreeMap<&'static str, Value> {
    BTreeMap::from([("id", Value::from(id))])
}

fn sequence_exhausted(sequence: &str) -> DbErr {
    DbErr::Query(RuntimeErr::Internal(format!(
        "nextval: reached maximum value of sequence \"{sequence}\" (9223372036854775807)"
    )))
}

fn mock() -> MockDatabase {
    MockDatabase::new(DatabaseBackend::Postgres)
}

fn store(db: DatabaseConnection) -> PostgresForumStore {
    PostgresForumStore::new(db)
}

#[tokio::test]
async fn test_get_post_by_id() {
    let db = mock()
        .append_query_results([vec![post_model(1, false, false)]])
        .into_connection();

    let post = store(db).get_post(1).await.unwrap();
    assert_eq!(post.id, 1);
    assert_eq!(post.title, "Hello");
    assert!(!post.has_comments);
}

#[tokio::test]
async fn test_get_missing_post() {
    let db = mock().append_query_results([no_posts()]).into_connection();

    let err = store(db).get_post(9).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound { entity_type: "post", id: 9 }));
}

#[tokio::test]
async fn test_check_post_exists() {
    // Only the id column is selected.
    let db = mock()
        .append_query_results([vec![id_row(1)]])
        .append_query_results([Vec::<BTreeMap<&str, Value>>::new()])
        .into_connection();
    let store = store(db);

    assert!(store.check_post_exists(1).await.unwrap());
    assert!(!store.check_post_exists(2).await.unwrap());
}

#[tokio::test]
async fn test_list_posts() {
    let db = mock()
        .append_query_results([vec![post_model(1, false, false), post_model(2, true, true)]])
        .into_connection();

    let posts = store(db).list_posts().await.unwrap();
    assert_eq!(posts.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 2]);
    assert!(posts[1].comments_locked);
}

#[tokio::test]
async fn test_create_post_returns_inserted_row() {
    let db = mock()
        .append_query_results([vec![post_model(1, false, false)]])
        .into_connection();

    let post = store(db)
        .create_post(NewPost::new("Hello", "World"))
        .await
        .unwrap();
    assert_eq!(post.id, 1);
    assert_eq!(post.content, "World");
}

#[tokio::test]
async fn test_create_post_validates_before_touching_database() {
    // No results queued: any query would fail the test with a mock error.
    let db = mock().into_connection();

    let err = store(db)
        .create_post(NewPost::new("Hi", "World"))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
}

#[tokio::test]
async fn test_create_post_with_exhausted_sequence() {
    let db = mock()
        .append_query_errors([sequence_exhausted("posts_id_seq")])
        .into_connection();

    let err = store(db)
        .create_post(NewPost::new("Hello", "World"))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Exhausted("posts")));
}

#[tokio::test]
async fn test_create_comment_with_exhausted_sequence() {
    let db = mock()
        .append_query_results([vec![post_model(1, false, false)]])
        .append_query_errors([sequence_exhausted("comments_id_seq")])
        .into_connection();

    let err = store(db)
        .create_comment(NewComment::top_level(1, "one too many"))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Exhausted("comments")));
}

#[tokio::test]
async fn test_other_insert_failures_stay_repository_errors() {
    let db = mock()
        .append_query_errors([DbErr::Query(RuntimeErr::Internal(
            "connection reset".to_owned(),
        ))])
        .into_connection();

    let err = store(db)
        .create_post(NewPost::new("Hello", "World"))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Repository(_)));
}

#[tokio::test]
async fn test_lock_comments_updates_unlocked_post() {
    let db = mock()
        .append_query_results([vec![post_model(1, false, false)]])
        .append_query_results([vec![post_model(1, true, false)]])
        .into_connection();

    let outcome = store(db).lock_comments(1).await.unwrap();
    assert!(outcome.post.comments_locked);
    assert!(outcome.newly_locked);
}

#[tokio::test]
async fn test_lock_comments_is_idempotent() {
    // Already locked: only the row lookup runs.
    let db = mock()
        .append_query_results([vec![post_model(1, true, true)]])
        .into_connection();

    let outcome = store(db).lock_comments(1).await.unwrap();
    assert!(outcome.post.comments_locked);
    assert!(outcome.post.has_comments);
    assert!(!outcome.newly_locked);
}

#[tokio::test]
async fn test_create_comment_on_locked_post() {
    let db = mock()
        .append_query_results([vec![post_model(1, true, false)]])
        .into_connection();

    let err = store(db)
        .create_comment(NewComment::top_level(1, "blocked"))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Locked { post_id: 1 }));
}

#[tokio::test]
async fn test_create_comment_on_missing_post() {
    let db = mock().append_query_results([no_posts()]).into_connection();

    let err = store(db)
        .create_comment(NewComment::top_level(999, "x"))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound { entity_type: "post", id: 999 }));
}

#[tokio::test]
async fn test_create_first_reply_marks_post() {
    let db = mock()
        .append_query_results([vec![post_model(1, false, false)]])
        .append_query_results([vec![comment_model(1, 1, None)]])
        .append_query_results([vec![comment_model(2, 1, Some(1))]])
        .append_query_results([vec![post_model(1, false, true)]])
        .into_connection();

    let comment = store(db)
        .create_comment(NewComment::reply(1, 1, "reply"))
        .await
        .unwrap();
    assert_eq!(comment.id, 2);
    assert_eq!(comment.parent_id, Some(1));
}

#[tokio::test]
async fn test_create_reply_to_comment_of_other_post() {
    let db = mock()
        .append_query_results([vec![post_model(1, false, true)]])
        .append_query_results([vec![comment_model(5, 2, None)]])
        .into_connection();

    let err = store(db)
        .create_comment(NewComment::reply(1, 5, "cross post"))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound { entity_type: "comment", id: 5 }));
}

#[tokio::test]
async fn test_get_thread_assembles_levels() {
    let db = mock()
        .append_query_results([vec![post_model(1, false, true)]])
        // top-level window: limit 1 fetches two rows
        .append_query_results([vec![comment_model(1, 1, None), comment_model(2, 1, None)]])
        .append_query_results([vec![comment_model(3, 1, Some(1)), comment_model(4, 1, Some(1))]])
        .append_query_results([vec![comment_model(5, 1, Some(4))]])
        .append_query_results([no_comments()])
        .into_connection();

    let thread = store(db)
        .get_thread(1, ThreadLimit::new(Some(1)).unwrap())
        .await
        .unwrap();

    assert!(thread.has_more_comments);
    assert_eq!(thread.comments.len(), 1);
    let root = &thread.comments[0];
    assert_eq!(root.comment.id, 1);
    assert_eq!(root.replies.len(), 2);
    assert!(root.replies[0].replies.is_empty());
    assert_eq!(root.replies[1].replies[0].comment.id, 5);
    assert_eq!(root.node_count(), 4);
}

#[tokio::test]
async fn test_wide_level_is_fetched_in_batches() {
    let roots = LEVEL_BATCH_SIZE as i64 + 1;
    let db = mock()
        .append_query_results([vec![post_model(1, false, true)]])
        .append_query_results([(1..=roots)
            .map(|id| comment_model(id, 1, None))
            .collect::<Vec<_>>()])
        // first batch of parents, then the single parent left over
        .append_query_results([vec![comment_model(20_000, 1, Some(3))]])
        .append_query_results([vec![comment_model(10_000, 1, Some(roots))]])
        .append_query_results([no_comments()])
        .into_connection();

    let thread = store(db)
        .get_thread(1, ThreadLimit::new(Some(roots)).unwrap())
        .await
        .unwrap();

    assert!(!thread.has_more_comments);
    assert_eq!(thread.comments.len(), roots as usize);
    assert_eq!(thread.comments[2].replies[0].comment.id, 20_000);
    assert_eq!(thread.comments[roots as usize - 1].replies[0].comment.id, 10_000);
    let total: usize = thread.comments.iter().map(|n| n.node_count()).sum();
    assert_eq!(total, roots as usize + 2);
}

#[tokio::test]
async fn test_children_page_after_cursor() {
    let db = mock()
        // scope parent
        .append_query_results([vec![comment_model(1, 1, None)]])
        // cursor anchor
        .append_query_results([vec![comment_model(2, 1, Some(1))]])
        // window of page_size + 1
        .append_query_results([vec![
            comment_model(3, 1, Some(1)),
            comment_model(4, 1, Some(1)),
            comment_model(6, 1, Some(1)),
        ]])
        // replies below the page
        .append_query_results([no_comments()])
        .into_connection();

    let page = store(db)
        .get_children_page(
            CommentScope::Replies(1),
            PageRequest::first(2).after(CursorCodec::encode(2)),
        )
        .await
        .unwrap();

    assert_eq!(page.nodes.len(), 2);
    assert!(page.page_info.has_next_page);
    assert_eq!(page.page_info.end_cursor, Some(CursorCodec::encode(4)));
}

#[tokio::test]
async fn test_children_page_rejects_cursor_from_other_scope() {
    let db = mock()
        .append_query_results([vec![post_model(1, false, true)]])
        // the anchor is a reply, not a top-level comment
        .append_query_results([vec![comment_model(2, 1, Some(1))]])
        .into_connection();

    let err = store(db)
        .get_children_page(
            CommentScope::Post(1),
            PageRequest::first(2).after(CursorCodec::encode(2)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::InvalidCursor(_)));
}

#[tokio::test]
async fn test_children_page_rejects_bad_page_size() {
    let db = mock().into_connection();

    let err = store(db)
        .get_children_page(CommentScope::Post(1), PageRequest::first(0))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
}
