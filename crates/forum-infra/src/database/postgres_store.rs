//! PostgreSQL forum store.
//!
//! Every write is a single transaction that takes the post row with
//! `SELECT ... FOR UPDATE` before validating, so a racing `lock_comments`
//! cannot slip between the lock check and the insert. Reads run in a
//! repeatable-read, read-only transaction so the several queries behind a
//! thread or page see one snapshot.

use async_trait::async_trait;
use sea_orm::{
    AccessMode, ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseTransaction,
    DbConn, DbErr, EntityTrait, IntoActiveModel, IsolationLevel, NotSet, QueryFilter, QueryOrder,
    QuerySelect, RuntimeErr, Set, TransactionTrait, sqlx,
};

use forum_core::domain::{
    Comment, CommentNode, CommentScope, NewComment, NewPost, Post, PostId, Thread,
};
use forum_core::error::{DomainError, RepoError};
use forum_core::pagination::{Connection, PageRequest, close_window};
use forum_core::ports::{ForumStore, LockOutcome, ThreadLimit};
use forum_core::tree::TreeAssembler;

use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::post::{self, Entity as PostEntity};

/// PostgreSQL implementation of `ForumStore`.
pub struct PostgresForumStore {
    db: DbConn,
}

impl PostgresForumStore {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    async fn begin_write(&self) -> Result<DatabaseTransaction, RepoError> {
        self.db.begin().await.map_err(transaction_err)
    }

    async fn begin_read(&self) -> Result<DatabaseTransaction, RepoError> {
        self.db
            .begin_with_config(
                Some(IsolationLevel::RepeatableRead),
                Some(AccessMode::ReadOnly),
            )
            .await
            .map_err(transaction_err)
    }
}

fn query_err(e: DbErr) -> RepoError {
    RepoError::Query(e.to_string())
}

fn transaction_err(e: DbErr) -> RepoError {
    RepoError::Transaction(e.to_string())
}

/// SQLSTATE raised by `nextval` once a sequence has reached its maximum.
const SEQUENCE_EXHAUSTED: &str = "2200H";

/// Parent ids bound per `parent_id IN (...)` statement; keeps each level
/// query well below the driver's bind parameter limit.
pub(crate) const LEVEL_BATCH_SIZE: usize = 5_000;

fn is_sequence_exhausted(e: &DbErr) -> bool {
    let code = match e {
        DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(db)))
        | DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(db))) => {
            db.code().map(|c| c.into_owned())
        }
        _ => None,
    };
    code.as_deref() == Some(SEQUENCE_EXHAUSTED)
        || e.to_string().contains("reached maximum value of sequence")
}

/// Map an insert failure; an exhausted id sequence becomes `Exhausted(space)`.
fn insert_err(space: &'static str) -> impl Fn(DbErr) -> DomainError {
    move |e| {
        if is_sequence_exhausted(&e) {
            return DomainError::Exhausted(space);
        }
        let err_str = e.to_string();
        if err_str.contains("foreign key") || err_str.contains("violates") {
            RepoError::Constraint(err_str).into()
        } else {
            RepoError::Query(err_str).into()
        }
    }
}

fn scope_condition(scope: CommentScope) -> Condition {
    match scope {
        CommentScope::Post(post_id) => Condition::all()
            .add(comment::Column::PostId.eq(post_id))
            .add(comment::Column::ParentId.is_null()),
        CommentScope::Replies(parent_id) => {
            Condition::all().add(comment::Column::ParentId.eq(parent_id))
        }
    }
}

async fn find_post<C: ConnectionTrait>(conn: &C, post_id: PostId) -> Result<post::Model, DomainError> {
    PostEntity::find_by_id(post_id)
        .one(conn)
        .await
        .map_err(query_err)?
        .ok_or_else(|| DomainError::post_not_found(post_id))
}

/// Attach full reply trees to `roots`, one `parent_id IN (...)` lookup per
/// level, split into batches of `LEVEL_BATCH_SIZE` parents.
async fn assemble<C: ConnectionTrait>(
    conn: &C,
    roots: Vec<Comment>,
) -> Result<Vec<CommentNode>, DomainError> {
    let mut tree = TreeAssembler::new(roots);
    loop {
        let parent_ids = tree.frontier_ids();
        if parent_ids.is_empty() {
            break;
        }

        let mut level: Vec<Comment> = Vec::new();
        for batch in parent_ids.chunks(LEVEL_BATCH_SIZE) {
            let rows = CommentEntity::find()
                .filter(comment::Column::ParentId.is_in(batch.iter().copied()))
                .order_by_asc(comment::Column::Id)
                .all(conn)
                .await
                .map_err(query_err)?;
            level.extend(rows.into_iter().map(Comment::from));
        }
        level.sort_unstable_by_key(|c| c.id);

        if !tree.push_level(level) {
            break;
        }
    }
    Ok(tree.finish())
}

#[async_trait]
impl ForumStore for PostgresForumStore {
    async fn create_post(&self, new_post: NewPost) -> Result<Post, DomainError> {
        new_post.validate()?;

        let txn = self.begin_write().await?;
        let model = post::ActiveModel {
            id: NotSet,
            title: Set(new_post.title),
            content: Set(new_post.content),
            comments_locked: Set(new_post.comments_locked.unwrap_or(false)),
            has_comments: Set(false),
        }
        .insert(&txn)
        .await
        .map_err(insert_err("posts"))?;
        txn.commit().await.map_err(transaction_err)?;

        tracing::debug!(post_id = model.id, "Post created");
        Ok(model.into())
    }

    async fn lock_comments(&self, post_id: PostId) -> Result<LockOutcome, DomainError> {
        let txn = self.begin_write().await?;
        let model = PostEntity::find_by_id(post_id)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(query_err)?
            .ok_or_else(|| DomainError::post_not_found(post_id))?;

        if model.comments_locked {
            txn.commit().await.map_err(transaction_err)?;
            return Ok(LockOutcome {
                post: model.into(),
                newly_locked: false,
            });
        }

        let mut active = model.into_active_model();
        active.comments_locked = Set(true);
        let updated = active.update(&txn).await.map_err(query_err)?;
        txn.commit().await.map_err(transaction_err)?;

        tracing::debug!(post_id, "Comments locked");
        Ok(LockOutcome {
            post: updated.into(),
            newly_locked: true,
        })
    }

    async fn get_post(&self, post_id: PostId) -> Result<Post, DomainError> {
        Ok(find_post(&self.db, post_id).await?.into())
    }

    async fn list_posts(&self) -> Result<Vec<Post>, DomainError> {
        let posts = PostEntity::find()
            .order_by_asc(post::Column::Id)
            .all(&self.db)
            .await
            .map_err(query_err)?;

        Ok(posts.into_iter().map(Into::into).collect())
    }

    async fn check_post_exists(&self, post_id: PostId) -> Result<bool, DomainError> {
        let found = PostEntity::find_by_id(post_id)
            .select_only()
            .column(post::Column::Id)
            .into_tuple::<i64>()
            .one(&self.db)
            .await
            .map_err(query_err)?;
        Ok(found.is_some())
    }

    async fn create_comment(&self, new_comment: NewComment) -> Result<Comment, DomainError> {
        let txn = self.begin_write().await?;

        // Dropping `txn` on any early return rolls the transaction back.
        let post = PostEntity::find_by_id(new_comment.post_id)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(query_err)?
            .ok_or_else(|| DomainError::post_not_found(new_comment.post_id))?;

        if post.comments_locked {
            return Err(DomainError::Locked { post_id: post.id });
        }
        new_comment.validate()?;

        if let Some(parent_id) = new_comment.parent_id {
            let parent = CommentEntity::find_by_id(parent_id)
                .one(&txn)
                .await
                .map_err(query_err)?;
            match parent {
                Some(parent) if parent.post_id == post.id => {}
                _ => return Err(DomainError::comment_not_found(parent_id)),
            }
        }

        let model = comment::ActiveModel {
            id: NotSet,
            post_id: Set(new_comment.post_id),
            parent_id: Set(new_comment.parent_id),
            content: Set(new_comment.content),
        }
        .insert(&txn)
        .await
        .map_err(insert_err("comments"))?;

        if !post.has_comments {
            let mut active = post.into_active_model();
            active.has_comments = Set(true);
            active.update(&txn).await.map_err(query_err)?;
        }
        txn.commit().await.map_err(transaction_err)?;

        tracing::debug!(
            comment_id = model.id,
            post_id = model.post_id,
            parent_id = ?model.parent_id,
            "Comment created"
        );
        Ok(model.into())
    }

    async fn get_thread(&self, post_id: PostId, limit: ThreadLimit) -> Result<Thread, DomainError> {
        let txn = self.begin_read().await?;
        let post = find_post(&txn, post_id).await?;

        let mut roots = CommentEntity::find()
            .filter(scope_condition(CommentScope::Post(post_id)))
            .order_by_asc(comment::Column::Id)
            .limit((limit.get() as u64).saturating_add(1))
            .all(&txn)
            .await
            .map_err(query_err)?;

        let has_more_comments = roots.len() > limit.get();
        roots.truncate(limit.get());

        let comments = assemble(&txn, roots.into_iter().map(Into::into).collect()).await?;
        txn.commit().await.map_err(transaction_err)?;

        Ok(Thread {
            post: post.into(),
            comments,
            has_more_comments,
        })
    }

    async fn get_children_page(
        &self,
        scope: CommentScope,
        page: PageRequest,
    ) -> Result<Connection<CommentNode>, DomainError> {
        let page_size = page.page_size()?;

        let txn = self.begin_read().await?;
        match scope {
            CommentScope::Post(post_id) => {
                find_post(&txn, post_id).await?;
            }
            CommentScope::Replies(parent_id) => {
                CommentEntity::find_by_id(parent_id)
                    .one(&txn)
                    .await
                    .map_err(query_err)?
                    .ok_or_else(|| DomainError::comment_not_found(parent_id))?;
            }
        }

        let mut query = CommentEntity::find().filter(scope_condition(scope));
        if let Some(after) = page.after_id()? {
            let anchor: Option<Comment> = CommentEntity::find_by_id(after)
                .one(&txn)
                .await
                .map_err(query_err)?
                .map(Into::into);
            if !anchor.is_some_and(|c| scope.contains(&c)) {
                return Err(DomainError::InvalidCursor(format!(
                    "comment {after} is not part of this listing"
                )));
            }
            query = query.filter(comment::Column::Id.gt(after));
        }

        let fetched: Vec<Comment> = query
            .order_by_asc(comment::Column::Id)
            .limit((page_size as u64).saturating_add(1))
            .all(&txn)
            .await
            .map_err(query_err)?
            .into_iter()
            .map(Into::into)
            .collect();

        let window = close_window(fetched, page_size, |c| c.id);
        let nodes = assemble(&txn, window.nodes).await?;
        txn.commit().await.map_err(transaction_err)?;

        Ok(Connection {
            nodes,
            page_info: window.page_info,
        })
    }

    async fn shutdown(&self) -> Result<(), DomainError> {
        self.db
            .close_by_ref()
            .await
            .map_err(|e| RepoError::Connection(e.to_string()))?;
        tracing::info!("Forum database connections closed");
        Ok(())
    }
}
