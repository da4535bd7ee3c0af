//! Post handlers.

use actix_web::{HttpResponse, web};

use forum_core::domain::NewPost;
use forum_core::ports::ThreadLimit;
use forum_shared::ApiResponse;
use forum_shared::dto::{CreatePostRequest, PostExistsResponse, ThreadQuery};

use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/posts
pub async fn list_posts(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let posts = state.forum.list_posts().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(posts)))
}

/// POST /api/posts
pub async fn create_post(
    state: web::Data<AppState>,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let mut new_post = NewPost::new(req.title, req.content);
    if let Some(locked) = req.comments_locked {
        new_post = new_post.locked(locked);
    }

    let post = state.forum.create_post(new_post).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(post)))
}

/// GET /api/posts/{id}
pub async fn get_post(state: web::Data<AppState>, path: web::Path<i64>) -> AppResult<HttpResponse> {
    let post = state.forum.get_post(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(post)))
}

/// GET /api/posts/{id}/exists
pub async fn post_exists(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let exists = state.forum.check_post_exists(id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(PostExistsResponse { id, exists })))
}

/// POST /api/posts/{id}/lock
pub async fn lock_comments(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let post = state.forum.lock_comments(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(post)))
}

/// GET /api/posts/{id}/thread?limit=
pub async fn get_thread(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    query: web::Query<ThreadQuery>,
) -> AppResult<HttpResponse> {
    let limit = ThreadLimit::new(query.limit)?;
    let thread = state.forum.get_thread(path.into_inner(), limit).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(thread)))
}
