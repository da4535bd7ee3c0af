//! Comment handlers.

use actix_web::{HttpResponse, web};

use forum_core::domain::{CommentScope, NewComment};
use forum_core::pagination::PageRequest;
use forum_shared::ApiResponse;
use forum_shared::dto::{CreateCommentRequest, PageQuery};

use crate::middleware::error::AppResult;
use crate::state::AppState;

/// POST /api/posts/{id}/comments
pub async fn create_comment(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<CreateCommentRequest>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    let req = body.into_inner();

    let new_comment = match req.parent_id {
        Some(parent_id) => NewComment::reply(post_id, parent_id, req.content),
        None => NewComment::top_level(post_id, req.content),
    };

    let comment = state.forum.create_comment(new_comment).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(comment)))
}

/// GET /api/posts/{id}/comments?first=&after=
pub async fn list_comments(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    children_page(&state, CommentScope::Post(path.into_inner()), query.into_inner()).await
}

/// GET /api/comments/{id}/replies?first=&after=
pub async fn list_replies(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    children_page(
        &state,
        CommentScope::Replies(path.into_inner()),
        query.into_inner(),
    )
    .await
}

async fn children_page(
    state: &AppState,
    scope: CommentScope,
    query: PageQuery,
) -> AppResult<HttpResponse> {
    let page = PageRequest::new(query.first, query.after);
    let connection = state.forum.get_children_page(scope, page).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(connection)))
}

#[cfg(test)]
mod tests {
    use actix_web::test;
    use forum_core::domain::MAX_RENDERED_DEPTH;
    use serde_json::{Value, json};

    #[actix_web::test]
    async fn test_comment_reply_and_thread() {
        let app = test_app!();

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .set_json(json!({ "title": "Hello", "content": "World" }))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::post()
            .uri("/api/posts/1/comments")
            .set_json(json!({ "content": "Nice post" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status().as_u16(), 201);
        let top: Value = test::read_body_json(res).await;
        assert_eq!(top["data"]["parentId"], Value::Null);

        let req = test::TestRequest::post()
            .uri("/api/posts/1/comments")
            .set_json(json!({ "parentId": 1, "content": "Thanks" }))
            .to_request();
        let reply: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(reply["data"]["parentId"], 1);

        let req = test::TestRequest::get()
            .uri("/api/posts/1/thread")
            .to_request();
        let thread: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(thread["data"]["post"]["hasComments"], true);
        assert_eq!(thread["data"]["comments"][0]["content"], "Nice post");
        assert_eq!(
            thread["data"]["comments"][0]["replies"][0]["content"],
            "Thanks"
        );
        assert_eq!(
            thread["data"]["comments"][0]["replies"][0]["replies"],
            json!([])
        );
    }

    #[actix_web::test]
    async fn test_comment_on_missing_post_is_404() {
        let app = test_app!();

        let req = test::TestRequest::post()
            .uri("/api/posts/999/comments")
            .set_json(json!({ "content": "hello" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status().as_u16(), 404);
    }

    #[actix_web::test]
    async fn test_paging_follows_end_cursor() {
        let app = test_app!();

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .set_json(json!({ "title": "Hello", "content": "World" }))
            .to_request();
        test::call_service(&app, req).await;

        for i in 0..15 {
            let req = test::TestRequest::post()
                .uri("/api/posts/1/comments")
                .set_json(json!({ "content": format!("comment {i}") }))
                .to_request();
            test::call_service(&app, req).await;
        }

        let req = test::TestRequest::get()
            .uri("/api/posts/1/comments?first=10")
            .to_request();
        let first: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(first["data"]["nodes"].as_array().map(Vec::len), Some(10));
        assert_eq!(first["data"]["pageInfo"]["hasNextPage"], true);

        let cursor = first["data"]["pageInfo"]["endCursor"]
            .as_str()
            .unwrap()
            .to_string();
        let req = test::TestRequest::get()
            .uri(&format!("/api/posts/1/comments?first=10&after={cursor}"))
            .to_request();
        let second: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(second["data"]["nodes"].as_array().map(Vec::len), Some(5));
        assert_eq!(second["data"]["pageInfo"]["hasNextPage"], false);
    }

    #[actix_web::test]
    async fn test_invalid_cursor_is_400() {
        let app = test_app!();

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .set_json(json!({ "title": "Hello", "content": "World" }))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::get()
            .uri("/api/posts/1/comments?after=not-a-cursor")
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status().as_u16(), 400);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["type"], "/problems/invalid-cursor");
    }

    #[actix_web::test]
    async fn test_replies_of_missing_comment_is_404() {
        let app = test_app!();

        let req = test::TestRequest::get()
            .uri("/api/comments/5/replies")
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status().as_u16(), 404);
    }

    #[actix_web::test]
    async fn test_deep_thread_renders_with_depth_cap() {
        let app = test_app!();

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .set_json(json!({ "title": "Hello", "content": "World" }))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::post()
            .uri("/api/posts/1/comments")
            .set_json(json!({ "content": "root" }))
            .to_request();
        test::call_service(&app, req).await;
        for parent in 1..3_000 {
            let req = test::TestRequest::post()
                .uri("/api/posts/1/comments")
                .set_json(json!({ "parentId": parent, "content": "deeper" }))
                .to_request();
            test::call_service(&app, req).await;
        }

        let req = test::TestRequest::get()
            .uri("/api/posts/1/thread")
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status().as_u16(), 200);
        let body: Value = test::read_body_json(res).await;

        let mut node = &body["data"]["comments"][0];
        for _ in 0..MAX_RENDERED_DEPTH {
            node = &node["replies"][0];
        }
        assert_eq!(node["hasMoreReplies"], true);

        // the cut-off subtree stays reachable page by page
        let cut = node["id"].as_i64().unwrap();
        let req = test::TestRequest::get()
            .uri(&format!("/api/comments/{cut}/replies"))
            .to_request();
        let page: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(page["data"]["nodes"][0]["parentId"], cut);
    }
}
