//! HTTP handlers and route configuration.

/// Initialize the full route table over a fresh in-memory store.
#[cfg(test)]
macro_rules! test_app {
    () => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new(crate::state::AppState::in_memory()))
                .configure(crate::handlers::configure_routes),
        )
        .await
    };
}

mod comments;
mod health;
mod posts;

use actix_web::web;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health::health_check))
            .service(
                web::scope("/posts")
                    .route("", web::get().to(posts::list_posts))
                    .route("", web::post().to(posts::create_post))
                    .route("/{id}", web::get().to(posts::get_post))
                    .route("/{id}/exists", web::get().to(posts::post_exists))
                    .route("/{id}/lock", web::post().to(posts::lock_comments))
                    .route("/{id}/thread", web::get().to(posts::get_thread))
                    .route("/{id}/comments", web::get().to(comments::list_comments))
                    .route("/{id}/comments", web::post().to(comments::create_comment)),
            )
            .route(
                "/comments/{id}/replies",
                web::get().to(comments::list_replies),
            ),
    );
}
