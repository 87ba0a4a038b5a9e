//! HTTP API - axum router over the core operations.
//!
//! Handlers are thin: they extract the caller and the JSON body, call into
//! [`crate::core`], and let [`crate::errors::Error`] pick the status code.
//! Error responses are described once in [`error`] rather than per handler.

#![allow(clippy::missing_errors_doc)]

pub mod auth;
pub mod blog;
pub mod chat;
pub mod courses;
pub mod error;
pub mod instructor;
pub mod learning;
pub mod shop;
pub mod state;
pub mod users;

use crate::errors::Result;
use axum::{
    Json, Router,
    extract::State,
    http::{HeaderValue, Method},
    routing::{delete, get, post, put},
};
use serde_json::{Value, json};
use state::SharedState;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .max_age(Duration::from_secs(60 * 60));
    if allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| {
            origin
                .parse()
                .inspect_err(|_| warn!("Ignoring invalid CORS origin '{origin}'"))
                .ok()
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

/// `GET /health` - liveness plus a database ping.
async fn health(State(state): State<SharedState>) -> Result<Json<Value>> {
    state.db.ping().await?;
    Ok(Json(json!({ "status": "ok" })))
}

/// Builds the application router.
pub fn router(state: SharedState) -> Router {
    let cors = cors_layer(&state.config.server.allowed_origins);

    let api = Router::new()
        .route("/users/sync", post(users::sync))
        .route("/users/me", get(users::me))
        .route("/courses", get(courses::list))
        .route("/courses/categories", get(courses::categories))
        .route("/courses/:id", get(courses::outline))
        .route("/instructor/register", post(users::become_instructor))
        .route(
            "/instructor/courses",
            get(instructor::list_courses).post(instructor::create_course),
        )
        .route(
            "/instructor/courses/:id",
            put(instructor::update_course).delete(instructor::delete_course),
        )
        .route("/instructor/courses/:id/modules", post(instructor::create_module))
        .route(
            "/instructor/modules/:id",
            put(instructor::update_module).delete(instructor::delete_module),
        )
        .route("/instructor/modules/:id/lessons", post(instructor::create_lesson))
        .route(
            "/instructor/lessons/:id",
            put(instructor::update_lesson).delete(instructor::delete_lesson),
        )
        .route("/instructor/dashboard", get(instructor::dashboard))
        .route(
            "/instructor/coupons",
            get(instructor::list_coupons).post(instructor::create_coupon),
        )
        .route(
            "/cart",
            get(shop::view_cart)
                .post(shop::add_to_cart)
                .delete(shop::clear_cart),
        )
        .route("/cart/:course_id", delete(shop::remove_from_cart))
        .route("/coupon/validate", post(shop::validate_coupon))
        .route("/checkout", post(shop::checkout))
        .route("/orders", get(shop::list_orders))
        .route(
            "/wishlist",
            get(shop::list_wishlist).post(shop::add_to_wishlist),
        )
        .route("/wishlist/:course_id", delete(shop::remove_from_wishlist))
        .route("/enrollments", get(learning::list_enrollments))
        .route("/progress", post(learning::record_progress))
        .route("/progress/:course_id", get(learning::course_progress))
        .route("/blog", get(blog::list_posts).post(blog::create_post))
        .route(
            "/blog/:slug",
            get(blog::get_post)
                .put(blog::update_post)
                .delete(blog::delete_post),
        )
        .route(
            "/blog/:slug/comments",
            get(blog::list_comments).post(blog::add_comment),
        )
        .route("/blog/comments/:id", delete(blog::delete_comment))
        .route("/chat", post(chat::chat))
        .route("/contact", post(chat::contact));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests;
