//! Blog post and comment endpoints.

use crate::{
    api::{
        auth::{CurrentUser, OptionalUser},
        error::{ApiJson, ApiPath},
        state::SharedState,
    },
    core::{
        blog::{self, PostInput},
        comment::{self, CommentInput, CommentNode},
    },
    entities::{blog_post, comment as comment_entity},
    errors::Result,
};
use axum::{Json, extract::State, http::StatusCode};

/// `GET /api/blog`
pub async fn list_posts(State(state): State<SharedState>) -> Result<Json<Vec<blog_post::Model>>> {
    Ok(Json(blog::list_published_posts(&state.db).await?))
}

/// `GET /api/blog/:slug`
pub async fn get_post(
    State(state): State<SharedState>,
    OptionalUser(viewer): OptionalUser,
    ApiPath(slug): ApiPath<String>,
) -> Result<Json<blog_post::Model>> {
    Ok(Json(
        blog::get_visible_post(&state.db, &slug, viewer.as_ref()).await?,
    ))
}

/// `POST /api/blog`
pub async fn create_post(
    State(state): State<SharedState>,
    CurrentUser(me): CurrentUser,
    ApiJson(input): ApiJson<PostInput>,
) -> Result<(StatusCode, Json<blog_post::Model>)> {
    let created = blog::create_post(&state.db, &me, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `PUT /api/blog/:slug`
pub async fn update_post(
    State(state): State<SharedState>,
    CurrentUser(me): CurrentUser,
    ApiPath(slug): ApiPath<String>,
    ApiJson(input): ApiJson<PostInput>,
) -> Result<Json<blog_post::Model>> {
    Ok(Json(blog::update_post(&state.db, &me, &slug, input).await?))
}

/// `DELETE /api/blog/:slug`
pub async fn delete_post(
    State(state): State<SharedState>,
    CurrentUser(me): CurrentUser,
    ApiPath(slug): ApiPath<String>,
) -> Result<StatusCode> {
    blog::delete_post(&state.db, &me, &slug).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/blog/:slug/comments`
pub async fn list_comments(
    State(state): State<SharedState>,
    OptionalUser(viewer): OptionalUser,
    ApiPath(slug): ApiPath<String>,
) -> Result<Json<Vec<CommentNode>>> {
    Ok(Json(
        comment::comment_tree(&state.db, &slug, viewer.as_ref()).await?,
    ))
}

/// `POST /api/blog/:slug/comments`
pub async fn add_comment(
    State(state): State<SharedState>,
    CurrentUser(me): CurrentUser,
    ApiPath(slug): ApiPath<String>,
    ApiJson(input): ApiJson<CommentInput>,
) -> Result<(StatusCode, Json<comment_entity::Model>)> {
    let created = comment::add_comment(&state.db, &me, &slug, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `DELETE /api/blog/comments/:id`
pub async fn delete_comment(
    State(state): State<SharedState>,
    CurrentUser(me): CurrentUser,
    ApiPath(comment_id): ApiPath<i64>,
) -> Result<StatusCode> {
    comment::delete_comment(&state.db, &me, comment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
