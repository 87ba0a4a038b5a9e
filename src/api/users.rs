//! Account endpoints.

use crate::{
    api::{
        auth::{AuthSubject, CurrentUser},
        error::ApiJson,
        state::SharedState,
    },
    core::user::{self as users, ProfileInput},
    entities::user,
    errors::Result,
};
use axum::{Json, extract::State};

/// `POST /api/users/sync` - creates or refreshes the local record of the signed-in user.
pub async fn sync(
    State(state): State<SharedState>,
    AuthSubject(subject): AuthSubject,
    ApiJson(profile): ApiJson<ProfileInput>,
) -> Result<Json<user::Model>> {
    Ok(Json(users::sync_user(&state.db, &subject, profile).await?))
}

/// `GET /api/users/me`
pub async fn me(CurrentUser(me): CurrentUser) -> Json<user::Model> {
    Json(me)
}

/// `POST /api/instructor/register` - grants the instructor role to the current user.
pub async fn become_instructor(
    State(state): State<SharedState>,
    CurrentUser(me): CurrentUser,
) -> Result<Json<user::Model>> {
    Ok(Json(users::become_instructor(&state.db, &me.id).await?))
}
