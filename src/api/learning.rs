//! Enrollment and lesson progress endpoints.

use crate::{
    api::{
        auth::CurrentUser,
        error::{ApiJson, ApiPath},
        state::SharedState,
    },
    core::{
        enrollment::{self, EnrolledCourse},
        progress::{self, CourseProgress, ProgressInput},
    },
    entities::progress as progress_entity,
    errors::Result,
};
use axum::{Json, extract::State};

/// `GET /api/enrollments`
pub async fn list_enrollments(
    State(state): State<SharedState>,
    CurrentUser(me): CurrentUser,
) -> Result<Json<Vec<EnrolledCourse>>> {
    Ok(Json(enrollment::list_enrollments(&state.db, &me.id).await?))
}

/// `POST /api/progress`
pub async fn record_progress(
    State(state): State<SharedState>,
    CurrentUser(me): CurrentUser,
    ApiJson(input): ApiJson<ProgressInput>,
) -> Result<Json<progress_entity::Model>> {
    Ok(Json(progress::record_progress(&state.db, &me, input).await?))
}

/// `GET /api/progress/:course_id`
pub async fn course_progress(
    State(state): State<SharedState>,
    CurrentUser(me): CurrentUser,
    ApiPath(course_id): ApiPath<i64>,
) -> Result<Json<CourseProgress>> {
    Ok(Json(
        progress::course_progress_for(&state.db, &me, course_id).await?,
    ))
}
