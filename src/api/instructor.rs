//! Instructor endpoints: course authoring, dashboard and coupons.
//!
//! Every handler takes the [`Instructor`] extractor, so other roles get 403 before
//! anything is looked up; ownership of the individual course is checked by the core
//! functions.

use crate::{
    api::{
        auth::Instructor,
        error::{ApiJson, ApiPath},
        state::SharedState,
    },
    core::{
        coupon::{self, CouponInput},
        course::{self, CourseInput, LessonInput},
        instructor::{self, Dashboard},
    },
    entities::{course as course_entity, course_module, coupon as coupon_entity, lesson},
    errors::Result,
};
use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;

/// Module create/rename body.
#[derive(Debug, Deserialize)]
pub struct ModuleInput {
    /// Module title.
    pub title: String,
}

/// `GET /api/instructor/courses`
pub async fn list_courses(
    State(state): State<SharedState>,
    Instructor(me): Instructor,
) -> Result<Json<Vec<course_entity::Model>>> {
    Ok(Json(instructor::list_own_courses(&state.db, &me.id).await?))
}

/// `POST /api/instructor/courses`
pub async fn create_course(
    State(state): State<SharedState>,
    Instructor(me): Instructor,
    ApiJson(input): ApiJson<CourseInput>,
) -> Result<(StatusCode, Json<course_entity::Model>)> {
    let created = course::create_course(&state.db, &me, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `PUT /api/instructor/courses/:id`
pub async fn update_course(
    State(state): State<SharedState>,
    Instructor(me): Instructor,
    ApiPath(course_id): ApiPath<i64>,
    ApiJson(input): ApiJson<CourseInput>,
) -> Result<Json<course_entity::Model>> {
    Ok(Json(
        course::update_course(&state.db, &me, course_id, input).await?,
    ))
}

/// `DELETE /api/instructor/courses/:id`
pub async fn delete_course(
    State(state): State<SharedState>,
    Instructor(me): Instructor,
    ApiPath(course_id): ApiPath<i64>,
) -> Result<StatusCode> {
    course::delete_course(&state.db, &me, course_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/instructor/courses/:id/modules`
pub async fn create_module(
    State(state): State<SharedState>,
    Instructor(me): Instructor,
    ApiPath(course_id): ApiPath<i64>,
    ApiJson(input): ApiJson<ModuleInput>,
) -> Result<(StatusCode, Json<course_module::Model>)> {
    let created = course::create_module(&state.db, &me, course_id, &input.title).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `PUT /api/instructor/modules/:id`
pub async fn update_module(
    State(state): State<SharedState>,
    Instructor(me): Instructor,
    ApiPath(module_id): ApiPath<i64>,
    ApiJson(input): ApiJson<ModuleInput>,
) -> Result<Json<course_module::Model>> {
    Ok(Json(
        course::update_module(&state.db, &me, module_id, &input.title).await?,
    ))
}

/// `DELETE /api/instructor/modules/:id`
pub async fn delete_module(
    State(state): State<SharedState>,
    Instructor(me): Instructor,
    ApiPath(module_id): ApiPath<i64>,
) -> Result<StatusCode> {
    course::delete_module(&state.db, &me, module_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/instructor/modules/:id/lessons`
pub async fn create_lesson(
    State(state): State<SharedState>,
    Instructor(me): Instructor,
    ApiPath(module_id): ApiPath<i64>,
    ApiJson(input): ApiJson<LessonInput>,
) -> Result<(StatusCode, Json<lesson::Model>)> {
    let created = course::create_lesson(&state.db, &me, module_id, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `PUT /api/instructor/lessons/:id`
pub async fn update_lesson(
    State(state): State<SharedState>,
    Instructor(me): Instructor,
    ApiPath(lesson_id): ApiPath<i64>,
    ApiJson(input): ApiJson<LessonInput>,
) -> Result<Json<lesson::Model>> {
    Ok(Json(
        course::update_lesson(&state.db, &me, lesson_id, input).await?,
    ))
}

/// `DELETE /api/instructor/lessons/:id`
pub async fn delete_lesson(
    State(state): State<SharedState>,
    Instructor(me): Instructor,
    ApiPath(lesson_id): ApiPath<i64>,
) -> Result<StatusCode> {
    course::delete_lesson(&state.db, &me, lesson_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/instructor/dashboard`
pub async fn dashboard(
    State(state): State<SharedState>,
    Instructor(me): Instructor,
) -> Result<Json<Dashboard>> {
    Ok(Json(instructor::dashboard(&state.db, &me).await?))
}

/// `POST /api/instructor/coupons`
pub async fn create_coupon(
    State(state): State<SharedState>,
    Instructor(me): Instructor,
    ApiJson(input): ApiJson<CouponInput>,
) -> Result<(StatusCode, Json<coupon_entity::Model>)> {
    let created = coupon::create_coupon(&state.db, &me, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /api/instructor/coupons`
pub async fn list_coupons(
    State(state): State<SharedState>,
    Instructor(me): Instructor,
) -> Result<Json<Vec<coupon_entity::Model>>> {
    Ok(Json(coupon::list_coupons_by_creator(&state.db, &me.id).await?))
}
