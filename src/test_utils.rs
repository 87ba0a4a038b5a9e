//! Shared test utilities for `BrainiX`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{
        coupon::{self, CouponInput, DiscountType},
        enrollment,
        user::{self as users, ProfileInput, Role},
    },
    entities::{self, CourseModule, Lesson, course, course_module, lesson, user},
    errors::Result,
};
use sea_orm::{QueryOrder, Set, prelude::*};

/// Installs a test subscriber so `tracing` output shows up with `--nocapture`.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("debug")
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a student account.
///
/// # Defaults
/// * `email`: `{id}@example.com`
/// * `name`: the id
pub async fn create_test_user(db: &DatabaseConnection, id: &str) -> Result<user::Model> {
    users::sync_user(
        db,
        id,
        ProfileInput {
            email: format!("{id}@example.com"),
            name: id.to_string(),
            image_url: None,
        },
    )
    .await
}

/// Creates an account with the instructor role.
pub async fn create_test_instructor(db: &DatabaseConnection, id: &str) -> Result<user::Model> {
    create_test_user(db, id).await?;
    users::set_role(db, id, Role::Instructor).await
}

/// Creates an account with the admin role.
pub async fn create_test_admin(db: &DatabaseConnection, id: &str) -> Result<user::Model> {
    create_test_user(db, id).await?;
    users::set_role(db, id, Role::Admin).await
}

/// An instructor model that is never stored; for tests against a mock database.
#[must_use]
pub fn instructor_model(id: &str) -> user::Model {
    user::Model {
        id: id.to_string(),
        email: format!("{id}@example.com"),
        name: id.to_string(),
        image_url: None,
        role: Role::Instructor.as_str().to_string(),
        created_at: chrono::Utc::now(),
    }
}

/// Creates a published course.
///
/// # Defaults
/// * `category`: "programming"
/// * `level`: "beginner"
/// * `rating`: 0.0
pub async fn create_test_course(
    db: &DatabaseConnection,
    instructor_id: &str,
    title: &str,
    price: f64,
) -> Result<course::Model> {
    let now = chrono::Utc::now();
    course::ActiveModel {
        instructor_id: Set(instructor_id.to_string()),
        title: Set(title.to_string()),
        description: Set(format!("An introduction to {title}")),
        category: Set("programming".to_string()),
        level: Set("beginner".to_string()),
        price: Set(price),
        thumbnail_url: Set(None),
        is_published: Set(true),
        rating: Set(0.0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Appends a lesson to the first module of a course, creating the module if needed.
pub async fn create_test_lesson(
    db: &DatabaseConnection,
    course_id: i64,
    title: &str,
    duration_seconds: i32,
) -> Result<lesson::Model> {
    let existing = CourseModule::find()
        .filter(course_module::Column::CourseId.eq(course_id))
        .order_by_asc(course_module::Column::Position)
        .one(db)
        .await?;
    let module = match existing {
        Some(module) => module,
        None => {
            course_module::ActiveModel {
                course_id: Set(course_id),
                title: Set("Module 1".to_string()),
                position: Set(1),
                ..Default::default()
            }
            .insert(db)
            .await?
        }
    };
    let count = Lesson::find()
        .filter(lesson::Column::ModuleId.eq(module.id))
        .count(db)
        .await?;

    lesson::ActiveModel {
        module_id: Set(module.id),
        title: Set(title.to_string()),
        video_url: Set(Some(format!("https://cdn.example.com/{course_id}/{title}.mp4"))),
        duration_seconds: Set(duration_seconds),
        position: Set(i32::try_from(count).unwrap_or(i32::MAX - 1) + 1),
        is_preview: Set(false),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Enrolls a user without going through checkout.
pub async fn enroll_test_user(
    db: &DatabaseConnection,
    user_id: &str,
    course_id: i64,
) -> Result<entities::enrollment::Model> {
    enrollment::enroll(db, user_id, course_id).await
}

/// Creates an active coupon without usage limits or expiry.
pub async fn create_test_coupon(
    db: &DatabaseConnection,
    creator: &user::Model,
    code: &str,
    discount_type: DiscountType,
    value: f64,
) -> Result<entities::coupon::Model> {
    coupon::create_coupon(
        db,
        creator,
        CouponInput {
            code: code.to_string(),
            discount_type,
            value,
            max_uses: None,
            expires_at: None,
        },
    )
    .await
}

/// Sets up a database with a student enrolled in a one-lesson course.
///
/// Returns the connection, the student and the lesson.
pub async fn setup_enrolled_lesson(
    duration_seconds: i32,
) -> Result<(DatabaseConnection, user::Model, lesson::Model)> {
    let db = setup_test_db().await?;
    let owner = create_test_instructor(&db, "owner").await?;
    let student = create_test_user(&db, "student").await?;
    let course = create_test_course(&db, &owner.id, "Rust", 10.0).await?;
    let lesson = create_test_lesson(&db, course.id, "One", duration_seconds).await?;
    enroll_test_user(&db, &student.id, course.id).await?;
    Ok((db, student, lesson))
}

/// Course that owns a lesson.
pub async fn lesson_course_id(db: &DatabaseConnection, lesson: &lesson::Model) -> Result<i64> {
    let (_, course_id) = crate::core::course::lesson_with_course(db, lesson.id).await?;
    Ok(course_id)
}
