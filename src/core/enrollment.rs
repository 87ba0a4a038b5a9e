//! Enrollment business logic - Which users may learn which courses.

use crate::{
    core::progress,
    entities::{Course, Enrollment, course, enrollment},
    errors::Result,
};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Serialize;
use tracing::{debug, instrument};

/// True if the user is enrolled in the course.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn is_enrolled<C>(db: &C, user_id: &str, course_id: i64) -> Result<bool>
where
    C: ConnectionTrait,
{
    let count = Enrollment::find()
        .filter(enrollment::Column::UserId.eq(user_id))
        .filter(enrollment::Column::CourseId.eq(course_id))
        .count(db)
        .await?;
    Ok(count > 0)
}

/// Enrolls a user in a course; enrolling twice returns the existing row.
///
/// # Errors
/// Returns an error if a database statement fails.
#[instrument(skip(db))]
pub async fn enroll<C>(db: &C, user_id: &str, course_id: i64) -> Result<enrollment::Model>
where
    C: ConnectionTrait,
{
    if let Some(existing) = Enrollment::find()
        .filter(enrollment::Column::UserId.eq(user_id))
        .filter(enrollment::Column::CourseId.eq(course_id))
        .one(db)
        .await?
    {
        debug!("User {user_id} already enrolled in course {course_id}");
        return Ok(existing);
    }
    enrollment::ActiveModel {
        user_id: Set(user_id.to_string()),
        course_id: Set(course_id),
        enrolled_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// A course the user is enrolled in, with completion.
#[derive(Debug, Clone, Serialize)]
pub struct EnrolledCourse {
    /// The enrolled course.
    pub course: course::Model,
    /// When access was granted.
    pub enrolled_at: chrono::DateTime<chrono::Utc>,
    /// Lessons marked complete.
    pub completed_lessons: usize,
    /// Lessons in the course.
    pub total_lessons: usize,
    /// Completion percentage.
    pub percent_complete: f64,
}

/// Lists the user's enrollments, most recent first.
///
/// # Errors
/// Returns an error if a database query fails.
pub async fn list_enrollments(db: &DatabaseConnection, user_id: &str) -> Result<Vec<EnrolledCourse>> {
    let enrollments = Enrollment::find()
        .filter(enrollment::Column::UserId.eq(user_id))
        .order_by_desc(enrollment::Column::EnrolledAt)
        .all(db)
        .await?;

    let mut result = Vec::with_capacity(enrollments.len());
    for row in enrollments {
        let Some(course) = Course::find_by_id(row.course_id).one(db).await? else {
            continue;
        };
        let summary = progress::course_progress(db, user_id, course.id).await?;
        result.push(EnrolledCourse {
            course,
            enrolled_at: row.enrolled_at,
            completed_lessons: summary.completed_lessons,
            total_lessons: summary.total_lessons,
            percent_complete: summary.percent_complete,
        });
    }
    Ok(result)
}
