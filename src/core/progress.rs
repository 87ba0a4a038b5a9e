//! Learning progress - Playback position sync and course completion.
//!
//! The player reports its position periodically (the client debounces); each report
//! upserts the single progress row for the (user, lesson) pair. A lesson counts as
//! completed once the player asks for it or the position reaches
//! [`COMPLETION_THRESHOLD`] of the lesson duration. Completion is sticky: seeking back
//! never un-completes a lesson.

use crate::{
    core::{course as courses, enrollment},
    entities::{Progress, progress, user},
    errors::{Error, Result},
};
use sea_orm::{Set, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Fraction of the duration after which a lesson is considered watched.
pub const COMPLETION_THRESHOLD: f64 = 0.9;

/// Position report from the player.
#[derive(Debug, Clone, Deserialize)]
pub struct ProgressInput {
    /// Lesson being watched.
    pub lesson_id: i64,
    /// Playback position in seconds.
    pub position_seconds: f64,
    /// Explicit completion flag from the player.
    #[serde(default)]
    pub completed: Option<bool>,
}

/// Normalizes a reported position: whole seconds, clamped to a known duration.
fn normalize_position(position_seconds: f64, duration_seconds: i32) -> i32 {
    #[allow(clippy::cast_possible_truncation)]
    let whole = position_seconds.round().min(f64::from(i32::MAX)) as i32;
    if duration_seconds > 0 {
        whole.min(duration_seconds)
    } else {
        whole
    }
}

fn reaches_threshold(position: i32, duration_seconds: i32) -> bool {
    duration_seconds > 0 && f64::from(position) >= f64::from(duration_seconds) * COMPLETION_THRESHOLD
}

/// Checks that the user may learn the course (enrolled, owner or admin).
async fn ensure_access(db: &DatabaseConnection, learner: &user::Model, course_id: i64) -> Result<()> {
    if enrollment::is_enrolled(db, &learner.id, course_id).await? {
        return Ok(());
    }
    let course = courses::get_course_by_id(db, course_id)
        .await?
        .ok_or_else(|| Error::not_found("Course", course_id))?;
    if courses::can_manage(learner, &course) {
        return Ok(());
    }
    Err(Error::forbidden("You are not enrolled in this course"))
}

/// Records a playback position, inserting or updating the progress row.
///
/// # Errors
/// Returns `Error::Validation` for a negative or non-finite position, `Error::NotFound`
/// for an unknown lesson, `Error::Forbidden` without access to the course.
#[instrument(skip(db, learner), fields(user = %learner.id))]
pub async fn record_progress(
    db: &DatabaseConnection,
    learner: &user::Model,
    input: ProgressInput,
) -> Result<progress::Model> {
    if !input.position_seconds.is_finite() || input.position_seconds < 0.0 {
        return Err(Error::validation(
            "Playback position must be a non-negative number of seconds",
        ));
    }
    let (lesson, course_id) = courses::lesson_with_course(db, input.lesson_id).await?;
    ensure_access(db, learner, course_id).await?;

    let position = normalize_position(input.position_seconds, lesson.duration_seconds);
    let completed_now =
        input.completed.unwrap_or(false) || reaches_threshold(position, lesson.duration_seconds);
    let now = chrono::Utc::now();

    let existing = Progress::find()
        .filter(progress::Column::UserId.eq(learner.id.as_str()))
        .filter(progress::Column::LessonId.eq(lesson.id))
        .one(db)
        .await?;

    let saved = match existing {
        Some(row) => {
            let completed = row.completed || completed_now;
            let mut active: progress::ActiveModel = row.into();
            active.position_seconds = Set(position);
            active.completed = Set(completed);
            active.updated_at = Set(now);
            active.update(db).await?
        }
        None => {
            progress::ActiveModel {
                user_id: Set(learner.id.clone()),
                lesson_id: Set(lesson.id),
                position_seconds: Set(position),
                completed: Set(completed_now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(db)
            .await?
        }
    };
    debug!(
        "Lesson {} at {}s (completed: {})",
        saved.lesson_id, saved.position_seconds, saved.completed
    );
    Ok(saved)
}

/// Progress of one lesson within a course.
#[derive(Debug, Clone, Serialize)]
pub struct LessonProgress {
    /// Lesson id.
    pub lesson_id: i64,
    /// Lesson title.
    pub title: String,
    /// Video length in seconds.
    pub duration_seconds: i32,
    /// Last saved position.
    pub position_seconds: i32,
    /// Whether the lesson is complete.
    pub completed: bool,
}

/// Progress of a whole course.
#[derive(Debug, Clone, Serialize)]
pub struct CourseProgress {
    /// Course id.
    pub course_id: i64,
    /// Lessons in course order.
    pub lessons: Vec<LessonProgress>,
    /// Lessons marked complete.
    pub completed_lessons: usize,
    /// Lessons in the course.
    pub total_lessons: usize,
    /// Completion percentage.
    pub percent_complete: f64,
}

/// Percentage of completed lessons, rounded to two decimals; zero without lessons.
#[must_use]
pub fn completion_percent(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let percent = completed as f64 / total as f64 * 100.0;
    (percent * 100.0).round() / 100.0
}

/// Builds the per-lesson progress of a course for a user without access checks.
///
/// # Errors
/// Returns an error if a database query fails.
pub async fn course_progress(
    db: &DatabaseConnection,
    user_id: &str,
    course_id: i64,
) -> Result<CourseProgress> {
    let lessons = courses::lessons_for_course(db, course_id).await?;
    let lesson_ids: Vec<i64> = lessons.iter().map(|l| l.id).collect();
    let rows: HashMap<i64, progress::Model> = Progress::find()
        .filter(progress::Column::UserId.eq(user_id))
        .filter(progress::Column::LessonId.is_in(lesson_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|row| (row.lesson_id, row))
        .collect();

    let lessons: Vec<LessonProgress> = lessons
        .into_iter()
        .map(|lesson| {
            let row = rows.get(&lesson.id);
            LessonProgress {
                lesson_id: lesson.id,
                title: lesson.title,
                duration_seconds: lesson.duration_seconds,
                position_seconds: row.map_or(0, |r| r.position_seconds),
                completed: row.is_some_and(|r| r.completed),
            }
        })
        .collect();
    let completed_lessons = lessons.iter().filter(|l| l.completed).count();
    let total_lessons = lessons.len();
    Ok(CourseProgress {
        course_id,
        percent_complete: completion_percent(completed_lessons, total_lessons),
        lessons,
        completed_lessons,
        total_lessons,
    })
}

/// Course progress for a learner who must have access to the course.
///
/// # Errors
/// Returns `Error::Forbidden` without access, `Error::NotFound` for an unknown course.
pub async fn course_progress_for(
    db: &DatabaseConnection,
    learner: &user::Model,
    course_id: i64,
) -> Result<CourseProgress> {
    ensure_access(db, learner, course_id).await?;
    course_progress(db, &learner.id, course_id).await
}
