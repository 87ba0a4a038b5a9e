//! Instructor dashboard - Course, student and revenue figures for one instructor.

use crate::{
    core::{coupon::round_cents, user as users},
    entities::{Course, Enrollment, OrderItem, course, enrollment, order_item, user},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, prelude::*};
use serde::Serialize;
use std::collections::HashSet;
use tracing::instrument;

/// Per-course figures.
#[derive(Debug, Clone, Serialize)]
pub struct CourseStats {
    /// Course id.
    pub course_id: i64,
    /// Course title.
    pub title: String,
    /// Whether the course is listed.
    pub is_published: bool,
    /// Current price.
    pub price: f64,
    /// Students enrolled.
    pub enrollments: usize,
    /// Sum of item prices sold.
    pub revenue: f64,
}

/// Dashboard totals.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    /// Courses authored.
    pub total_courses: usize,
    /// Courses currently listed.
    pub published_courses: usize,
    /// Distinct students across all courses
    pub total_students: usize,
    /// Sum of item prices sold for the instructor's courses
    pub total_revenue: f64,
    /// Figures per course, newest first.
    pub courses: Vec<CourseStats>,
}

/// Courses owned by the instructor, newest first.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_own_courses(db: &DatabaseConnection, instructor_id: &str) -> Result<Vec<course::Model>> {
    Course::find()
        .filter(course::Column::InstructorId.eq(instructor_id))
        .order_by_desc(course::Column::CreatedAt)
        .order_by_desc(course::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Builds the dashboard of `instructor`.
///
/// Revenue counts item list prices; coupon discounts are applied at the order level and
/// are not split across instructors.
///
/// # Errors
/// Returns `Error::Forbidden` if the user cannot teach.
#[instrument(skip(db, instructor), fields(instructor = %instructor.id))]
pub async fn dashboard(db: &DatabaseConnection, instructor: &user::Model) -> Result<Dashboard> {
    if !users::can_teach(instructor) {
        return Err(Error::forbidden("Instructor access required"));
    }
    let courses = list_own_courses(db, &instructor.id).await?;
    let course_ids: Vec<i64> = courses.iter().map(|c| c.id).collect();

    let enrollments = Enrollment::find()
        .filter(enrollment::Column::CourseId.is_in(course_ids.clone()))
        .all(db)
        .await?;
    let sales = OrderItem::find()
        .filter(order_item::Column::CourseId.is_in(course_ids))
        .all(db)
        .await?;

    let stats: Vec<CourseStats> = courses
        .iter()
        .map(|c| CourseStats {
            course_id: c.id,
            title: c.title.clone(),
            is_published: c.is_published,
            price: c.price,
            enrollments: enrollments.iter().filter(|e| e.course_id == c.id).count(),
            revenue: round_cents(
                sales
                    .iter()
                    .filter(|s| s.course_id == c.id)
                    .map(|s| s.price)
                    .sum(),
            ),
        })
        .collect();
    let students: HashSet<&str> = enrollments.iter().map(|e| e.user_id.as_str()).collect();

    Ok(Dashboard {
        total_courses: courses.len(),
        published_courses: courses.iter().filter(|c| c.is_published).count(),
        total_students: students.len(),
        total_revenue: round_cents(stats.iter().map(|s| s.revenue).sum()),
        courses: stats,
    })
}
