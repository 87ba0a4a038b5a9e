//! Course business logic - Catalogue browsing and instructor course authoring.
//!
//! This module provides functions for listing and filtering published courses, building
//! the module/lesson outline of a course, and creating, updating and deleting courses,
//! modules and lessons. Authoring operations check that the acting user owns the course
//! (admins may manage any course).

use crate::{
    core::{enrollment, user as users},
    entities::{
        Course, CourseModule, Enrollment, Lesson, OrderItem, course, course_module,
        enrollment as enrollment_entity, lesson, order_item, user,
    },
    errors::{Error, Result},
};
use sea_orm::{Condition, QueryOrder, QuerySelect, Set, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Difficulty level of a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseLevel {
    /// No prior knowledge
    Beginner,
    /// Some experience
    Intermediate,
    /// Experienced learners
    Advanced,
}

impl CourseLevel {
    /// Stored representation of the level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    /// Parses a level name, case-insensitively.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "beginner" => Some(Self::Beginner),
            "intermediate" => Some(Self::Intermediate),
            "advanced" => Some(Self::Advanced),
            _ => None,
        }
    }
}

/// Catalogue ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseSort {
    /// Most recently created first
    #[default]
    Newest,
    /// Cheapest first
    PriceAsc,
    /// Most expensive first
    PriceDesc,
    /// Best rated first
    Rating,
}

/// Catalogue filter. Every field is optional; keywords match title or description.
#[derive(Debug, Clone, Default)]
pub struct CourseFilter {
    /// Exact category, case-insensitive.
    pub category: Option<String>,
    /// Required level.
    pub level: Option<CourseLevel>,
    /// Words that must each appear in the title or description.
    pub keywords: Vec<String>,
    /// Highest price to include.
    pub max_price: Option<f64>,
    /// Only free courses.
    pub free_only: bool,
    /// Result order.
    pub sort: CourseSort,
}

impl CourseFilter {
    /// Builds the SQL condition for published courses matching this filter.
    #[must_use]
    pub fn condition(&self) -> Condition {
        let mut condition = Condition::all().add(course::Column::IsPublished.eq(true));
        if let Some(category) = &self.category {
            condition = condition.add(course::Column::Category.eq(category.clone()));
        }
        if let Some(level) = self.level {
            condition = condition.add(course::Column::Level.eq(level.as_str()));
        }
        if self.free_only {
            condition = condition.add(course::Column::Price.lte(0.0));
        } else if let Some(max_price) = self.max_price {
            condition = condition.add(course::Column::Price.lte(max_price));
        }
        if !self.keywords.is_empty() {
            let mut any = Condition::any();
            for keyword in &self.keywords {
                any = any
                    .add(course::Column::Title.contains(keyword))
                    .add(course::Column::Description.contains(keyword));
            }
            condition = condition.add(any);
        }
        condition
    }
}

/// Fields an instructor supplies when creating or updating a course.
#[derive(Debug, Clone, Deserialize)]
pub struct CourseInput {
    /// Course title.
    pub title: String,
    /// Course description.
    #[serde(default)]
    pub description: String,
    /// Catalogue category.
    pub category: String,
    /// `beginner`, `intermediate` or `advanced`.
    pub level: String,
    /// Price in dollars; zero for free courses.
    pub price: f64,
    /// Thumbnail image URL.
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    /// Whether the course is listed in the catalogue.
    #[serde(default)]
    pub is_published: bool,
}

struct ValidCourse {
    title: String,
    category: String,
    level: CourseLevel,
}

fn validate_course(input: &CourseInput) -> Result<ValidCourse> {
    let title = input.title.trim();
    if title.is_empty() {
        return Err(Error::validation("Course title cannot be empty"));
    }
    let category = input.category.trim().to_lowercase();
    if category.is_empty() {
        return Err(Error::validation("Course category cannot be empty"));
    }
    if !input.price.is_finite() || input.price < 0.0 {
        return Err(Error::InvalidAmount {
            amount: input.price,
        });
    }
    let level = CourseLevel::parse(&input.level).ok_or_else(|| {
        Error::validation(format!(
            "Unknown course level '{}'; expected beginner, intermediate or advanced",
            input.level
        ))
    })?;
    Ok(ValidCourse {
        title: title.to_string(),
        category,
        level,
    })
}

/// Lists published courses matching `filter`, optionally capped at `limit` rows.
///
/// # Errors
/// Returns an error if the database query fails.
#[instrument(skip(db))]
pub async fn list_published_courses(
    db: &DatabaseConnection,
    filter: &CourseFilter,
    limit: Option<u64>,
) -> Result<Vec<course::Model>> {
    let mut query = Course::find().filter(filter.condition());
    query = match filter.sort {
        CourseSort::Newest => query
            .order_by_desc(course::Column::CreatedAt)
            .order_by_desc(course::Column::Id),
        CourseSort::PriceAsc => query
            .order_by_asc(course::Column::Price)
            .order_by_asc(course::Column::Id),
        CourseSort::PriceDesc => query
            .order_by_desc(course::Column::Price)
            .order_by_asc(course::Column::Id),
        CourseSort::Rating => query
            .order_by_desc(course::Column::Rating)
            .order_by_asc(course::Column::Id),
    };
    if let Some(limit) = limit {
        query = query.limit(limit);
    }
    let courses = query.all(db).await?;
    debug!("Catalogue query returned {} courses", courses.len());
    Ok(courses)
}

/// Distinct categories of published courses, alphabetically.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_categories(db: &DatabaseConnection) -> Result<Vec<String>> {
    Course::find()
        .select_only()
        .column(course::Column::Category)
        .distinct()
        .filter(course::Column::IsPublished.eq(true))
        .order_by_asc(course::Column::Category)
        .into_tuple::<String>()
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a course by ID regardless of publication state.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_course_by_id<C>(db: &C, course_id: i64) -> Result<Option<course::Model>>
where
    C: ConnectionTrait,
{
    Course::find_by_id(course_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a published course, treating unpublished courses as missing.
///
/// # Errors
/// Returns `Error::NotFound` if the course does not exist or is not published.
pub async fn get_published_course<C>(db: &C, course_id: i64) -> Result<course::Model>
where
    C: ConnectionTrait,
{
    get_course_by_id(db, course_id)
        .await?
        .filter(|c| c.is_published)
        .ok_or_else(|| Error::not_found("Course", course_id))
}

/// True if `actor` owns the course or is an admin.
#[must_use]
pub fn can_manage(actor: &user::Model, course: &course::Model) -> bool {
    course.instructor_id == actor.id || users::is_admin(actor)
}

/// Loads a course the actor is allowed to modify.
///
/// # Errors
/// Returns `Error::NotFound` for a missing course and `Error::Forbidden` when the actor
/// neither owns it nor is an admin.
pub async fn get_manageable_course(
    db: &DatabaseConnection,
    actor: &user::Model,
    course_id: i64,
) -> Result<course::Model> {
    let course = get_course_by_id(db, course_id)
        .await?
        .ok_or_else(|| Error::not_found("Course", course_id))?;
    if !can_manage(actor, &course) {
        return Err(Error::forbidden("You can only manage your own courses"));
    }
    Ok(course)
}

/// Creates a course owned by `instructor`.
///
/// # Errors
/// Returns `Error::Forbidden` if the user cannot teach, `Error::Validation` /
/// `Error::InvalidAmount` for invalid input, or a database error.
#[instrument(skip(db, instructor, input), fields(instructor = %instructor.id))]
pub async fn create_course(
    db: &DatabaseConnection,
    instructor: &user::Model,
    input: CourseInput,
) -> Result<course::Model> {
    if !users::can_teach(instructor) {
        return Err(Error::forbidden("Only instructors can create courses"));
    }
    let valid = validate_course(&input)?;
    let now = chrono::Utc::now();
    let created = course::ActiveModel {
        instructor_id: Set(instructor.id.clone()),
        title: Set(valid.title),
        description: Set(input.description.trim().to_string()),
        category: Set(valid.category),
        level: Set(valid.level.as_str().to_string()),
        price: Set(input.price),
        thumbnail_url: Set(input.thumbnail_url),
        is_published: Set(input.is_published),
        rating: Set(0.0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!("Created course '{}' (ID: {})", created.title, created.id);
    Ok(created)
}

/// Replaces the editable fields of a course.
///
/// # Errors
/// Same as [`create_course`] plus `Error::NotFound` for a missing course.
#[instrument(skip(db, actor, input), fields(actor = %actor.id))]
pub async fn update_course(
    db: &DatabaseConnection,
    actor: &user::Model,
    course_id: i64,
    input: CourseInput,
) -> Result<course::Model> {
    let valid = validate_course(&input)?;
    let existing = get_manageable_course(db, actor, course_id).await?;
    let mut active: course::ActiveModel = existing.into();
    active.title = Set(valid.title);
    active.description = Set(input.description.trim().to_string());
    active.category = Set(valid.category);
    active.level = Set(valid.level.as_str().to_string());
    active.price = Set(input.price);
    active.thumbnail_url = Set(input.thumbnail_url);
    active.is_published = Set(input.is_published);
    active.updated_at = Set(chrono::Utc::now());
    active.update(db).await.map_err(Into::into)
}

/// Deletes a course with its modules and lessons.
///
/// Courses that were already sold keep their rows for order history; those must be
/// unpublished instead.
///
/// # Errors
/// Returns `Error::Conflict` if the course has enrollments or order items.
#[instrument(skip(db, actor), fields(actor = %actor.id))]
pub async fn delete_course(db: &DatabaseConnection, actor: &user::Model, course_id: i64) -> Result<()> {
    let existing = get_manageable_course(db, actor, course_id).await?;
    let enrollments = Enrollment::find()
        .filter(enrollment_entity::Column::CourseId.eq(course_id))
        .count(db)
        .await?;
    let sold = OrderItem::find()
        .filter(order_item::Column::CourseId.eq(course_id))
        .count(db)
        .await?;
    if enrollments > 0 || sold > 0 {
        return Err(Error::conflict(
            "Course has students or orders; unpublish it instead",
        ));
    }
    existing.delete(db).await?;
    info!("Deleted course {course_id}");
    Ok(())
}

/// Appends a module to a course.
///
/// # Errors
/// Returns `Error::Validation` for an empty title, plus the errors of
/// [`get_manageable_course`].
pub async fn create_module(
    db: &DatabaseConnection,
    actor: &user::Model,
    course_id: i64,
    title: &str,
) -> Result<course_module::Model> {
    let title = non_empty(title, "Module title cannot be empty")?;
    get_manageable_course(db, actor, course_id).await?;
    let last = CourseModule::find()
        .filter(course_module::Column::CourseId.eq(course_id))
        .order_by_desc(course_module::Column::Position)
        .one(db)
        .await?;
    course_module::ActiveModel {
        course_id: Set(course_id),
        title: Set(title),
        position: Set(last.map_or(1, |m| m.position + 1)),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

async fn get_manageable_module(
    db: &DatabaseConnection,
    actor: &user::Model,
    module_id: i64,
) -> Result<course_module::Model> {
    let module = CourseModule::find_by_id(module_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Module", module_id))?;
    get_manageable_course(db, actor, module.course_id).await?;
    Ok(module)
}

/// Renames a module.
///
/// # Errors
/// Returns `Error::NotFound`, `Error::Forbidden` or `Error::Validation`.
pub async fn update_module(
    db: &DatabaseConnection,
    actor: &user::Model,
    module_id: i64,
    title: &str,
) -> Result<course_module::Model> {
    let title = non_empty(title, "Module title cannot be empty")?;
    let module = get_manageable_module(db, actor, module_id).await?;
    let mut active: course_module::ActiveModel = module.into();
    active.title = Set(title);
    active.update(db).await.map_err(Into::into)
}

/// Deletes a module and its lessons.
///
/// # Errors
/// Returns `Error::NotFound` or `Error::Forbidden`.
pub async fn delete_module(db: &DatabaseConnection, actor: &user::Model, module_id: i64) -> Result<()> {
    let module = get_manageable_module(db, actor, module_id).await?;
    module.delete(db).await?;
    Ok(())
}

/// Fields an instructor supplies for a lesson.
#[derive(Debug, Clone, Deserialize)]
pub struct LessonInput {
    /// Lesson title.
    pub title: String,
    /// Video URL.
    #[serde(default)]
    pub video_url: Option<String>,
    /// Video length in seconds.
    #[serde(default)]
    pub duration_seconds: i32,
    /// Free preview lesson.
    #[serde(default)]
    pub is_preview: bool,
}

fn validate_lesson(input: &LessonInput) -> Result<String> {
    if input.duration_seconds < 0 {
        return Err(Error::validation("Lesson duration cannot be negative"));
    }
    non_empty(&input.title, "Lesson title cannot be empty")
}

/// Appends a lesson to a module.
///
/// # Errors
/// Returns `Error::Validation` for invalid input, plus the errors of the module lookup.
pub async fn create_lesson(
    db: &DatabaseConnection,
    actor: &user::Model,
    module_id: i64,
    input: LessonInput,
) -> Result<lesson::Model> {
    let title = validate_lesson(&input)?;
    get_manageable_module(db, actor, module_id).await?;
    let last = Lesson::find()
        .filter(lesson::Column::ModuleId.eq(module_id))
        .order_by_desc(lesson::Column::Position)
        .one(db)
        .await?;
    lesson::ActiveModel {
        module_id: Set(module_id),
        title: Set(title),
        video_url: Set(input.video_url),
        duration_seconds: Set(input.duration_seconds),
        position: Set(last.map_or(1, |l| l.position + 1)),
        is_preview: Set(input.is_preview),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Replaces the editable fields of a lesson.
///
/// # Errors
/// Returns `Error::NotFound`, `Error::Forbidden` or `Error::Validation`.
pub async fn update_lesson(
    db: &DatabaseConnection,
    actor: &user::Model,
    lesson_id: i64,
    input: LessonInput,
) -> Result<lesson::Model> {
    let title = validate_lesson(&input)?;
    let (existing, _) = lesson_with_course(db, lesson_id).await?;
    get_manageable_module(db, actor, existing.module_id).await?;
    let mut active: lesson::ActiveModel = existing.into();
    active.title = Set(title);
    active.video_url = Set(input.video_url);
    active.duration_seconds = Set(input.duration_seconds);
    active.is_preview = Set(input.is_preview);
    active.update(db).await.map_err(Into::into)
}

/// Deletes a lesson and the progress recorded against it.
///
/// # Errors
/// Returns `Error::NotFound` or `Error::Forbidden`.
pub async fn delete_lesson(db: &DatabaseConnection, actor: &user::Model, lesson_id: i64) -> Result<()> {
    let (existing, _) = lesson_with_course(db, lesson_id).await?;
    get_manageable_module(db, actor, existing.module_id).await?;
    existing.delete(db).await?;
    Ok(())
}

/// Loads a lesson together with the ID of the course it belongs to.
///
/// # Errors
/// Returns `Error::NotFound` if the lesson (or its module) does not exist.
pub async fn lesson_with_course<C>(db: &C, lesson_id: i64) -> Result<(lesson::Model, i64)>
where
    C: ConnectionTrait,
{
    let lesson = Lesson::find_by_id(lesson_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Lesson", lesson_id))?;
    let module = CourseModule::find_by_id(lesson.module_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Module", lesson.module_id))?;
    Ok((lesson, module.course_id))
}

/// All lessons of a course, in module then lesson order.
///
/// # Errors
/// Returns an error if a database query fails.
pub async fn lessons_for_course<C>(db: &C, course_id: i64) -> Result<Vec<lesson::Model>>
where
    C: ConnectionTrait,
{
    let modules = CourseModule::find()
        .filter(course_module::Column::CourseId.eq(course_id))
        .order_by_asc(course_module::Column::Position)
        .all(db)
        .await?;
    let module_ids: Vec<i64> = modules.iter().map(|m| m.id).collect();
    let mut lessons = Lesson::find()
        .filter(lesson::Column::ModuleId.is_in(module_ids))
        .all(db)
        .await?;
    let module_order = |module_id: i64| modules.iter().position(|m| m.id == module_id);
    lessons.sort_by_key(|l| (module_order(l.module_id), l.position, l.id));
    Ok(lessons)
}

/// Lesson as shown in a course outline.
#[derive(Debug, Clone, Serialize)]
pub struct LessonView {
    /// Lesson id.
    pub id: i64,
    /// Lesson title.
    pub title: String,
    /// Video length in seconds.
    pub duration_seconds: i32,
    /// Order within the module.
    pub position: i32,
    /// Free preview lesson.
    pub is_preview: bool,
    /// Present only for preview lessons or viewers with access
    pub video_url: Option<String>,
}

/// Module with its ordered lessons.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleOutline {
    /// Module id.
    pub id: i64,
    /// Module title.
    pub title: String,
    /// Order within the course.
    pub position: i32,
    /// Lessons in order.
    pub lessons: Vec<LessonView>,
}

/// Course page payload.
#[derive(Debug, Clone, Serialize)]
pub struct CourseOutline {
    /// The course row.
    pub course: course::Model,
    /// Modules in order.
    pub modules: Vec<ModuleOutline>,
    /// Lessons across all modules.
    pub total_lessons: usize,
    /// Summed lesson length.
    pub total_duration_seconds: i64,
    /// Whether the viewer may watch every lesson
    pub has_access: bool,
}

/// Builds the outline of a course for `viewer`.
///
/// Unpublished courses are visible only to users who can manage them. Video URLs are
/// withheld from non-preview lessons unless the viewer is enrolled or manages the course.
///
/// # Errors
/// Returns `Error::NotFound` if the course is missing or hidden from the viewer.
pub async fn get_course_outline(
    db: &DatabaseConnection,
    course_id: i64,
    viewer: Option<&user::Model>,
) -> Result<CourseOutline> {
    let course = get_course_by_id(db, course_id)
        .await?
        .ok_or_else(|| Error::not_found("Course", course_id))?;
    let manages = viewer.is_some_and(|v| can_manage(v, &course));
    if !course.is_published && !manages {
        return Err(Error::not_found("Course", course_id));
    }
    let has_access = match viewer {
        Some(_) if manages => true,
        Some(v) => enrollment::is_enrolled(db, &v.id, course_id).await?,
        None => false,
    };

    let modules = CourseModule::find()
        .filter(course_module::Column::CourseId.eq(course_id))
        .order_by_asc(course_module::Column::Position)
        .all(db)
        .await?;
    let lessons = lessons_for_course(db, course_id).await?;

    let total_lessons = lessons.len();
    let total_duration_seconds = lessons.iter().map(|l| i64::from(l.duration_seconds)).sum();
    let modules = modules
        .into_iter()
        .map(|module| ModuleOutline {
            lessons: lessons
                .iter()
                .filter(|l| l.module_id == module.id)
                .map(|l| LessonView {
                    id: l.id,
                    title: l.title.clone(),
                    duration_seconds: l.duration_seconds,
                    position: l.position,
                    is_preview: l.is_preview,
                    video_url: if has_access || l.is_preview {
                        l.video_url.clone()
                    } else {
                        None
                    },
                })
                .collect(),
            id: module.id,
            title: module.title,
            position: module.position,
        })
        .collect();

    Ok(CourseOutline {
        course,
        modules,
        total_lessons,
        total_duration_seconds,
        has_access,
    })
}

fn non_empty(value: &str, message: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(message));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn input(title: &str, level: &str, price: f64) -> CourseInput {
        CourseInput {
            title: title.to_string(),
            description: "A course".to_string(),
            category: "Programming".to_string(),
            level: level.to_string(),
            price,
            thumbnail_url: None,
            is_published: true,
        }
    }

    #[tokio::test]
    async fn test_create_course_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let instructor = instructor_model("inst_1");

        let result = create_course(&db, &instructor, input("  ", "beginner", 10.0)).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let result = create_course(&db, &instructor, input("Rust", "expert", 10.0)).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let result = create_course(&db, &instructor, input("Rust", "beginner", -1.0)).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidAmount { amount: -1.0 }));

        let result = create_course(&db, &instructor, input("Rust", "beginner", f64::NAN)).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidAmount { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_students_cannot_create_courses() -> Result<()> {
        let db = setup_test_db().await?;
        let student = create_test_user(&db, "student_1").await?;
        let result = create_course(&db, &student, input("Rust", "beginner", 10.0)).await;
        assert!(matches!(result.unwrap_err(), Error::Forbidden { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_course_normalizes_fields() -> Result<()> {
        let db = setup_test_db().await?;
        let instructor = create_test_instructor(&db, "inst_1").await?;
        let course = create_course(&db, &instructor, input(" Rust ", "Advanced", 49.0)).await?;
        assert_eq!(course.title, "Rust");
        assert_eq!(course.category, "programming");
        assert_eq!(course.level, "advanced");
        assert_eq!(course.instructor_id, "inst_1");
        Ok(())
    }

    #[tokio::test]
    async fn test_only_owner_or_admin_can_update() -> Result<()> {
        let db = setup_test_db().await?;
        let owner = create_test_instructor(&db, "owner").await?;
        let other = create_test_instructor(&db, "other").await?;
        let admin = create_test_admin(&db, "admin").await?;
        let course = create_test_course(&db, &owner.id, "Rust", 10.0).await?;

        let result = update_course(&db, &other, course.id, input("Hijack", "beginner", 0.0)).await;
        assert!(matches!(result.unwrap_err(), Error::Forbidden { .. }));

        let updated = update_course(&db, &admin, course.id, input("Rust 2", "beginner", 5.0)).await?;
        assert_eq!(updated.title, "Rust 2");
        assert_eq!(updated.price, 5.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_published_courses_filters() -> Result<()> {
        let db = setup_test_db().await?;
        let owner = create_test_instructor(&db, "owner").await?;
        create_test_course(&db, &owner.id, "Rust Basics", 0.0).await?;
        create_test_course(&db, &owner.id, "Advanced Rust", 80.0).await?;
        let hidden = create_test_course(&db, &owner.id, "Hidden Rust", 10.0).await?;
        let mut active: course::ActiveModel = hidden.into();
        active.is_published = Set(false);
        active.update(&db).await?;

        let all = list_published_courses(&db, &CourseFilter::default(), None).await?;
        assert_eq!(all.len(), 2);

        let free = CourseFilter {
            free_only: true,
            ..Default::default()
        };
        let free_courses = list_published_courses(&db, &free, None).await?;
        assert_eq!(free_courses.len(), 1);
        assert_eq!(free_courses[0].title, "Rust Basics");

        let cheap_first = CourseFilter {
            keywords: vec!["rust".to_string()],
            sort: CourseSort::PriceDesc,
            ..Default::default()
        };
        let sorted = list_published_courses(&db, &cheap_first, Some(1)).await?;
        assert_eq!(sorted.len(), 1);
        assert_eq!(sorted[0].title, "Advanced Rust");

        let categories = list_categories(&db).await?;
        assert_eq!(categories, vec!["programming".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn test_equal_prices_sort_by_id() -> Result<()> {
        let db = setup_test_db().await?;
        let owner = create_test_instructor(&db, "owner").await?;
        let first = create_test_course(&db, &owner.id, "First", 20.0).await?;
        let second = create_test_course(&db, &owner.id, "Second", 20.0).await?;
        let pricey = create_test_course(&db, &owner.id, "Pricey", 90.0).await?;

        for (sort, expected) in [
            (CourseSort::PriceAsc, vec![first.id, second.id, pricey.id]),
            (CourseSort::PriceDesc, vec![pricey.id, first.id, second.id]),
        ] {
            let filter = CourseFilter {
                sort,
                ..Default::default()
            };
            let ids: Vec<i64> = list_published_courses(&db, &filter, None)
                .await?
                .iter()
                .map(|c| c.id)
                .collect();
            assert_eq!(ids, expected);
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_modules_and_lessons_append_positions() -> Result<()> {
        let db = setup_test_db().await?;
        let owner = create_test_instructor(&db, "owner").await?;
        let course = create_test_course(&db, &owner.id, "Rust", 10.0).await?;

        let first = create_module(&db, &owner, course.id, "Intro").await?;
        let second = create_module(&db, &owner, course.id, "Ownership").await?;
        assert_eq!((first.position, second.position), (1, 2));

        let lesson_input = |title: &str| LessonInput {
            title: title.to_string(),
            video_url: Some(format!("https://cdn.example.com/{title}.mp4")),
            duration_seconds: 120,
            is_preview: false,
        };
        create_lesson(&db, &owner, second.id, lesson_input("borrowing")).await?;
        create_lesson(&db, &owner, first.id, lesson_input("hello")).await?;
        let moves = create_lesson(&db, &owner, second.id, lesson_input("moves")).await?;
        assert_eq!(moves.position, 2);

        let ordered = lessons_for_course(&db, course.id).await?;
        let titles: Vec<&str> = ordered.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, vec!["hello", "borrowing", "moves"]);

        let bad = create_lesson(
            &db,
            &owner,
            first.id,
            LessonInput {
                duration_seconds: -5,
                ..lesson_input("bad")
            },
        )
        .await;
        assert!(matches!(bad.unwrap_err(), Error::Validation { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_outline_hides_videos_without_access() -> Result<()> {
        let db = setup_test_db().await?;
        let owner = create_test_instructor(&db, "owner").await?;
        let student = create_test_user(&db, "student").await?;
        let course = create_test_course(&db, &owner.id, "Rust", 10.0).await?;
        create_test_lesson(&db, course.id, "Lesson 1", 60).await?;

        let public = get_course_outline(&db, course.id, Some(&student)).await?;
        assert!(!public.has_access);
        assert_eq!(public.total_lessons, 1);
        assert!(public.modules[0].lessons[0].video_url.is_none());

        enroll_test_user(&db, &student.id, course.id).await?;
        let enrolled = get_course_outline(&db, course.id, Some(&student)).await?;
        assert!(enrolled.has_access);
        assert!(enrolled.modules[0].lessons[0].video_url.is_some());
        assert_eq!(enrolled.total_duration_seconds, 60);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_course_with_students_conflicts() -> Result<()> {
        let db = setup_test_db().await?;
        let owner = create_test_instructor(&db, "owner").await?;
        let student = create_test_user(&db, "student").await?;
        let sold = create_test_course(&db, &owner.id, "Sold", 10.0).await?;
        let unsold = create_test_course(&db, &owner.id, "Draft", 10.0).await?;
        create_test_lesson(&db, unsold.id, "Lesson", 30).await?;
        enroll_test_user(&db, &student.id, sold.id).await?;

        let result = delete_course(&db, &owner, sold.id).await;
        assert!(matches!(result.unwrap_err(), Error::Conflict { .. }));

        delete_course(&db, &owner, unsold.id).await?;
        assert!(get_course_by_id(&db, unsold.id).await?.is_none());
        assert!(lessons_for_course(&db, unsold.id).await?.is_empty());
        Ok(())
    }
}
