//! Wishlist business logic - Courses saved for later.

use crate::{
    core::course as courses,
    entities::{Course, WishlistItem, course, wishlist_item},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};

/// Saves a published course to the user's wishlist.
///
/// # Errors
/// Returns `Error::NotFound` for an unknown course and `Error::Conflict` if it is
/// already saved.
pub async fn add_to_wishlist(
    db: &DatabaseConnection,
    user_id: &str,
    course_id: i64,
) -> Result<wishlist_item::Model> {
    courses::get_published_course(db, course_id).await?;
    if find_item(db, user_id, course_id).await?.is_some() {
        return Err(Error::conflict("Course is already in your wishlist"));
    }
    wishlist_item::ActiveModel {
        user_id: Set(user_id.to_string()),
        course_id: Set(course_id),
        added_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

async fn find_item(
    db: &DatabaseConnection,
    user_id: &str,
    course_id: i64,
) -> Result<Option<wishlist_item::Model>> {
    WishlistItem::find()
        .filter(wishlist_item::Column::UserId.eq(user_id))
        .filter(wishlist_item::Column::CourseId.eq(course_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Removes a course from the wishlist.
///
/// # Errors
/// Returns `Error::NotFound` if the course is not saved.
pub async fn remove_from_wishlist(db: &DatabaseConnection, user_id: &str, course_id: i64) -> Result<()> {
    let item = find_item(db, user_id, course_id)
        .await?
        .ok_or_else(|| Error::not_found("Wishlist item", course_id))?;
    item.delete(db).await?;
    Ok(())
}

/// Saved courses, most recently saved first.
///
/// # Errors
/// Returns an error if a database query fails.
pub async fn list_wishlist(db: &DatabaseConnection, user_id: &str) -> Result<Vec<course::Model>> {
    let items = WishlistItem::find()
        .filter(wishlist_item::Column::UserId.eq(user_id))
        .order_by_desc(wishlist_item::Column::AddedAt)
        .order_by_desc(wishlist_item::Column::Id)
        .all(db)
        .await?;
    let mut saved = Vec::with_capacity(items.len());
    for item in items {
        if let Some(course) = Course::find_by_id(item.course_id).one(db).await? {
            saved.push(course);
        }
    }
    Ok(saved)
}
