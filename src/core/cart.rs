//! Cart business logic - Adding, removing and pricing the courses a user intends to buy.
//!
//! Totals are always recomputed from current course prices; an optional coupon code is
//! applied to the subtotal on every read, so the cart itself never stores a discount.

use crate::{
    core::{
        coupon::{self, CouponQuote},
        course as courses, enrollment,
    },
    entities::{CartItem, Course, cart_item, course, user},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{info, instrument};

/// One course in the cart.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    /// Course in the cart.
    pub course_id: i64,
    /// Course title.
    pub title: String,
    /// Current course price.
    pub price: f64,
    /// Course thumbnail, if any.
    pub thumbnail_url: Option<String>,
    /// When the course was added.
    pub added_at: DateTime<Utc>,
}

/// Cart with recomputed totals.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    /// Purchasable courses, oldest first.
    pub items: Vec<CartLine>,
    /// Sum of current prices.
    pub subtotal: f64,
    /// Discount from the previewed coupon.
    pub discount: f64,
    /// Amount due, never negative.
    pub total: f64,
    /// The previewed coupon.
    pub coupon: Option<CouponQuote>,
}

/// Adds a published course to the user's cart.
///
/// # Errors
/// Returns `Error::NotFound` for an unknown or unpublished course and `Error::Conflict`
/// if the course is already in the cart, already owned, or authored by the user.
#[instrument(skip(db, buyer), fields(user = %buyer.id))]
pub async fn add_to_cart(
    db: &DatabaseConnection,
    buyer: &user::Model,
    course_id: i64,
) -> Result<cart_item::Model> {
    let course = courses::get_published_course(db, course_id).await?;
    if course.instructor_id == buyer.id {
        return Err(Error::conflict("You cannot buy your own course"));
    }
    if enrollment::is_enrolled(db, &buyer.id, course_id).await? {
        return Err(Error::conflict("You are already enrolled in this course"));
    }
    if find_item(db, &buyer.id, course_id).await?.is_some() {
        return Err(Error::conflict("Course is already in your cart"));
    }
    let item = cart_item::ActiveModel {
        user_id: Set(buyer.id.clone()),
        course_id: Set(course_id),
        added_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!("Added course {} to cart", course.id);
    Ok(item)
}

async fn find_item<C>(db: &C, user_id: &str, course_id: i64) -> Result<Option<cart_item::Model>>
where
    C: ConnectionTrait,
{
    CartItem::find()
        .filter(cart_item::Column::UserId.eq(user_id))
        .filter(cart_item::Column::CourseId.eq(course_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Removes a course from the user's cart.
///
/// # Errors
/// Returns `Error::NotFound` if the course is not in the cart.
pub async fn remove_from_cart(db: &DatabaseConnection, user_id: &str, course_id: i64) -> Result<()> {
    let item = find_item(db, user_id, course_id)
        .await?
        .ok_or_else(|| Error::not_found("Cart item", course_id))?;
    item.delete(db).await?;
    Ok(())
}

/// Empties the user's cart, returning the number of removed items.
///
/// # Errors
/// Returns an error if the delete fails.
pub async fn clear_cart<C>(db: &C, user_id: &str) -> Result<u64>
where
    C: ConnectionTrait,
{
    let result = CartItem::delete_many()
        .filter(cart_item::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Cart lines joined with their courses, oldest first. Courses unpublished since they
/// were added are left out, so they are neither priced nor sold.
///
/// # Errors
/// Returns an error if a database query fails.
pub async fn cart_lines<C>(db: &C, user_id: &str) -> Result<Vec<(cart_item::Model, course::Model)>>
where
    C: ConnectionTrait,
{
    let items = CartItem::find()
        .filter(cart_item::Column::UserId.eq(user_id))
        .order_by_asc(cart_item::Column::AddedAt)
        .order_by_asc(cart_item::Column::Id)
        .all(db)
        .await?;
    let course_ids: Vec<i64> = items.iter().map(|i| i.course_id).collect();
    let mut by_id: HashMap<i64, course::Model> = Course::find()
        .filter(course::Column::Id.is_in(course_ids))
        .filter(course::Column::IsPublished.eq(true))
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();
    Ok(items
        .into_iter()
        .filter_map(|item| by_id.remove(&item.course_id).map(|c| (item, c)))
        .collect())
}

/// Subtotal of course prices, rounded to cents.
#[must_use]
pub fn subtotal_of<'a, I>(prices: I) -> f64
where
    I: IntoIterator<Item = &'a f64>,
{
    coupon::round_cents(prices.into_iter().sum())
}

/// Returns the cart with totals, applying `coupon_code` when given.
///
/// # Errors
/// Returns the coupon errors of [`coupon::quote`] for an invalid code.
pub async fn view_cart(
    db: &DatabaseConnection,
    user_id: &str,
    coupon_code: Option<&str>,
) -> Result<CartView> {
    let lines = cart_lines(db, user_id).await?;
    let items: Vec<CartLine> = lines
        .into_iter()
        .map(|(item, course)| CartLine {
            course_id: course.id,
            title: course.title,
            price: course.price,
            thumbnail_url: course.thumbnail_url,
            added_at: item.added_at,
        })
        .collect();
    let subtotal = subtotal_of(items.iter().map(|i| &i.price));

    let coupon = match coupon_code.map(str::trim).filter(|c| !c.is_empty()) {
        Some(code) => Some(coupon::quote(db, code, subtotal).await?),
        None => None,
    };
    let discount = coupon.as_ref().map_or(0.0, |q| q.discount);
    Ok(CartView {
        items,
        subtotal,
        discount,
        total: coupon::round_cents((subtotal - discount).max(0.0)),
        coupon,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::coupon::DiscountType;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_add_and_view_cart() -> Result<()> {
        let db = setup_test_db().await?;
        let owner = create_test_instructor(&db, "owner").await?;
        let buyer = create_test_user(&db, "buyer").await?;
        let rust = create_test_course(&db, &owner.id, "Rust", 19.99).await?;
        let go = create_test_course(&db, &owner.id, "Go", 10.01).await?;

        add_to_cart(&db, &buyer, rust.id).await?;
        add_to_cart(&db, &buyer, go.id).await?;

        let cart = view_cart(&db, &buyer.id, None).await?;
        assert_eq!(cart.items.len(), 2);
        assert_eq!(cart.items[0].title, "Rust");
        assert_eq!(cart.subtotal, 30.0);
        assert_eq!(cart.total, 30.0);
        assert!(cart.coupon.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_add_to_cart_conflicts() -> Result<()> {
        let db = setup_test_db().await?;
        let owner = create_test_instructor(&db, "owner").await?;
        let buyer = create_test_user(&db, "buyer").await?;
        let course = create_test_course(&db, &owner.id, "Rust", 20.0).await?;
        let owned = create_test_course(&db, &owner.id, "Owned", 20.0).await?;
        enroll_test_user(&db, &buyer.id, owned.id).await?;

        add_to_cart(&db, &buyer, course.id).await?;
        let twice = add_to_cart(&db, &buyer, course.id).await;
        assert!(matches!(twice.unwrap_err(), Error::Conflict { .. }));

        let already_owned = add_to_cart(&db, &buyer, owned.id).await;
        assert!(matches!(already_owned.unwrap_err(), Error::Conflict { .. }));

        let own_course = add_to_cart(&db, &owner, course.id).await;
        assert!(matches!(own_course.unwrap_err(), Error::Conflict { .. }));

        let missing = add_to_cart(&db, &buyer, 4242).await;
        assert!(matches!(missing.unwrap_err(), Error::NotFound { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_view_cart_with_coupon() -> Result<()> {
        let db = setup_test_db().await?;
        let owner = create_test_instructor(&db, "owner").await?;
        let buyer = create_test_user(&db, "buyer").await?;
        let course = create_test_course(&db, &owner.id, "Rust", 40.0).await?;
        create_test_coupon(&db, &owner, "HALF", DiscountType::Percent, 50.0).await?;
        create_test_coupon(&db, &owner, "HUGE", DiscountType::Fixed, 100.0).await?;
        add_to_cart(&db, &buyer, course.id).await?;

        let half = view_cart(&db, &buyer.id, Some("half")).await?;
        assert_eq!(half.discount, 20.0);
        assert_eq!(half.total, 20.0);

        let huge = view_cart(&db, &buyer.id, Some("HUGE")).await?;
        assert_eq!(huge.discount, 40.0);
        assert_eq!(huge.total, 0.0);

        // Blank codes are ignored
        let blank = view_cart(&db, &buyer.id, Some("  ")).await?;
        assert!(blank.coupon.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_and_clear_cart() -> Result<()> {
        let db = setup_test_db().await?;
        let owner = create_test_instructor(&db, "owner").await?;
        let buyer = create_test_user(&db, "buyer").await?;
        let first = create_test_course(&db, &owner.id, "One", 1.0).await?;
        let second = create_test_course(&db, &owner.id, "Two", 2.0).await?;
        add_to_cart(&db, &buyer, first.id).await?;
        add_to_cart(&db, &buyer, second.id).await?;

        remove_from_cart(&db, &buyer.id, first.id).await?;
        let missing = remove_from_cart(&db, &buyer.id, first.id).await;
        assert!(matches!(missing.unwrap_err(), Error::NotFound { .. }));

        assert_eq!(clear_cart(&db, &buyer.id).await?, 1);
        assert!(view_cart(&db, &buyer.id, None).await?.items.is_empty());
        Ok(())
    }
}
