//! Coupon business logic - Code lookup, validity checks and discount computation.
//!
//! Coupons are matched by string: the submitted code is trimmed and upper-cased before
//! it is compared with the stored code. A coupon applies a percentage or a fixed amount
//! and never discounts more than the subtotal.

use crate::{
    core::user as users,
    entities::{Coupon, coupon, user},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, prelude::*, sea_query::Expr};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// How a coupon reduces the price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    /// `value` percent of the subtotal
    Percent,
    /// `value` dollars off
    Fixed,
}

impl DiscountType {
    /// Stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Percent => "percent",
            Self::Fixed => "fixed",
        }
    }

    fn from_stored(value: &str) -> Option<Self> {
        match value {
            "percent" => Some(Self::Percent),
            "fixed" => Some(Self::Fixed),
            _ => None,
        }
    }
}

/// Rounds a dollar amount to cents.
#[must_use]
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Normalizes a user-supplied code for matching.
#[must_use]
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Discount a coupon grants on `subtotal`, capped at the subtotal and rounded to cents.
#[must_use]
pub fn discount_for(coupon: &coupon::Model, subtotal: f64) -> f64 {
    if subtotal <= 0.0 {
        return 0.0;
    }
    let raw = match DiscountType::from_stored(&coupon.discount_type) {
        Some(DiscountType::Percent) => subtotal * coupon.value / 100.0,
        Some(DiscountType::Fixed) => coupon.value,
        None => 0.0,
    };
    round_cents(raw.clamp(0.0, subtotal))
}

/// Explains why a coupon cannot be redeemed at `now`, or `None` if it can.
#[must_use]
pub fn rejection_reason(coupon: &coupon::Model, now: DateTime<Utc>) -> Option<&'static str> {
    if !coupon.is_active {
        return Some("coupon is inactive");
    }
    if coupon.expires_at.is_some_and(|expiry| expiry <= now) {
        return Some("coupon has expired");
    }
    if coupon.max_uses.is_some_and(|max| coupon.used_count >= max) {
        return Some("coupon usage limit reached");
    }
    None
}

/// Finds a coupon by code, case-insensitively.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn find_by_code<C>(db: &C, code: &str) -> Result<Option<coupon::Model>>
where
    C: ConnectionTrait,
{
    Coupon::find()
        .filter(coupon::Column::Code.eq(normalize_code(code)))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Looks up a coupon and checks it can be redeemed now.
///
/// # Errors
/// Returns `Error::NotFound` for an unknown code and `Error::InvalidCoupon` when the
/// coupon is inactive, expired or used up.
pub async fn redeemable_coupon<C>(db: &C, code: &str) -> Result<coupon::Model>
where
    C: ConnectionTrait,
{
    let normalized = normalize_code(code);
    if normalized.is_empty() {
        return Err(Error::validation("Coupon code cannot be empty"));
    }
    let coupon = find_by_code(db, &normalized)
        .await?
        .ok_or_else(|| Error::not_found("Coupon", &normalized))?;
    if let Some(reason) = rejection_reason(&coupon, Utc::now()) {
        return Err(Error::InvalidCoupon {
            code: normalized,
            reason: reason.to_string(),
        });
    }
    Ok(coupon)
}

/// Result of applying a coupon to a subtotal.
#[derive(Debug, Clone, Serialize)]
pub struct CouponQuote {
    /// Normalized coupon code.
    pub code: String,
    /// `percent` or `fixed`.
    pub discount_type: String,
    /// Percentage or dollar amount.
    pub value: f64,
    /// Amount the coupon was applied to.
    pub subtotal: f64,
    /// Discount granted, capped at the subtotal.
    pub discount: f64,
    /// Subtotal minus discount.
    pub total: f64,
}

/// Quotes the discount of a coupon on `subtotal`.
///
/// # Errors
/// Returns `Error::InvalidAmount` for a negative or non-finite subtotal, plus the errors
/// of [`redeemable_coupon`].
pub async fn quote<C>(db: &C, code: &str, subtotal: f64) -> Result<CouponQuote>
where
    C: ConnectionTrait,
{
    if !subtotal.is_finite() || subtotal < 0.0 {
        return Err(Error::InvalidAmount { amount: subtotal });
    }
    let coupon = redeemable_coupon(db, code).await?;
    let discount = discount_for(&coupon, subtotal);
    Ok(CouponQuote {
        total: round_cents(subtotal - discount),
        code: coupon.code,
        discount_type: coupon.discount_type,
        value: coupon.value,
        subtotal: round_cents(subtotal),
        discount,
    })
}

/// Counts one redemption of the coupon. The usage limit is checked by the update itself,
/// so concurrent checkouts cannot redeem past `max_uses`.
///
/// # Errors
/// Returns `Error::InvalidCoupon` if the coupon was used up or deactivated since it was
/// read, or an error if the update fails.
pub async fn record_redemption<C>(db: &C, redeemed: &coupon::Model) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = Coupon::update_many()
        .col_expr(
            coupon::Column::UsedCount,
            Expr::col(coupon::Column::UsedCount).add(1),
        )
        .filter(coupon::Column::Id.eq(redeemed.id))
        .filter(coupon::Column::IsActive.eq(true))
        .filter(
            coupon::Column::MaxUses
                .is_null()
                .or(Expr::col(coupon::Column::UsedCount).lt(Expr::col(coupon::Column::MaxUses))),
        )
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(Error::InvalidCoupon {
            code: redeemed.code.clone(),
            reason: "coupon usage limit reached".to_string(),
        });
    }
    Ok(())
}

/// Fields for creating a coupon.
#[derive(Debug, Clone, Deserialize)]
pub struct CouponInput {
    /// Code buyers enter; stored upper-case.
    pub code: String,
    /// Percentage or fixed amount.
    pub discount_type: DiscountType,
    /// Percentage (0, 100] or dollars off.
    pub value: f64,
    /// Redemption limit; unlimited when absent.
    #[serde(default)]
    pub max_uses: Option<i32>,
    /// Expiry; never expires when absent.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Creates a coupon. Only instructors and admins may create coupons.
///
/// # Errors
/// Returns `Error::Forbidden`, `Error::Validation` / `Error::InvalidAmount` for bad input,
/// or `Error::Conflict` if the code already exists.
#[instrument(skip(db, creator, input), fields(creator = %creator.id))]
pub async fn create_coupon(
    db: &DatabaseConnection,
    creator: &user::Model,
    input: CouponInput,
) -> Result<coupon::Model> {
    if !users::can_teach(creator) {
        return Err(Error::forbidden("Only instructors can create coupons"));
    }
    let code = normalize_code(&input.code);
    if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(Error::validation(
            "Coupon code must be non-empty and use letters, digits, '-' or '_'",
        ));
    }
    let value_ok = match input.discount_type {
        DiscountType::Percent => input.value > 0.0 && input.value <= 100.0,
        DiscountType::Fixed => input.value > 0.0,
    };
    if !input.value.is_finite() || !value_ok {
        return Err(Error::InvalidAmount {
            amount: input.value,
        });
    }
    if input.max_uses.is_some_and(|max| max <= 0) {
        return Err(Error::validation("max_uses must be positive"));
    }
    if find_by_code(db, &code).await?.is_some() {
        return Err(Error::conflict(format!("Coupon '{code}' already exists")));
    }

    let created = coupon::ActiveModel {
        code: Set(code),
        discount_type: Set(input.discount_type.as_str().to_string()),
        value: Set(input.value),
        max_uses: Set(input.max_uses),
        used_count: Set(0),
        expires_at: Set(input.expires_at),
        is_active: Set(true),
        created_by: Set(creator.id.clone()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!("Created coupon {} ({} {})", created.code, created.value, created.discount_type);
    Ok(created)
}

/// Lists coupons created by `creator`, newest first.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_coupons_by_creator(
    db: &DatabaseConnection,
    creator_id: &str,
) -> Result<Vec<coupon::Model>> {
    Coupon::find()
        .filter(coupon::Column::CreatedBy.eq(creator_id))
        .order_by_desc(coupon::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use chrono::Duration;

    fn model(discount_type: &str, value: f64) -> coupon::Model {
        coupon::Model {
            id: 1,
            code: "SAVE".to_string(),
            discount_type: discount_type.to_string(),
            value,
            max_uses: None,
            used_count: 0,
            expires_at: None,
            is_active: true,
            created_by: "owner".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_discount_for_percent_and_fixed() {
        assert_eq!(discount_for(&model("percent", 20.0), 49.99), 10.0);
        assert_eq!(discount_for(&model("fixed", 15.0), 49.99), 15.0);
        // Capped at the subtotal
        assert_eq!(discount_for(&model("fixed", 80.0), 49.99), 49.99);
        assert_eq!(discount_for(&model("percent", 50.0), 0.0), 0.0);
    }

    #[test]
    fn test_rejection_reason() {
        let now = Utc::now();
        assert!(rejection_reason(&model("percent", 10.0), now).is_none());

        let mut inactive = model("percent", 10.0);
        inactive.is_active = false;
        assert_eq!(rejection_reason(&inactive, now), Some("coupon is inactive"));

        let mut expired = model("percent", 10.0);
        expired.expires_at = Some(now - Duration::hours(1));
        assert_eq!(rejection_reason(&expired, now), Some("coupon has expired"));

        let mut used_up = model("percent", 10.0);
        used_up.max_uses = Some(2);
        used_up.used_count = 2;
        assert_eq!(rejection_reason(&used_up, now), Some("coupon usage limit reached"));
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("  save10 "), "SAVE10");
    }

    #[tokio::test]
    async fn test_quote_matches_case_insensitively() -> Result<()> {
        let db = setup_test_db().await?;
        let owner = create_test_instructor(&db, "owner").await?;
        create_test_coupon(&db, &owner, "WELCOME", DiscountType::Percent, 25.0).await?;

        let quoted = quote(&db, " welcome ", 80.0).await?;
        assert_eq!(quoted.code, "WELCOME");
        assert_eq!(quoted.discount, 20.0);
        assert_eq!(quoted.total, 60.0);

        let missing = quote(&db, "NOPE", 80.0).await;
        assert!(matches!(missing.unwrap_err(), Error::NotFound { .. }));

        let negative = quote(&db, "WELCOME", -1.0).await;
        assert!(matches!(negative.unwrap_err(), Error::InvalidAmount { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_used_up_coupon_is_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let owner = create_test_instructor(&db, "owner").await?;
        let coupon = create_coupon(
            &db,
            &owner,
            CouponInput {
                code: "ONCE".to_string(),
                discount_type: DiscountType::Fixed,
                value: 5.0,
                max_uses: Some(1),
                expires_at: None,
            },
        )
        .await?;

        quote(&db, "ONCE", 10.0).await?;
        record_redemption(&db, &coupon).await?;
        let result = quote(&db, "ONCE", 10.0).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidCoupon { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_redemption_stops_at_limit() -> Result<()> {
        let db = setup_test_db().await?;
        let owner = create_test_instructor(&db, "owner").await?;
        let coupon = create_coupon(
            &db,
            &owner,
            CouponInput {
                code: "TWICE".to_string(),
                discount_type: DiscountType::Percent,
                value: 10.0,
                max_uses: Some(2),
                expires_at: None,
            },
        )
        .await?;

        // Both redemptions read the coupon before either was counted
        let first = redeemable_coupon(&db, "TWICE").await?;
        let second = redeemable_coupon(&db, "TWICE").await?;
        let third = redeemable_coupon(&db, "TWICE").await?;
        record_redemption(&db, &first).await?;
        record_redemption(&db, &second).await?;
        let over = record_redemption(&db, &third).await;
        assert!(matches!(over.unwrap_err(), Error::InvalidCoupon { .. }));

        let stored = Coupon::find_by_id(coupon.id).one(&db).await?.unwrap();
        assert_eq!(stored.used_count, 2);

        let unlimited = create_test_coupon(&db, &owner, "ALWAYS", DiscountType::Fixed, 1.0).await?;
        for _ in 0..3 {
            record_redemption(&db, &unlimited).await?;
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_create_coupon_validation() -> Result<()> {
        let db = setup_test_db().await?;
        let owner = create_test_instructor(&db, "owner").await?;
        let student = create_test_user(&db, "student").await?;
        let input = |code: &str, discount_type, value| CouponInput {
            code: code.to_string(),
            discount_type,
            value,
            max_uses: None,
            expires_at: None,
        };

        let forbidden = create_coupon(&db, &student, input("A", DiscountType::Fixed, 1.0)).await;
        assert!(matches!(forbidden.unwrap_err(), Error::Forbidden { .. }));

        let bad_code = create_coupon(&db, &owner, input("two words", DiscountType::Fixed, 1.0)).await;
        assert!(matches!(bad_code.unwrap_err(), Error::Validation { .. }));

        let too_much = create_coupon(&db, &owner, input("BIG", DiscountType::Percent, 150.0)).await;
        assert!(matches!(too_much.unwrap_err(), Error::InvalidAmount { .. }));

        create_coupon(&db, &owner, input("dup", DiscountType::Fixed, 1.0)).await?;
        let duplicate = create_coupon(&db, &owner, input("DUP", DiscountType::Fixed, 2.0)).await;
        assert!(matches!(duplicate.unwrap_err(), Error::Conflict { .. }));

        assert_eq!(list_coupons_by_creator(&db, &owner.id).await?.len(), 1);
        Ok(())
    }
}
