//! Coupon entity - A discount code redeemable at checkout.
//!
//! Codes are stored upper-case and matched case-insensitively. A coupon is
//! either a percentage off the subtotal or a fixed amount.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Coupon database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "coupons")]
pub struct Model {
    /// Unique identifier for the coupon
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Redeemable code, upper-case
    #[sea_orm(unique)]
    pub code: String,
    /// `"percent"` or `"fixed"`
    pub discount_type: String,
    /// Percentage (0, 100] or dollar amount depending on `discount_type`
    pub value: f64,
    /// Maximum number of redemptions; unlimited when `None`
    pub max_uses: Option<i32>,
    /// Number of completed redemptions
    pub used_count: i32,
    /// Expiry instant; never expires when `None`
    pub expires_at: Option<DateTimeUtc>,
    /// Disabled coupons are never valid
    pub is_active: bool,
    /// User who created the coupon
    pub created_by: String,
    /// When the coupon was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Coupon and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each coupon is created by one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatedBy",
        to = "super::user::Column::Id"
    )]
    Creator,
}

impl ActiveModelBehavior for ActiveModel {}
