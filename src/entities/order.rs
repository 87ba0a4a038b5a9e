//! Order entity - A completed checkout of a user's cart.
//!
//! Amounts are captured at checkout time so later price changes do not
//! rewrite history.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Order database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    /// Unique identifier for the order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Purchasing user
    pub user_id: String,
    /// Sum of item prices before discount
    pub subtotal: f64,
    /// Coupon discount applied
    pub discount: f64,
    /// Amount charged (`subtotal - discount`)
    pub total: f64,
    /// Normalized coupon code, if one was applied
    pub coupon_code: Option<String>,
    /// Order status; checkout records `"paid"`
    pub status: String,
    /// When the order was placed
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Order and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each order belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    /// One order has many items
    #[sea_orm(has_many = "super::order_item::Entity")]
    Items,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
