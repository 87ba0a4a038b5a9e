//! Order business logic - Checkout of the cart and order history.
//!
//! Checkout runs in one database transaction: the order and its items are written at
//! current course prices, the coupon redemption is counted, the buyer is enrolled in
//! every course and the cart is emptied. Payment capture is outside this service, so
//! orders are recorded as paid.

use crate::{
    core::{cart, coupon, enrollment},
    entities::{Order, OrderItem, order, order_item, user},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Serialize;
use tracing::{info, instrument};

/// Status recorded for completed checkouts.
pub const STATUS_PAID: &str = "paid";

/// An order with its items.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetails {
    /// The order row.
    #[serde(flatten)]
    pub order: order::Model,
    /// Purchased courses at the price paid.
    pub items: Vec<order_item::Model>,
}

/// Converts the user's cart into a paid order.
///
/// # Errors
/// Returns `Error::Validation` for a cart with no published courses, coupon errors for an invalid
/// `coupon_code`, or a database error (in which case nothing is written).
#[instrument(skip(db, buyer), fields(user = %buyer.id))]
pub async fn checkout(
    db: &DatabaseConnection,
    buyer: &user::Model,
    coupon_code: Option<&str>,
) -> Result<OrderDetails> {
    let txn = db.begin().await?;

    let lines = cart::cart_lines(&txn, &buyer.id).await?;
    if lines.is_empty() {
        return Err(Error::validation("Your cart is empty"));
    }
    let subtotal = cart::subtotal_of(lines.iter().map(|(_, c)| &c.price));

    let redeemed = match coupon_code.map(str::trim).filter(|c| !c.is_empty()) {
        Some(code) => Some(coupon::redeemable_coupon(&txn, code).await?),
        None => None,
    };
    let discount = redeemed
        .as_ref()
        .map_or(0.0, |c| coupon::discount_for(c, subtotal));

    let placed = order::ActiveModel {
        user_id: Set(buyer.id.clone()),
        subtotal: Set(subtotal),
        discount: Set(discount),
        total: Set(coupon::round_cents((subtotal - discount).max(0.0))),
        coupon_code: Set(redeemed.as_ref().map(|c| c.code.clone())),
        status: Set(STATUS_PAID.to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(lines.len());
    for (_, course) in &lines {
        let item = order_item::ActiveModel {
            order_id: Set(placed.id),
            course_id: Set(course.id),
            price: Set(course.price),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        items.push(item);
        enrollment::enroll(&txn, &buyer.id, course.id).await?;
    }

    if let Some(redeemed) = &redeemed {
        coupon::record_redemption(&txn, redeemed).await?;
    }
    cart::clear_cart(&txn, &buyer.id).await?;

    txn.commit().await?;
    info!(
        "Order {} placed: {} courses, total {:.2}",
        placed.id,
        items.len(),
        placed.total
    );
    Ok(OrderDetails {
        order: placed,
        items,
    })
}

/// Lists the user's orders, newest first.
///
/// # Errors
/// Returns an error if a database query fails.
pub async fn list_orders(db: &DatabaseConnection, user_id: &str) -> Result<Vec<OrderDetails>> {
    let orders = Order::find()
        .filter(order::Column::UserId.eq(user_id))
        .order_by_desc(order::Column::CreatedAt)
        .order_by_desc(order::Column::Id)
        .all(db)
        .await?;
    let mut details = Vec::with_capacity(orders.len());
    for order in orders {
        let items = OrderItem::find()
            .filter(order_item::Column::OrderId.eq(order.id))
            .order_by_asc(order_item::Column::Id)
            .all(db)
            .await?;
        details.push(OrderDetails { order, items });
    }
    Ok(details)
}
