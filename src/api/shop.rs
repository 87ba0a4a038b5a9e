//! Cart, coupon preview, checkout, orders and wishlist endpoints.

use crate::{
    api::{
        auth::CurrentUser,
        error::{ApiJson, ApiPath, ApiQuery},
        state::SharedState,
    },
    core::{
        cart::{self, CartView},
        coupon::{self, CouponQuote},
        order::{self, OrderDetails},
        wishlist,
    },
    entities::{cart_item, course, wishlist_item},
    errors::{Error, Result},
};
use axum::{Json, body::Bytes, extract::State, http::StatusCode};
use serde::Deserialize;

/// Body naming a course.
#[derive(Debug, Deserialize)]
pub struct CourseRef {
    /// Course to add.
    pub course_id: i64,
}

/// `?coupon=CODE` on the cart view.
#[derive(Debug, Default, Deserialize)]
pub struct CartQuery {
    /// Coupon code to preview against the cart.
    pub coupon: Option<String>,
}

/// Coupon preview body.
#[derive(Debug, Deserialize)]
pub struct ValidateCoupon {
    /// Coupon code, any case.
    pub code: String,
    /// Amount the discount applies to.
    pub subtotal: f64,
}

/// Checkout body; the coupon is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckoutRequest {
    /// Coupon code to redeem.
    #[serde(default)]
    pub coupon: Option<String>,
}

impl CheckoutRequest {
    /// Parses the checkout body. An empty body means no coupon; anything else must be a
    /// valid request object.
    ///
    /// # Errors
    /// Returns `Error::Validation` when the body is not a valid request.
    pub fn parse(body: &[u8]) -> Result<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
            .map_err(|e| Error::validation(format!("Invalid checkout body: {e}")))
    }
}

fn non_blank(code: Option<&str>) -> Option<&str> {
    code.map(str::trim).filter(|c| !c.is_empty())
}

/// `GET /api/cart`
pub async fn view_cart(
    State(state): State<SharedState>,
    CurrentUser(me): CurrentUser,
    ApiQuery(query): ApiQuery<CartQuery>,
) -> Result<Json<CartView>> {
    let code = non_blank(query.coupon.as_deref());
    Ok(Json(cart::view_cart(&state.db, &me.id, code).await?))
}

/// `POST /api/cart`
pub async fn add_to_cart(
    State(state): State<SharedState>,
    CurrentUser(me): CurrentUser,
    ApiJson(body): ApiJson<CourseRef>,
) -> Result<(StatusCode, Json<cart_item::Model>)> {
    let added = cart::add_to_cart(&state.db, &me, body.course_id).await?;
    Ok((StatusCode::CREATED, Json(added)))
}

/// `DELETE /api/cart/:course_id`
pub async fn remove_from_cart(
    State(state): State<SharedState>,
    CurrentUser(me): CurrentUser,
    ApiPath(course_id): ApiPath<i64>,
) -> Result<StatusCode> {
    cart::remove_from_cart(&state.db, &me.id, course_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /api/cart`
pub async fn clear_cart(
    State(state): State<SharedState>,
    CurrentUser(me): CurrentUser,
) -> Result<StatusCode> {
    cart::clear_cart(&state.db, &me.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/coupon/validate`
pub async fn validate_coupon(
    State(state): State<SharedState>,
    ApiJson(body): ApiJson<ValidateCoupon>,
) -> Result<Json<CouponQuote>> {
    Ok(Json(coupon::quote(&state.db, &body.code, body.subtotal).await?))
}

/// `POST /api/checkout`
pub async fn checkout(
    State(state): State<SharedState>,
    CurrentUser(me): CurrentUser,
    body: Bytes,
) -> Result<(StatusCode, Json<OrderDetails>)> {
    let request = CheckoutRequest::parse(&body)?;
    let placed = order::checkout(&state.db, &me, non_blank(request.coupon.as_deref())).await?;
    Ok((StatusCode::CREATED, Json(placed)))
}

/// `GET /api/orders`
pub async fn list_orders(
    State(state): State<SharedState>,
    CurrentUser(me): CurrentUser,
) -> Result<Json<Vec<OrderDetails>>> {
    Ok(Json(order::list_orders(&state.db, &me.id).await?))
}

/// `GET /api/wishlist`
pub async fn list_wishlist(
    State(state): State<SharedState>,
    CurrentUser(me): CurrentUser,
) -> Result<Json<Vec<course::Model>>> {
    Ok(Json(wishlist::list_wishlist(&state.db, &me.id).await?))
}

/// `POST /api/wishlist`
pub async fn add_to_wishlist(
    State(state): State<SharedState>,
    CurrentUser(me): CurrentUser,
    ApiJson(body): ApiJson<CourseRef>,
) -> Result<(StatusCode, Json<wishlist_item::Model>)> {
    let added = wishlist::add_to_wishlist(&state.db, &me.id, body.course_id).await?;
    Ok((StatusCode::CREATED, Json(added)))
}

/// `DELETE /api/wishlist/:course_id`
pub async fn remove_from_wishlist(
    State(state): State<SharedState>,
    CurrentUser(me): CurrentUser,
    ApiPath(course_id): ApiPath<i64>,
) -> Result<StatusCode> {
    wishlist::remove_from_wishlist(&state.db, &me.id, course_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_body_parsing() {
        assert!(CheckoutRequest::parse(b"").unwrap_or_default().coupon.is_none());
        assert!(CheckoutRequest::parse(b" \n").unwrap_or_default().coupon.is_none());
        assert_eq!(
            CheckoutRequest::parse(br#"{"coupon":"HALF"}"#)
                .unwrap_or_default()
                .coupon
                .as_deref(),
            Some("HALF")
        );
        for bad in [&b"{"[..], br#"{"coupon":5}"#, br#"{"cupon":"HALF"}"#, b"null"] {
            assert!(matches!(
                CheckoutRequest::parse(bad),
                Err(Error::Validation { .. })
            ));
        }
    }
}
