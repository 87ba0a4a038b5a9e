//! Core business logic - framework-agnostic marketplace operations.
//!
//! Every function takes a database connection and plain inputs, and returns entity models
//! or view structs. The HTTP layer in [`crate::api`] only maps requests onto these calls.

pub mod blog;
pub mod cart;
pub mod chat;
pub mod comment;
pub mod contact;
pub mod coupon;
pub mod course;
pub mod enrollment;
pub mod instructor;
pub mod order;
pub mod progress;
pub mod user;
pub mod wishlist;
