//! Unified error types for `BrainiX`.
//!
//! Core operations return [`Result`]; the HTTP layer maps each variant to a
//! status code in `api::error`.

use thiserror::Error;

/// Errors raised by `BrainiX` operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed configuration
    #[error("Configuration error: {message}")]
    Config {
        /// What is wrong
        message: String,
    },

    /// Query or connection failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Client input rejected
    #[error("{message}")]
    Validation {
        /// Reason shown to the client
        message: String,
    },

    /// Price, subtotal or coupon value out of range
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// Rejected amount
        amount: f64,
    },

    /// Missing record, or one hidden from the caller
    #[error("{entity} '{id}' not found")]
    NotFound {
        /// Kind of record
        entity: &'static str,
        /// Requested id, slug or code
        id: String,
    },

    /// No authenticated user
    #[error("Authentication required")]
    Unauthorized,

    /// Authenticated but not allowed
    #[error("{message}")]
    Forbidden {
        /// Reason shown to the client
        message: String,
    },

    /// Duplicate or state conflict
    #[error("{message}")]
    Conflict {
        /// Reason shown to the client
        message: String,
    },

    /// Coupon exists but cannot be redeemed
    #[error("Coupon '{code}' is not valid: {reason}")]
    InvalidCoupon {
        /// Normalized code
        code: String,
        /// Inactive, expired or used up
        reason: String,
    },

    /// Language model request failed
    #[error("Language model error: {message}")]
    Llm {
        /// Failure detail
        message: String,
    },

    /// Redis failure
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// Outgoing HTTP failure
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON encoding or decoding failure
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for [`Error::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for [`Error::NotFound`].
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Shorthand for [`Error::Forbidden`].
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Shorthand for [`Error::Conflict`].
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
