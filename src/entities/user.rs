//! User entity - A person known to the hosted auth provider.
//!
//! The primary key is the provider's subject identifier, so rows are created by
//! syncing a profile rather than by a local sign-up flow.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Subject identifier issued by the auth provider
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Primary email address
    pub email: String,
    /// Display name
    pub name: String,
    /// Avatar URL hosted by the image CDN
    pub image_url: Option<String>,
    /// One of `"student"`, `"instructor"` or `"admin"`
    pub role: String,
    /// When the profile was first synced
    pub created_at: DateTimeUtc,
}

/// `User` is referenced by other tables but declares no outgoing relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
