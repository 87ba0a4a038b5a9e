//! Contact message entity - A message submitted through the contact form.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Contact message database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "contact_messages")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Sender name
    pub name: String,
    /// Sender email address
    pub email: String,
    /// Subject line
    pub subject: String,
    /// Message body
    #[sea_orm(column_type = "Text")]
    pub message: String,
    /// Creation time
    pub created_at: DateTimeUtc,
}

/// Defines relationships between ContactMessage and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
