//! Blog post entity - An article addressed by its unique slug.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Blog post database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "blog_posts")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Author user ID
    pub author_id: String,
    /// Post title
    pub title: String,
    /// URL-safe identifier derived from the title
    #[sea_orm(unique)]
    pub slug: String,
    /// Markdown body
    #[sea_orm(column_type = "Text")]
    pub content: String,
    /// Cover image URL, if any
    pub cover_image_url: Option<String>,
    /// Drafts are hidden from readers
    pub is_published: bool,
    /// Creation time
    pub created_at: DateTimeUtc,
    /// Last modification time
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between BlogPost and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each post is written by one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id"
    )]
    Author,
    /// One post has many comments
    #[sea_orm(has_many = "super::comment::Entity")]
    Comments,
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
