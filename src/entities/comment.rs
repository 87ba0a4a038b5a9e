//! Comment entity - A blog comment, optionally replying to another comment.
//!
//! Replies reference their parent through `parent_id`; deleting a comment
//! cascades to its replies.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Comment database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "comments")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Post the comment belongs to
    pub post_id: i64,
    /// Commenter user ID
    pub author_id: String,
    /// Parent comment for replies; `None` for top-level comments
    pub parent_id: Option<i64>,
    /// Body text
    #[sea_orm(column_type = "Text")]
    pub content: String,
    /// Creation time
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Comment and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each comment belongs to one post
    #[sea_orm(
        belongs_to = "super::blog_post::Entity",
        from = "Column::PostId",
        to = "super::blog_post::Column::Id",
        on_delete = "Cascade"
    )]
    Post,
    /// Each comment is written by one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id"
    )]
    Author,
    /// Replies point at the comment they answer
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id",
        on_delete = "Cascade"
    )]
    Parent,
}

impl Related<super::blog_post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
