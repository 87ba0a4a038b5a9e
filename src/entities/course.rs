//! Course entity - A sellable course authored by an instructor.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Course database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "courses")]
pub struct Model {
    /// Unique identifier for the course
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning instructor's user ID
    pub instructor_id: String,
    /// Course title
    pub title: String,
    /// Long description shown on the course page
    #[sea_orm(column_type = "Text")]
    pub description: String,
    /// Browsing category (e.g., "web development")
    pub category: String,
    /// `"beginner"`, `"intermediate"` or `"advanced"`
    pub level: String,
    /// Price in dollars; zero for free courses
    pub price: f64,
    /// Thumbnail URL hosted by the image CDN
    pub thumbnail_url: Option<String>,
    /// Hidden from the catalogue until published
    pub is_published: bool,
    /// Average rating between 0 and 5
    pub rating: f64,
    /// When the course was created
    pub created_at: DateTimeUtc,
    /// When the course was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Course and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each course belongs to one instructor
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::InstructorId",
        to = "super::user::Column::Id"
    )]
    Instructor,
    /// One course has many modules
    #[sea_orm(has_many = "super::course_module::Entity")]
    Modules,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Instructor.def()
    }
}

impl Related<super::course_module::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Modules.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
