//! Lesson entity - A single video lesson inside a course module.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lesson database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "lessons")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Parent module
    pub module_id: i64,
    /// Lesson title
    pub title: String,
    /// Video URL; only exposed to enrolled users unless `is_preview`
    pub video_url: Option<String>,
    /// Video length in seconds; zero when unknown
    pub duration_seconds: i32,
    /// Display order within the module, starting at 1
    pub position: i32,
    /// Free preview lessons are visible to everyone
    pub is_preview: bool,
}

/// Defines relationships between Lesson and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each lesson belongs to one module
    #[sea_orm(
        belongs_to = "super::course_module::Entity",
        from = "Column::ModuleId",
        to = "super::course_module::Column::Id",
        on_delete = "Cascade"
    )]
    Module,
}

impl Related<super::course_module::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Module.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
