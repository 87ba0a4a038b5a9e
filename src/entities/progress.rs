//! Progress entity - Last known playback position of a user in a lesson.
//!
//! Rows are upserted by the learning player; there is at most one row per
//! (user, lesson) and `completed` never reverts once set.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Progress database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "progress")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user
    pub user_id: String,
    /// Watched lesson
    pub lesson_id: i64,
    /// Playback position in whole seconds
    pub position_seconds: i32,
    /// Set once the lesson is finished; never reverts
    pub completed: bool,
    /// Last modification time
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Progress and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Belongs to a user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    /// Belongs to a lesson
    #[sea_orm(
        belongs_to = "super::lesson::Entity",
        from = "Column::LessonId",
        to = "super::lesson::Column::Id",
        on_delete = "Cascade"
    )]
    Lesson,
}

impl Related<super::lesson::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lesson.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
