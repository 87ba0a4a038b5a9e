//! Course module entity - An ordered section of a course grouping lessons.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Course module database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "course_modules")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Referenced course
    pub course_id: i64,
    /// Module title
    pub title: String,
    /// Display order within the course, starting at 1
    pub position: i32,
}

/// Defines relationships between CourseModule and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each module belongs to one course
    #[sea_orm(
        belongs_to = "super::course::Entity",
        from = "Column::CourseId",
        to = "super::course::Column::Id",
        on_delete = "Cascade"
    )]
    Course,
    /// One module has many lessons
    #[sea_orm(has_many = "super::lesson::Entity")]
    Lessons,
}

impl Related<super::course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl Related<super::lesson::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lessons.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
