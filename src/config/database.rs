//! Database configuration module for `BrainiX`.
//!
//! This module handles the database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs. Composite uniqueness (one cart row per
//! user and course, one progress row per user and lesson, ...) is added with explicit
//! index statements because it cannot be expressed on a single column.

use crate::entities::{
    BlogPost, CartItem, CartItemColumn, Comment, ContactMessage, Coupon, Course, CourseModule,
    Enrollment, EnrollmentColumn, Lesson, Order, OrderItem, Progress, ProgressColumn, User,
    WishlistItem, WishlistItemColumn,
};
use crate::errors::Result;
use sea_orm::sea_query::{Index, IndexCreateStatement};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use std::path::Path;
use tracing::{debug, info};

/// Establishes a connection to the database at `database_url`.
///
/// # Errors
/// Returns `Error::Database` if the URL is invalid or the database is unreachable.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    if let Some(dir) = sqlite_parent_dir(database_url) {
        std::fs::create_dir_all(dir)?;
    }
    debug!("Connecting to database");
    Database::connect(database_url).await.map_err(Into::into)
}

/// Directory holding a file-backed `SQLite` database, if it has one.
fn sqlite_parent_dir(database_url: &str) -> Option<&Path> {
    let path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = path.split('?').next().unwrap_or_default();
    if path.is_empty() || path.starts_with(":memory:") {
        return None;
    }
    Path::new(path).parent().filter(|p| !p.as_os_str().is_empty())
}

/// Creates all tables and composite unique indexes if they do not exist yet.
///
/// Parent tables are created before the tables referencing them.
///
/// # Errors
/// Returns `Error::Database` if any statement fails.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    create_table(db, User).await?;
    create_table(db, Course).await?;
    create_table(db, CourseModule).await?;
    create_table(db, Lesson).await?;
    create_table(db, Enrollment).await?;
    create_table(db, Progress).await?;
    create_table(db, CartItem).await?;
    create_table(db, WishlistItem).await?;
    create_table(db, Order).await?;
    create_table(db, OrderItem).await?;
    create_table(db, Coupon).await?;
    create_table(db, BlogPost).await?;
    create_table(db, Comment).await?;
    create_table(db, ContactMessage).await?;

    let builder = db.get_database_backend();
    for index in unique_indexes() {
        db.execute(builder.build(&index)).await?;
    }

    info!("Database tables ensured");
    Ok(())
}

async fn create_table<E>(db: &DatabaseConnection, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

fn unique_indexes() -> Vec<IndexCreateStatement> {
    vec![
        Index::create()
            .name("idx_enrollments_user_course")
            .table(Enrollment)
            .col(EnrollmentColumn::UserId)
            .col(EnrollmentColumn::CourseId)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_progress_user_lesson")
            .table(Progress)
            .col(ProgressColumn::UserId)
            .col(ProgressColumn::LessonId)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_cart_items_user_course")
            .table(CartItem)
            .col(CartItemColumn::UserId)
            .col(CartItemColumn::CourseId)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_wishlist_items_user_course")
            .table(WishlistItem)
            .col(WishlistItemColumn::UserId)
            .col(WishlistItemColumn::CourseId)
            .unique()
            .if_not_exists()
            .to_owned(),
    ]
}
