//! User business logic - Profile sync from the hosted auth provider and role management.
//!
//! Users are never created by a local sign-up; the first authenticated request syncs
//! the provider's profile into the `users` table. Roles gate the instructor and admin
//! surfaces.

use crate::{
    entities::{User, user},
    errors::{Error, Result},
};
use sea_orm::{Set, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Access role of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Default role; can buy and learn
    Student,
    /// Can author courses and coupons
    Instructor,
    /// Can manage everything
    Admin,
}

impl Role {
    /// Stored representation of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Instructor => "instructor",
            Self::Admin => "admin",
        }
    }

    /// Parses a stored role, treating unknown values as `Student`.
    #[must_use]
    pub fn from_stored(value: &str) -> Self {
        match value {
            "instructor" => Self::Instructor,
            "admin" => Self::Admin,
            _ => Self::Student,
        }
    }
}

/// Role of a user model.
#[must_use]
pub fn role_of(user: &user::Model) -> Role {
    Role::from_stored(&user.role)
}

/// True for admins.
#[must_use]
pub fn is_admin(user: &user::Model) -> bool {
    role_of(user) == Role::Admin
}

/// True for instructors and admins.
#[must_use]
pub fn can_teach(user: &user::Model) -> bool {
    matches!(role_of(user), Role::Instructor | Role::Admin)
}

/// Profile fields supplied by the auth provider.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileInput {
    /// Primary email address.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Avatar URL.
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Inserts or refreshes the profile of `user_id`, keeping its role.
///
/// # Errors
/// Returns `Error::Validation` for an empty subject or email, or a database error.
#[instrument(skip(db, profile))]
pub async fn sync_user(
    db: &DatabaseConnection,
    user_id: &str,
    profile: ProfileInput,
) -> Result<user::Model> {
    let email = profile.email.trim().to_string();
    if user_id.trim().is_empty() {
        return Err(Error::validation("User id cannot be empty"));
    }
    if email.is_empty() || !email.contains('@') {
        return Err(Error::validation("A valid email address is required"));
    }
    let name = match profile.name.trim() {
        "" => email.split('@').next().unwrap_or_default().to_string(),
        trimmed => trimmed.to_string(),
    };

    if let Some(existing) = User::find_by_id(user_id.to_string()).one(db).await? {
        let mut active: user::ActiveModel = existing.into();
        active.email = Set(email);
        active.name = Set(name);
        active.image_url = Set(profile.image_url);
        return active.update(db).await.map_err(Into::into);
    }

    let created = user::ActiveModel {
        id: Set(user_id.to_string()),
        email: Set(email),
        name: Set(name),
        image_url: Set(profile.image_url),
        role: Set(Role::Student.as_str().to_string()),
        created_at: Set(chrono::Utc::now()),
    }
    .insert(db)
    .await?;
    info!("Synced new user {}", created.id);
    Ok(created)
}

/// Fetches a user by subject identifier.
///
/// # Errors
/// Returns a database error if the query fails.
pub async fn get_user(db: &DatabaseConnection, user_id: &str) -> Result<Option<user::Model>> {
    User::find_by_id(user_id.to_string())
        .one(db)
        .await
        .map_err(Into::into)
}

/// Changes the role of a user.
///
/// # Errors
/// Returns `Error::NotFound` if the user does not exist.
#[instrument(skip(db))]
pub async fn set_role(db: &DatabaseConnection, user_id: &str, role: Role) -> Result<user::Model> {
    let existing = get_user(db, user_id)
        .await?
        .ok_or_else(|| Error::not_found("User", user_id))?;
    if role_of(&existing) == role {
        return Ok(existing);
    }
    let mut active: user::ActiveModel = existing.into();
    active.role = Set(role.as_str().to_string());
    let updated = active.update(db).await?;
    info!("User {} is now {}", updated.id, updated.role);
    Ok(updated)
}

/// Promotes a student to instructor; instructors and admins are left unchanged.
///
/// # Errors
/// Returns `Error::NotFound` if the user does not exist.
pub async fn become_instructor(db: &DatabaseConnection, user_id: &str) -> Result<user::Model> {
    let existing = get_user(db, user_id)
        .await?
        .ok_or_else(|| Error::not_found("User", user_id))?;
    if can_teach(&existing) {
        return Ok(existing);
    }
    set_role(db, user_id, Role::Instructor).await
}
