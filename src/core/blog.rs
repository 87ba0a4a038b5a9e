//! Blog business logic - Posts addressed by slug.
//!
//! Slugs are derived from titles and stay stable when a post is edited, so links keep
//! working after a title change.

use crate::{
    core::user as users,
    entities::{BlogPost, blog_post, user},
    errors::{Error, Result},
};
use regex::Regex;
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Deserialize;
use std::sync::LazyLock;
use tracing::{info, instrument};

static NON_SLUG_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"[^a-z0-9]+").unwrap()
});

/// Converts a title into a URL slug: lower-case alphanumerics separated by single hyphens.
#[must_use]
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    NON_SLUG_CHARS
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

/// Fields an author supplies for a post.
#[derive(Debug, Clone, Deserialize)]
pub struct PostInput {
    /// Post title; the slug is derived from it.
    pub title: String,
    /// Post body.
    pub content: String,
    /// Cover image URL.
    #[serde(default)]
    pub cover_image_url: Option<String>,
    /// Drafts are visible only to their author and admins.
    #[serde(default = "default_published")]
    pub is_published: bool,
}

const fn default_published() -> bool {
    true
}

fn validate_post(input: &PostInput) -> Result<(String, String)> {
    let title = input.title.trim();
    if title.is_empty() {
        return Err(Error::validation("Post title cannot be empty"));
    }
    let content = input.content.trim();
    if content.is_empty() {
        return Err(Error::validation("Post content cannot be empty"));
    }
    Ok((title.to_string(), content.to_string()))
}

/// First free slug for `title`: the plain slug, then `-2`, `-3`, ...
async fn unique_slug(db: &DatabaseConnection, title: &str) -> Result<String> {
    let base = match slugify(title) {
        slug if slug.is_empty() => "post".to_string(),
        slug => slug,
    };
    let mut candidate = base.clone();
    let mut suffix = 2;
    while find_by_slug(db, &candidate).await?.is_some() {
        candidate = format!("{base}-{suffix}");
        suffix += 1;
    }
    Ok(candidate)
}

/// Finds a post by slug regardless of publication.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn find_by_slug(db: &DatabaseConnection, slug: &str) -> Result<Option<blog_post::Model>> {
    BlogPost::find()
        .filter(blog_post::Column::Slug.eq(slug))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Loads a post visible to `viewer`: published posts for everyone, drafts for the
/// author and admins.
///
/// # Errors
/// Returns `Error::NotFound` when the post is missing or hidden.
pub async fn get_visible_post(
    db: &DatabaseConnection,
    slug: &str,
    viewer: Option<&user::Model>,
) -> Result<blog_post::Model> {
    let post = find_by_slug(db, slug)
        .await?
        .ok_or_else(|| Error::not_found("Post", slug))?;
    if post.is_published || viewer.is_some_and(|v| can_edit(v, &post)) {
        return Ok(post);
    }
    Err(Error::not_found("Post", slug))
}

fn can_edit(actor: &user::Model, post: &blog_post::Model) -> bool {
    post.author_id == actor.id || users::is_admin(actor)
}

async fn get_editable_post(
    db: &DatabaseConnection,
    actor: &user::Model,
    slug: &str,
) -> Result<blog_post::Model> {
    let post = find_by_slug(db, slug)
        .await?
        .ok_or_else(|| Error::not_found("Post", slug))?;
    if !can_edit(actor, &post) {
        return Err(Error::forbidden("You can only edit your own posts"));
    }
    Ok(post)
}

/// Published posts, newest first.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_published_posts(db: &DatabaseConnection) -> Result<Vec<blog_post::Model>> {
    BlogPost::find()
        .filter(blog_post::Column::IsPublished.eq(true))
        .order_by_desc(blog_post::Column::CreatedAt)
        .order_by_desc(blog_post::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Creates a post authored by `author`.
///
/// # Errors
/// Returns `Error::Validation` for an empty title or content.
#[instrument(skip(db, author, input), fields(author = %author.id))]
pub async fn create_post(
    db: &DatabaseConnection,
    author: &user::Model,
    input: PostInput,
) -> Result<blog_post::Model> {
    let (title, content) = validate_post(&input)?;
    let slug = unique_slug(db, &title).await?;
    let now = chrono::Utc::now();
    let created = blog_post::ActiveModel {
        author_id: Set(author.id.clone()),
        title: Set(title),
        slug: Set(slug),
        content: Set(content),
        cover_image_url: Set(input.cover_image_url),
        is_published: Set(input.is_published),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!("Created post '{}'", created.slug);
    Ok(created)
}

/// Updates a post; the slug is kept.
///
/// # Errors
/// Returns `Error::NotFound`, `Error::Forbidden` or `Error::Validation`.
pub async fn update_post(
    db: &DatabaseConnection,
    actor: &user::Model,
    slug: &str,
    input: PostInput,
) -> Result<blog_post::Model> {
    let (title, content) = validate_post(&input)?;
    let post = get_editable_post(db, actor, slug).await?;
    let mut active: blog_post::ActiveModel = post.into();
    active.title = Set(title);
    active.content = Set(content);
    active.cover_image_url = Set(input.cover_image_url);
    active.is_published = Set(input.is_published);
    active.updated_at = Set(chrono::Utc::now());
    active.update(db).await.map_err(Into::into)
}

/// Deletes a post and its comments.
///
/// # Errors
/// Returns `Error::NotFound` or `Error::Forbidden`.
pub async fn delete_post(db: &DatabaseConnection, actor: &user::Model, slug: &str) -> Result<()> {
    let post = get_editable_post(db, actor, slug).await?;
    post.delete(db).await?;
    info!("Deleted post '{slug}'");
    Ok(())
}
