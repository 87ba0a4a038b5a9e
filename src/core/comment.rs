//! Comment business logic - Nested blog comments.
//!
//! Comments are stored flat with an optional `parent_id`; readers receive a tree built
//! by matching each comment to its parent. Siblings are ordered oldest first, and a
//! comment whose parent is not in the list is promoted to a root. Threads deeper than
//! [`MAX_REPLY_DEPTH`] are shown flat under the deepest nested reply.

use crate::{
    core::{blog, user as users},
    entities::{Comment, comment, user},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{info, instrument};

/// Longest accepted comment, in characters.
pub const MAX_COMMENT_LENGTH: usize = 5000;

/// Deepest reply accepted; a top-level comment has depth 0.
pub const MAX_REPLY_DEPTH: usize = 32;

/// A comment with its replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentNode {
    /// The stored comment.
    #[serde(flatten)]
    pub comment: comment::Model,
    /// Direct replies, oldest first.
    pub replies: Vec<CommentNode>,
}

/// Builds the reply tree from a flat list of comments.
#[must_use]
pub fn build_tree(mut comments: Vec<comment::Model>) -> Vec<CommentNode> {
    comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    let known: HashSet<i64> = comments.iter().map(|c| c.id).collect();

    let mut children: HashMap<i64, Vec<comment::Model>> = HashMap::new();
    let mut roots = Vec::new();
    for comment in comments {
        match comment.parent_id {
            Some(parent) if parent != comment.id && known.contains(&parent) => {
                children.entry(parent).or_default().push(comment);
            }
            _ => roots.push(comment),
        }
    }

    let mut tree: Vec<CommentNode> = roots
        .into_iter()
        .map(|root| attach_replies(root, &mut children, 0))
        .collect();

    // Comments in a parent cycle never reach a root; list them flat.
    let stranded: Vec<comment::Model> = children.drain().flat_map(|(_, c)| c).collect();
    tree.extend(leaves(stranded));
    tree
}

fn attach_replies(
    comment: comment::Model,
    children: &mut HashMap<i64, Vec<comment::Model>>,
    depth: usize,
) -> CommentNode {
    let direct = children.remove(&comment.id).unwrap_or_default();
    let replies = if depth + 1 < MAX_REPLY_DEPTH {
        direct
            .into_iter()
            .map(|reply| attach_replies(reply, children, depth + 1))
            .collect()
    } else {
        // Collect the rest of the thread without recursing.
        let mut descendants = Vec::new();
        let mut pending = direct;
        while let Some(reply) = pending.pop() {
            if let Some(more) = children.remove(&reply.id) {
                pending.extend(more);
            }
            descendants.push(reply);
        }
        leaves(descendants)
    };
    CommentNode { comment, replies }
}

fn leaves(mut comments: Vec<comment::Model>) -> Vec<CommentNode> {
    comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    comments
        .into_iter()
        .map(|comment| CommentNode {
            comment,
            replies: Vec::new(),
        })
        .collect()
}

/// Total number of comments in a tree.
#[must_use]
pub fn count_nodes(nodes: &[CommentNode]) -> usize {
    nodes.iter().map(|n| 1 + count_nodes(&n.replies)).sum()
}

/// New comment or reply.
#[derive(Debug, Clone, Deserialize)]
pub struct CommentInput {
    /// Comment text.
    pub content: String,
    /// Comment being replied to.
    #[serde(default)]
    pub parent_id: Option<i64>,
}

/// The comment tree of a visible post.
///
/// # Errors
/// Returns `Error::NotFound` when the post is missing or hidden from the viewer.
pub async fn comment_tree(
    db: &DatabaseConnection,
    slug: &str,
    viewer: Option<&user::Model>,
) -> Result<Vec<CommentNode>> {
    let post = blog::get_visible_post(db, slug, viewer).await?;
    let flat = Comment::find()
        .filter(comment::Column::PostId.eq(post.id))
        .order_by_asc(comment::Column::CreatedAt)
        .all(db)
        .await?;
    Ok(build_tree(flat))
}

/// Adds a comment, or a reply when `parent_id` is set.
///
/// # Errors
/// Returns `Error::Validation` for empty or oversized content, for a parent that is
/// missing or belongs to another post, and for replies nested deeper than
/// [`MAX_REPLY_DEPTH`]; `Error::NotFound` for a hidden post.
#[instrument(skip(db, author, input), fields(author = %author.id))]
pub async fn add_comment(
    db: &DatabaseConnection,
    author: &user::Model,
    slug: &str,
    input: CommentInput,
) -> Result<comment::Model> {
    let content = input.content.trim();
    if content.is_empty() {
        return Err(Error::validation("Comment cannot be empty"));
    }
    if content.chars().count() > MAX_COMMENT_LENGTH {
        return Err(Error::validation(format!(
            "Comment cannot exceed {MAX_COMMENT_LENGTH} characters"
        )));
    }
    let post = blog::get_visible_post(db, slug, Some(author)).await?;

    if let Some(parent_id) = input.parent_id {
        let parent = Comment::find_by_id(parent_id).one(db).await?;
        let Some(parent) = parent.filter(|p| p.post_id == post.id) else {
            return Err(Error::validation("Replied-to comment does not exist on this post"));
        };
        if reply_depth(db, &parent).await? > MAX_REPLY_DEPTH {
            return Err(Error::validation(format!(
                "Replies cannot be nested more than {MAX_REPLY_DEPTH} levels deep"
            )));
        }
    }

    let created = comment::ActiveModel {
        post_id: Set(post.id),
        author_id: Set(author.id.clone()),
        parent_id: Set(input.parent_id),
        content: Set(content.to_string()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!("Comment {} added to post '{}'", created.id, post.slug);
    Ok(created)
}

/// Depth a reply to `parent` would have. Stops counting past [`MAX_REPLY_DEPTH`].
async fn reply_depth(db: &DatabaseConnection, parent: &comment::Model) -> Result<usize> {
    let mut depth = 1;
    let mut next = parent.parent_id;
    while let Some(id) = next {
        if depth > MAX_REPLY_DEPTH {
            break;
        }
        depth += 1;
        next = Comment::find_by_id(id).one(db).await?.and_then(|c| c.parent_id);
    }
    Ok(depth)
}

/// Deletes a comment and its replies. Authors may delete their own comments, admins any.
///
/// # Errors
/// Returns `Error::NotFound` or `Error::Forbidden`.
pub async fn delete_comment(db: &DatabaseConnection, actor: &user::Model, comment_id: i64) -> Result<()> {
    let existing = Comment::find_by_id(comment_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Comment", comment_id))?;
    if existing.author_id != actor.id && !users::is_admin(actor) {
        return Err(Error::forbidden("You can only delete your own comments"));
    }
    existing.delete(db).await?;
    Ok(())
}
