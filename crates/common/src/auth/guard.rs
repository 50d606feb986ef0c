//! Ownership checks run before any article or comment mutation.
//!
//! The guard only compares ids; callers load the target first (so unknown
//! ids surface as 404) and must not touch the store when a check fails.

use super::AuthUser;
use crate::db::models::{Article, Comment};
use crate::errors::{AppError, Result};

/// The mutation being attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Update,
    Delete,
}

impl Mutation {
    fn verb(self) -> &'static str {
        match self {
            Mutation::Update => "updated",
            Mutation::Delete => "deleted",
        }
    }
}

/// Only the owner of an article may change or remove it
pub fn ensure_article_owner(user: &AuthUser, article: &Article, action: Mutation) -> Result<()> {
    if article.owner_id == user.id {
        return Ok(());
    }

    crate::metrics::record_permission_denied("article");
    Err(AppError::PermissionDenied {
        message: format!(
            "An article that was not written by you cannot be {}.",
            action.verb()
        ),
    })
}

/// Only the author of a comment may change or remove it
pub fn ensure_comment_author(user: &AuthUser, comment: &Comment, action: Mutation) -> Result<()> {
    if comment.user_id == user.id {
        return Ok(());
    }

    crate::metrics::record_permission_denied("comment");
    let message = match action {
        Mutation::Update => "You cannot update someone else's comment.",
        Mutation::Delete => "You cannot delete someone else's comment.",
    };
    Err(AppError::PermissionDenied {
        message: message.to_string(),
    })
}
