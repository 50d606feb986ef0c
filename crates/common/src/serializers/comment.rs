//! Comment serialization
//!
//! `id`, `user`, `created_at` and `updated_at` are read-only: the payload
//! types have no such fields, so client values are dropped on the floor.

use super::required;
use crate::db::models::Comment;
use crate::db::{CommentChanges, NewComment};
use crate::errors::Result;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub article: Uuid,
    pub user: Uuid,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            article: comment.article_id,
            user: comment.user_id,
            content: comment.content,
            created_at: comment.created_at.to_rfc3339(),
            updated_at: comment.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct CommentPayload {
    pub article: Option<Uuid>,

    #[validate(length(min = 1))]
    pub content: Option<String>,
}

impl CommentPayload {
    pub fn into_new_comment(self) -> Result<NewComment> {
        self.validate()?;

        Ok(NewComment {
            article_id: required(self.article, "article")?,
            content: required(self.content, "content")?,
        })
    }

    /// Validate for a full update; both fields are required
    pub fn into_replacement(self) -> Result<CommentChanges> {
        let comment = self.into_new_comment()?;

        Ok(CommentChanges {
            article_id: Some(comment.article_id),
            content: Some(comment.content),
        })
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct CommentPatch {
    pub article: Option<Uuid>,

    #[validate(length(min = 1))]
    pub content: Option<String>,
}

impl CommentPatch {
    pub fn into_changes(self) -> Result<CommentChanges> {
        self.validate()?;

        Ok(CommentChanges {
            article_id: self.article,
            content: self.content,
        })
    }
}
