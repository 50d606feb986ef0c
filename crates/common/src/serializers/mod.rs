//! Wire representations for articles, comments, and users
//!
//! Outbound types are built from store records. Inbound payloads keep every
//! field optional so that missing fields can be reported by name, and so
//! PATCH bodies can distinguish "absent" from "present".

mod article;
mod comment;
mod user;

pub use article::{ArticlePayload, ArticlePatch, ArticleResponse, NameInput, NamedResponse};
pub use comment::{CommentPatch, CommentPayload, CommentResponse};
pub use user::{CredentialsPayload, TokenResponse, UserResponse};

use crate::errors::{AppError, Result};

/// Unwrap a required field or report it as missing
pub(crate) fn required<T>(value: Option<T>, field: &str) -> Result<T> {
    value.ok_or_else(|| AppError::MissingField {
        field: field.to_string(),
    })
}
