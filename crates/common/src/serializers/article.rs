//! Article serialization

use super::required;
use crate::db::models::{Author, Tag};
use crate::db::{ArticleChanges, ArticleRecord, NewArticle};
use crate::errors::{AppError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Nested author/tag as sent to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedResponse {
    pub id: Uuid,
    pub name: String,
}

impl From<Author> for NamedResponse {
    fn from(author: Author) -> Self {
        Self {
            id: author.id,
            name: author.name,
        }
    }
}

impl From<Tag> for NamedResponse {
    fn from(tag: Tag) -> Self {
        Self {
            id: tag.id,
            name: tag.name,
        }
    }
}

/// Response for an article
#[derive(Debug, Clone, Serialize)]
pub struct ArticleResponse {
    pub id: Uuid,
    pub identifier: String,
    pub publication_date: NaiveDate,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub owner: Uuid,
    pub authors: Vec<NamedResponse>,
    pub tags: Vec<NamedResponse>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ArticleRecord> for ArticleResponse {
    fn from(record: ArticleRecord) -> Self {
        let article = record.article;
        Self {
            id: article.id,
            identifier: article.identifier,
            publication_date: article.publication_date,
            title: article.title,
            abstract_text: article.abstract_text,
            owner: article.owner_id,
            authors: record.authors.into_iter().map(Into::into).collect(),
            tags: record.tags.into_iter().map(Into::into).collect(),
            created_at: article.created_at.to_rfc3339(),
            updated_at: article.updated_at.to_rfc3339(),
        }
    }
}

/// Nested `{ "name": ... }` entry for authors and tags; ids are not accepted
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NameInput {
    #[serde(default)]
    pub name: Option<String>,
}

/// Body of POST (and PUT) on articles. Any `owner` sent by the client is
/// ignored.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ArticlePayload {
    #[validate(length(min = 1, max = 255))]
    pub identifier: Option<String>,

    pub publication_date: Option<NaiveDate>,

    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,

    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,

    pub authors: Option<Vec<NameInput>>,

    pub tags: Option<Vec<NameInput>>,
}

impl ArticlePayload {
    /// Validate and require every field
    pub fn into_new_article(self) -> Result<NewArticle> {
        self.validate()?;

        Ok(NewArticle {
            identifier: required(self.identifier, "identifier")?,
            publication_date: required(self.publication_date, "publication_date")?,
            title: required(self.title, "title")?,
            abstract_text: required(self.abstract_text, "abstract")?,
            authors: strict_names(required(self.authors, "authors")?, "authors")?,
            tags: strict_names(required(self.tags, "tags")?, "tags")?,
        })
    }

    /// Validate for a full update. Every field is required, but tag entries
    /// without a usable name are dropped as on PATCH.
    pub fn into_replacement(self) -> Result<ArticleChanges> {
        self.validate()?;

        Ok(ArticleChanges {
            identifier: Some(required(self.identifier, "identifier")?),
            publication_date: Some(required(self.publication_date, "publication_date")?),
            title: Some(required(self.title, "title")?),
            abstract_text: Some(required(self.abstract_text, "abstract")?),
            authors: Some(strict_names(required(self.authors, "authors")?, "authors")?),
            tags: Some(named_only(required(self.tags, "tags")?)),
        })
    }
}

/// Body of PATCH on articles
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ArticlePatch {
    #[validate(length(min = 1, max = 255))]
    pub identifier: Option<String>,

    pub publication_date: Option<NaiveDate>,

    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,

    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,

    pub authors: Option<Vec<NameInput>>,

    pub tags: Option<Vec<NameInput>>,
}

impl ArticlePatch {
    /// Validate into store changes. Tag entries without a usable name are
    /// dropped; author entries must carry one.
    pub fn into_changes(self) -> Result<ArticleChanges> {
        self.validate()?;

        let authors = match self.authors {
            Some(entries) => Some(strict_names(entries, "authors")?),
            None => None,
        };
        let tags = self.tags.map(named_only);

        Ok(ArticleChanges {
            identifier: self.identifier,
            publication_date: self.publication_date,
            title: self.title,
            abstract_text: self.abstract_text,
            authors,
            tags,
        })
    }
}

fn named_only(entries: Vec<NameInput>) -> Vec<String> {
    entries
        .into_iter()
        .filter_map(|entry| entry.name.filter(|name| !name.is_empty()))
        .collect()
}

fn strict_names(entries: Vec<NameInput>, field: &str) -> Result<Vec<String>> {
    entries
        .into_iter()
        .map(|entry| match entry.name {
            Some(name) if !name.is_empty() => Ok(name),
            _ => Err(AppError::invalid_field(field, "Each entry needs a non-empty name.")),
        })
        .collect()
}
