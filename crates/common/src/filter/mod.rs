//! Article filter engine
//!
//! Turns list/export query parameters into a SeaORM `Condition`:
//! - `year`, `month`: parts of `publication_date`
//! - `authors`, `tags`: case-insensitive substring match on any related name
//! - `search`: case-insensitive substring match on title or abstract
//! - `identifier` (repeatable): exact identifier membership
//!
//! Filters combine with AND. Absent, empty, or malformed values impose no
//! constraint; nothing here can fail.

use crate::db::models::{
    ArticleAuthorColumn, ArticleAuthorEntity, ArticleColumn, ArticleEntity, ArticleTagColumn,
    ArticleTagEntity, AuthorColumn, AuthorEntity, TagColumn, TagEntity,
};
use sea_orm::{
    sea_query::{Expr, Func, LikeExpr, Query, SelectStatement, SimpleExpr},
    ColumnTrait, Condition, DbBackend,
};

/// Escape character used in generated LIKE patterns
const LIKE_ESCAPE: char = '\\';

/// Parsed article query parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub authors: Option<String>,
    pub tags: Option<String>,
    pub search: Option<String>,
    pub identifiers: Vec<String>,
}

impl ArticleQuery {
    /// Build from raw query-string pairs; unknown keys are ignored
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = &'a (String, String)>,
    {
        let mut query = Self::default();

        for (key, value) in pairs {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }

            match key.as_str() {
                "year" => query.year = value.parse().ok(),
                "month" => query.month = value.parse().ok(),
                "authors" => query.authors = Some(value.to_string()),
                "tags" => query.tags = Some(value.to_string()),
                "search" => query.search = Some(value.to_string()),
                "identifier" => query.identifiers.push(value.to_string()),
                _ => {}
            }
        }

        query
    }

    /// Predicate for `ArticleEntity::find().filter(..)`
    pub fn condition(&self, backend: DbBackend) -> Condition {
        let mut condition = Condition::all();

        if let Some(year) = self.year {
            condition = condition.add(Expr::expr(date_part(backend, DatePart::Year)).eq(year));
        }

        if let Some(month) = self.month {
            condition = condition.add(Expr::expr(date_part(backend, DatePart::Month)).eq(month));
        }

        if let Some(ref name) = self.authors {
            condition = condition.add(ArticleColumn::Id.in_subquery(articles_with_author(name)));
        }

        if let Some(ref name) = self.tags {
            condition = condition.add(ArticleColumn::Id.in_subquery(articles_with_tag(name)));
        }

        if let Some(ref text) = self.search {
            condition = condition.add(
                Condition::any()
                    .add(icontains(Expr::col((ArticleEntity, ArticleColumn::Title)), text))
                    .add(icontains(Expr::col((ArticleEntity, ArticleColumn::AbstractText)), text)),
            );
        }

        if !self.identifiers.is_empty() {
            condition = condition.add(ArticleColumn::Identifier.is_in(self.identifiers.clone()));
        }

        condition
    }
}

#[derive(Debug, Clone, Copy)]
enum DatePart {
    Year,
    Month,
}

/// Integer year/month of `articles.publication_date` in the backend's dialect
fn date_part(backend: DbBackend, part: DatePart) -> SimpleExpr {
    let (keyword, strftime) = match part {
        DatePart::Year => ("YEAR", "%Y"),
        DatePart::Month => ("MONTH", "%m"),
    };

    let sql = match backend {
        DbBackend::Postgres => format!(r#"EXTRACT({} FROM "articles"."publication_date")"#, keyword),
        DbBackend::MySql => format!("{}(`articles`.`publication_date`)", keyword),
        DbBackend::Sqlite => format!(
            r#"CAST(strftime('{}', "articles"."publication_date") AS INTEGER)"#,
            strftime
        ),
    };

    Expr::cust(sql)
}

/// `LOWER(expr) LIKE '%needle%'` with wildcards in `needle` escaped
fn icontains(expr: Expr, needle: &str) -> SimpleExpr {
    Expr::expr(Func::lower(expr)).like(LikeExpr::new(contains_pattern(needle)).escape(LIKE_ESCAPE))
}

fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.to_lowercase().chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// `SELECT article_id FROM article_authors JOIN authors .. WHERE name ILIKE ..`
fn articles_with_author(name: &str) -> SelectStatement {
    Query::select()
        .column((ArticleAuthorEntity, ArticleAuthorColumn::ArticleId))
        .from(ArticleAuthorEntity)
        .inner_join(
            AuthorEntity,
            Expr::col((AuthorEntity, AuthorColumn::Id))
                .equals((ArticleAuthorEntity, ArticleAuthorColumn::AuthorId)),
        )
        .and_where(icontains(Expr::col((AuthorEntity, AuthorColumn::Name)), name))
        .to_owned()
}

fn articles_with_tag(name: &str) -> SelectStatement {
    Query::select()
        .column((ArticleTagEntity, ArticleTagColumn::ArticleId))
        .from(ArticleTagEntity)
        .inner_join(
            TagEntity,
            Expr::col((TagEntity, TagColumn::Id)).equals((ArticleTagEntity, ArticleTagColumn::TagId)),
        )
        .and_where(icontains(Expr::col((TagEntity, TagColumn::Name)), name))
        .to_owned()
}
