//! CSV export of article collections

use crate::db::ArticleRecord;
use crate::errors::{AppError, Result};

/// Content type of the export response
pub const CSV_CONTENT_TYPE: &str = "text/csv";

/// Content disposition of the export response
pub const CSV_CONTENT_DISPOSITION: &str = r#"attachment; filename="articles.csv""#;

/// Column order is part of the file contract
pub const CSV_HEADER: [&str; 6] = [
    "Identifier",
    "Title",
    "Publication Date",
    "Authors",
    "Tags",
    "Abstract",
];

/// Render articles as CSV, one row per record in the given order
pub fn articles_to_csv(records: &[ArticleRecord]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for record in records {
        let article = &record.article;
        let date = article.publication_date.format("%Y-%m-%d").to_string();
        let authors = join_names(record.authors.iter().map(|a| a.name.as_str()));
        let tags = join_names(record.tags.iter().map(|t| t.name.as_str()));

        writer.write_record([
            article.identifier.as_str(),
            article.title.as_str(),
            date.as_str(),
            authors.as_str(),
            tags.as_str(),
            article.abstract_text.as_str(),
        ])?;
    }

    writer.into_inner().map_err(|e| AppError::Internal {
        message: format!("Failed to flush CSV: {}", e.error()),
    })
}

fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join(", ")
}
