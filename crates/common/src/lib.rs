//! ArticleHub Common Library
//!
//! Shared code for the ArticleHub API including:
//! - Database models and repository patterns
//! - Article filtering and pagination
//! - Ownership checks and token authentication
//! - Wire serialization and CSV export
//! - Error types, configuration, and metrics

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod export;
pub mod filter;
pub mod metrics;
pub mod pagination;
pub mod serializers;

// Re-export commonly used types
pub use config::AppConfig;
pub use db::{DbPool, Repository};
pub use errors::{AppError, Result};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
