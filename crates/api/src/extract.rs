//! Request extractors whose rejections share the `AppError` envelope

use axum::extract::{FromRequest, FromRequestParts};
use articlehub_common::errors::{AppError, Result};
use serde::de::DeserializeOwned;
use uuid::Uuid;

/// `Json<T>` that rejects with `AppError::InvalidFormat`
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// `Query<T>` that rejects with `AppError::InvalidFormat`
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

/// Raw query pairs; repeated keys (`identifier=a&identifier=b`) are kept
pub type QueryPairs = AppQuery<Vec<(String, String)>>;

/// Decode a raw JSON body once the target has been loaded and checked.
///
/// Update routes take the body as `Bytes` so ownership is decided before the
/// payload is looked at; an empty body reads as `T::default()`.
pub fn json_body<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }

    serde_json::from_slice(body).map_err(|e| AppError::InvalidFormat {
        message: format!("Failed to parse the request body as JSON: {}", e),
    })
}

/// Parse a path id; anything that is not a UUID cannot name a row
pub fn parse_id(resource_type: &str, raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::not_found(resource_type, raw))
}
