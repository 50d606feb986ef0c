//! Registration and token issuance

use axum::{extract::State, http::StatusCode, Json};
use validator::Validate;

use crate::{extract::AppJson, AppState};
use articlehub_common::{
    auth::{hash_password, verify_password},
    db::Repository,
    errors::{AppError, Result},
    serializers::{CredentialsPayload, TokenResponse, UserResponse},
};

/// Create a user account
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CredentialsPayload>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    payload.validate()?;

    let repo = Repository::new(state.db.clone());
    let password_hash = hash_password(&payload.password)?;
    let user = repo.create_user(&payload.username, password_hash).await?;

    tracing::info!(user_id = %user.id, username = %user.username, "User registered");

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Exchange credentials for a bearer token
pub async fn token(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CredentialsPayload>,
) -> Result<Json<TokenResponse>> {
    let repo = Repository::new(state.db.clone());

    let user = repo
        .find_user_by_username(&payload.username)
        .await?
        .filter(|user| verify_password(&payload.password, &user.password_hash))
        .ok_or_else(|| {
            tracing::warn!(username = %payload.username, "Rejected login attempt");
            AppError::Unauthorized {
                message: "Invalid username or password".to_string(),
            }
        })?;

    let token = state.jwt.generate_token(user.id, &user.username)?;

    Ok(Json(TokenResponse::bearer(token, state.jwt.expiration_secs())))
}
