//! Comment handlers

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    extract::{json_body, parse_id, AppJson, AppQuery, QueryPairs},
    AppState,
};
use articlehub_common::{
    auth::{
        guard::{ensure_comment_author, Mutation},
        AuthUser,
    },
    db::{models::Comment, CommentChanges, Repository},
    errors::{AppError, Result},
    metrics,
    pagination::{Page, PageRequest},
    serializers::{CommentPatch, CommentPayload, CommentResponse},
};

/// List comments, oldest first
pub async fn list_comments(
    State(state): State<AppState>,
    _user: AuthUser,
    AppQuery(params): QueryPairs,
) -> Result<Json<Page<CommentResponse>>> {
    let page = PageRequest::from_pairs(&params, &state.config.pagination)?;

    let repo = Repository::new(state.db.clone());
    let (comments, count) = repo.list_comments(page).await?;

    Ok(Json(Page::new(comments, count, page).map(CommentResponse::from)))
}

/// Create a comment authored by the caller
pub async fn create_comment(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<CommentPayload>,
) -> Result<(StatusCode, Json<CommentResponse>)> {
    let input = payload.into_new_comment()?;

    let repo = Repository::new(state.db.clone());
    let comment = repo.create_comment(user.id, input).await?;

    metrics::record_comment_mutation("created");
    tracing::info!(
        comment_id = %comment.id,
        article_id = %comment.article_id,
        user_id = %user.id,
        "Comment created"
    );

    Ok((StatusCode::CREATED, Json(comment.into())))
}

/// Get a comment by ID
pub async fn get_comment(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    _user: AuthUser,
) -> Result<Json<CommentResponse>> {
    let repo = Repository::new(state.db.clone());
    let comment = load_comment(&repo, &raw_id).await?;

    Ok(Json(comment.into()))
}

/// Replace a comment's article and content; only its author may
pub async fn replace_comment(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    user: AuthUser,
    body: Bytes,
) -> Result<Json<CommentResponse>> {
    let repo = Repository::new(state.db.clone());
    let comment = load_comment(&repo, &raw_id).await?;
    ensure_comment_author(&user, &comment, Mutation::Update)?;

    let changes = json_body::<CommentPayload>(&body)?.into_replacement()?;
    apply_update(&repo, comment, changes, &user).await
}

/// Edit a comment; only its author may
pub async fn update_comment(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    user: AuthUser,
    body: Bytes,
) -> Result<Json<CommentResponse>> {
    let repo = Repository::new(state.db.clone());
    let comment = load_comment(&repo, &raw_id).await?;
    ensure_comment_author(&user, &comment, Mutation::Update)?;

    let changes = json_body::<CommentPatch>(&body)?.into_changes()?;
    apply_update(&repo, comment, changes, &user).await
}

/// Delete a comment; only its author may
pub async fn delete_comment(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    user: AuthUser,
) -> Result<StatusCode> {
    let repo = Repository::new(state.db.clone());
    let comment = load_comment(&repo, &raw_id).await?;
    ensure_comment_author(&user, &comment, Mutation::Delete)?;

    if !repo.delete_comment(comment.id).await? {
        return Err(AppError::not_found("comment", comment.id));
    }

    metrics::record_comment_mutation("deleted");
    tracing::info!(comment_id = %comment.id, user_id = %user.id, "Comment deleted");

    Ok(StatusCode::NO_CONTENT)
}

async fn apply_update(
    repo: &Repository,
    comment: Comment,
    changes: CommentChanges,
    user: &AuthUser,
) -> Result<Json<CommentResponse>> {
    let comment = repo.update_comment(comment, changes).await?;

    metrics::record_comment_mutation("updated");
    tracing::info!(comment_id = %comment.id, user_id = %user.id, "Comment updated");

    Ok(Json(comment.into()))
}

async fn load_comment(repo: &Repository, raw_id: &str) -> Result<Comment> {
    let id = parse_id("comment", raw_id)?;
    repo.find_comment_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("comment", id))
}
