//! Article handlers: CRUD, filtered listing, and CSV export

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        StatusCode,
    },
    response::IntoResponse,
    Json,
};

use crate::{
    extract::{json_body, parse_id, AppJson, AppQuery, QueryPairs},
    AppState,
};
use articlehub_common::{
    auth::{
        guard::{ensure_article_owner, Mutation},
        AuthUser,
    },
    db::{models::Article, ArticleChanges, Repository},
    errors::{AppError, Result},
    export::{articles_to_csv, CSV_CONTENT_DISPOSITION, CSV_CONTENT_TYPE},
    filter::ArticleQuery,
    metrics,
    pagination::{Page, PageRequest},
    serializers::{ArticlePatch, ArticlePayload, ArticleResponse},
};

/// List articles, filtered and paginated
pub async fn list_articles(
    State(state): State<AppState>,
    _user: AuthUser,
    AppQuery(params): QueryPairs,
) -> Result<Json<Page<ArticleResponse>>> {
    let page = PageRequest::from_pairs(&params, &state.config.pagination)?;

    // `identifier` narrowing only applies to the export
    let mut query = ArticleQuery::from_pairs(&params);
    query.identifiers.clear();

    let repo = Repository::new(state.db.clone());
    let (records, count) = repo.list_articles(&query, page).await?;

    Ok(Json(Page::new(records, count, page).map(ArticleResponse::from)))
}

/// Create an article owned by the caller
pub async fn create_article(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<ArticlePayload>,
) -> Result<(StatusCode, Json<ArticleResponse>)> {
    let input = payload.into_new_article()?;

    let repo = Repository::new(state.db.clone());
    let record = repo.create_article(user.id, input).await?;

    metrics::record_article_mutation("created");
    tracing::info!(
        article_id = %record.article.id,
        identifier = %record.article.identifier,
        user_id = %user.id,
        "Article created"
    );

    Ok((StatusCode::CREATED, Json(record.into())))
}

/// Export the filtered articles as a CSV attachment
pub async fn download_csv(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(params): QueryPairs,
) -> Result<impl IntoResponse> {
    let query = ArticleQuery::from_pairs(&params);

    let repo = Repository::new(state.db.clone());
    let records = repo.export_articles(&query).await?;
    let body = articles_to_csv(&records)?;

    metrics::record_csv_export(records.len());
    tracing::info!(rows = records.len(), user_id = %user.id, "Articles exported");

    Ok((
        [
            (CONTENT_TYPE, CSV_CONTENT_TYPE),
            (CONTENT_DISPOSITION, CSV_CONTENT_DISPOSITION),
        ],
        body,
    ))
}

/// Get an article by ID
pub async fn get_article(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    _user: AuthUser,
) -> Result<Json<ArticleResponse>> {
    let id = parse_id("article", &raw_id)?;

    let repo = Repository::new(state.db.clone());
    let record = repo
        .find_article_record(id)
        .await?
        .ok_or_else(|| AppError::not_found("article", id))?;

    Ok(Json(record.into()))
}

/// Replace every writable field of an article
pub async fn replace_article(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    user: AuthUser,
    body: Bytes,
) -> Result<Json<ArticleResponse>> {
    let repo = Repository::new(state.db.clone());
    let article = load_owned(&repo, &raw_id, &user, Mutation::Update).await?;

    let changes = json_body::<ArticlePayload>(&body)?.into_replacement()?;
    apply_update(&repo, article, changes, &user).await
}

/// Update only the fields present in the body
pub async fn update_article(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    user: AuthUser,
    body: Bytes,
) -> Result<Json<ArticleResponse>> {
    let repo = Repository::new(state.db.clone());
    let article = load_owned(&repo, &raw_id, &user, Mutation::Update).await?;

    let changes = json_body::<ArticlePatch>(&body)?.into_changes()?;
    apply_update(&repo, article, changes, &user).await
}

/// Delete an article and everything hanging off it
pub async fn delete_article(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    user: AuthUser,
) -> Result<StatusCode> {
    let repo = Repository::new(state.db.clone());
    let article = load_owned(&repo, &raw_id, &user, Mutation::Delete).await?;

    if !repo.delete_article(article.id).await? {
        return Err(AppError::not_found("article", article.id));
    }

    metrics::record_article_mutation("deleted");
    tracing::info!(article_id = %article.id, user_id = %user.id, "Article deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Load the target (404 first), then check ownership before any write
async fn load_owned(
    repo: &Repository,
    raw_id: &str,
    user: &AuthUser,
    action: Mutation,
) -> Result<Article> {
    let id = parse_id("article", raw_id)?;
    let article = repo
        .find_article_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("article", id))?;

    ensure_article_owner(user, &article, action)?;
    Ok(article)
}

async fn apply_update(
    repo: &Repository,
    article: Article,
    changes: ArticleChanges,
    user: &AuthUser,
) -> Result<Json<ArticleResponse>> {
    let record = repo.update_article(article, changes).await?;

    metrics::record_article_mutation("updated");
    tracing::info!(article_id = %record.article.id, user_id = %user.id, "Article updated");

    Ok(Json(record.into()))
}
