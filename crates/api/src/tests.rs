//! Router-level tests against an in-memory SQLite store

use super::*;
use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
};
use sea_orm::{ConnectOptions, Database};
use serde_json::{json, Value};
use tower::ServiceExt;

const SECRET: &str = "test-secret";
const PASSWORD: &str = "correct horse";

struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl TestResponse {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    fn text(&self) -> String {
        String::from_utf8(self.body.clone()).unwrap()
    }
}

struct TestApp {
    router: Router,
}

impl TestApp {
    async fn new() -> Self {
        Self::build(true).await
    }

    /// Connected store with no tables
    async fn unmigrated() -> Self {
        Self::build(false).await
    }

    async fn build(migrate: bool) -> Self {
        let mut opts = ConnectOptions::new("sqlite::memory:");
        opts.max_connections(1).min_connections(1).sqlx_logging(false);
        let db = DbPool::from_connection(Database::connect(opts).await.unwrap());
        if migrate {
            db.migrate().await.unwrap();
        }

        let mut config = AppConfig::default();
        config.auth.jwt_secret = Some(SECRET.to_string());
        config.rate_limit.enabled = false;

        let state = AppState {
            config: Arc::new(config),
            db,
            jwt: Arc::new(JwtManager::new(SECRET, 3600)),
        };

        Self {
            router: create_router(state),
        }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        TestResponse {
            status,
            headers,
            body: body.to_vec(),
        }
    }

    async fn get(&self, uri: &str, token: &str) -> TestResponse {
        self.send(Method::GET, uri, Some(token), None).await
    }

    /// Register `username` and return (user id, bearer token)
    async fn login(&self, username: &str) -> (String, String) {
        let credentials = json!({ "username": username, "password": PASSWORD });

        let registered = self
            .send(Method::POST, "/v1/auth/register", None, Some(credentials.clone()))
            .await;
        assert_eq!(registered.status, StatusCode::CREATED);

        let issued = self
            .send(Method::POST, "/v1/auth/token", None, Some(credentials))
            .await;
        assert_eq!(issued.status, StatusCode::OK);

        let id = registered.json()["id"].as_str().unwrap().to_string();
        let token = issued.json()["access_token"].as_str().unwrap().to_string();
        (id, token)
    }

    async fn create_article(&self, token: &str, body: Value) -> Value {
        let response = self
            .send(Method::POST, "/v1/articles", Some(token), Some(body))
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.text());
        response.json()
    }
}

fn article_body(identifier: &str, publication_date: &str) -> Value {
    json!({
        "identifier": identifier,
        "publication_date": publication_date,
        "title": format!("Title {identifier}"),
        "abstract": format!("Abstract {identifier}"),
        "authors": [{ "name": "New Author" }],
        "tags": [{ "name": "Flask" }]
    })
}

fn identifiers(page: &Value) -> Vec<&str> {
    page["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["identifier"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_health_and_ready() {
    let app = TestApp::new().await;

    let health = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.json()["status"], "healthy");

    let ready = app.send(Method::GET, "/ready", None, None).await;
    assert_eq!(ready.status, StatusCode::OK);
    assert_eq!(ready.json()["checks"]["database"]["status"], "up");
    assert_eq!(ready.json()["checks"]["schema"]["status"], "up");
}

#[tokio::test]
async fn test_not_ready_without_schema() {
    let app = TestApp::unmigrated().await;

    let health = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(health.status, StatusCode::OK);

    let ready = app.send(Method::GET, "/ready", None, None).await;
    assert_eq!(ready.status, StatusCode::SERVICE_UNAVAILABLE);
    let body = ready.json();
    assert_eq!(body["status"], "not_ready");
    assert_eq!(body["checks"]["database"]["status"], "up");
    assert_eq!(body["checks"]["schema"]["status"], "down");
}

#[tokio::test]
async fn test_requests_without_token_are_unauthorized() {
    let app = TestApp::new().await;

    let response = app.send(Method::GET, "/v1/articles", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.json()["error"]["code"], "UNAUTHORIZED");

    let response = app
        .send(Method::GET, "/v1/comments", Some("not-a-jwt"), None)
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_registration_and_token_errors() {
    let app = TestApp::new().await;
    app.login("alice").await;

    let duplicate = app
        .send(
            Method::POST,
            "/v1/auth/register",
            None,
            Some(json!({ "username": "alice", "password": PASSWORD })),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let wrong_password = app
        .send(
            Method::POST,
            "/v1/auth/token",
            None,
            Some(json!({ "username": "alice", "password": "wrong password" })),
        )
        .await;
    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);

    let short_password = app
        .send(
            Method::POST,
            "/v1/auth/register",
            None,
            Some(json!({ "username": "bob", "password": "short" })),
        )
        .await;
    assert_eq!(short_password.status, StatusCode::BAD_REQUEST);
    assert_eq!(short_password.json()["error"]["details"]["field"], "password");
}

#[tokio::test]
async fn test_create_article_with_nested_names() {
    let app = TestApp::new().await;
    let (alice_id, token) = app.login("alice").await;

    let mut body = article_body("csv", "2025-03-19");
    body["owner"] = json!("00000000-0000-0000-0000-000000000000");
    let article = app.create_article(&token, body).await;

    assert_eq!(article["owner"], json!(alice_id));
    assert_eq!(article["publication_date"], "2025-03-19");
    assert_eq!(article["abstract"], "Abstract csv");
    assert_eq!(article["authors"][0]["name"], "New Author");
    assert!(article["authors"][0]["id"].is_string());
    assert_eq!(article["tags"][0]["name"], "Flask");

    let id = article["id"].as_str().unwrap();
    let fetched = app.get(&format!("/v1/articles/{id}"), &token).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.json()["identifier"], "csv");
}

#[tokio::test]
async fn test_create_article_validation() {
    let app = TestApp::new().await;
    let (_, token) = app.login("alice").await;

    let mut body = article_body("a1", "2025-01-01");
    body.as_object_mut().unwrap().remove("title");
    let response = app
        .send(Method::POST, "/v1/articles", Some(&token), Some(body))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"]["details"]["field"], "title");

    app.create_article(&token, article_body("a1", "2025-01-01")).await;
    let duplicate = app
        .send(
            Method::POST,
            "/v1/articles",
            Some(&token),
            Some(article_body("a1", "2025-02-02")),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::BAD_REQUEST);
    assert_eq!(duplicate.json()["error"]["details"]["field"], "identifier");

    let malformed = app
        .send(
            Method::POST,
            "/v1/articles",
            Some(&token),
            Some(json!({ "publication_date": "yesterday" })),
        )
        .await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
    assert_eq!(malformed.json()["error"]["code"], "INVALID_FORMAT");
}

#[tokio::test]
async fn test_only_owner_may_patch_article() {
    let app = TestApp::new().await;
    let (_, alice) = app.login("alice").await;
    let (_, bob) = app.login("bob").await;

    let article = app.create_article(&alice, article_body("a1", "2025-01-01")).await;
    let uri = format!("/v1/articles/{}", article["id"].as_str().unwrap());

    let denied = app
        .send(Method::PATCH, &uri, Some(&bob), Some(json!({ "title": "Hijacked" })))
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
    assert_eq!(
        denied.json()["error"]["message"],
        "An article that was not written by you cannot be updated."
    );
    assert_eq!(app.get(&uri, &alice).await.json()["title"], "Title a1");

    let allowed = app
        .send(Method::PATCH, &uri, Some(&alice), Some(json!({ "title": "Renamed" })))
        .await;
    assert_eq!(allowed.status, StatusCode::OK);
    let updated = allowed.json();
    assert_eq!(updated["title"], "Renamed");
    assert_eq!(updated["identifier"], "a1");
    assert_eq!(updated["authors"][0]["name"], "New Author");
}

#[tokio::test]
async fn test_put_replaces_article() {
    let app = TestApp::new().await;
    let (_, token) = app.login("alice").await;

    let article = app.create_article(&token, article_body("a1", "2025-01-01")).await;
    let uri = format!("/v1/articles/{}", article["id"].as_str().unwrap());

    let mut body = article_body("a1-v2", "2024-06-30");
    body["authors"] = json!([{ "name": "Grace" }, { "name": "Ada" }]);
    body["tags"] = json!([]);
    let response = app.send(Method::PUT, &uri, Some(&token), Some(body)).await;
    assert_eq!(response.status, StatusCode::OK);

    let replaced = response.json();
    assert_eq!(replaced["identifier"], "a1-v2");
    assert_eq!(replaced["authors"][0]["name"], "Ada");
    assert_eq!(replaced["authors"][1]["name"], "Grace");
    assert_eq!(replaced["tags"], json!([]));

    let partial = app
        .send(Method::PUT, &uri, Some(&token), Some(json!({ "title": "only" })))
        .await;
    assert_eq!(partial.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_patch_tags_skips_empty_names() {
    let app = TestApp::new().await;
    let (_, token) = app.login("alice").await;

    let article = app.create_article(&token, article_body("a1", "2025-01-01")).await;
    let uri = format!("/v1/articles/{}", article["id"].as_str().unwrap());

    let response = app
        .send(
            Method::PATCH,
            &uri,
            Some(&token),
            Some(json!({ "tags": [{ "name": "" }, { "name": "Rust" }, {}] })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let tags = response.json()["tags"].clone();
    assert_eq!(tags.as_array().unwrap().len(), 1);
    assert_eq!(tags[0]["name"], "Rust");
}

#[tokio::test]
async fn test_only_owner_may_delete_article() {
    let app = TestApp::new().await;
    let (_, alice) = app.login("alice").await;
    let (_, bob) = app.login("bob").await;

    let article = app.create_article(&alice, article_body("a1", "2025-01-01")).await;
    let uri = format!("/v1/articles/{}", article["id"].as_str().unwrap());

    let denied = app.send(Method::DELETE, &uri, Some(&bob), None).await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
    assert_eq!(app.get(&uri, &alice).await.status, StatusCode::OK);

    let deleted = app.send(Method::DELETE, &uri, Some(&alice), None).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    assert_eq!(app.get(&uri, &alice).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_and_malformed_ids_are_not_found() {
    let app = TestApp::new().await;
    let (_, token) = app.login("alice").await;

    let missing = app
        .get("/v1/articles/7a1f6f2e-4a7e-4f54-9b8e-0a0b0c0d0e0f", &token)
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let malformed = app.get("/v1/articles/42", &token).await;
    assert_eq!(malformed.status, StatusCode::NOT_FOUND);

    let malformed = app
        .send(Method::DELETE, "/v1/comments/nope", Some(&token), None)
        .await;
    assert_eq!(malformed.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_filters_by_year_and_month() {
    let app = TestApp::new().await;
    let (_, token) = app.login("alice").await;

    app.create_article(&token, article_body("jan", "2025-01-15")).await;
    app.create_article(&token, article_body("mar", "2025-03-19")).await;
    app.create_article(&token, article_body("old", "2024-03-01")).await;

    let all = app.get("/v1/articles", &token).await.json();
    assert_eq!(all["count"], 3);
    assert_eq!(identifiers(&all), vec!["mar", "jan", "old"]);

    let year = app.get("/v1/articles?year=2025", &token).await.json();
    assert_eq!(identifiers(&year), vec!["mar", "jan"]);

    let month = app.get("/v1/articles?year=2025&month=3", &token).await.json();
    assert_eq!(identifiers(&month), vec!["mar"]);

    let malformed = app.get("/v1/articles?year=abc&month=", &token).await.json();
    assert_eq!(malformed["count"], 3);
}

#[tokio::test]
async fn test_list_filters_by_author_and_search() {
    let app = TestApp::new().await;
    let (_, token) = app.login("alice").await;

    let mut body = article_body("two-news", "2025-01-01");
    body["authors"] = json!([{ "name": "New Author" }, { "name": "Newton" }]);
    app.create_article(&token, body).await;

    let mut body = article_body("other", "2025-01-02");
    body["authors"] = json!([{ "name": "Grace" }]);
    body["title"] = json!("Compilers");
    app.create_article(&token, body).await;

    let by_author = app.get("/v1/articles?authors=new", &token).await.json();
    assert_eq!(identifiers(&by_author), vec!["two-news"]);

    let by_search = app.get("/v1/articles?search=COMPILER", &token).await.json();
    assert_eq!(identifiers(&by_search), vec!["other"]);

    let none = app.get("/v1/articles?tags=django", &token).await.json();
    assert_eq!(none["count"], 0);
}

#[tokio::test]
async fn test_pagination() {
    let app = TestApp::new().await;
    let (_, token) = app.login("alice").await;

    for day in 1..=3 {
        app.create_article(&token, article_body(&format!("a{day}"), &format!("2025-01-0{day}")))
            .await;
    }

    let first = app.get("/v1/articles?page_size=2", &token).await.json();
    assert_eq!(first["count"], 3);
    assert_eq!(first["next"], 2);
    assert_eq!(first["previous"], Value::Null);
    assert_eq!(identifiers(&first), vec!["a3", "a2"]);

    let second = app.get("/v1/articles?page_size=2&page=2", &token).await.json();
    assert_eq!(identifiers(&second), vec!["a1"]);
    assert_eq!(second["next"], Value::Null);

    let past_end = app.get("/v1/articles?page_size=2&page=3", &token).await;
    assert_eq!(past_end.status, StatusCode::NOT_FOUND);
    assert_eq!(past_end.json()["error"]["message"], "Invalid page.");
}

#[tokio::test]
async fn test_download_csv() {
    let app = TestApp::new().await;
    let (_, token) = app.login("alice").await;

    let mut body = article_body("csv", "2025-03-19");
    body["title"] = json!("csv");
    body["abstract"] = json!("csv");
    body["authors"] = json!([{ "name": "A" }]);
    body["tags"] = json!([{ "name": "T" }]);
    app.create_article(&token, body).await;
    app.create_article(&token, article_body("other", "2024-01-01")).await;

    let response = app.get("/v1/articles/download_csv", &token).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.headers[header::CONTENT_TYPE], "text/csv");
    assert_eq!(
        response.headers[header::CONTENT_DISPOSITION],
        r#"attachment; filename="articles.csv""#
    );

    let text = response.text();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "Identifier,Title,Publication Date,Authors,Tags,Abstract");
    assert_eq!(lines[1], "csv,csv,2025-03-19,A,T,csv");
    assert_eq!(lines.len(), 3);

    let narrowed = app
        .get("/v1/articles/download_csv?identifier=other", &token)
        .await
        .text();
    assert_eq!(narrowed.lines().count(), 2);
    assert!(narrowed.contains("other"));

    let filtered = app
        .get("/v1/articles/download_csv?year=2025", &token)
        .await
        .text();
    assert_eq!(filtered.lines().count(), 2);
}

#[tokio::test]
async fn test_comment_lifecycle_and_ownership() {
    let app = TestApp::new().await;
    let (alice_id, alice) = app.login("alice").await;
    let (_, bob) = app.login("bob").await;

    let article = app.create_article(&alice, article_body("a1", "2025-01-01")).await;
    let article_id = article["id"].as_str().unwrap();

    let created = app
        .send(
            Method::POST,
            "/v1/comments",
            Some(&alice),
            Some(json!({ "article": article_id, "content": "first", "user": "ignored" })),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let comment = created.json();
    assert_eq!(comment["user"], json!(alice_id));
    assert_eq!(comment["article"], json!(article_id));

    let uri = format!("/v1/comments/{}", comment["id"].as_str().unwrap());

    let denied = app
        .send(Method::PATCH, &uri, Some(&bob), Some(json!({ "content": "mine now" })))
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
    assert_eq!(
        denied.json()["error"]["message"],
        "You cannot update someone else's comment."
    );

    let denied = app.send(Method::DELETE, &uri, Some(&bob), None).await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
    assert_eq!(
        denied.json()["error"]["message"],
        "You cannot delete someone else's comment."
    );

    let edited = app
        .send(Method::PATCH, &uri, Some(&alice), Some(json!({ "content": "edited" })))
        .await;
    assert_eq!(edited.status, StatusCode::OK);
    assert_eq!(edited.json()["content"], "edited");

    let listed = app.get("/v1/comments", &bob).await.json();
    assert_eq!(listed["count"], 1);

    let deleted = app.send(Method::DELETE, &uri, Some(&alice), None).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    assert_eq!(app.get(&uri, &alice).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_comment_on_missing_article_is_rejected() {
    let app = TestApp::new().await;
    let (_, token) = app.login("alice").await;

    let response = app
        .send(
            Method::POST,
            "/v1/comments",
            Some(&token),
            Some(json!({
                "article": "7a1f6f2e-4a7e-4f54-9b8e-0a0b0c0d0e0f",
                "content": "orphan"
            })),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"]["details"]["field"], "article");
}

#[tokio::test]
async fn test_deleting_article_removes_its_comments() {
    let app = TestApp::new().await;
    let (_, token) = app.login("alice").await;

    let article = app.create_article(&token, article_body("a1", "2025-01-01")).await;
    let article_id = article["id"].as_str().unwrap();
    app.send(
        Method::POST,
        "/v1/comments",
        Some(&token),
        Some(json!({ "article": article_id, "content": "hi" })),
    )
    .await;

    let deleted = app
        .send(Method::DELETE, &format!("/v1/articles/{article_id}"), Some(&token), None)
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let comments = app.get("/v1/comments", &token).await.json();
    assert_eq!(comments["count"], 0);
}

#[tokio::test]
async fn test_bodyless_update_by_stranger_is_forbidden() {
    let app = TestApp::new().await;
    let (_, alice) = app.login("alice").await;
    let (_, bob) = app.login("bob").await;

    let article = app.create_article(&alice, article_body("a1", "2025-01-01")).await;
    let article_id = article["id"].as_str().unwrap();
    let uri = format!("/v1/articles/{article_id}");

    let patched = app.send(Method::PATCH, &uri, Some(&bob), None).await;
    assert_eq!(patched.status, StatusCode::FORBIDDEN);

    let replaced = app.send(Method::PUT, &uri, Some(&bob), None).await;
    assert_eq!(replaced.status, StatusCode::FORBIDDEN);

    // The owner's empty PATCH is a no-op
    let unchanged = app.send(Method::PATCH, &uri, Some(&alice), None).await;
    assert_eq!(unchanged.status, StatusCode::OK);
    assert_eq!(unchanged.json()["title"], "Title a1");

    let comment = app
        .send(
            Method::POST,
            "/v1/comments",
            Some(&alice),
            Some(json!({ "article": article_id, "content": "first" })),
        )
        .await
        .json();
    let comment_uri = format!("/v1/comments/{}", comment["id"].as_str().unwrap());

    let patched = app.send(Method::PATCH, &comment_uri, Some(&bob), None).await;
    assert_eq!(patched.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_put_skips_empty_tag_names() {
    let app = TestApp::new().await;
    let (_, token) = app.login("alice").await;

    let article = app.create_article(&token, article_body("a1", "2025-01-01")).await;
    let uri = format!("/v1/articles/{}", article["id"].as_str().unwrap());

    let mut body = article_body("a1", "2025-01-01");
    body["tags"] = json!([{ "name": "Rust" }, { "name": "" }]);
    let response = app.send(Method::PUT, &uri, Some(&token), Some(body)).await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.text());

    let tags = response.json()["tags"].clone();
    assert_eq!(tags.as_array().unwrap().len(), 1);
    assert_eq!(tags[0]["name"], "Rust");
}

#[tokio::test]
async fn test_put_replaces_comment() {
    let app = TestApp::new().await;
    let (alice_id, alice) = app.login("alice").await;
    let (_, bob) = app.login("bob").await;

    let first = app.create_article(&alice, article_body("a1", "2025-01-01")).await;
    let second = app.create_article(&alice, article_body("a2", "2025-01-02")).await;
    let comment = app
        .send(
            Method::POST,
            "/v1/comments",
            Some(&alice),
            Some(json!({ "article": first["id"], "content": "first" })),
        )
        .await
        .json();
    let uri = format!("/v1/comments/{}", comment["id"].as_str().unwrap());

    let denied = app
        .send(
            Method::PUT,
            &uri,
            Some(&bob),
            Some(json!({ "article": second["id"], "content": "mine" })),
        )
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    let incomplete = app
        .send(Method::PUT, &uri, Some(&alice), Some(json!({ "content": "edited" })))
        .await;
    assert_eq!(incomplete.status, StatusCode::BAD_REQUEST);
    assert_eq!(incomplete.json()["error"]["details"]["field"], "article");

    let replaced = app
        .send(
            Method::PUT,
            &uri,
            Some(&alice),
            Some(json!({ "article": second["id"], "content": "edited" })),
        )
        .await;
    assert_eq!(replaced.status, StatusCode::OK);
    let replaced = replaced.json();
    assert_eq!(replaced["content"], "edited");
    assert_eq!(replaced["article"], second["id"]);
    assert_eq!(replaced["user"], json!(alice_id));
}
