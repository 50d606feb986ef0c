//! Liveness and readiness endpoints (unauthenticated, outside `/v1`)

use crate::AppState;
use articlehub_common::{Repository, Result};
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::time::Instant;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub checks: ReadyChecks,
}

#[derive(Serialize)]
pub struct ReadyChecks {
    pub database: CheckResult,
    pub schema: CheckResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Up,
    Down,
}

#[derive(Serialize)]
pub struct CheckResult {
    pub status: CheckStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckResult {
    fn from_outcome(started: Instant, outcome: Result<()>) -> Self {
        match outcome {
            Ok(()) => Self {
                status: CheckStatus::Up,
                latency_ms: Some(started.elapsed().as_millis() as u64),
                error: None,
            },
            Err(e) => {
                tracing::warn!(error = %e, "Readiness check failed");
                Self {
                    status: CheckStatus::Down,
                    latency_ms: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    fn is_up(&self) -> bool {
        self.status == CheckStatus::Up
    }
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: articlehub_common::VERSION,
    })
}

/// 503 until the database answers and the article tables exist
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let repo = Repository::new(state.db.clone());

    let started = Instant::now();
    let database = CheckResult::from_outcome(started, repo.ping().await);

    // Tables are unreachable without a connection
    let schema = if database.is_up() {
        let started = Instant::now();
        CheckResult::from_outcome(started, repo.schema_ready().await)
    } else {
        CheckResult {
            status: CheckStatus::Down,
            latency_ms: None,
            error: None,
        }
    };

    let ready = database.is_up() && schema.is_up();
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let body = ReadyResponse {
        status: if ready { "ready" } else { "not_ready" },
        version: articlehub_common::VERSION,
        checks: ReadyChecks { database, schema },
    };

    (status, Json(body))
}
