// HTTP route handlers for the Gavel API
//
// This layer only translates between JSON and the engine's typed
// contract; judging semantics live in gavel-engine.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use gavel_common::types::{
    ExecutionReport, ExecutionRequest, ResourceLimits, SubmissionResult, TestCase,
};
use gavel_engine::EngineError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct JudgeRequest {
    pub language: String,
    pub source_code: String,
    pub test_cases: Vec<TestCaseInput>,
    #[serde(default)]
    pub limits: ResourceLimits,
}

#[derive(Debug, Deserialize)]
pub struct TestCaseInput {
    pub input: String,
    pub expected_output: String,
}

#[derive(Debug, Serialize)]
pub struct JudgeResponse {
    pub id: Uuid,
    pub status: &'static str,
    pub score: f64,
    pub passed_count: usize,
    pub total_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compile_error: Option<String>,
    pub results: Vec<ExecutionReport>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Deserialize)]
pub struct RunRequest {
    pub language: String,
    pub source_code: String,
    #[serde(default)]
    pub input: String,
}

/// Overall verdict string reported to clients.
fn submission_status(result: &SubmissionResult) -> &'static str {
    if result.compile_error.is_some() {
        "COMPILE_ERROR"
    } else if result.accepted() {
        "ACCEPTED"
    } else {
        "FAILED"
    }
}

fn authorized(state: &AppState, headers: &HeaderMap) -> bool {
    let Some(expected) = &state.api_token else {
        // no token configured: open instance
        return true;
    };
    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|token| token == expected)
        .unwrap_or(false)
}

fn engine_error_response(err: EngineError) -> (StatusCode, Json<serde_json::Value>) {
    let status = match err {
        EngineError::UnsupportedLanguage(_) | EngineError::NoTestCases => StatusCode::BAD_REQUEST,
        EngineError::PoolExhausted => StatusCode::SERVICE_UNAVAILABLE,
        EngineError::StagingFailed { .. }
        | EngineError::RunLaunchFailed { .. }
        | EngineError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(serde_json::json!({ "error": err.to_string() })),
    )
}

/// POST /api/v1/judge - Judge a submission against its test cases
pub async fn judge_submission(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<JudgeRequest>,
) -> impl IntoResponse {
    if !authorized(&state, &headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": "unauthorized" })),
        )
            .into_response();
    }

    let request = ExecutionRequest {
        id: Uuid::new_v4(),
        language: payload.language,
        source_code: payload.source_code,
        test_cases: payload
            .test_cases
            .into_iter()
            .map(|tc| TestCase {
                input: tc.input,
                expected_output: tc.expected_output,
            })
            .collect(),
        limits: payload.limits,
    };

    info!(
        submission_id = %request.id,
        language = %request.language,
        test_cases = request.test_cases.len(),
        source_size = request.source_code.len(),
        "Judge request received"
    );

    match state.engine.judge(&request).await {
        Ok(result) => {
            let response = JudgeResponse {
                id: request.id,
                status: submission_status(&result),
                score: result.score_percent,
                passed_count: result.passed_count,
                total_count: result.total_count,
                compile_error: result.compile_error.clone(),
                results: result.reports,
                timestamp: chrono::Utc::now(),
            };
            info!(
                submission_id = %request.id,
                status = response.status,
                score = response.score,
                "Judge request completed"
            );
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!(submission_id = %request.id, error = %e, "Judge request failed");
            engine_error_response(e).into_response()
        }
    }
}

/// POST /api/v1/run - Run code once against raw input, no judgment
pub async fn run_adhoc(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<RunRequest>,
) -> impl IntoResponse {
    if !authorized(&state, &headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": "unauthorized" })),
        )
            .into_response();
    }

    info!(
        language = %payload.language,
        source_size = payload.source_code.len(),
        "Ad-hoc run request received"
    );

    match state
        .engine
        .run_single(&payload.language, &payload.source_code, &payload.input)
        .await
    {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => {
            error!(error = %e, "Ad-hoc run failed");
            engine_error_response(e).into_response()
        }
    }
}

/// GET /api/v1/languages - List configured language pipelines
pub async fn list_languages(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({ "languages": state.engine.registry().names() }))
}

/// GET /health - Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
