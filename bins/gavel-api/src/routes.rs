use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

use crate::{handlers, AppState};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/v1/judge", post(handlers::judge_submission))
        .route("/api/v1/run", post(handlers::run_adhoc))
        .route("/api/v1/languages", get(handlers::list_languages))
}
