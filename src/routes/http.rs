// GET /metrics handler and the 404 fallback

use axum::{extract::State, http::StatusCode, http::header, response::IntoResponse};

use super::AppState;
use crate::exposition;

/// GET /metrics — run the collectors in order (activity, host, containers),
/// aggregate, render. Collectors absorb their own failures, so this always
/// replies 200.
pub(super) async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut sections = Vec::with_capacity(3);
    if let Some(repo) = &state.tautulli_repo {
        sections.push(repo.collect().await);
    }
    sections.push(state.sysinfo_repo.collect().await);
    if let Some(repo) = &state.docker_repo {
        sections.push(repo.collect().await);
    }

    let samples = exposition::aggregate(sections);
    let body = exposition::render(&samples);
    ([(header::CONTENT_TYPE, "text/plain")], body)
}

/// Anything but GET /metrics — 404, empty body.
pub(super) async fn not_found_handler() -> impl IntoResponse {
    StatusCode::NOT_FOUND
}
