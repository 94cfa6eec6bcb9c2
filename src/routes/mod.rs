// HTTP routes

mod http;

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::docker_repo::DockerRepo;
use crate::sysinfo_repo::SysinfoRepo;
use crate::tautulli_repo::TautulliRepo;

/// Disabled collectors are `None`; the handler skips them without touching
/// their upstreams.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) tautulli_repo: Option<Arc<TautulliRepo>>,
    pub(crate) sysinfo_repo: Arc<SysinfoRepo>,
    pub(crate) docker_repo: Option<Arc<DockerRepo>>,
}

pub fn app(
    tautulli_repo: Option<Arc<TautulliRepo>>,
    sysinfo_repo: Arc<SysinfoRepo>,
    docker_repo: Option<Arc<DockerRepo>>,
) -> Router {
    let state = AppState {
        tautulli_repo,
        sysinfo_repo,
        docker_repo,
    };
    Router::new()
        .route(
            "/metrics",
            get(http::metrics_handler).fallback(http::not_found_handler),
        )
        .fallback(http::not_found_handler)
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
