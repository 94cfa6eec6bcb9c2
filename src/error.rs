// Collector failure taxonomy. Every variant is caught at the collector
// layer, logged, and degraded to "no samples"; none reaches the dispatcher.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(#[from] reqwest::Error),

    #[error("upstream returned {status} for cmd={cmd}")]
    UpstreamStatus {
        cmd: &'static str,
        status: reqwest::StatusCode,
    },

    #[error("malformed payload for cmd={cmd}: {source}")]
    UpstreamPayload {
        cmd: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("container runtime unavailable: {0}")]
    RuntimeUnavailable(#[from] bollard::errors::Error),

    #[error("no stats snapshot for container {name}")]
    ContainerStats { name: String },
}
