// Environment-driven exporter configuration

use anyhow::Context;

/// Resolved once at startup; immutable afterwards.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_address: String,
    pub port: u16,
    pub tautulli_url: String,
    pub tautulli_api_key: String,
    pub enable_docker_metrics: bool,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(|key| std::env::var(key).ok())
    }

    /// Resolve config from a lookup function (e.g. for tests).
    pub fn load_from(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let bind_address = get("EXPORTER_BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0".into());

        let port = match get("EXPORTER_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("EXPORTER_PORT must be a port number, got {raw:?}"))?,
            None => 8000,
        };
        anyhow::ensure!(port > 0, "EXPORTER_PORT must be between 1 and 65535, got 0");

        let tautulli_url = get("TAUTULLI_URL").unwrap_or_else(|| "http://localhost:8181".into());
        let tautulli_api_key = get("TAUTULLI_API_KEY").unwrap_or_default();

        let enable_docker_metrics = get("ENABLE_DOCKER_METRICS")
            .is_none_or(|v| v.trim().eq_ignore_ascii_case("true"));

        Ok(Self {
            bind_address,
            port,
            tautulli_url,
            tautulli_api_key,
            enable_docker_metrics,
        })
    }

    /// Activity metrics are opt-in via the API key; empty means disabled.
    pub fn tautulli_enabled(&self) -> bool {
        !self.tautulli_api_key.is_empty()
    }
}
