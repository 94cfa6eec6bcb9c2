// Plex activity metrics via the Tautulli v2 API

mod payload;

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::CollectError;
use crate::exposition::{MetricSample, SampleValue};
use payload::{Activity, ApiEnvelope, ServerInfo};

/// Upstream calls are bounded so a stalled Tautulli cannot hang a scrape.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct TautulliRepo {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl TautulliRepo {
    pub fn new(base_url: &str, api_key: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/v2", base_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
        })
    }

    /// Run the three sub-calls and normalize whatever succeeded into
    /// samples. Each sub-call degrades to "no samples" on its own; one
    /// failing never suppresses the others.
    pub async fn collect(&self) -> Vec<MetricSample> {
        let mut samples = Vec::new();

        match self.api_call::<Activity>("get_activity").await {
            Ok(activity) => samples.extend(activity.samples()),
            Err(e) => warn!(error = %e, cmd = "get_activity", "Tautulli call failed"),
        }

        match self.api_call::<ServerInfo>("get_server_info").await {
            Ok(info) => samples.push(info.sample()),
            Err(e) => warn!(error = %e, cmd = "get_server_info", "Tautulli call failed"),
        }

        match self.api_call::<Vec<serde_json::Value>>("get_users").await {
            Ok(users) => samples.push(MetricSample::gauge(
                "plex_total_users",
                "Total number of Plex users",
                SampleValue::Int(users.len() as u64),
            )),
            Err(e) => warn!(error = %e, cmd = "get_users", "Tautulli call failed"),
        }

        samples
    }

    async fn api_call<T: DeserializeOwned>(&self, cmd: &'static str) -> Result<T, CollectError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("apikey", self.api_key.as_str()), ("cmd", cmd)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CollectError::UpstreamStatus { cmd, status });
        }

        let body = response.bytes().await?;
        let envelope: ApiEnvelope<T> = serde_json::from_slice(&body)
            .map_err(|source| CollectError::UpstreamPayload { cmd, source })?;
        Ok(envelope.response.data)
    }
}
