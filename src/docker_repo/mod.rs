// Docker container stats via bollard

mod stats;

use std::collections::HashMap;

use bollard::Docker;
use bollard::query_parameters::{ListContainersOptions, StatsOptions};
use bollard::models::ContainerStatsResponse;
use futures_util::StreamExt;
use tracing::warn;

use crate::error::CollectError;
use crate::exposition::MetricSample;

pub struct DockerRepo {
    docker: Docker,
}

impl DockerRepo {
    pub fn connect() -> anyhow::Result<Self> {
        let docker = Docker::connect_with_unix_defaults()?;
        Ok(Self { docker })
    }

    /// Stats for every running container. A list failure empties this
    /// section for the current request; a single container failing (e.g.
    /// exiting mid-enumeration) only drops that container.
    pub async fn collect(&self) -> Vec<MetricSample> {
        let mut filters = HashMap::new();
        filters.insert("status".to_string(), vec!["running".to_string()]);

        let filter = ListContainersOptions {
            all: false,
            filters: Some(filters),
            ..Default::default()
        };

        let containers = match self.docker.list_containers(Some(filter)).await {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Docker list_containers failed");
                return Vec::new();
            }
        };

        let mut samples = Vec::new();
        for container in &containers {
            let id = container.id.as_deref().unwrap_or_default();
            let name = container
                .names
                .as_ref()
                .and_then(|n| n.first())
                .map(|n| n.trim_start_matches('/'))
                .unwrap_or(id);
            let image = container
                .image
                .as_deref()
                .filter(|i| !i.is_empty())
                .unwrap_or("unknown");

            match self.stats_snapshot(id, name).await {
                Ok(snapshot) => {
                    if let Some(metrics) = stats::process_statistics(&snapshot, name, image) {
                        samples.extend(metrics.samples());
                    }
                }
                Err(e) => warn!(error = %e, container = name, "container stats failed"),
            }
        }
        samples
    }

    /// One non-streaming stats read; the response already carries the
    /// current and previous CPU readings needed for the delta.
    async fn stats_snapshot(
        &self,
        id: &str,
        name: &str,
    ) -> Result<ContainerStatsResponse, CollectError> {
        let options = StatsOptions {
            stream: false,
            ..Default::default()
        };
        let mut stream = self.docker.stats(id, Some(options));
        match stream.next().await {
            Some(Ok(snapshot)) => Ok(snapshot),
            Some(Err(e)) => Err(e.into()),
            None => Err(CollectError::ContainerStats {
                name: name.to_string(),
            }),
        }
    }
}
