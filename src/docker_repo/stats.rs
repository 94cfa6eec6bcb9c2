// Turn a raw Docker stats response into per-container metric samples.

use bollard::models::ContainerStatsResponse;

use crate::exposition::{MetricSample, SampleValue};

/// Normalized per-container reading.
#[derive(Debug, Clone)]
pub(crate) struct ContainerMetrics {
    pub name: String,
    pub image: String,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub network: Option<(u64, u64)>,
}

/// Process a raw stats response. Exposed for unit tests.
pub(crate) fn process_statistics(
    s: &ContainerStatsResponse,
    name: &str,
    image: &str,
) -> Option<ContainerMetrics> {
    let cpu_stats = s.cpu_stats.as_ref()?;
    let precpu_stats = s.precpu_stats.as_ref()?;

    let cpu_usage = cpu_stats.cpu_usage.as_ref()?;
    let precpu_usage = precpu_stats.cpu_usage.as_ref()?;

    let cpu_delta =
        cpu_usage.total_usage.unwrap_or(0) as i64 - precpu_usage.total_usage.unwrap_or(0) as i64;
    let system_delta = cpu_stats.system_cpu_usage.unwrap_or(0) as i64
        - precpu_stats.system_cpu_usage.unwrap_or(0) as i64;
    let online = cpu_stats.online_cpus.unwrap_or(1) as f64;
    let cpu_percent = if cpu_delta > 0 && system_delta > 0 {
        (cpu_delta as f64 / system_delta as f64) * online * 100.0
    } else {
        0.0
    };

    let mem_usage = s.memory_stats.as_ref().and_then(|m| m.usage).unwrap_or(0);
    let mem_limit = s.memory_stats.as_ref().and_then(|m| m.limit).unwrap_or(0);
    let memory_percent = if mem_limit > 0 {
        (mem_usage as f64 / mem_limit as f64) * 100.0
    } else {
        0.0
    };

    // The runtime returns interfaces in hash order; pick the first by name
    // so repeated scrapes report the same counters.
    let network = s.networks.as_ref().and_then(|n| {
        n.iter()
            .min_by(|a, b| a.0.cmp(b.0))
            .map(|(_, v)| (v.rx_bytes.unwrap_or(0), v.tx_bytes.unwrap_or(0)))
    });

    Some(ContainerMetrics {
        name: name.to_string(),
        image: image.to_string(),
        cpu_percent,
        memory_percent,
        network,
    })
}

impl ContainerMetrics {
    pub fn samples(&self) -> Vec<MetricSample> {
        let mut samples = vec![
            MetricSample::gauge(
                "docker_container_cpu_percent",
                "Container CPU utilization percent",
                SampleValue::Percent(self.cpu_percent),
            )
            .with_label("container", self.name.clone())
            .with_label("image", self.image.clone()),
            MetricSample::gauge(
                "docker_container_memory_percent",
                "Container memory utilization percent",
                SampleValue::Percent(self.memory_percent),
            )
            .with_label("container", self.name.clone())
            .with_label("image", self.image.clone()),
        ];
        if let Some((rx, tx)) = self.network {
            samples.push(
                MetricSample::counter(
                    "docker_container_network_rx_bytes",
                    "Container network bytes received",
                    SampleValue::Int(rx),
                )
                .with_label("container", self.name.clone())
                .with_label("image", self.image.clone()),
            );
            samples.push(
                MetricSample::counter(
                    "docker_container_network_tx_bytes",
                    "Container network bytes transmitted",
                    SampleValue::Int(tx),
                )
                .with_label("container", self.name.clone())
                .with_label("image", self.image.clone()),
            );
        }
        samples
    }
}
