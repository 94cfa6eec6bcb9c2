// Host CPU, memory, and temperature stats via sysinfo

use std::sync::Arc;
use std::time::Instant;

use sysinfo::{Components, System};
use tracing::warn;

use crate::exposition::{MetricSample, SampleValue};

/// Temperature sensors are read from this hwmon group; the second reading is
/// the package sensor on the boxes this runs on.
const TEMP_SENSOR_GROUP: &str = "coretemp";
const PACKAGE_SENSOR_INDEX: usize = 1;

pub struct SysinfoRepo {
    sys: Arc<std::sync::Mutex<System>>,
    components: Arc<std::sync::Mutex<Components>>,
    last_cpu_refresh: Arc<std::sync::Mutex<Option<(Instant, f64)>>>,
}

impl Default for SysinfoRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl SysinfoRepo {
    pub fn new() -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();
        let components = Components::new_with_refreshed_list();
        Self {
            sys: Arc::new(std::sync::Mutex::new(sys)),
            components: Arc::new(std::sync::Mutex::new(components)),
            last_cpu_refresh: Arc::new(std::sync::Mutex::new(None)),
        }
    }

    /// CPU and memory are always emitted; the package temperature only when
    /// the sensor group exposes it. Getter failures are logged and the
    /// affected sample omitted.
    pub async fn collect(&self) -> Vec<MetricSample> {
        let mut samples = Vec::with_capacity(3);

        match self.get_cpu_percent().await {
            Ok(cpu) => samples.push(MetricSample::gauge(
                "ppth_system_cpu_percent",
                "Host CPU utilization percent",
                SampleValue::Percent(cpu),
            )),
            Err(e) => warn!(error = %e, operation = "get_cpu_percent", "CPU stats failed"),
        }

        match self.get_memory_percent().await {
            Ok(memory) => samples.push(MetricSample::gauge(
                "ppth_system_memory_percent",
                "Host memory utilization percent",
                SampleValue::Percent(memory),
            )),
            Err(e) => warn!(error = %e, operation = "get_memory_percent", "memory stats failed"),
        }

        if let Some(temp) = self.get_package_temp().await {
            samples.push(MetricSample::gauge(
                "ppth_system_cpu_package_temp",
                "CPU package temperature in Celsius",
                SampleValue::Float(temp),
            ));
        }

        samples
    }

    async fn get_cpu_percent(&self) -> anyhow::Result<f64> {
        let sys = self.sys.clone();
        let last_cpu_refresh = self.last_cpu_refresh.clone();
        tokio::task::spawn_blocking(move || {
            let mut sys = sys
                .lock()
                .map_err(|e| anyhow::anyhow!("sysinfo lock poisoned: {}", e))?;

            let now = Instant::now();
            let usage = if let Ok(mut guard) = last_cpu_refresh.lock() {
                if let Some((prev_ts, prev_usage)) = *guard {
                    let dt = now.duration_since(prev_ts);
                    if dt >= sysinfo::MINIMUM_CPU_UPDATE_INTERVAL {
                        sys.refresh_cpu_all();
                        let new_usage = sys.global_cpu_usage() as f64;
                        *guard = Some((now, new_usage));
                        new_usage
                    } else {
                        // Too soon for a meaningful delta; reuse the cached reading
                        prev_usage
                    }
                } else {
                    // First call: refresh to establish the baseline
                    sys.refresh_cpu_all();
                    *guard = Some((now, 0.0));
                    0.0
                }
            } else {
                sys.refresh_cpu_all();
                0.0
            };

            Ok(usage.clamp(0.0, 100.0))
        })
        .await
        .map_err(|e| anyhow::anyhow!("sysinfo task join: {}", e))?
    }

    async fn get_memory_percent(&self) -> anyhow::Result<f64> {
        let sys = self.sys.clone();
        tokio::task::spawn_blocking(move || {
            let mut sys = sys
                .lock()
                .map_err(|e| anyhow::anyhow!("sysinfo lock poisoned: {}", e))?;
            sys.refresh_memory();

            let total = sys.total_memory();
            let available = sys.available_memory();
            let used = total.saturating_sub(available);
            if total > 0 {
                Ok((used as f64 / total as f64) * 100.0)
            } else {
                Ok(0.0)
            }
        })
        .await
        .map_err(|e| anyhow::anyhow!("sysinfo task join: {}", e))?
    }

    /// Package temperature, or None when the platform exposes no usable
    /// sensor group (fewer than two readings under the group).
    async fn get_package_temp(&self) -> Option<f64> {
        let components = self.components.clone();
        let result = tokio::task::spawn_blocking(move || {
            let mut components = components.lock().ok()?;
            components.refresh(false);
            let readings: Vec<f64> = components
                .list()
                .iter()
                .filter(|c| c.label().starts_with(TEMP_SENSOR_GROUP))
                .filter_map(|c| c.temperature().map(f64::from))
                .collect();
            readings.get(PACKAGE_SENSOR_INDEX).copied()
        })
        .await;
        match result {
            Ok(temp) => temp,
            Err(e) => {
                warn!(error = %e, operation = "get_package_temp", "temperature read failed");
                None
            }
        }
    }
}
