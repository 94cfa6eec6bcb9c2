// Tautulli API payload types and derived values

use std::collections::{BTreeMap, HashSet};

use serde::Deserialize;

use crate::exposition::{MetricSample, SampleValue};

/// Every v2 response is wrapped in `{"response": {"data": ...}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiEnvelope<T> {
    pub response: ApiResponse<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse<T> {
    pub data: T,
}

/// `get_activity` data. All fields default, so an empty payload decodes to
/// all-zero counts rather than a parse failure.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct Activity {
    #[serde(default, deserialize_with = "flex::u64_or_string")]
    pub stream_count: u64,
    #[serde(default, deserialize_with = "flex::u64_or_string")]
    pub stream_count_direct_play: u64,
    #[serde(default, deserialize_with = "flex::u64_or_string")]
    pub stream_count_direct_stream: u64,
    #[serde(default, deserialize_with = "flex::u64_or_string")]
    pub stream_count_transcode: u64,
    #[serde(default, deserialize_with = "flex::u64_or_string")]
    pub total_bandwidth: u64,
    #[serde(default, deserialize_with = "flex::u64_or_string")]
    pub lan_bandwidth: u64,
    #[serde(default)]
    pub sessions: Vec<Session>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Session {
    #[serde(default)]
    pub username: String,
    #[serde(default, deserialize_with = "flex::opt_u64_or_string")]
    pub bitrate: Option<u64>,
    #[serde(default)]
    pub video_full_resolution: String,
}

impl Activity {
    pub fn wan_bandwidth(&self) -> u64 {
        self.total_bandwidth.saturating_sub(self.lan_bandwidth)
    }

    pub fn unique_user_count(&self) -> u64 {
        self.sessions
            .iter()
            .filter(|s| !s.username.is_empty())
            .map(|s| s.username.as_str())
            .collect::<HashSet<_>>()
            .len() as u64
    }

    /// Sessions per resolution label; a missing resolution counts as
    /// "unknown". Sorted keys keep the emission order stable across scrapes.
    pub fn resolution_counts(&self) -> BTreeMap<&str, u64> {
        let mut counts = BTreeMap::new();
        for session in &self.sessions {
            let resolution = if session.video_full_resolution.is_empty() {
                "unknown"
            } else {
                session.video_full_resolution.as_str()
            };
            *counts.entry(resolution).or_insert(0) += 1;
        }
        counts
    }

    /// Mean bitrate over sessions that report one; 0 when none do.
    pub fn average_bitrate(&self) -> f64 {
        let bitrates: Vec<u64> = self
            .sessions
            .iter()
            .filter_map(|s| s.bitrate.filter(|b| *b > 0))
            .collect();
        if bitrates.is_empty() {
            return 0.0;
        }
        bitrates.iter().sum::<u64>() as f64 / bitrates.len() as f64
    }

    pub fn samples(&self) -> Vec<MetricSample> {
        let mut samples = vec![
            MetricSample::gauge(
                "plex_streams_total",
                "Total number of active Plex streams",
                SampleValue::Int(self.stream_count),
            ),
            MetricSample::gauge(
                "plex_streams_direct_play",
                "Number of direct play streams",
                SampleValue::Int(self.stream_count_direct_play),
            ),
            MetricSample::gauge(
                "plex_streams_direct_stream",
                "Number of direct streams",
                SampleValue::Int(self.stream_count_direct_stream),
            ),
            MetricSample::gauge(
                "plex_streams_transcode",
                "Number of transcoded streams",
                SampleValue::Int(self.stream_count_transcode),
            ),
            MetricSample::gauge(
                "plex_bandwidth_total",
                "Total Plex streaming bandwidth in kbps",
                SampleValue::Int(self.total_bandwidth),
            ),
            MetricSample::gauge(
                "plex_bandwidth_lan",
                "LAN Plex streaming bandwidth in kbps",
                SampleValue::Int(self.lan_bandwidth),
            ),
            MetricSample::gauge(
                "plex_bandwidth_wan",
                "WAN Plex streaming bandwidth in kbps",
                SampleValue::Int(self.wan_bandwidth()),
            ),
            MetricSample::gauge(
                "plex_active_users",
                "Number of distinct users currently streaming",
                SampleValue::Int(self.unique_user_count()),
            ),
        ];
        for (resolution, count) in self.resolution_counts() {
            samples.push(
                MetricSample::gauge(
                    "plex_streams_by_resolution",
                    "Number of active streams by video resolution",
                    SampleValue::Int(count),
                )
                .with_label("resolution", resolution),
            );
        }
        samples.push(MetricSample::gauge(
            "plex_avg_stream_bitrate",
            "Average bitrate of active streams in kbps",
            SampleValue::Float(self.average_bitrate()),
        ));
        samples
    }
}

/// `get_server_info` data.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ServerInfo {
    #[serde(default)]
    pub pms_version: String,
    #[serde(default)]
    pub pms_platform: String,
}

impl ServerInfo {
    pub fn sample(&self) -> MetricSample {
        MetricSample::gauge(
            "plex_server_info",
            "Plex Media Server version and platform",
            SampleValue::Int(1),
        )
        .with_label("version", self.pms_version.clone())
        .with_label("platform", self.pms_platform.clone())
    }
}

/// Tautulli renders several numeric fields as JSON strings; accept both.
mod flex {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u64),
        Text(String),
    }

    pub(super) fn u64_or_string<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        match Raw::deserialize(d)? {
            Raw::Num(n) => Ok(n),
            Raw::Text(s) if s.trim().is_empty() => Ok(0),
            Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
        }
    }

    pub(super) fn opt_u64_or_string<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<u64>, D::Error> {
        match Option::<Raw>::deserialize(d)? {
            None => Ok(None),
            Some(Raw::Num(n)) => Ok(Some(n)),
            Some(Raw::Text(s)) if s.trim().is_empty() => Ok(None),
            Some(Raw::Text(s)) => s.trim().parse().map(Some).map_err(serde::de::Error::custom),
        }
    }
}
