// Typed metric samples and the text exposition pipeline

mod render;

pub use render::render;

/// Exposition metric kind; printed verbatim on the `# TYPE` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Gauge,
    Counter,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Gauge => "gauge",
            MetricKind::Counter => "counter",
        }
    }
}

/// Sample value, typed by how it is rendered: integers as integer literals,
/// percentages with fixed 2-decimal precision, other floats via `Display`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleValue {
    Int(u64),
    Float(f64),
    Percent(f64),
}

impl std::fmt::Display for SampleValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SampleValue::Int(v) => write!(f, "{v}"),
            SampleValue::Float(v) => write!(f, "{v}"),
            SampleValue::Percent(v) => write!(f, "{v:.2}"),
        }
    }
}

/// One sample line of the exposition. Samples sharing a name must share
/// `kind` and `help` within a response; label sets may differ. Labels are
/// rendered in insertion order.
#[derive(Debug, Clone)]
pub struct MetricSample {
    pub name: &'static str,
    pub help: &'static str,
    pub kind: MetricKind,
    pub labels: Vec<(&'static str, String)>,
    pub value: SampleValue,
}

impl MetricSample {
    pub fn gauge(name: &'static str, help: &'static str, value: SampleValue) -> Self {
        Self {
            name,
            help,
            kind: MetricKind::Gauge,
            labels: Vec::new(),
            value,
        }
    }

    pub fn counter(name: &'static str, help: &'static str, value: SampleValue) -> Self {
        Self {
            name,
            help,
            kind: MetricKind::Counter,
            labels: Vec::new(),
            value,
        }
    }

    pub fn with_label(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.labels.push((key, value.into()));
        self
    }
}

/// Concatenate collector outputs preserving collector order and each
/// collector's internal emission order. No dedup, no sorting.
pub fn aggregate(sections: Vec<Vec<MetricSample>>) -> Vec<MetricSample> {
    sections.into_iter().flatten().collect()
}
