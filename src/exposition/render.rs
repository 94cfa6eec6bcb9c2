// Serialize samples into the Prometheus text exposition format.

use std::collections::HashSet;
use std::fmt::Write;

use super::MetricSample;

/// Render the ordered sample list. `# HELP`/`# TYPE` lines are emitted at
/// the first encounter of each metric name; every line ends with `\n`, so
/// the output carries exactly one trailing newline.
pub fn render(samples: &[MetricSample]) -> String {
    let mut out = String::with_capacity(64 * samples.len().max(1));
    let mut seen: HashSet<&str> = HashSet::new();

    for sample in samples {
        if seen.insert(sample.name) {
            let _ = writeln!(out, "# HELP {} {}", sample.name, sample.help);
            let _ = writeln!(out, "# TYPE {} {}", sample.name, sample.kind.as_str());
        }
        out.push_str(sample.name);
        if !sample.labels.is_empty() {
            out.push('{');
            for (i, (key, value)) in sample.labels.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                let _ = write!(out, "{key}=\"{}\"", escape_label_value(value));
            }
            out.push('}');
        }
        let _ = writeln!(out, " {}", sample.value);
    }

    out
}

/// Label-value escaping per the exposition format: backslash, double quote,
/// and line feed.
fn escape_label_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(c),
        }
    }
    escaped
}
