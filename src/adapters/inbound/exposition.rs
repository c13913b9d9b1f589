//! Prometheus Text Exposition
//!
//! Renders a [`Snapshot`] in the Prometheus text format (version 0.0.4).

use crate::domain::metrics::{MetricRegistry, Sample, Snapshot};
use std::fmt::Write;

/// Content type of the rendered output.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Render every metric that has at least one sample.
///
/// Metrics appear in registry order; samples within a metric are sorted by
/// label values so repeated scrapes diff cleanly.
pub fn render(registry: &MetricRegistry, snapshot: &Snapshot) -> String {
    let mut output = String::new();

    for def in registry.definitions() {
        let mut samples: Vec<&Sample> = snapshot.samples_for(def.id).collect();
        if samples.is_empty() {
            continue;
        }
        samples.sort_by(|a, b| a.label_values.cmp(&b.label_values));

        let _ = writeln!(output, "# HELP {} {}", def.name, escape_help(def.help));
        let _ = writeln!(output, "# TYPE {} {}", def.name, def.kind);

        for sample in samples {
            output.push_str(&def.name);
            if !def.labels.is_empty() {
                output.push('{');
                for (i, (name, value)) in def.labels.iter().zip(&sample.label_values).enumerate() {
                    if i > 0 {
                        output.push(',');
                    }
                    let _ = write!(output, "{}=\"{}\"", name, escape_label_value(value));
                }
                output.push('}');
            }
            let _ = writeln!(output, " {}", format_value(sample.value));
        }
    }

    output
}

fn escape_help(help: &str) -> String {
    help.replace('\\', "\\\\").replace('\n', "\\n")
}

fn escape_label_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "+Inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        value.to_string()
    }
}
