//! Text renderings of a collector snapshot.

use crate::collector::Sample;

pub mod http;

/// Prometheus text exposition. Unavailable metrics are omitted.
pub fn prometheus(samples: &[Sample]) -> String {
    let mut content = String::new();

    for sample in samples {
        let Some(value) = sample.value else {
            continue;
        };

        let name = sanitize(&sample.info.name);

        let help = if sample.info.units.is_empty() {
            sample.info.description.to_string()
        } else {
            format!("{} [{}]", sample.info.description, sample.info.units)
        };

        content.push_str(&format!("# HELP {name} {help}\n"));
        content.push_str(&format!("# TYPE {name} gauge\n"));
        content.push_str(&format!(
            "{name}{{group=\"{}\",device=\"{}\",port=\"{}\"}} {value}\n",
            sample.info.group,
            escape(&sample.info.device),
            sample.info.port
        ));
    }

    content
}

/// Human readable `name: value` lines using each metric's precision.
pub fn human(samples: &[Sample]) -> String {
    let mut content = String::new();

    for sample in samples {
        let value = match sample.value {
            Some(v) => sample.info.format(v),
            None => "unavailable".to_string(),
        };

        if sample.info.units.is_empty() || sample.value.is_none() {
            content.push_str(&format!("{}: {value}\n", sample.info.name));
        } else {
            content.push_str(&format!(
                "{}: {value} {}\n",
                sample.info.name, sample.info.units
            ));
        }
    }

    content
}

/// Restrict a metric name to the characters Prometheus accepts.
fn sanitize(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == ':' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }

    out
}

fn escape(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
