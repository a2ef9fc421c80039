//! Store snapshot -> exposition families.
//!
//! Samples are grouped by metric name. The first sample seen for a name
//! fixes the family's help and type; later samples are emitted under that
//! type so one family never mixes value kinds.

use std::collections::{BTreeMap, HashSet};

use prometheus::proto::{Counter, Gauge, LabelPair, Metric, MetricFamily, MetricType, Untyped};
use prometheus::{Encoder, TextEncoder};

use textfile_core::error::{CoreError, Result};
use textfile_core::{Sample, ValueKind};

fn metric_type(kind: ValueKind) -> MetricType {
    match kind {
        ValueKind::Gauge => MetricType::GAUGE,
        ValueKind::Counter => MetricType::COUNTER,
        ValueKind::Untyped => MetricType::UNTYPED,
    }
}

fn to_metric(sample: Sample, kind: ValueKind) -> Metric {
    let mut m = Metric::default();
    for (name, value) in sample.labels {
        let mut pair = LabelPair::default();
        pair.set_name(name);
        pair.set_value(value);
        m.mut_label().push(pair);
    }

    match kind {
        ValueKind::Gauge => {
            let mut g = Gauge::default();
            g.set_value(sample.value);
            m.set_gauge(g);
        }
        ValueKind::Counter => {
            let mut c = Counter::default();
            c.set_value(sample.value);
            m.set_counter(c);
        }
        ValueKind::Untyped => {
            let mut u = Untyped::default();
            u.set_value(sample.value);
            m.set_untyped(u);
        }
    }

    m.set_timestamp_ms(sample.timestamp_ms);
    m
}

/// Group samples into one family per metric name, sorted by name.
pub fn families_from_samples(samples: Vec<Sample>) -> Vec<MetricFamily> {
    let mut families: BTreeMap<String, (ValueKind, MetricFamily)> = BTreeMap::new();

    for sample in samples {
        let (kind, family) = families.entry(sample.name.clone()).or_insert_with(|| {
            let mut mf = MetricFamily::default();
            mf.set_name(sample.name.clone());
            mf.set_help(sample.help.clone());
            mf.set_field_type(metric_type(sample.kind));
            (sample.kind, mf)
        });
        if *kind != sample.kind {
            tracing::debug!(
                metric = %sample.name,
                family_kind = kind.as_str(),
                sample_kind = sample.kind.as_str(),
                "sample kind differs from family, emitting as family kind"
            );
        }
        let kind = *kind;
        family.mut_metric().push(to_metric(sample, kind));
    }

    families.into_values().map(|(_, mf)| mf).collect()
}

/// Append the exporter's own families after the file families.
///
/// A file family whose name is already taken by an own family is skipped,
/// so every name appears once in the output.
pub fn merge_families(files: Vec<MetricFamily>, own: Vec<MetricFamily>) -> Vec<MetricFamily> {
    let taken: HashSet<String> = own.iter().map(|mf| mf.get_name().to_string()).collect();
    let mut merged: Vec<MetricFamily> = files
        .into_iter()
        .filter(|mf| {
            let clash = taken.contains(mf.get_name());
            if clash {
                tracing::debug!(metric = mf.get_name(), "file metric shadows an exporter metric, skipped");
            }
            !clash
        })
        .collect();
    merged.extend(own);
    merged
}

/// Encode families in the text exposition format.
pub fn encode_text(families: &[MetricFamily]) -> Result<String> {
    let mut buf = Vec::new();
    TextEncoder::new()
        .encode(families, &mut buf)
        .map_err(|e| CoreError::Internal(format!("encode metrics failed: {e}")))?;
    String::from_utf8(buf).map_err(|e| CoreError::Internal(format!("encoded metrics not utf-8: {e}")))
}
