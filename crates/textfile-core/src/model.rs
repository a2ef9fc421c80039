//! Canonical metric model.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::key::sanitize_labels;

/// Value kinds the exporter republishes.
///
/// Histograms and summaries never reach this type: their families are
/// dropped during ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Gauge,
    Counter,
    Untyped,
}

impl ValueKind {
    /// Keyword used in `# TYPE` lines.
    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Gauge => "gauge",
            ValueKind::Counter => "counter",
            ValueKind::Untyped => "untyped",
        }
    }
}

/// One observed value, immutable once built.
///
/// Label names are sanitized on construction; the map keeps them sorted.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub kind: ValueKind,
    pub value: f64,
    /// Observation time, Unix epoch milliseconds.
    pub timestamp_ms: i64,
    pub help: String,
}

impl Sample {
    /// Build a sample, sanitizing label names.
    pub fn new<I, K, V>(
        name: impl Into<String>,
        labels: I,
        kind: ValueKind,
        value: f64,
        timestamp_ms: i64,
        help: impl Into<String>,
    ) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            name: name.into(),
            labels: sanitize_labels(labels),
            kind,
            value,
            timestamp_ms,
            help: help.into(),
        }
    }

    pub fn label_names(&self) -> Vec<String> {
        self.labels.keys().cloned().collect()
    }
}

/// Wall-clock time as Unix epoch milliseconds (0 for pre-epoch clocks).
pub fn unix_millis(t: SystemTime) -> i64 {
    t.duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
