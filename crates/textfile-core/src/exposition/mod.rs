//! Prometheus text exposition input.
//!
//! Snapshot files are parsed into metric families keyed by family name.
//! The parser is panic-free and all-or-nothing: a malformed line rejects the
//! whole file with its line number, so a broken producer never contributes
//! half of its samples.

pub mod text;

pub use text::parse;

/// Declared family type (`# TYPE` line); `Untyped` when undeclared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FamilyKind {
    Counter,
    Gauge,
    Untyped,
    Summary,
    Histogram,
}

impl FamilyKind {
    pub(crate) fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "counter" => Some(FamilyKind::Counter),
            "gauge" => Some(FamilyKind::Gauge),
            "untyped" => Some(FamilyKind::Untyped),
            "summary" => Some(FamilyKind::Summary),
            "histogram" => Some(FamilyKind::Histogram),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FamilyKind::Counter => "counter",
            FamilyKind::Gauge => "gauge",
            FamilyKind::Untyped => "untyped",
            FamilyKind::Summary => "summary",
            FamilyKind::Histogram => "histogram",
        }
    }
}

/// One sample line as written in the file.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSample {
    /// Sample name (may carry `_bucket`/`_sum`/`_count` for complex types).
    pub name: String,
    /// Labels in file order; names are not sanitized yet.
    pub labels: Vec<(String, String)>,
    pub value: f64,
    /// Optional timestamp, Unix epoch milliseconds.
    pub timestamp_ms: Option<i64>,
}

/// All samples sharing a family name, with their metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricFamily {
    pub name: String,
    pub kind: FamilyKind,
    pub help: String,
    pub samples: Vec<RawSample>,
}

impl MetricFamily {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: FamilyKind::Untyped,
            help: String::new(),
            samples: Vec::new(),
        }
    }
}
