//! Glue between parsed families and a store generation.

use std::collections::BTreeMap;
use std::time::SystemTime;

use crate::exposition::{FamilyKind, MetricFamily};
use crate::model::{unix_millis, Sample, ValueKind};
use crate::store::Generation;

/// Per-file ingest counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestStats {
    /// Samples written into the generation.
    pub samples: usize,
    /// Histogram/summary families skipped whole.
    pub dropped_families: usize,
}

/// Republished kind of a family, `None` for unsupported kinds.
pub fn value_kind(kind: FamilyKind) -> Option<ValueKind> {
    match kind {
        FamilyKind::Gauge => Some(ValueKind::Gauge),
        FamilyKind::Counter => Some(ValueKind::Counter),
        FamilyKind::Untyped => Some(ValueKind::Untyped),
        FamilyKind::Summary | FamilyKind::Histogram => None,
    }
}

/// Add every supported sample of `families` to `generation`.
///
/// Entries are inserted as of `now`; samples without a positive timestamp
/// are stamped with `now`. When `verbose` is set every sample is traced.
pub fn ingest_families(
    generation: &mut Generation,
    families: BTreeMap<String, MetricFamily>,
    now: SystemTime,
    verbose: bool,
) -> IngestStats {
    let mut stats = IngestStats::default();
    let now_ms = unix_millis(now);

    for (name, family) in families {
        if verbose {
            tracing::info!(metric = %name, kind = family.kind.as_str(), help = %family.help, "family");
        }

        let Some(kind) = value_kind(family.kind) else {
            tracing::debug!(metric = %name, kind = family.kind.as_str(), "unsupported family dropped");
            stats.dropped_families += 1;
            continue;
        };

        for raw in family.samples {
            let timestamp_ms = match raw.timestamp_ms {
                Some(ts) if ts > 0 => ts,
                _ => now_ms,
            };
            if verbose {
                tracing::info!(
                    metric = %name,
                    value = raw.value,
                    timestamp_ms,
                    file_timestamp = ?raw.timestamp_ms,
                    labels = ?raw.labels,
                    "sample"
                );
            }

            let sample = Sample::new(
                name.as_str(),
                raw.labels,
                kind,
                raw.value,
                timestamp_ms,
                family.help.as_str(),
            );
            generation.insert_at(sample, None, now);
            stats.samples += 1;
        }
    }

    stats
}
