//! The exporter's own metrics.
//!
//! Kept in a dedicated `prometheus::Registry` and appended after the
//! republished file metrics on every scrape.

use prometheus::proto::MetricFamily;
use prometheus::{Gauge, IntCounter, IntCounterVec, IntGauge, Opts, Registry};

use textfile_core::error::{CoreError, Result};

fn register_err(e: prometheus::Error) -> CoreError {
    CoreError::Internal(format!("metric registration failed: {e}"))
}

#[derive(Clone)]
pub struct ExporterMetrics {
    registry: Registry,
    pub scanned_files: IntGauge,
    pub last_scan_timestamp: Gauge,
    pub scan_duration: Gauge,
    pub stored_metrics: IntGauge,
    pub scan_errors: IntCounterVec,
    pub scrapes: IntCounter,
}

impl ExporterMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let scanned_files = IntGauge::new(
            "textfile_exporter_scanned_files_count",
            "Number of .prom files found in the last scan.",
        )
        .map_err(register_err)?;
        let last_scan_timestamp = Gauge::new(
            "textfile_exporter_last_scan_timestamp",
            "Unix timestamp of the last scan.",
        )
        .map_err(register_err)?;
        let scan_duration = Gauge::new(
            "textfile_exporter_scan_duration_seconds",
            "Duration of the last scan cycle.",
        )
        .map_err(register_err)?;
        let stored_metrics = IntGauge::new(
            "textfile_exporter_stored_metrics",
            "Series installed by the last scan cycle.",
        )
        .map_err(register_err)?;
        let scan_errors = IntCounterVec::new(
            Opts::new(
                "textfile_exporter_scan_errors_total",
                "Scan errors by kind (walk, stat, read, parse, command).",
            ),
            &["kind"],
        )
        .map_err(register_err)?;
        let scrapes = IntCounter::new(
            "textfile_exporter_scrapes_total",
            "Scrapes served on /metrics.",
        )
        .map_err(register_err)?;

        registry.register(Box::new(scanned_files.clone())).map_err(register_err)?;
        registry.register(Box::new(last_scan_timestamp.clone())).map_err(register_err)?;
        registry.register(Box::new(scan_duration.clone())).map_err(register_err)?;
        registry.register(Box::new(stored_metrics.clone())).map_err(register_err)?;
        registry.register(Box::new(scan_errors.clone())).map_err(register_err)?;
        registry.register(Box::new(scrapes.clone())).map_err(register_err)?;

        #[cfg(target_os = "linux")]
        registry
            .register(Box::new(prometheus::process_collector::ProcessCollector::for_self()))
            .map_err(register_err)?;

        Ok(Self {
            registry,
            scanned_files,
            last_scan_timestamp,
            scan_duration,
            stored_metrics,
            scan_errors,
            scrapes,
        })
    }

    /// Count one scan error of the given kind.
    pub fn scan_error(&self, kind: &str) {
        self.scan_errors.with_label_values(&[kind]).inc();
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }
}
