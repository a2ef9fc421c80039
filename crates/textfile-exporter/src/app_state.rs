//! Shared application state for the textfile exporter.
//!
//! Owns the metric store and the exporter's own metrics; the HTTP handlers
//! and the scanner both borrow them from here.

use std::path::Path;
use std::sync::Arc;

use textfile_core::error::Result;
use textfile_core::MetricStore;

use crate::config::ExporterConfig;
use crate::obs::ExporterMetrics;
use crate::scan::{ExternalCommand, NoopHook, ScanSettings, Scanner, StaleFileHook};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: ExporterConfig,
    store: Arc<MetricStore>,
    metrics: ExporterMetrics,
}

impl AppState {
    /// Build application state.
    /// Returns Result so main can handle errors gracefully (no panic).
    pub fn new(cfg: ExporterConfig) -> Result<Self> {
        let store = Arc::new(MetricStore::new(cfg.store.memory_max_age()));
        let metrics = ExporterMetrics::new()?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                store,
                metrics,
            }),
        })
    }

    pub fn cfg(&self) -> &ExporterConfig {
        &self.inner.cfg
    }

    pub fn store(&self) -> Arc<MetricStore> {
        Arc::clone(&self.inner.store)
    }

    pub fn metrics(&self) -> &ExporterMetrics {
        &self.inner.metrics
    }

    /// Hook configured by `stale_files`: the external command, or a no-op
    /// when checks are disabled.
    pub fn stale_file_hook(&self) -> Arc<dyn StaleFileHook> {
        let stale = &self.inner.cfg.stale_files;
        if !stale.enabled {
            return Arc::new(NoopHook);
        }
        match ExternalCommand::from_template(&stale.command) {
            Some(cmd) => Arc::new(
                cmd.with_timeout(stale.timeout())
                    .with_log_output(stale.log_output),
            ),
            None => {
                tracing::warn!("stale_files.command is empty, stale files will only be logged");
                Arc::new(NoopHook)
            }
        }
    }

    /// Scanner wired to this state's store and metrics.
    pub fn scanner(&self, hook: Arc<dyn StaleFileHook>) -> Scanner {
        Scanner::new(
            ScanSettings::from_config(&self.inner.cfg),
            self.store(),
            hook,
            self.inner.metrics.clone(),
        )
    }

    /// Log every effective setting once at startup.
    pub fn log_settings(&self) {
        let cfg = &self.inner.cfg;
        tracing::info!(
            listen = %cfg.web.listen,
            path = %Path::new(&cfg.scan.path).display(),
            interval_secs = cfg.scan.interval_secs,
            recursive = cfg.scan.recursive,
            suffix = %cfg.scan.suffix,
            memory_max_age_secs = cfg.store.memory_max_age_secs,
            files_min_age_check = cfg.stale_files.enabled,
            files_min_age_secs = cfg.stale_files.min_age_secs,
            command = %cfg.stale_files.command,
            command_timeout_secs = cfg.stale_files.timeout_secs,
            "effective settings"
        );
    }
}
