//! Scan cycle driver.
//!
//! One long-lived task: every interval it lists snapshot files, runs the
//! stale-file hook, parses each file into a fresh generation, and installs
//! that generation in the store in one swap. A failing file is skipped; a
//! failing directory walk skips the cycle. Neither stops the loop.

pub mod discover;
pub mod hook;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tokio::fs;
use tokio::sync::watch;

use textfile_core::error::Result;
use textfile_core::exposition;
use textfile_core::ingest::{ingest_families, IngestStats};
use textfile_core::{Generation, MetricStore};

use crate::config::ExporterConfig;
use crate::obs::ExporterMetrics;

pub use discover::{debug_marker_active, is_stale, list_files, DEBUG_MARKER};
pub use hook::{ExternalCommand, NoopHook, StaleFileHook};

/// Files logged at info level at each end of the list (all when verbose).
const LOUD_EDGE: usize = 5;

#[derive(Debug, Clone)]
pub struct ScanSettings {
    pub path: PathBuf,
    pub interval: Duration,
    pub recursive: bool,
    pub suffix: String,
    /// Minimum age that marks a file stale; `None` disables the check.
    pub stale_after: Option<Duration>,
}

impl ScanSettings {
    pub fn from_config(cfg: &ExporterConfig) -> Self {
        Self {
            path: PathBuf::from(&cfg.scan.path),
            interval: cfg.scan.interval(),
            recursive: cfg.scan.recursive,
            suffix: cfg.scan.suffix.clone(),
            stale_after: cfg.stale_files.enabled.then(|| cfg.stale_files.min_age()),
        }
    }
}

/// Outcome of one completed cycle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub files_found: usize,
    pub files_ingested: usize,
    pub stale_files: usize,
    pub samples: usize,
    pub dropped_families: usize,
    /// Series installed in the store.
    pub series: usize,
    /// Series of the previous generation absent from this one.
    pub vanished: usize,
    pub verbose: bool,
}

struct FileOutcome {
    stale: bool,
    stats: Option<IngestStats>,
}

pub struct Scanner {
    settings: ScanSettings,
    store: Arc<MetricStore>,
    hook: Arc<dyn StaleFileHook>,
    metrics: ExporterMetrics,
}

impl Scanner {
    pub fn new(
        settings: ScanSettings,
        store: Arc<MetricStore>,
        hook: Arc<dyn StaleFileHook>,
        metrics: ExporterMetrics,
    ) -> Self {
        Self {
            settings,
            store,
            hook,
            metrics,
        }
    }

    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    /// Scan until `shutdown` flips to `true` (or its sender is dropped).
    ///
    /// A failed cycle still waits a full interval before the next attempt.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            path = %self.settings.path.display(),
            interval_secs = self.settings.interval.as_secs(),
            "scanner started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            if let Err(e) = self.run_cycle().await {
                self.metrics.scan_error("walk");
                tracing::warn!(
                    path = %self.settings.path.display(),
                    error = %e,
                    kind = e.kind().as_str(),
                    "scan cycle aborted"
                );
            }

            tokio::select! {
                _ = tokio::time::sleep(self.settings.interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        tracing::info!("scanner stopped");
    }

    /// Run one scan cycle and install its generation.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let started = Instant::now();
        let cycle_start = SystemTime::now();
        let root = self.settings.path.as_path();

        let meta = fs::metadata(root).await?;
        let (files, verbose) = if meta.is_dir() {
            let files = list_files(root, &self.settings.suffix, self.settings.recursive).await?;
            (files, debug_marker_active(root, cycle_start).await)
        } else {
            (vec![root.to_path_buf()], false)
        };

        if verbose {
            tracing::info!(marker = DEBUG_MARKER, "*** DEBUG MODE ENABLED ***");
        }

        let n = files.len();
        tracing::info!(found = n, "found files");

        let mut generation = self.store.new_generation();
        let mut report = CycleReport {
            files_found: n,
            verbose,
            ..CycleReport::default()
        };

        for (i, file) in files.iter().enumerate() {
            let loud = verbose || i < LOUD_EDGE || i + LOUD_EDGE >= n;
            if loud {
                tracing::info!(file = %file.display(), n = i + 1, of = n, "processing file");
            } else {
                tracing::debug!(file = %file.display(), n = i + 1, of = n, "processing file");
            }

            let outcome = self.process_file(file, verbose, &mut generation).await;
            if outcome.stale {
                report.stale_files += 1;
            }
            if let Some(stats) = outcome.stats {
                report.files_ingested += 1;
                report.samples += stats.samples;
                report.dropped_families += stats.dropped_families;
                if loud {
                    tracing::info!(file = %file.display(), samples = stats.samples, "found data points");
                }
            }
        }

        report.series = generation.len();
        report.vanished = self.store.replace(generation);

        if verbose {
            for d in self.store.describe() {
                tracing::info!(metric = %d.name, help = %d.help, labels = ?d.label_names, "published series");
            }
        }

        let elapsed = started.elapsed();
        self.record(&report, cycle_start, elapsed);
        tracing::info!(
            files = report.files_found,
            ingested = report.files_ingested,
            stale = report.stale_files,
            series = report.series,
            vanished = report.vanished,
            elapsed_ms = elapsed.as_millis() as u64,
            "scan cycle complete"
        );

        Ok(report)
    }

    /// Stat, stale check, parse, ingest. Every failure is scoped to the file.
    async fn process_file(
        &self,
        file: &Path,
        verbose: bool,
        generation: &mut Generation,
    ) -> FileOutcome {
        let mut outcome = FileOutcome {
            stale: false,
            stats: None,
        };

        let meta = match fs::metadata(file).await {
            Ok(m) => m,
            Err(e) => {
                self.metrics.scan_error("stat");
                tracing::warn!(file = %file.display(), error = %e, "stat failed, skipping file");
                return outcome;
            }
        };

        let now = SystemTime::now();
        if let Some(min_age) = self.settings.stale_after {
            match meta.modified() {
                Ok(modified) if is_stale(modified, min_age, now) => {
                    outcome.stale = true;
                    tracing::info!(file = %file.display(), "old file");
                    if let Err(e) = self.hook.on_stale(file, verbose).await {
                        self.metrics.scan_error("command");
                        tracing::warn!(file = %file.display(), error = %e, "stale-file command failed");
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(file = %file.display(), error = %e, "no mtime, stale check skipped");
                }
            }
        }

        let text = match fs::read_to_string(file).await {
            Ok(t) => t,
            Err(e) => {
                self.metrics.scan_error("read");
                tracing::warn!(file = %file.display(), error = %e, "read failed, skipping file");
                return outcome;
            }
        };

        let families = match exposition::parse(&text) {
            Ok(f) => f,
            Err(e) => {
                self.metrics.scan_error("parse");
                tracing::warn!(file = %file.display(), error = %e, "parse failed, skipping file");
                return outcome;
            }
        };

        outcome.stats = Some(ingest_families(generation, families, SystemTime::now(), verbose));
        outcome
    }

    fn record(&self, report: &CycleReport, cycle_start: SystemTime, elapsed: Duration) {
        let ts = cycle_start
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        self.metrics.scanned_files.set(report.files_found as i64);
        self.metrics.last_scan_timestamp.set(ts);
        self.metrics.scan_duration.set(elapsed.as_secs_f64());
        self.metrics.stored_metrics.set(report.series as i64);
    }
}
