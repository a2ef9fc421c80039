#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use tokio::sync::watch;

use textfile_core::error::{ErrorKind, Result};
use textfile_core::MetricStore;
use textfile_exporter::obs::ExporterMetrics;
use textfile_exporter::scan::{
    ExternalCommand, NoopHook, ScanSettings, Scanner, StaleFileHook, DEBUG_MARKER,
};

#[derive(Default)]
struct RecordingHook {
    seen: Mutex<Vec<PathBuf>>,
}

#[async_trait]
impl StaleFileHook for RecordingHook {
    async fn on_stale(&self, path: &Path, _verbose: bool) -> Result<()> {
        self.seen.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }
}

fn settings(path: &Path) -> ScanSettings {
    ScanSettings {
        path: path.to_path_buf(),
        interval: Duration::from_secs(3600),
        recursive: false,
        suffix: ".prom".into(),
        stale_after: None,
    }
}

fn scanner(settings: ScanSettings, hook: Arc<dyn StaleFileHook>) -> (Scanner, Arc<MetricStore>, ExporterMetrics) {
    let store = Arc::new(MetricStore::new(Duration::from_secs(3600)));
    let metrics = ExporterMetrics::new().unwrap();
    let s = Scanner::new(settings, Arc::clone(&store), hook, metrics.clone());
    (s, store, metrics)
}

#[tokio::test]
async fn same_series_in_two_files_is_stored_once() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.prom"), "up{job=\"x\"} 1\n").unwrap();
    fs::write(dir.path().join("b.prom"), "up{job=\"x\"} 1\n").unwrap();
    fs::write(dir.path().join("notes.txt"), "up{job=\"y\"} 1\n").unwrap();

    let (s, store, metrics) = scanner(settings(dir.path()), Arc::new(NoopHook));
    let report = s.run_cycle().await.unwrap();

    assert_eq!(report.files_found, 2);
    assert_eq!(report.files_ingested, 2);
    assert_eq!(report.samples, 2);
    assert_eq!(report.series, 1);
    assert_eq!(store.len(), 1);
    assert_eq!(metrics.scanned_files.get(), 2);
    assert_eq!(metrics.stored_metrics.get(), 1);
    assert!(metrics.last_scan_timestamp.get() > 0.0);
}

#[tokio::test]
async fn deleted_file_vanishes_on_next_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("batch.prom");
    fs::write(&file, "# TYPE jobs_done counter\njobs_done 7\n").unwrap();

    let (s, store, _) = scanner(settings(dir.path()), Arc::new(NoopHook));
    s.run_cycle().await.unwrap();
    let samples = store.collect();
    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].name, "jobs_done");
    assert_eq!(samples[0].value, 7.0);

    fs::remove_file(&file).unwrap();
    let report = s.run_cycle().await.unwrap();
    assert_eq!(report.files_found, 0);
    assert_eq!(report.vanished, 1);
    assert!(store.collect().is_empty());
}

#[tokio::test]
async fn stale_file_triggers_hook_and_is_still_parsed() {
    let dir = tempfile::tempdir().unwrap();
    let old = dir.path().join("old.prom");
    let fresh = dir.path().join("fresh.prom");
    fs::write(&old, "backup_ok 1\n").unwrap();
    fs::write(&fresh, "sync_ok 1\n").unwrap();

    let seven_hours_ago = SystemTime::now() - Duration::from_secs(7 * 3600);
    fs::File::options()
        .write(true)
        .open(&old)
        .unwrap()
        .set_modified(seven_hours_ago)
        .unwrap();

    let mut cfg = settings(dir.path());
    cfg.stale_after = Some(Duration::from_secs(6 * 3600));
    let hook = Arc::new(RecordingHook::default());
    let (s, store, _) = scanner(cfg, hook.clone());

    let report = s.run_cycle().await.unwrap();
    assert_eq!(report.stale_files, 1);
    assert_eq!(*hook.seen.lock().unwrap(), vec![old]);

    let mut names: Vec<String> = store.collect().into_iter().map(|s| s.name).collect();
    names.sort();
    assert_eq!(names, vec!["backup_ok", "sync_ok"]);
}

#[cfg(unix)]
#[tokio::test]
async fn stale_file_runs_configured_command_with_path_last() {
    let dir = tempfile::tempdir().unwrap();
    let tools = tempfile::tempdir().unwrap();
    let old = dir.path().join("old.prom");
    fs::write(&old, "backup_ok 1\n").unwrap();
    fs::write(dir.path().join("fresh.prom"), "sync_ok 1\n").unwrap();
    fs::File::options()
        .write(true)
        .open(&old)
        .unwrap()
        .set_modified(SystemTime::now() - Duration::from_secs(7 * 3600))
        .unwrap();

    // The stub appends one line per argument, then a separator per call.
    let calls = tools.path().join("calls.log");
    let stub = tools.path().join("record.sh");
    fs::write(
        &stub,
        format!(
            "for a in \"$@\"; do printf '%s\\n' \"$a\" >> '{log}'; done\necho --- >> '{log}'\n",
            log = calls.display()
        ),
    )
    .unwrap();

    let cmd = ExternalCommand::from_template(&format!("sh {} -x", stub.display())).unwrap();
    let mut cfg = settings(dir.path());
    cfg.stale_after = Some(Duration::from_secs(6 * 3600));
    let (s, store, metrics) = scanner(cfg, Arc::new(cmd));

    let report = s.run_cycle().await.unwrap();
    assert_eq!(report.stale_files, 1);
    assert_eq!(store.len(), 2);
    assert_eq!(metrics.scan_errors.with_label_values(&["command"]).get(), 0);

    let log = fs::read_to_string(&calls).unwrap();
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines, vec!["-x", old.to_str().unwrap(), "---"]);
}

#[tokio::test]
async fn stale_check_disabled_never_calls_hook() {
    let dir = tempfile::tempdir().unwrap();
    let old = dir.path().join("old.prom");
    fs::write(&old, "backup_ok 1\n").unwrap();
    fs::File::options()
        .write(true)
        .open(&old)
        .unwrap()
        .set_modified(SystemTime::now() - Duration::from_secs(30 * 86_400))
        .unwrap();

    let hook = Arc::new(RecordingHook::default());
    let (s, _, _) = scanner(settings(dir.path()), hook.clone());
    let report = s.run_cycle().await.unwrap();

    assert_eq!(report.stale_files, 0);
    assert!(hook.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn histogram_families_are_dropped_next_to_gauges() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("mixed.prom"),
        "# TYPE temp gauge\ntemp 21.5\n\
         # TYPE lat histogram\nlat_bucket{le=\"+Inf\"} 3\nlat_sum 1.2\nlat_count 3\n",
    )
    .unwrap();

    let (s, store, _) = scanner(settings(dir.path()), Arc::new(NoopHook));
    let report = s.run_cycle().await.unwrap();

    assert_eq!(report.dropped_families, 1);
    let samples = store.collect();
    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].name, "temp");
}

#[tokio::test]
async fn broken_file_is_skipped_alone() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("good.prom"), "up 1\n").unwrap();
    fs::write(dir.path().join("bad.prom"), "up{job=\"x\" 1\n").unwrap();

    let (s, store, metrics) = scanner(settings(dir.path()), Arc::new(NoopHook));
    let report = s.run_cycle().await.unwrap();

    assert_eq!(report.files_found, 2);
    assert_eq!(report.files_ingested, 1);
    assert_eq!(store.len(), 1);
    assert_eq!(metrics.scan_errors.with_label_values(&["parse"]).get(), 1);
}

#[tokio::test]
async fn single_file_path_is_read_regardless_of_suffix() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("node.metrics");
    fs::write(&file, "node_ok 1\n").unwrap();

    let (s, store, _) = scanner(settings(&file), Arc::new(NoopHook));
    let report = s.run_cycle().await.unwrap();

    assert_eq!(report.files_found, 1);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn debug_marker_turns_on_verbose_cycle() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.prom"), "up 1\n").unwrap();
    fs::write(dir.path().join(DEBUG_MARKER), "").unwrap();

    let (s, store, _) = scanner(settings(dir.path()), Arc::new(NoopHook));
    let report = s.run_cycle().await.unwrap();
    assert!(report.verbose);

    let described = store.describe();
    assert_eq!(described.len(), 1);
    assert_eq!(described[0].name, "up");
    assert!(described[0].label_names.is_empty());
}

#[tokio::test]
async fn missing_path_fails_cycle_and_keeps_store() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.prom"), "up 1\n").unwrap();
    let store = Arc::new(MetricStore::new(Duration::from_secs(3600)));
    let metrics = ExporterMetrics::new().unwrap();

    Scanner::new(settings(dir.path()), Arc::clone(&store), Arc::new(NoopHook), metrics.clone())
        .run_cycle()
        .await
        .unwrap();
    assert_eq!(store.len(), 1);

    let missing = Scanner::new(
        settings(&dir.path().join("gone")),
        Arc::clone(&store),
        Arc::new(NoopHook),
        metrics,
    );
    let err = missing.run_cycle().await.expect_err("must fail");
    assert_eq!(err.kind(), ErrorKind::Io);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn run_loop_stops_on_shutdown() {
    let dir = tempfile::tempdir().unwrap();
    let (s, _, metrics) = scanner(settings(&dir.path().join("gone")), Arc::new(NoopHook));
    let (tx, rx) = watch::channel(false);

    let handle = tokio::spawn(s.run(rx));
    tokio::time::sleep(Duration::from_millis(100)).await;
    tx.send(true).unwrap();

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("scanner did not stop")
        .unwrap();
    assert_eq!(metrics.scan_errors.with_label_values(&["walk"]).get(), 1);
}
