#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::time::Duration;

use textfile_core::error::ErrorKind;
use textfile_exporter::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
scan:
  path: "/var/lib/textfiles"
  intervall_secs: 10 # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.kind(), ErrorKind::BadConfig);
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.web.listen, "0.0.0.0:9014");
    assert_eq!(cfg.scan.path, ".");
    assert_eq!(cfg.scan.interval(), Duration::from_secs(30));
    assert_eq!(cfg.scan.suffix, ".prom");
    assert!(!cfg.scan.recursive);
    assert_eq!(cfg.store.memory_max_age(), Duration::from_secs(25 * 3600));
    assert!(cfg.stale_files.enabled);
    assert_eq!(cfg.stale_files.min_age(), Duration::from_secs(6 * 3600));
    assert_eq!(cfg.stale_files.command, "ls -l");
    assert_eq!(cfg.stale_files.timeout(), None);
}

#[test]
fn full_config_round_trips_values() {
    let ok = r#"
version: 1
web:
  listen: "127.0.0.1:19014"
scan:
  path: "/tmp/textfiles"
  interval_secs: 5
  recursive: true
  suffix: ".metrics"
store:
  memory_max_age_secs: 600
stale_files:
  enabled: true
  min_age_secs: 60
  command: "/usr/local/bin/alert --severity warn"
  log_output: true
  timeout_secs: 10
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.web.listen_addr().unwrap().port(), 19014);
    assert!(cfg.scan.recursive);
    assert_eq!(cfg.scan.suffix, ".metrics");
    assert_eq!(cfg.store.memory_max_age(), Duration::from_secs(600));
    assert_eq!(cfg.stale_files.timeout(), Some(Duration::from_secs(10)));
    assert!(cfg.stale_files.log_output);
}

#[test]
fn rejects_unsupported_version() {
    let err = config::load_from_str("version: 2\n").expect_err("must fail");
    assert_eq!(err.kind(), ErrorKind::BadConfig);
}

#[test]
fn rejects_bad_listen_address() {
    let bad = r#"
version: 1
web:
  listen: "not-an-address"
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.kind(), ErrorKind::BadConfig);
    assert!(err.to_string().contains("web.listen"));
}

#[test]
fn rejects_zero_interval() {
    let bad = r#"
version: 1
scan:
  interval_secs: 0
"#;
    assert!(config::load_from_str(bad).is_err());
}

#[test]
fn rejects_empty_command_only_when_enabled() {
    let enabled = r#"
version: 1
stale_files:
  command: "   "
"#;
    let err = config::load_from_str(enabled).expect_err("must fail");
    assert_eq!(err.kind(), ErrorKind::BadConfig);

    let disabled = r#"
version: 1
stale_files:
  enabled: false
  command: ""
"#;
    let cfg = config::load_from_str(disabled).expect("must parse");
    assert!(!cfg.stale_files.enabled);
}

#[test]
fn missing_config_file_is_bad_config() {
    let err = config::load_from_file("/definitely/not/here.yaml").expect_err("must fail");
    assert_eq!(err.kind(), ErrorKind::BadConfig);
}
