use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;
use textfile_core::error::{CoreError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExporterConfig {
    pub version: u32,

    #[serde(default)]
    pub web: WebSection,

    #[serde(default)]
    pub scan: ScanSection,

    #[serde(default)]
    pub store: StoreSection,

    #[serde(default)]
    pub stale_files: StaleFilesSection,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            version: 1,
            web: WebSection::default(),
            scan: ScanSection::default(),
            store: StoreSection::default(),
            stale_files: StaleFilesSection::default(),
        }
    }
}

impl ExporterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(CoreError::BadConfig(format!(
                "unsupported config version {}",
                self.version
            )));
        }

        self.web.validate()?;
        self.scan.validate()?;
        self.store.validate()?;
        self.stale_files.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WebSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for WebSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl WebSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr().map(|_| ())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|e| {
            CoreError::BadConfig(format!("web.listen {:?} is not a socket address: {e}", self.listen))
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScanSection {
    /// A single `.prom` file or a directory of them.
    #[serde(default = "default_path")]
    pub path: String,

    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    #[serde(default)]
    pub recursive: bool,

    #[serde(default = "default_suffix")]
    pub suffix: String,
}

impl Default for ScanSection {
    fn default() -> Self {
        Self {
            path: default_path(),
            interval_secs: default_interval_secs(),
            recursive: false,
            suffix: default_suffix(),
        }
    }
}

impl ScanSection {
    pub fn validate(&self) -> Result<()> {
        if self.path.trim().is_empty() {
            return Err(CoreError::BadConfig("scan.path must not be empty".into()));
        }
        if self.interval_secs == 0 {
            return Err(CoreError::BadConfig("scan.interval_secs must be at least 1".into()));
        }
        if self.suffix.is_empty() {
            return Err(CoreError::BadConfig("scan.suffix must not be empty".into()));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreSection {
    /// Default lifetime of a stored metric.
    #[serde(default = "default_memory_max_age_secs")]
    pub memory_max_age_secs: u64,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            memory_max_age_secs: default_memory_max_age_secs(),
        }
    }
}

impl StoreSection {
    pub fn validate(&self) -> Result<()> {
        if self.memory_max_age_secs == 0 {
            return Err(CoreError::BadConfig(
                "store.memory_max_age_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn memory_max_age(&self) -> Duration {
        Duration::from_secs(self.memory_max_age_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaleFilesSection {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_min_age_secs")]
    pub min_age_secs: u64,

    /// Command template; the stale file path is appended as last argument.
    #[serde(default = "default_command")]
    pub command: String,

    /// Log captured stdout even when debug mode is off.
    #[serde(default)]
    pub log_output: bool,

    /// 0 disables the timeout.
    #[serde(default)]
    pub timeout_secs: u64,
}

impl Default for StaleFilesSection {
    fn default() -> Self {
        Self {
            enabled: true,
            min_age_secs: default_min_age_secs(),
            command: default_command(),
            log_output: false,
            timeout_secs: 0,
        }
    }
}

impl StaleFilesSection {
    pub fn validate(&self) -> Result<()> {
        if self.enabled && self.command.split_whitespace().next().is_none() {
            return Err(CoreError::BadConfig(
                "stale_files.command must not be empty when stale_files.enabled".into(),
            ));
        }
        Ok(())
    }

    pub fn min_age(&self) -> Duration {
        Duration::from_secs(self.min_age_secs)
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

fn default_listen() -> String {
    "0.0.0.0:9014".into()
}
fn default_path() -> String {
    ".".into()
}
fn default_interval_secs() -> u64 {
    30
}
fn default_suffix() -> String {
    ".prom".into()
}
fn default_memory_max_age_secs() -> u64 {
    25 * 3600
}
fn default_true() -> bool {
    true
}
fn default_min_age_secs() -> u64 {
    6 * 3600
}
fn default_command() -> String {
    "ls -l".into()
}
