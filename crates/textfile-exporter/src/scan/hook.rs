//! Side effect for stale snapshot files.
//!
//! The hook is fire-and-forget: the scanner logs its errors and keeps
//! going, and the file is still parsed afterwards.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;

use textfile_core::error::{CoreError, Result};

/// Called once per stale file per scan cycle.
#[async_trait]
pub trait StaleFileHook: Send + Sync {
    async fn on_stale(&self, path: &Path, verbose: bool) -> Result<()>;
}

/// Hook used when no command is configured.
#[derive(Debug, Default)]
pub struct NoopHook;

#[async_trait]
impl StaleFileHook for NoopHook {
    async fn on_stale(&self, _path: &Path, _verbose: bool) -> Result<()> {
        Ok(())
    }
}

/// Runs `<program> <args...> <stale file path>`.
#[derive(Debug, Clone)]
pub struct ExternalCommand {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
    log_output: bool,
}

impl ExternalCommand {
    /// Split a template such as `"ls -l"` on whitespace. `None` when the
    /// template has no program.
    pub fn from_template(template: &str) -> Option<Self> {
        let mut parts = template.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
            timeout: None,
            log_output: false,
        })
    }

    /// Kill the command once it runs longer than `timeout`.
    /// `None` lets it run for as long as it takes.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_log_output(mut self, log_output: bool) -> Self {
        self.log_output = log_output;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Human-readable command line for logs.
    pub fn command_line(&self, path: &Path) -> String {
        let mut line = self.program.clone();
        for a in &self.args {
            line.push(' ');
            line.push_str(a);
        }
        line.push(' ');
        line.push_str(&path.display().to_string());
        line
    }
}

#[async_trait]
impl StaleFileHook for ExternalCommand {
    async fn on_stale(&self, path: &Path, verbose: bool) -> Result<()> {
        let command_line = self.command_line(path);
        tracing::info!(command = %command_line, "running stale-file command");

        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, cmd.output())
                .await
                .map_err(|_| {
                    CoreError::Command(format!("{command_line}: timed out after {limit:?}"))
                })?,
            None => cmd.output().await,
        }
        .map_err(|e| CoreError::Command(format!("{command_line}: spawn failed: {e}")))?;

        if verbose || self.log_output {
            tracing::info!(
                command = %command_line,
                stdout = %String::from_utf8_lossy(&output.stdout),
                "stale-file command output"
            );
        }

        if !output.status.success() {
            return Err(CoreError::Command(format!(
                "{command_line}: exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}
