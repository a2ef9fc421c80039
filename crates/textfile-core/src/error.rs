//! Shared error type across textfile crates.

use thiserror::Error;

/// Stable error categories (used as log fields and metric labels).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed exposition text.
    Parse,
    /// Filesystem access failed.
    Io,
    /// Invalid configuration.
    BadConfig,
    /// External command failed or could not be spawned.
    Command,
    /// Internal error.
    Internal,
}

impl ErrorKind {
    /// String representation used in logs and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Parse => "parse",
            ErrorKind::Io => "io",
            ErrorKind::BadConfig => "bad_config",
            ErrorKind::Command => "command",
            ErrorKind::Internal => "internal",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Unified error type used by core and exporter.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("parse error at line {line}: {msg}")]
    Parse { line: usize, msg: String },
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("bad config: {0}")]
    BadConfig(String),
    #[error("command: {0}")]
    Command(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl CoreError {
    /// Map an error to its stable category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Parse { .. } => ErrorKind::Parse,
            CoreError::Io(_) => ErrorKind::Io,
            CoreError::BadConfig(_) => ErrorKind::BadConfig,
            CoreError::Command(_) => ErrorKind::Command,
            CoreError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn parse(line: usize, msg: impl Into<String>) -> Self {
        CoreError::Parse {
            line,
            msg: msg.into(),
        }
    }
}
