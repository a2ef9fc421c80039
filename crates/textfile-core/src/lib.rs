//! textfile core: metric model, exposition parsing, series keys, and the
//! time-aware store shared by the exporter.
//!
//! This crate carries no transport or runtime dependencies. The exporter
//! crate owns scanning, HTTP, and configuration; everything here is plain
//! synchronous code that can be unit tested without a runtime.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Malformed snapshot files surface as `CoreError`/`Result` so one bad
//! producer never brings the exporter down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod exposition;
pub mod ingest;
pub mod key;
pub mod model;
pub mod store;

/// Shared result type.
pub use error::{CoreError, Result};
pub use model::{Sample, ValueKind};
pub use store::{Descriptor, Generation, MetricStore, StoredEntry};
