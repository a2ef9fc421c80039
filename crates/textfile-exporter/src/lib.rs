//! textfile exporter library entry.
//!
//! This crate wires configuration, the scan cycle driver, the metric store,
//! and the HTTP endpoints into one exporter. It is consumed by the binary
//! (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod obs;
pub mod ops;
pub mod router;
pub mod scan;
