//! Observability: the exporter's own metrics and exposition rendering.
//!
//! Rendering goes through the `prometheus` crate's text encoder; this module
//! only maps store snapshots onto its metric families.

pub mod metrics;
pub mod render;

pub use metrics::ExporterMetrics;
