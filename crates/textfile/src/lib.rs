//! Top-level facade crate for the textfile exporter.
//!
//! Re-exports the parser/store core and the exporter library so users can
//! depend on a single crate.

pub mod core {
    pub use textfile_core::*;
}

pub mod exporter {
    pub use textfile_exporter::*;
}
