//! Pipeline orchestration for tradeflow.
//!
//! This crate handles:
//! - Stage composition from source loading to artifact export
//! - Atomic artifact writes and growth augmentation merges
//! - Logging and configuration setup for the executables

pub mod exporter;
pub mod pipeline;
pub mod runtime;

pub use exporter::{Artifact, Exporter};
pub use pipeline::{ExportMode, Pipeline, RunSummary};
