//! Data ingestion and normalization for the tradeflow pipeline.
//!
//! This crate handles:
//! - Reference CSV and trade table loading
//! - Repair of concatenated country reference files
//! - Reference joins with sentinel filling
//! - Flow filtering and natural-key deduplication

pub mod dedup;
pub mod loader;
pub mod reconciler;

pub use dedup::{DedupStats, Deduplicator};
pub use loader::{SourceLoader, SourceSet};
pub use reconciler::{ReconcileReport, Reconciler};
