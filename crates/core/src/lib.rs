//! Core types and configuration for the tradeflow pipeline.
//!
//! This crate provides shared types used across all other crates:
//! - Source and reconciled trade records
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::{AggregateKind, Config};
pub use error::{Error, Result};
pub use types::*;
