//! Aggregate computation for the tradeflow pipeline.
//!
//! This crate handles:
//! - Yearly export/import dynamics
//! - Top-N commodity and partner rankings
//! - Sector and region shares
//! - Structural change between the earliest and latest years
//! - Period-over-period commodity growth

pub mod dimensions;
pub mod dynamics;
pub mod engine;
pub mod group;
pub mod growth;
pub mod partners;
pub mod rankings;
pub mod shares;
pub mod structural;

pub use engine::{AggregateSet, AggregationEngine};
pub use growth::{GrowthCalculator, GrowthSet};
