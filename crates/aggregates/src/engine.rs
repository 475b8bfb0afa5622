//! Aggregation engine.
//!
//! Runs the configured set of named aggregates over one deduplicated record set.

use crate::dimensions::dimension_lists;
use crate::dynamics::{focus_partner_dynamics, trade_dynamics};
use crate::partners::top_partner_countries;
use crate::rankings::top_commodities;
use crate::shares::{economic_sectors, trade_geography};
use crate::structural::{declining_commodities, declining_partners};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};
use tradeflow_core::config::AggregatesConfig;
use tradeflow_core::{AggregateKind, FlowCode, Result, TradeRecord};

/// Output key of the record count.
pub const RECORD_COUNT: &str = "record_count";

/// Named aggregates, ready to be written as one artifact.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateSet {
    entries: Map<String, Value>,
}

impl AggregateSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize `value` under `key`, replacing any previous entry.
    pub fn insert<T: Serialize + ?Sized>(&mut self, key: impl Into<String>, value: &T) -> Result<()> {
        self.entries.insert(key.into(), serde_json::to_value(value)?);
        Ok(())
    }

    /// Entry under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Keys in the set.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Is the set empty?
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Move every entry of `other` into this set, overwriting on collision.
    pub fn extend(&mut self, other: AggregateSet) {
        self.entries.extend(other.entries);
    }

    /// Consume into the underlying JSON mapping.
    pub fn into_map(self) -> Map<String, Value> {
        self.entries
    }
}

/// Computes the dashboard aggregates.
pub struct AggregationEngine {
    config: AggregatesConfig,
}

impl AggregationEngine {
    /// Create a new engine from configuration.
    pub fn new(config: AggregatesConfig) -> Self {
        Self { config }
    }

    /// Compute every enabled aggregate, plus the record count.
    pub fn compute(&self, records: &[TradeRecord]) -> Result<AggregateSet> {
        let mut set = AggregateSet::new();
        for kind in AggregateKind::ALL {
            if self.config.is_enabled(kind) {
                self.compute_kind(kind, records, &mut set)?;
            }
        }
        set.insert(RECORD_COUNT, &records.len())?;

        info!(aggregates = set.len(), records = records.len(), "Aggregates computed");
        Ok(set)
    }

    /// Compute a single aggregate into `set`.
    pub fn compute_kind(&self, kind: AggregateKind, records: &[TradeRecord], set: &mut AggregateSet) -> Result<()> {
        let cfg = &self.config;
        match kind {
            AggregateKind::TradeDynamics => {
                put(set, "trade_dynamics", &trade_dynamics(records))
            }
            AggregateKind::TopExportCommodities => put(
                set,
                "top_export_commodities",
                &top_commodities(records, FlowCode::Export, cfg.top_n),
            ),
            AggregateKind::TopImportCommodities => put(
                set,
                "top_import_commodities",
                &top_commodities(records, FlowCode::Import, cfg.top_n),
            ),
            AggregateKind::EconomicSectors => {
                put(set, "economic_sectors", &economic_sectors(records))
            }
            AggregateKind::TradeGeography => {
                put(set, "trade_geography", &trade_geography(records))
            }
            AggregateKind::TopPartnerCountries => put(
                set,
                "top_partner_countries",
                &top_partner_countries(records, cfg.recent_window_years, cfg.top_n),
            ),
            AggregateKind::DecliningCommodities => put(
                set,
                "declining_commodities",
                &declining_commodities(
                    records,
                    cfg.structural_min_span_years,
                    cfg.structural_half_years,
                    cfg.top_n,
                ),
            ),
            AggregateKind::DecliningPartners => put(
                set,
                "declining_partners",
                &declining_partners(
                    records,
                    cfg.structural_min_span_years,
                    cfg.structural_half_years,
                    cfg.top_n,
                ),
            ),
            AggregateKind::FocusPartnerDynamics => put(
                set,
                &cfg.focus_partner.key,
                &focus_partner_dynamics(records, &cfg.focus_partner, cfg.recent_window_years),
            ),
            AggregateKind::DimensionLists => {
                let lists = dimension_lists(records);
                put(set, "years", &lists.years)?;
                put(set, "regions", &lists.regions)?;
                put(set, "countries", &lists.countries)?;
                put(set, "commodities", &lists.commodities)
            }
        }
    }
}

fn put<T: Serialize>(set: &mut AggregateSet, key: &str, rows: &[T]) -> Result<()> {
    debug!(key, rows = rows.len(), "Aggregate ready");
    set.insert(key, rows)
}
