//! Period-over-period commodity growth.
//!
//! Compares the latest year against the year `lag` years earlier. Unlike the
//! structural change aggregates, a commodity has to be present in both years
//! to be ranked at all.

use crate::engine::AggregateSet;
use crate::group::{sum_by, top_n_by, Dimension, NamedValue};
use tracing::debug;
use tradeflow_core::config::AggregatesConfig;
use tradeflow_core::{year_span, FlowCode, Result, TradeRecord, Year};

/// Output key of the export growth ranking.
pub const EXPORT_GROWTH: &str = "export_growth";
/// Output key of the import growth ranking.
pub const IMPORT_GROWTH: &str = "import_growth";

/// Growth rankings for both flow directions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GrowthSet {
    pub export_growth: Vec<NamedValue>,
    pub import_growth: Vec<NamedValue>,
}

impl GrowthSet {
    /// Convert into artifact entries.
    pub fn into_aggregates(self) -> Result<AggregateSet> {
        let mut set = AggregateSet::new();
        set.insert(EXPORT_GROWTH, &self.export_growth)?;
        set.insert(IMPORT_GROWTH, &self.import_growth)?;
        Ok(set)
    }
}

/// Ranks commodities by the change of their value (in billions) between two years.
#[derive(Debug, Clone)]
pub struct GrowthCalculator {
    lag_years: u32,
    top_n: usize,
}

impl GrowthCalculator {
    /// Create a calculator comparing the latest year with `lag_years` before it.
    pub fn new(lag_years: u32, top_n: usize) -> Self {
        Self { lag_years, top_n }
    }

    /// Create a calculator from the aggregate configuration.
    pub fn from_config(config: &AggregatesConfig) -> Self {
        Self::new(config.growth_lag_years, config.growth_top_n)
    }

    /// The compared `(base, latest)` years, if there is any data.
    pub fn years(&self, records: &[TradeRecord]) -> Option<(Year, Year)> {
        let latest = records.iter().map(|r| r.year).max()?;
        Some((latest.saturating_sub(year_span(self.lag_years)), latest))
    }

    /// Compute both rankings.
    pub fn compute(&self, records: &[TradeRecord]) -> GrowthSet {
        let Some((base, latest)) = self.years(records) else {
            return GrowthSet::default();
        };
        debug!(base, latest, "Computing commodity growth");

        GrowthSet {
            export_growth: self.rank(records, FlowCode::Export, base, latest),
            import_growth: self.rank(records, FlowCode::Import, base, latest),
        }
    }

    fn rank(&self, records: &[TradeRecord], flow: FlowCode, base: Year, latest: Year) -> Vec<NamedValue> {
        let in_year = |year: Year| {
            move |r: &&TradeRecord| r.year == year && r.flow() == Some(flow)
        };
        let now = sum_by(records.iter().filter(in_year(latest)), Dimension::Commodity, |r| r.value_bln());
        let then = sum_by(records.iter().filter(in_year(base)), Dimension::Commodity, |r| r.value_bln());

        let deltas = now
            .iter()
            .filter_map(|(name, current)| {
                then.get(name.as_str()).map(|previous| NamedValue {
                    dimension: Dimension::Commodity,
                    value_field: "delta",
                    name: name.clone(),
                    value: current - previous,
                })
            })
            .collect();
        top_n_by(deltas, self.top_n, |row| row.value)
    }
}
