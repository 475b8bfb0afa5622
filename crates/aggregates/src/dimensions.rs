//! Distinct dimension values for dashboard filters.

use crate::group::Dimension;
use std::collections::BTreeSet;
use tradeflow_core::{TradeRecord, Year};

/// Sorted distinct values of every filterable dimension.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DimensionLists {
    pub years: Vec<Year>,
    pub regions: Vec<String>,
    pub countries: Vec<String>,
    pub commodities: Vec<String>,
}

fn distinct(records: &[TradeRecord], dimension: Dimension) -> Vec<String> {
    records
        .iter()
        .map(|r| dimension.of(r))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Collect the filter lists.
pub fn dimension_lists(records: &[TradeRecord]) -> DimensionLists {
    DimensionLists {
        years: records
            .iter()
            .map(|r| r.year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect(),
        regions: distinct(records, Dimension::WorldPart),
        countries: distinct(records, Dimension::Country),
        commodities: distinct(records, Dimension::Commodity),
    }
}
