//! Yearly export/import series.

use crate::group::{FlowTotals, OrderedGroups};
use serde::Serialize;
use tradeflow_core::config::FocusPartnerConfig;
use tradeflow_core::{year_span, TradeRecord, Year};

/// Export and import totals for one year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearFlows {
    pub year: Year,
    #[serde(rename = "X")]
    pub exports: f64,
    #[serde(rename = "M")]
    pub imports: f64,
    /// Always `exports - imports`.
    pub balance: f64,
}

/// Per-year totals over `records`, ascending by year.
pub fn yearly_flows<'a>(records: impl IntoIterator<Item = &'a TradeRecord>) -> Vec<YearFlows> {
    let mut groups: OrderedGroups<Year, FlowTotals> = OrderedGroups::new();
    for record in records {
        if let Some(flow) = record.flow() {
            groups.entry(&record.year).add(flow, record.primary_value);
        }
    }

    let mut series: Vec<YearFlows> = groups
        .into_vec()
        .into_iter()
        .map(|(year, totals)| YearFlows {
            year,
            exports: totals.exports,
            imports: totals.imports,
            balance: totals.balance(),
        })
        .collect();
    series.sort_by_key(|row| row.year);
    series
}

/// `trade_dynamics`: the whole record set by year.
pub fn trade_dynamics(records: &[TradeRecord]) -> Vec<YearFlows> {
    yearly_flows(records)
}

/// First year of the `window_years`-long window ending at the latest year in `records`.
pub fn window_start(records: &[TradeRecord], window_years: u32) -> Option<Year> {
    let latest = records.iter().map(|r| r.year).max()?;
    Some(latest.saturating_sub(year_span(window_years.saturating_sub(1))))
}

/// Yearly dynamics with one partner over the recent window.
///
/// A record belongs to the partner if its code or its resolved country name is
/// listed in `focus`. The window is anchored at the latest year of the whole
/// record set, not of the partner's own records.
pub fn focus_partner_dynamics(
    records: &[TradeRecord],
    focus: &FocusPartnerConfig,
    window_years: u32,
) -> Vec<YearFlows> {
    let Some(start) = window_start(records, window_years) else {
        return Vec::new();
    };

    yearly_flows(records.iter().filter(|r| {
        r.year >= start
            && (focus.codes.contains(&r.partner_code)
                || focus.names.iter().any(|n| n == &r.country_name))
    }))
}
