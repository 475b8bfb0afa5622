//! Main partner countries by turnover over the recent window.

use crate::dynamics::window_start;
use crate::group::{pivot_by, top_n_by, Dimension};
use serde::Serialize;
use tradeflow_core::{TradeRecord, BILLION};

/// A partner's trade over the recent window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartnerTurnover {
    pub country_name: String,
    #[serde(rename = "X")]
    pub exports: f64,
    #[serde(rename = "M")]
    pub imports: f64,
    pub balance: f64,
    pub turnover: f64,
    pub balance_bln: f64,
    pub turnover_bln: f64,
}

/// The `n` partners with the largest turnover over the last `window_years` years present.
pub fn top_partner_countries(records: &[TradeRecord], window_years: u32, n: usize) -> Vec<PartnerTurnover> {
    let Some(start) = window_start(records, window_years) else {
        return Vec::new();
    };

    let groups = pivot_by(records.iter().filter(|r| r.year >= start), Dimension::Country);
    let rows = groups
        .into_vec()
        .into_iter()
        .map(|(country_name, totals)| {
            let balance = totals.balance();
            let turnover = totals.turnover();
            PartnerTurnover {
                country_name,
                exports: totals.exports,
                imports: totals.imports,
                balance,
                turnover,
                balance_bln: balance / BILLION,
                turnover_bln: turnover / BILLION,
            }
        })
        .collect();
    top_n_by(rows, n, |row| row.turnover)
}
