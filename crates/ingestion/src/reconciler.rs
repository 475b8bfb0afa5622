//! Reference joins and type coercion.
//!
//! Trade rows are left-joined against the commodity and country references;
//! anything a join cannot resolve falls back to the sentinel.

use std::collections::HashMap;
use tracing::{info, warn};
use tradeflow_core::{
    Cell, Code, CommodityRef, Config, CountryRef, Error, RawTradeRow, Result, TradeRecord, Year,
};

/// Statistics about a reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileReport {
    /// Rows read from the trade source.
    pub rows_in: usize,
    /// Records produced.
    pub rows_out: usize,
    /// Rows dropped because a field could not be coerced.
    pub dropped_rows: usize,
    /// Records whose commodity fell back to the sentinel.
    pub unresolved_commodities: usize,
    /// Records whose country fell back to the sentinel.
    pub unresolved_countries: usize,
}

impl ReconcileReport {
    /// Fraction of input rows that were dropped.
    pub fn dropped_frac(&self) -> f64 {
        if self.rows_in > 0 {
            self.dropped_rows as f64 / self.rows_in as f64
        } else {
            0.0
        }
    }
}

/// Joins raw trade rows against the reference tables.
pub struct Reconciler {
    sentinel: String,
    strict: bool,
    report: ReconcileReport,
}

impl Reconciler {
    /// Create a reconciler.
    pub fn new(sentinel: impl Into<String>, strict: bool) -> Self {
        Self {
            sentinel: sentinel.into(),
            strict,
            report: ReconcileReport::default(),
        }
    }

    /// Create a reconciler from the run configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.aggregates.sentinel.clone(),
            config.reconcile.strict_coercion,
        )
    }

    /// Statistics of the last pass.
    pub fn report(&self) -> &ReconcileReport {
        &self.report
    }

    /// Produce typed, resolved records in source order.
    ///
    /// When a reference id appears more than once, its first row wins.
    pub fn reconcile(
        &mut self,
        trade: &[RawTradeRow],
        commodities: &[CommodityRef],
        countries: &[CountryRef],
    ) -> Result<Vec<TradeRecord>> {
        let mut commodity_index: HashMap<Code, &CommodityRef> = HashMap::with_capacity(commodities.len());
        for c in commodities {
            commodity_index.entry(c.id).or_insert(c);
        }
        let mut country_index: HashMap<Code, &CountryRef> = HashMap::with_capacity(countries.len());
        for c in countries {
            country_index.entry(c.id).or_insert(c);
        }

        self.report = ReconcileReport {
            rows_in: trade.len(),
            ..Default::default()
        };
        let mut out = Vec::with_capacity(trade.len());

        for row in trade {
            let Some(typed) = self.coerce(row)? else {
                continue;
            };

            let commodity = commodity_index.get(&typed.cmd_code);
            let country = country_index.get(&typed.partner_code);
            if commodity.is_none() {
                self.report.unresolved_commodities += 1;
            }
            if country.is_none() {
                self.report.unresolved_countries += 1;
            }

            let sector = match &row.sector {
                Some(cell) => cell.as_text(),
                None => country.and_then(|c| c.sector.clone()),
            };

            out.push(TradeRecord {
                year: typed.year,
                partner_code: typed.partner_code,
                cmd_code: typed.cmd_code,
                flow_code: typed.flow_code,
                primary_value: typed.primary_value,
                commodity_name: self.or_sentinel(commodity.map(|c| c.text.as_str())),
                country_name: self.or_sentinel(country.map(|c| c.text.as_str())),
                sector: self.or_sentinel(sector.as_deref()),
                world_part: self.or_sentinel(country.and_then(|c| c.world_part.as_deref())),
            });
        }

        self.report.rows_out = out.len();
        if self.report.dropped_rows > 0 {
            warn!(
                dropped = self.report.dropped_rows,
                rows_in = self.report.rows_in,
                "Trade rows dropped during coercion"
            );
        }
        info!(
            records = self.report.rows_out,
            unresolved_commodities = self.report.unresolved_commodities,
            unresolved_countries = self.report.unresolved_countries,
            "Reconciled trade records"
        );

        Ok(out)
    }

    fn or_sentinel(&self, value: Option<&str>) -> String {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => v.to_string(),
            _ => self.sentinel.clone(),
        }
    }

    /// Type the join keys and measures of one row.
    ///
    /// Returns `Ok(None)` for a dropped row, `Err` for a failing row in strict mode.
    fn coerce(&mut self, row: &RawTradeRow) -> Result<Option<TypedRow>> {
        let year = row.period.as_integer().and_then(|y| Year::try_from(y).ok());
        let partner_code = row.partner_code.as_integer();
        let cmd_code = row.cmd_code.as_integer();
        let primary_value = row.primary_value.as_real();

        let mut failed = Vec::new();
        if year.is_none() {
            failed.push(("period", &row.period));
        }
        if partner_code.is_none() {
            failed.push(("partnerCode", &row.partner_code));
        }
        if cmd_code.is_none() {
            failed.push(("cmdCode", &row.cmd_code));
        }
        if primary_value.is_none() {
            failed.push(("primaryValue", &row.primary_value));
        }

        match (year, partner_code, cmd_code, primary_value) {
            (Some(year), Some(partner_code), Some(cmd_code), Some(primary_value)) => {
                Ok(Some(TypedRow {
                    year,
                    partner_code,
                    cmd_code,
                    flow_code: raw_flow_code(&row.flow_code),
                    primary_value,
                }))
            }
            _ => {
                let detail = describe(&failed);
                if self.strict {
                    return Err(Error::row_coercion(format!("trade row {}: {detail}", row.row)));
                }
                warn!(row = row.row, fields = %detail, "Dropping uncoercible trade row");
                self.report.dropped_rows += 1;
                Ok(None)
            }
        }
    }
}

/// Flow code as stored. Padding is kept so that only an exact `X` or `M` passes the flow filter.
fn raw_flow_code(cell: &Cell) -> String {
    match cell {
        Cell::Text(s) => s.clone(),
        other => other.as_text().unwrap_or_default(),
    }
}

struct TypedRow {
    year: Year,
    partner_code: Code,
    cmd_code: Code,
    flow_code: String,
    primary_value: f64,
}

fn describe(failed: &[(&str, &Cell)]) -> String {
    failed
        .iter()
        .map(|(name, cell)| format!("{name}={cell:?}"))
        .collect::<Vec<_>>()
        .join(", ")
}
