//! Core data types for the tradeflow pipeline.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Calendar year.
pub type Year = i32;

/// Integer reference into a commodity or country table.
pub type Code = i64;

/// Monetary value in base currency units.
pub type Value = f64;

/// Placeholder written into categorical fields that a reference join could not resolve.
pub const SENTINEL: &str = "Unknown";

/// Scale factor from base currency units to billions.
pub const BILLION: f64 = 1_000_000_000.0;

/// Sort key for monetary values.
#[inline]
pub fn value_key(value: Value) -> OrderedFloat<f64> {
    OrderedFloat(value)
}

/// Direction of a trade transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FlowCode {
    /// Export (`X`).
    #[serde(rename = "X")]
    Export,
    /// Import (`M`).
    #[serde(rename = "M")]
    Import,
}

impl FlowCode {
    /// Parse a source flow code. Anything other than exactly `X` or `M` is rejected.
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "X" => Some(FlowCode::Export),
            "M" => Some(FlowCode::Import),
            _ => None,
        }
    }

    /// The wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            FlowCode::Export => "X",
            FlowCode::Import => "M",
        }
    }
}

/// A single untyped cell as read from a source.
///
/// Mirrors the storage classes a relational source can hand back; typing
/// happens later, during reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Cell {
    /// Coerce to an integer. Reals must be integral, text must hold a number.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Cell::Null => None,
            Cell::Integer(v) => Some(*v),
            Cell::Real(v) => integral(*v),
            Cell::Text(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(integral))
            }
        }
    }

    /// Coerce to a finite float.
    pub fn as_real(&self) -> Option<f64> {
        let v = match self {
            Cell::Null => return None,
            Cell::Integer(v) => *v as f64,
            Cell::Real(v) => *v,
            Cell::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        v.is_finite().then_some(v)
    }

    /// Coerce to non-empty text. Numbers are rendered as-is.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Null => None,
            Cell::Integer(v) => Some(v.to_string()),
            Cell::Real(v) => Some(v.to_string()),
            Cell::Text(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
        }
    }

    /// Is this cell missing?
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }
}

/// A year count as a [`Year`] offset, saturating at `Year::MAX`.
#[inline]
pub fn year_span(years: u32) -> Year {
    Year::try_from(years).unwrap_or(Year::MAX)
}

fn integral(v: f64) -> Option<i64> {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
        Some(v as i64)
    } else {
        None
    }
}

/// Commodity reference row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommodityRef {
    /// Join key.
    pub id: Code,
    /// Display name.
    pub text: String,
}

/// Country reference row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryRef {
    /// Join key.
    pub id: Code,
    /// Display name.
    pub text: String,
    /// Region the country belongs to.
    pub world_part: Option<String>,
    /// ISO alpha-3 code. Carried for schema fidelity only.
    #[serde(rename = "reporterCodeIsoAlpha3")]
    pub reporter_code_iso_alpha3: Option<String>,
    /// Economic sector, when the reference carries one.
    pub sector: Option<String>,
}

/// One row of the relational `trade` table, before any typing.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTradeRow {
    /// Position in source order (0-based).
    pub row: usize,
    pub period: Cell,
    pub partner_code: Cell,
    pub cmd_code: Cell,
    pub flow_code: Cell,
    pub primary_value: Cell,
    /// Present only when the source table has a `sector` column.
    pub sector: Option<Cell>,
}

/// The canonical reconciled trade observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub year: Year,
    #[serde(rename = "partnerCode")]
    pub partner_code: Code,
    #[serde(rename = "cmdCode")]
    pub cmd_code: Code,
    /// Raw flow code. Only `X`/`M` survive deduplication.
    #[serde(rename = "flowCode")]
    pub flow_code: String,
    #[serde(rename = "primaryValue")]
    pub primary_value: Value,
    pub commodity_name: String,
    pub country_name: String,
    pub sector: String,
    pub world_part: String,
}

/// Natural key under which observations are deduplicated.
pub type NaturalKey<'a> = (Year, Code, Code, &'a str);

impl TradeRecord {
    /// Typed flow direction, if this is an export or import.
    #[inline]
    pub fn flow(&self) -> Option<FlowCode> {
        FlowCode::parse(&self.flow_code)
    }

    /// The `(year, partnerCode, cmdCode, flowCode)` key.
    #[inline]
    pub fn natural_key(&self) -> NaturalKey<'_> {
        (self.year, self.partner_code, self.cmd_code, &self.flow_code)
    }

    /// Value scaled to billions.
    #[inline]
    pub fn value_bln(&self) -> f64 {
        self.primary_value / BILLION
    }
}
