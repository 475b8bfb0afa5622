//! Source loading: reference CSVs and the relational trade table.
//!
//! All file handles and database connections are scoped to the individual
//! `load_*` calls and released before they return.

use csv::{ReaderBuilder, StringRecord};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use tracing::{debug, info, warn};
use tradeflow_core::config::SourcesConfig;
use tradeflow_core::{Cell, CommodityRef, CountryRef, Error, RawTradeRow, Result};

/// Columns the `trade` table must expose.
pub const TRADE_COLUMNS: [&str; 5] = ["period", "partnerCode", "cmdCode", "flowCode", "primaryValue"];

/// Optional `trade` column carrying the economic sector.
pub const TRADE_SECTOR_COLUMN: &str = "sector";

/// The three typed record sets a run starts from.
#[derive(Debug, Clone, Default)]
pub struct SourceSet {
    pub commodities: Vec<CommodityRef>,
    pub countries: Vec<CountryRef>,
    pub trade: Vec<RawTradeRow>,
}

/// Result of scanning a reference file for an accidentally concatenated copy.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderRepair {
    /// Text with everything from the repeated header onward removed.
    pub text: String,
    /// Line index (0-based) of the repeated header, if one was found.
    pub repeated_at: Option<usize>,
    /// Number of lines discarded.
    pub dropped_lines: usize,
}

/// Byte order mark some exporters put in front of the first header.
const BOM: char = '\u{feff}';

/// Truncate `text` at the first exact repeat of its own header line.
///
/// Assumes the only way a header shows up again is that two files were
/// concatenated, so the repeat and everything after it are discarded. The
/// comparison is a literal match of the whole line, ignoring only the line
/// terminator. A leading byte order mark is removed first, so it neither hides
/// the repeat nor ends up in the first column name. Text without a repeat is
/// otherwise returned unchanged.
pub fn truncate_at_repeated_header(text: &str) -> HeaderRepair {
    let text = strip_bom(text);
    let mut header = None;
    let mut offset = 0;
    for (idx, line) in text.split_inclusive('\n').enumerate() {
        let content = strip_terminator(line);
        match header {
            None => header = Some(content),
            Some(h) if h == content => {
                return HeaderRepair {
                    text: text[..offset].to_string(),
                    repeated_at: Some(idx),
                    dropped_lines: text[offset..].split_inclusive('\n').count(),
                };
            }
            Some(_) => {}
        }
        offset += line.len();
    }

    HeaderRepair {
        text: text.to_string(),
        repeated_at: None,
        dropped_lines: 0,
    }
}

fn strip_bom(text: &str) -> &str {
    text.strip_prefix(BOM).unwrap_or(text)
}

fn strip_terminator(line: &str) -> &str {
    line.trim_end_matches('\n').trim_end_matches('\r')
}

/// Loader for the reference tables and the trade table.
pub struct SourceLoader {
    sources: SourcesConfig,
    /// Fail on the first reference row with an uncoercible id.
    strict: bool,
}

impl SourceLoader {
    /// Create a loader for the given source locations.
    pub fn new(sources: SourcesConfig) -> Self {
        Self {
            sources,
            strict: false,
        }
    }

    /// Treat uncoercible reference ids as fatal.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Load all three sources.
    pub fn load(&self) -> Result<SourceSet> {
        let commodities = self.load_commodities(&self.sources.commodities_csv)?;
        let countries = self.load_countries(&self.sources.countries_csv)?;
        let trade = load_trade(&self.sources.trade_db)?;

        info!(
            commodities = commodities.len(),
            countries = countries.len(),
            trade_rows = trade.len(),
            "Sources loaded"
        );

        Ok(SourceSet {
            commodities,
            countries,
            trade,
        })
    }

    /// Load the commodity reference table (`id`, `text`).
    pub fn load_commodities(&self, path: &Path) -> Result<Vec<CommodityRef>> {
        let text = read_source(path)?;
        let table = ReferenceTable::parse(path, &text)?;
        let id = table.column("id")?;
        let name = table.column("text")?;

        let mut out = Vec::with_capacity(table.rows.len());
        for (line, record) in table.rows.iter().enumerate() {
            let Some(code) = self.reference_id(path, line, field(record, id))? else {
                continue;
            };
            out.push(CommodityRef {
                id: code,
                text: field(record, name).unwrap_or_default().to_string(),
            });
        }
        Ok(out)
    }

    /// Load the country reference table, repairing a concatenated duplicate if present.
    pub fn load_countries(&self, path: &Path) -> Result<Vec<CountryRef>> {
        let raw = read_source(path)?;
        let repair = truncate_at_repeated_header(&raw);
        if let Some(line) = repair.repeated_at {
            warn!(
                path = %path.display(),
                line,
                dropped_lines = repair.dropped_lines,
                "Repeated header in country reference; discarding from repeat onward"
            );
        }

        let table = ReferenceTable::parse(path, &repair.text)?;
        let id = table.column("id")?;
        let name = table.column("text")?;
        let world_part = table.column("world_part")?;
        let iso3 = table.optional_column("reporterCodeIsoAlpha3");
        let sector = table.optional_column("sector");

        let mut out = Vec::with_capacity(table.rows.len());
        for (line, record) in table.rows.iter().enumerate() {
            let Some(code) = self.reference_id(path, line, field(record, id))? else {
                continue;
            };
            out.push(CountryRef {
                id: code,
                text: field(record, name).unwrap_or_default().to_string(),
                world_part: non_empty(field(record, world_part)),
                reporter_code_iso_alpha3: iso3.and_then(|c| non_empty(field(record, c))),
                sector: sector.and_then(|c| non_empty(field(record, c))),
            });
        }
        Ok(out)
    }

    /// Coerce a reference id, dropping (or failing on) rows that cannot be joined.
    fn reference_id(&self, path: &Path, line: usize, raw: Option<&str>) -> Result<Option<i64>> {
        let cell = raw.map_or(Cell::Null, |s| Cell::Text(s.to_string()));
        match cell.as_integer() {
            Some(code) => Ok(Some(code)),
            None if self.strict => Err(Error::row_coercion(format!(
                "{} data row {}: id {:?} is not an integer",
                path.display(),
                line + 1,
                raw.unwrap_or("")
            ))),
            None => {
                warn!(
                    path = %path.display(),
                    row = line + 1,
                    id = raw.unwrap_or(""),
                    "Dropping reference row with non-integer id"
                );
                Ok(None)
            }
        }
    }
}

/// Parsed reference CSV with its header.
struct ReferenceTable {
    source: String,
    headers: StringRecord,
    rows: Vec<StringRecord>,
}

impl ReferenceTable {
    fn parse(path: &Path, text: &str) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .from_reader(text.as_bytes());
        let source = path.display().to_string();
        let headers = reader
            .headers()
            .map_err(|e| Error::source_unavailable(format!("{source}: {e}")))?
            .clone();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| Error::source_unavailable(format!("{source}: {e}")))?;
            rows.push(record);
        }
        debug!(path = %source, rows = rows.len(), "Reference table parsed");

        Ok(Self {
            source,
            headers,
            rows,
        })
    }

    fn optional_column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }

    fn column(&self, name: &str) -> Result<usize> {
        self.optional_column(name).ok_or_else(|| {
            Error::schema_mismatch(format!("{}: missing column '{name}'", self.source))
        })
    }
}

fn field(record: &StringRecord, idx: usize) -> Option<&str> {
    record.get(idx)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn read_source(path: &Path) -> Result<String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::source_unavailable(format!("{}: {e}", path.display())))?;
    Ok(match text.strip_prefix(BOM) {
        Some(rest) => rest.to_string(),
        None => text,
    })
}

/// Read every row of the `trade` table, in the order the store returns them.
pub fn load_trade(path: &Path) -> Result<Vec<RawTradeRow>> {
    if !path.exists() {
        return Err(Error::source_unavailable(format!(
            "trade database {} not found",
            path.display()
        )));
    }
    let db_err = |e: rusqlite::Error| Error::source_unavailable(format!("{}: {e}", path.display()));

    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY).map_err(db_err)?;

    let table_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type IN ('table', 'view') AND name = 'trade'",
            [],
            |row| row.get(0),
        )
        .map_err(db_err)?;
    if table_count == 0 {
        return Err(Error::source_unavailable(format!(
            "{}: table 'trade' does not exist",
            path.display()
        )));
    }

    let columns = trade_columns(&conn).map_err(db_err)?;
    for required in TRADE_COLUMNS {
        if !columns.iter().any(|c| c == required) {
            return Err(Error::schema_mismatch(format!(
                "trade table is missing column '{required}'"
            )));
        }
    }
    let has_sector = columns.iter().any(|c| c == TRADE_SECTOR_COLUMN);

    let mut select: Vec<String> = TRADE_COLUMNS.iter().map(|c| format!("\"{c}\"")).collect();
    if has_sector {
        select.push(format!("\"{TRADE_SECTOR_COLUMN}\""));
    }
    let sql = format!("SELECT {} FROM trade", select.join(", "));

    let mut stmt = conn.prepare(&sql).map_err(db_err)?;
    let mut rows = stmt.query([]).map_err(db_err)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().map_err(db_err)? {
        let get = |idx: usize| row.get_ref(idx).map(cell);
        out.push(RawTradeRow {
            row: out.len(),
            period: get(0).map_err(db_err)?,
            partner_code: get(1).map_err(db_err)?,
            cmd_code: get(2).map_err(db_err)?,
            flow_code: get(3).map_err(db_err)?,
            primary_value: get(4).map_err(db_err)?,
            sector: if has_sector {
                Some(get(5).map_err(db_err)?)
            } else {
                None
            },
        });
    }

    debug!(rows = out.len(), has_sector, "Trade table read");
    Ok(out)
}

fn trade_columns(conn: &Connection) -> rusqlite::Result<Vec<String>> {
    let stmt = conn.prepare("SELECT * FROM trade LIMIT 0")?;
    Ok(stmt.column_names().into_iter().map(str::to_string).collect())
}

fn cell(value: ValueRef<'_>) -> Cell {
    match value {
        ValueRef::Null | ValueRef::Blob(_) => Cell::Null,
        ValueRef::Integer(v) => Cell::Integer(v),
        ValueRef::Real(v) => Cell::Real(v),
        ValueRef::Text(t) => Cell::Text(String::from_utf8_lossy(t).into_owned()),
    }
}
