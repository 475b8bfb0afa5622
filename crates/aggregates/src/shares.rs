//! Categorical share breakdowns (economic sectors, trade geography).

use crate::group::{pivot_by, Dimension};
use serde::ser::{Serialize, SerializeMap, Serializer};
use tradeflow_core::TradeRecord;

/// Export/import totals of one category and its share of all categories.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryShare {
    pub dimension: Dimension,
    pub name: String,
    pub exports: f64,
    pub imports: f64,
    /// `exports / total exports`, or `0.0` when there are no exports at all.
    pub export_share: f64,
    /// `imports / total imports`, or `0.0` when there are no imports at all.
    pub import_share: f64,
}

impl Serialize for CategoryShare {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(5))?;
        map.serialize_entry(self.dimension.field_name(), &self.name)?;
        map.serialize_entry("X", &self.exports)?;
        map.serialize_entry("M", &self.imports)?;
        map.serialize_entry("export_share", &self.export_share)?;
        map.serialize_entry("import_share", &self.import_share)?;
        map.end()
    }
}

fn share(part: f64, total: f64) -> f64 {
    if total != 0.0 {
        part / total
    } else {
        0.0
    }
}

/// Totals and shares per member of `dimension`, ascending by member name.
pub fn category_shares(records: &[TradeRecord], dimension: Dimension) -> Vec<CategoryShare> {
    let groups = pivot_by(records, dimension);
    let total_exports: f64 = groups.iter().map(|(_, t)| t.exports).sum();
    let total_imports: f64 = groups.iter().map(|(_, t)| t.imports).sum();

    let mut rows: Vec<CategoryShare> = groups
        .into_vec()
        .into_iter()
        .map(|(name, totals)| CategoryShare {
            dimension,
            name,
            exports: totals.exports,
            imports: totals.imports,
            export_share: share(totals.exports, total_exports),
            import_share: share(totals.imports, total_imports),
        })
        .collect();
    rows.sort_by(|a, b| a.name.cmp(&b.name));
    rows
}

/// `economic_sectors`.
pub fn economic_sectors(records: &[TradeRecord]) -> Vec<CategoryShare> {
    category_shares(records, Dimension::Sector)
}

/// `trade_geography`.
pub fn trade_geography(records: &[TradeRecord]) -> Vec<CategoryShare> {
    category_shares(records, Dimension::WorldPart)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::categorized_record;
    use approx::assert_relative_eq;

    fn sample() -> Vec<TradeRecord> {
        vec![
            categorized_record(2020, "X", 30.0, "Industry", "Europe"),
            categorized_record(2020, "X", 10.0, "Agriculture", "Asia"),
            categorized_record(2021, "X", 60.0, "Industry", "Asia"),
            categorized_record(2020, "M", 25.0, "Energy", "Europe"),
        ]
    }

    #[test]
    fn test_export_shares_normalize() {
        let sectors = economic_sectors(&sample());
        let total: f64 = sectors.iter().map(|s| s.export_share).sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-12);

        let names: Vec<&str> = sectors.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Agriculture", "Energy", "Industry"]);

        let industry = &sectors[2];
        assert_relative_eq!(industry.exports, 90.0);
        assert_relative_eq!(industry.export_share, 0.9);
        assert_eq!(industry.imports, 0.0);
    }

    #[test]
    fn test_zero_denominator_share_is_zero() {
        let records = vec![categorized_record(2020, "X", 5.0, "Industry", "Europe")];
        let geography = trade_geography(&records);
        assert_eq!(geography.len(), 1);
        assert_eq!(geography[0].import_share, 0.0);
        assert_relative_eq!(geography[0].export_share, 1.0);
    }

    #[test]
    fn test_serialized_shape() {
        let geography = trade_geography(&sample());
        let json = serde_json::to_value(&geography[0]).unwrap();
        assert_eq!(json["world_part"], "Asia");
        assert_eq!(json["X"], 70.0);
        assert!(json.get("sector").is_none());
    }

    #[test]
    fn test_empty_input() {
        assert!(economic_sectors(&[]).is_empty());
    }
}
