//! Structural change between the earliest and latest years of the data.

use crate::group::{bottom_n_by, OrderedGroups, Dimension};
use serde::ser::{Serialize, SerializeMap, Serializer};
use tradeflow_core::{year_span, TradeRecord, Year};

/// Windows compared by the structural change aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HalfWindows {
    /// Inclusive bounds of the earliest window.
    pub first: (Year, Year),
    /// Inclusive bounds of the latest window.
    pub second: (Year, Year),
}

impl HalfWindows {
    /// Windows for `records`, or `None` if the data spans fewer than `min_span` years.
    pub fn for_records(records: &[TradeRecord], min_span: u32, half: u32) -> Option<Self> {
        let min = records.iter().map(|r| r.year).min()?;
        let max = records.iter().map(|r| r.year).max()?;
        let span = i64::from(max) - i64::from(min) + 1;
        if span < i64::from(min_span) {
            return None;
        }
        let half = year_span(half.saturating_sub(1));
        Some(Self {
            first: (min, min.saturating_add(half)),
            second: (max.saturating_sub(half), max),
        })
    }
}

/// Value of one dimension member in each window.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuralChange {
    pub dimension: Dimension,
    pub name: String,
    pub first_half: f64,
    pub second_half: f64,
    /// `second_half - first_half`.
    pub change: f64,
}

impl Serialize for StructuralChange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(4))?;
        map.serialize_entry(self.dimension.field_name(), &self.name)?;
        map.serialize_entry("first_half", &self.first_half)?;
        map.serialize_entry("second_half", &self.second_half)?;
        map.serialize_entry("change", &self.change)?;
        map.end()
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Halves {
    first: f64,
    second: f64,
}

/// The `n` members of `dimension` that declined most between the two windows.
///
/// Members missing from one window count as zero there. Only members with a
/// negative change are reported, ascending by change. Empty when the data
/// spans fewer than `min_span` years.
pub fn declining(
    records: &[TradeRecord],
    dimension: Dimension,
    min_span: u32,
    half: u32,
    n: usize,
) -> Vec<StructuralChange> {
    let Some(windows) = HalfWindows::for_records(records, min_span, half) else {
        return Vec::new();
    };
    let in_window = |year: Year, (lo, hi): (Year, Year)| year >= lo && year <= hi;

    let mut groups: OrderedGroups<String, Halves> = OrderedGroups::new();
    for record in records.iter().filter(|r| in_window(r.year, windows.first)) {
        groups.entry(dimension.of(record)).first += record.primary_value;
    }
    for record in records.iter().filter(|r| in_window(r.year, windows.second)) {
        groups.entry(dimension.of(record)).second += record.primary_value;
    }

    let rows = groups
        .into_vec()
        .into_iter()
        .map(|(name, halves)| StructuralChange {
            dimension,
            name,
            first_half: halves.first,
            second_half: halves.second,
            change: halves.second - halves.first,
        })
        .filter(|row| row.change < 0.0)
        .collect();
    bottom_n_by(rows, n, |row| row.change)
}

/// `declining_commodities`.
pub fn declining_commodities(records: &[TradeRecord], min_span: u32, half: u32, n: usize) -> Vec<StructuralChange> {
    declining(records, Dimension::Commodity, min_span, half, n)
}

/// `declining_partners`.
pub fn declining_partners(records: &[TradeRecord], min_span: u32, half: u32, n: usize) -> Vec<StructuralChange> {
    declining(records, Dimension::Country, min_span, half, n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::named_record;

    #[test]
    fn test_short_span_is_empty() {
        let records: Vec<_> = (2018..=2020)
            .map(|y| named_record(y, 1, 1, "X", 100.0 - y as f64, "Wood", "Sweden"))
            .collect();
        assert!(declining_commodities(&records, 10, 5, 10).is_empty());
        assert!(declining_partners(&records, 10, 5, 10).is_empty());
    }

    #[test]
    fn test_windows_for_ten_year_span() {
        let records = vec![
            named_record(2010, 1, 1, "X", 1.0, "A", "P"),
            named_record(2019, 1, 1, "X", 1.0, "A", "P"),
        ];
        let windows = HalfWindows::for_records(&records, 10, 5).unwrap();
        assert_eq!(windows.first, (2010, 2014));
        assert_eq!(windows.second, (2015, 2019));

        let nine = vec![
            named_record(2011, 1, 1, "X", 1.0, "A", "P"),
            named_record(2019, 1, 1, "X", 1.0, "A", "P"),
        ];
        assert!(HalfWindows::for_records(&nine, 10, 5).is_none());
    }

    #[test]
    fn test_missing_half_counts_as_zero() {
        let records = vec![
            // Only in the first window: declines by its full value.
            named_record(2010, 1, 1, "X", 50.0, "Tar", "Norway"),
            // Present in both windows.
            named_record(2011, 2, 2, "M", 100.0, "Pulp", "Germany"),
            named_record(2018, 2, 2, "M", 70.0, "Pulp", "Germany"),
            // Only in the second window: grows, so not reported.
            named_record(2019, 3, 3, "X", 500.0, "Chips", "China"),
            // Between the windows.
            named_record(2015, 4, 4, "X", 1.0, "Ignored", "Ignored"),
            named_record(2020, 5, 5, "X", 10.0, "Chips", "China"),
        ];

        let commodities = declining_commodities(&records, 10, 5, 10);
        let names: Vec<&str> = commodities.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Tar", "Pulp"]);
        assert_eq!(commodities[0].change, -50.0);
        assert_eq!(commodities[0].second_half, 0.0);
        assert_eq!(commodities[1].change, -30.0);

        let partners = declining_partners(&records, 10, 5, 10);
        let names: Vec<&str> = partners.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Norway", "Germany"]);
    }

    #[test]
    fn test_sorted_ascending_and_bounded() {
        let mut records = Vec::new();
        for i in 0..15 {
            records.push(named_record(2000, i, i, "X", 10.0 * (i + 1) as f64, &format!("C{i}"), "P"));
        }
        records.push(named_record(2009, 99, 99, "X", 1.0, "Late", "P"));

        let declining = declining_commodities(&records, 10, 5, 10);
        assert_eq!(declining.len(), 10);
        assert_eq!(declining[0].name, "C14");
        assert!(declining.windows(2).all(|w| w[0].change <= w[1].change));
    }

    #[test]
    fn test_serialized_shape() {
        let row = StructuralChange {
            dimension: Dimension::Country,
            name: "Norway".into(),
            first_half: 5.0,
            second_half: 1.0,
            change: -4.0,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["country_name"], "Norway");
        assert_eq!(json["change"], -4.0);
    }
}
