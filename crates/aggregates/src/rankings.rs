//! Top-N commodity rankings by flow.

use crate::group::{sum_by, top_n_by, Dimension, NamedValue};
use tradeflow_core::{FlowCode, TradeRecord};

/// The `n` commodities with the largest total value in the given flow direction.
///
/// Emitted as `{commodity_name, primaryValue}`, descending by value.
pub fn top_commodities(records: &[TradeRecord], flow: FlowCode, n: usize) -> Vec<NamedValue> {
    let sums = sum_by(
        records.iter().filter(|r| r.flow() == Some(flow)),
        Dimension::Commodity,
        |r| r.primary_value,
    );

    let rows = sums
        .into_vec()
        .into_iter()
        .map(|(name, value)| NamedValue {
            dimension: Dimension::Commodity,
            value_field: "primaryValue",
            name,
            value,
        })
        .collect();
    top_n_by(rows, n, |row| row.value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::named_record;

    #[test]
    fn test_top_exports_sorted_and_bounded() {
        let mut records = Vec::new();
        for i in 0..15 {
            records.push(named_record(2020, i, i, "X", (i + 1) as f64, &format!("C{i}"), "P"));
        }
        records.push(named_record(2020, 99, 99, "M", 1e9, "ImportOnly", "P"));

        let top = top_commodities(&records, FlowCode::Export, 10);
        assert_eq!(top.len(), 10);
        assert_eq!(top[0].name, "C14");
        assert!(top.windows(2).all(|w| w[0].value >= w[1].value));
        assert!(top.iter().all(|r| r.name != "ImportOnly"));
    }

    #[test]
    fn test_groups_sum_and_ties_keep_encounter_order() {
        let records = vec![
            named_record(2020, 1, 1, "M", 4.0, "Oil", "P"),
            named_record(2020, 1, 2, "M", 6.0, "Gas", "P"),
            named_record(2021, 1, 1, "M", 2.0, "Oil", "P"),
            named_record(2020, 2, 3, "M", 6.0, "Coal", "P"),
        ];

        let top = top_commodities(&records, FlowCode::Import, 10);
        let names: Vec<&str> = top.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Oil", "Gas", "Coal"]);
        assert_eq!(top[0].value, 6.0);
    }

    #[test]
    fn test_empty_input() {
        assert!(top_commodities(&[], FlowCode::Export, 10).is_empty());
    }
}
