//! Grouped accumulation primitives shared by every aggregate.
//!
//! Groups remember the order in which their keys first appeared, so a stable
//! sort over the groups breaks ties by encounter order.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::borrow::Borrow;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::hash::Hash;
use tradeflow_core::{value_key, FlowCode, TradeRecord};

/// Accumulators keyed by group, in first-seen order.
#[derive(Debug, Clone)]
pub struct OrderedGroups<K, V> {
    index: HashMap<K, usize>,
    groups: Vec<(K, V)>,
}

impl<K: Eq + Hash + Clone, V: Default> OrderedGroups<K, V> {
    /// Create an empty grouping.
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
            groups: Vec::new(),
        }
    }

    /// Accumulator for `key`, created on first use.
    pub fn entry<Q>(&mut self, key: &Q) -> &mut V
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = K> + ?Sized,
    {
        let idx = match self.index.get(key) {
            Some(&idx) => idx,
            None => {
                let idx = self.groups.len();
                self.index.insert(key.to_owned(), idx);
                self.groups.push((key.to_owned(), V::default()));
                idx
            }
        };
        &mut self.groups[idx].1
    }

    /// Accumulator for `key`, if the group exists.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.get(key).map(|&idx| &self.groups[idx].1)
    }

    /// Groups in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &(K, V)> {
        self.groups.iter()
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Are there no groups?
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Consume into `(key, accumulator)` pairs in first-seen order.
    pub fn into_vec(self) -> Vec<(K, V)> {
        self.groups
    }
}

impl<K: Eq + Hash + Clone, V: Default> Default for OrderedGroups<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Export and import totals for one group.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlowTotals {
    pub exports: f64,
    pub imports: f64,
}

impl FlowTotals {
    /// Add a value to the side given by `flow`.
    #[inline]
    pub fn add(&mut self, flow: FlowCode, value: f64) {
        match flow {
            FlowCode::Export => self.exports += value,
            FlowCode::Import => self.imports += value,
        }
    }

    /// Exports minus imports.
    #[inline]
    pub fn balance(&self) -> f64 {
        self.exports - self.imports
    }

    /// Exports plus imports.
    #[inline]
    pub fn turnover(&self) -> f64 {
        self.exports + self.imports
    }
}

/// A categorical column of a trade record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Commodity,
    Country,
    Sector,
    WorldPart,
}

impl Dimension {
    /// Field name the dimension is emitted under.
    pub fn field_name(self) -> &'static str {
        match self {
            Dimension::Commodity => "commodity_name",
            Dimension::Country => "country_name",
            Dimension::Sector => "sector",
            Dimension::WorldPart => "world_part",
        }
    }

    /// The record's value in this dimension.
    pub fn of(self, record: &TradeRecord) -> &str {
        match self {
            Dimension::Commodity => &record.commodity_name,
            Dimension::Country => &record.country_name,
            Dimension::Sector => &record.sector,
            Dimension::WorldPart => &record.world_part,
        }
    }
}

/// Sum of a value per dimension member, in first-seen order.
pub fn sum_by<'a>(
    records: impl IntoIterator<Item = &'a TradeRecord>,
    dimension: Dimension,
    value: impl Fn(&TradeRecord) -> f64,
) -> OrderedGroups<String, f64> {
    let mut groups = OrderedGroups::new();
    for record in records {
        *groups.entry(dimension.of(record)) += value(record);
    }
    groups
}

/// Export/import totals per dimension member, in first-seen order.
pub fn pivot_by<'a>(
    records: impl IntoIterator<Item = &'a TradeRecord>,
    dimension: Dimension,
) -> OrderedGroups<String, FlowTotals> {
    let mut groups: OrderedGroups<String, FlowTotals> = OrderedGroups::new();
    for record in records {
        if let Some(flow) = record.flow() {
            groups.entry(dimension.of(record)).add(flow, record.primary_value);
        }
    }
    groups
}

/// Keep the `n` items with the largest key. Ties keep their input order.
pub fn top_n_by<T>(mut items: Vec<T>, n: usize, key: impl Fn(&T) -> f64) -> Vec<T> {
    items.sort_by_key(|item| Reverse(value_key(key(item))));
    items.truncate(n);
    items
}

/// Keep the `n` items with the smallest key. Ties keep their input order.
pub fn bottom_n_by<T>(mut items: Vec<T>, n: usize, key: impl Fn(&T) -> f64) -> Vec<T> {
    items.sort_by_key(|item| value_key(key(item)));
    items.truncate(n);
    items
}

/// A dimension member with one value, emitted as `{<dimension>: name, <value_field>: value}`.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedValue {
    pub dimension: Dimension,
    pub value_field: &'static str,
    pub name: String,
    pub value: f64,
}

impl Serialize for NamedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(self.dimension.field_name(), &self.name)?;
        map.serialize_entry(self.value_field, &self.value)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_keep_first_seen_order() {
        let mut groups: OrderedGroups<String, f64> = OrderedGroups::new();
        *groups.entry("b") += 1.0;
        *groups.entry("a") += 2.0;
        *groups.entry("b") += 3.0;

        let pairs = groups.into_vec();
        assert_eq!(pairs, vec![("b".to_string(), 4.0), ("a".to_string(), 2.0)]);
    }

    #[test]
    fn test_top_n_is_stable() {
        let items = vec![("a", 1.0), ("b", 5.0), ("c", 5.0), ("d", 3.0)];
        let top = top_n_by(items, 3, |(_, v)| *v);
        assert_eq!(top, vec![("b", 5.0), ("c", 5.0), ("d", 3.0)]);
    }

    #[test]
    fn test_bottom_n_is_stable() {
        let items = vec![("a", -1.0), ("b", -5.0), ("c", -5.0)];
        let bottom = bottom_n_by(items, 2, |(_, v)| *v);
        assert_eq!(bottom, vec![("b", -5.0), ("c", -5.0)]);
    }

    #[test]
    fn test_flow_totals() {
        let mut totals = FlowTotals::default();
        totals.add(FlowCode::Export, 10.0);
        totals.add(FlowCode::Import, 4.0);
        assert_eq!(totals.balance(), 6.0);
        assert_eq!(totals.turnover(), 14.0);
    }

    #[test]
    fn test_named_value_serializes_dimension_field() {
        let row = NamedValue {
            dimension: Dimension::Commodity,
            value_field: "delta",
            name: "Wood".into(),
            value: 1.5,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json, serde_json::json!({"commodity_name": "Wood", "delta": 1.5}));
    }
}
