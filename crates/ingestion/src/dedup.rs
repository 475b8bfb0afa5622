//! Flow filtering and natural-key deduplication.

use std::collections::HashSet;
use tracing::info;
use tradeflow_core::{Code, TradeRecord, Year};

/// Counts from one deduplication pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DedupStats {
    /// Records received.
    pub input: usize,
    /// Records dropped for a flow code other than `X`/`M`.
    pub invalid_flow: usize,
    /// Records dropped as repeats of an earlier natural key.
    pub duplicates: usize,
    /// Records kept.
    pub output: usize,
}

/// Restricts records to exports/imports and keeps one record per natural key.
#[derive(Debug, Default)]
pub struct Deduplicator {
    stats: DedupStats,
}

impl Deduplicator {
    /// Create a new deduplicator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Statistics of the last pass.
    pub fn stats(&self) -> &DedupStats {
        &self.stats
    }

    /// Filter flows, then drop every record whose `(year, partnerCode, cmdCode, flowCode)`
    /// was already seen. Input order is preserved, so the first occurrence survives.
    pub fn apply(&mut self, records: Vec<TradeRecord>) -> Vec<TradeRecord> {
        let input = records.len();
        let flows: Vec<TradeRecord> = records.into_iter().filter(|r| r.flow().is_some()).collect();
        let invalid_flow = input - flows.len();

        let mut seen: HashSet<(Year, Code, Code, String)> = HashSet::with_capacity(flows.len());
        let kept: Vec<TradeRecord> = flows
            .into_iter()
            .filter(|r| seen.insert((r.year, r.partner_code, r.cmd_code, r.flow_code.clone())))
            .collect();

        self.stats = DedupStats {
            input,
            invalid_flow,
            duplicates: input - invalid_flow - kept.len(),
            output: kept.len(),
        };
        info!(
            kept = self.stats.output,
            invalid_flow = self.stats.invalid_flow,
            duplicates = self.stats.duplicates,
            "Deduplicated trade records"
        );

        kept
    }
}
