//! Stage composition.
//!
//! A run is load → reconcile → deduplicate → aggregate → export, optionally
//! followed by growth → export (merge). Each stage is callable on its own.

use crate::exporter::{Artifact, Exporter};
use chrono::{SecondsFormat, Utc};
use std::path::PathBuf;
use tracing::info;
use tradeflow_aggregates::{AggregateSet, AggregationEngine, GrowthCalculator};
use tradeflow_core::{Config, Result, TradeRecord};
use tradeflow_ingestion::{DedupStats, Deduplicator, ReconcileReport, Reconciler, SourceLoader, SourceSet};

/// Output key of the run timestamp.
pub const GENERATED_AT: &str = "generated_at";

/// How the export stage treats an existing artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportMode {
    /// Overwrite it.
    Replace,
    /// Read it and overwrite only the keys being exported.
    Merge,
}

/// Outcome of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Rows read from the trade table.
    pub trade_rows: usize,
    /// Rows dropped during coercion.
    pub dropped_rows: usize,
    /// Records with a flow other than X or M.
    pub invalid_flow: usize,
    /// Records dropped as natural-key duplicates.
    pub duplicates: usize,
    /// Records the aggregates were derived from.
    pub records: usize,
    /// Artifact keys written by this run, in write order.
    pub keys_written: Vec<String>,
    /// Where the artifact was written.
    pub artifact_path: PathBuf,
}

/// The dashboard data pipeline.
pub struct Pipeline {
    config: Config,
    exporter: Exporter,
}

impl Pipeline {
    /// Create a pipeline for the given configuration.
    pub fn new(config: Config) -> Self {
        let exporter = Exporter::from_config(&config.output);
        Self { config, exporter }
    }

    /// Run configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Read the reference tables and the trade table.
    pub fn load(&self) -> Result<SourceSet> {
        SourceLoader::new(self.config.sources.clone())
            .strict(self.config.reconcile.strict_coercion)
            .load()
            .map_err(|e| e.in_stage("load"))
    }

    /// Type the trade rows and join them against the references.
    pub fn reconcile(&self, sources: &SourceSet) -> Result<(Vec<TradeRecord>, ReconcileReport)> {
        let mut reconciler = Reconciler::from_config(&self.config);
        let records = reconciler
            .reconcile(&sources.trade, &sources.commodities, &sources.countries)
            .map_err(|e| e.in_stage("reconcile"))?;
        Ok((records, reconciler.report().clone()))
    }

    /// Keep exports and imports, one record per natural key.
    pub fn deduplicate(&self, records: Vec<TradeRecord>) -> (Vec<TradeRecord>, DedupStats) {
        let mut dedup = Deduplicator::new();
        let records = dedup.apply(records);
        (records, dedup.stats().clone())
    }

    /// Compute the enabled aggregates, stamped with the run time.
    pub fn aggregate(&self, records: &[TradeRecord]) -> Result<AggregateSet> {
        let engine = AggregationEngine::new(self.config.aggregates.clone());
        let mut set = engine.compute(records).map_err(|e| e.in_stage("aggregate"))?;
        let generated_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        set.insert(GENERATED_AT, &generated_at)
            .map_err(|e| e.in_stage("aggregate"))?;
        Ok(set)
    }

    /// Compute the growth rankings.
    pub fn growth(&self, records: &[TradeRecord]) -> Result<AggregateSet> {
        GrowthCalculator::from_config(&self.config.aggregates)
            .compute(records)
            .into_aggregates()
            .map_err(|e| e.in_stage("growth"))
    }

    /// Write `set` to the artifact.
    pub fn export(&self, set: AggregateSet, mode: ExportMode) -> Result<Artifact> {
        let written = match mode {
            ExportMode::Replace => self.exporter.write(set),
            ExportMode::Merge => self.exporter.merge(set),
        };
        written.map_err(|e| e.in_stage("export"))
    }

    /// Full run: rewrite the artifact, then augment it with growth if enabled.
    pub fn run(&self) -> Result<RunSummary> {
        let (records, mut summary) = self.prepare()?;

        let aggregates = self.aggregate(&records)?;
        summary.keys_written.extend(aggregates.keys().map(str::to_string));
        self.export(aggregates, ExportMode::Replace)?;

        if self.config.growth.enabled {
            let growth = self.growth(&records)?;
            summary.keys_written.extend(growth.keys().map(str::to_string));
            self.export(growth, ExportMode::Merge)?;
        }

        info!(
            records = summary.records,
            keys = summary.keys_written.len(),
            path = %summary.artifact_path.display(),
            "Run complete"
        );
        Ok(summary)
    }

    /// Augmentation only: merge growth rankings into an existing artifact.
    pub fn run_growth_augmentation(&self) -> Result<RunSummary> {
        let (records, mut summary) = self.prepare()?;

        let growth = self.growth(&records)?;
        summary.keys_written.extend(growth.keys().map(str::to_string));
        self.export(growth, ExportMode::Merge)?;

        info!(
            records = summary.records,
            path = %summary.artifact_path.display(),
            "Growth augmentation complete"
        );
        Ok(summary)
    }

    fn prepare(&self) -> Result<(Vec<TradeRecord>, RunSummary)> {
        let sources = self.load()?;
        let (records, report) = self.reconcile(&sources)?;
        let (records, stats) = self.deduplicate(records);

        let summary = RunSummary {
            trade_rows: report.rows_in,
            dropped_rows: report.dropped_rows,
            invalid_flow: stats.invalid_flow,
            duplicates: stats.duplicates,
            records: records.len(),
            keys_written: Vec::new(),
            artifact_path: self.exporter.path().to_path_buf(),
        };
        Ok((records, summary))
    }
}
