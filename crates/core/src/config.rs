//! Configuration structures for the tradeflow pipeline.

use crate::error::{Error, Result};
use crate::types::{Code, SENTINEL};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Upper bound for every year-count setting.
pub const MAX_WINDOW_YEARS: u32 = 1000;

/// Main configuration for a pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Input locations.
    pub sources: SourcesConfig,
    /// Output artifact.
    pub output: OutputConfig,
    /// Reconciliation policy.
    pub reconcile: ReconcileConfig,
    /// Which aggregates to compute, and their windows.
    pub aggregates: AggregatesConfig,
    /// Growth augmentation pass.
    pub growth: GrowthConfig,
}

impl Config {
    /// Load a configuration from a JSON file. Absent fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("cannot read {}: {e}", path.display())))?;
        let config: Config = serde_json::from_str(&raw)
            .map_err(|e| Error::config(format!("cannot parse {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no aggregate can work with.
    pub fn validate(&self) -> Result<()> {
        let agg = &self.aggregates;
        if agg.top_n == 0 || agg.growth_top_n == 0 {
            return Err(Error::config("top_n and growth_top_n must be positive"));
        }
        if agg.recent_window_years == 0 || agg.structural_half_years == 0 {
            return Err(Error::config("window lengths must be positive"));
        }
        let windows = [
            ("recent_window_years", agg.recent_window_years),
            ("growth_lag_years", agg.growth_lag_years),
            ("structural_min_span_years", agg.structural_min_span_years),
            ("structural_half_years", agg.structural_half_years),
        ];
        if let Some((name, _)) = windows.iter().find(|(_, v)| *v > MAX_WINDOW_YEARS) {
            return Err(Error::config(format!(
                "{name} must not exceed {MAX_WINDOW_YEARS} years"
            )));
        }
        if agg.structural_min_span_years < agg.structural_half_years {
            return Err(Error::config(
                "structural_min_span_years must cover at least one half window",
            ));
        }
        if agg.sentinel.is_empty() {
            return Err(Error::config("sentinel must not be empty"));
        }
        Ok(())
    }
}

/// Input source locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Commodity reference CSV (`id`, `text`).
    pub commodities_csv: PathBuf,
    /// Country reference CSV (`id`, `text`, `reporterCodeIsoAlpha3`, `world_part`).
    pub countries_csv: PathBuf,
    /// SQLite database holding the `trade` table.
    pub trade_db: PathBuf,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            commodities_csv: PathBuf::from("upload/commodities.csv"),
            countries_csv: PathBuf::from("upload/countries.csv"),
            trade_db: PathBuf::from("upload/trade.db"),
        }
    }
}

/// Output artifact configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Where the dashboard artifact lives.
    pub artifact_path: PathBuf,
    /// Spaces per indentation level.
    pub indent: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            artifact_path: PathBuf::from("dashboard_data.json"),
            indent: 4,
        }
    }
}

/// Reconciliation configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Fail the whole batch on the first uncoercible row instead of dropping it.
    pub strict_coercion: bool,
}

/// A named aggregate computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateKind {
    TradeDynamics,
    TopExportCommodities,
    TopImportCommodities,
    EconomicSectors,
    TradeGeography,
    TopPartnerCountries,
    DecliningCommodities,
    DecliningPartners,
    FocusPartnerDynamics,
    DimensionLists,
}

impl AggregateKind {
    /// Every aggregate, in output order.
    pub const ALL: [AggregateKind; 10] = [
        AggregateKind::TradeDynamics,
        AggregateKind::TopExportCommodities,
        AggregateKind::TopImportCommodities,
        AggregateKind::EconomicSectors,
        AggregateKind::TradeGeography,
        AggregateKind::TopPartnerCountries,
        AggregateKind::DecliningCommodities,
        AggregateKind::DecliningPartners,
        AggregateKind::FocusPartnerDynamics,
        AggregateKind::DimensionLists,
    ];
}

/// Aggregate selection and window configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatesConfig {
    /// Aggregates to compute.
    pub enabled: BTreeSet<AggregateKind>,
    /// Length of every top-N ranking.
    pub top_n: usize,
    /// Length of the growth rankings.
    pub growth_top_n: usize,
    /// Years (inclusive of the latest) in the partner ranking window.
    pub recent_window_years: u32,
    /// Minimum year span before structural change is computed.
    pub structural_min_span_years: u32,
    /// Years in each half of the structural change comparison.
    pub structural_half_years: u32,
    /// Distance in years between the compared growth years.
    pub growth_lag_years: u32,
    /// Placeholder for unresolved categorical values.
    pub sentinel: String,
    /// Focus partner for the dedicated dynamics series.
    pub focus_partner: FocusPartnerConfig,
}

impl AggregatesConfig {
    /// Is the given aggregate selected?
    pub fn is_enabled(&self, kind: AggregateKind) -> bool {
        self.enabled.contains(&kind)
    }
}

impl Default for AggregatesConfig {
    fn default() -> Self {
        Self {
            enabled: AggregateKind::ALL.into_iter().collect(),
            top_n: 10,
            growth_top_n: 5,
            recent_window_years: 5,
            structural_min_span_years: 10,
            structural_half_years: 5,
            growth_lag_years: 2,
            sentinel: SENTINEL.to_string(),
            focus_partner: FocusPartnerConfig::default(),
        }
    }
}

/// The partner singled out for its own trade dynamics series.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FocusPartnerConfig {
    /// Output key.
    pub key: String,
    /// Partner codes that identify the partner.
    pub codes: Vec<Code>,
    /// Resolved country names that identify the partner.
    pub names: Vec<String>,
}

impl Default for FocusPartnerConfig {
    fn default() -> Self {
        Self {
            key: "russia_trade_dynamics".to_string(),
            codes: vec![643],
            names: vec![
                "Россия".to_string(),
                "Российская Федерация".to_string(),
                "Russian Federation".to_string(),
            ],
        }
    }
}

/// Growth augmentation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthConfig {
    /// Run the augmentation pass after the main pass.
    pub enabled: bool,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}
