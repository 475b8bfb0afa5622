//! Full pipeline run: rebuild the dashboard artifact from the sources.

use anyhow::{Context, Result};
use tracing::info;
use tradeflow_pipeline::{runtime, Pipeline};

fn main() -> Result<()> {
    runtime::init_tracing();

    let config = runtime::config_from_env().context("failed to load configuration")?;
    let summary = Pipeline::new(config).run().context("pipeline run failed")?;

    info!(
        trade_rows = summary.trade_rows,
        dropped_rows = summary.dropped_rows,
        duplicates = summary.duplicates,
        records = summary.records,
        keys = summary.keys_written.len(),
        "Dashboard data ready"
    );
    Ok(())
}
