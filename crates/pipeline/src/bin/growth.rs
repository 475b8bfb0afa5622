//! Growth augmentation: add commodity growth rankings to an existing artifact.

use anyhow::{Context, Result};
use tracing::info;
use tradeflow_pipeline::{runtime, Pipeline};

fn main() -> Result<()> {
    runtime::init_tracing();

    let config = runtime::config_from_env().context("failed to load configuration")?;
    let summary = Pipeline::new(config)
        .run_growth_augmentation()
        .context("growth augmentation failed")?;

    info!(
        records = summary.records,
        keys = ?summary.keys_written,
        path = %summary.artifact_path.display(),
        "Growth rankings merged"
    );
    Ok(())
}
