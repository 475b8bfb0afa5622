//! Artifact output.
//!
//! Every write goes to a temporary file next to the artifact and is renamed
//! over it once complete, so a failed run never leaves a half-written file.
//! Nothing guards against two writers on the same path.

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;
use tradeflow_aggregates::AggregateSet;
use tradeflow_core::config::OutputConfig;
use tradeflow_core::{Error, Result};

/// The JSON document consumed by the dashboard.
pub type Artifact = Map<String, Value>;

/// Writes and augments the output artifact.
pub struct Exporter {
    path: PathBuf,
    indent: usize,
}

impl Exporter {
    /// Create an exporter for `path`.
    pub fn new(path: impl Into<PathBuf>, indent: usize) -> Self {
        Self {
            path: path.into(),
            indent,
        }
    }

    /// Create an exporter from the output configuration.
    pub fn from_config(config: &OutputConfig) -> Self {
        Self::new(config.artifact_path.clone(), config.indent)
    }

    /// Artifact location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the artifact with `set`.
    pub fn write(&self, set: AggregateSet) -> Result<Artifact> {
        let artifact = set.into_map();
        self.write_atomic(&artifact)?;
        info!(path = %self.path.display(), keys = artifact.len(), "Artifact written");
        Ok(artifact)
    }

    /// Merge `set` into the existing artifact. Keys in `set` overwrite existing ones.
    pub fn merge(&self, set: AggregateSet) -> Result<Artifact> {
        let mut artifact = self.read_existing()?;
        let added = set.len();
        artifact.extend(set.into_map());
        self.write_atomic(&artifact)?;
        info!(
            path = %self.path.display(),
            added,
            keys = artifact.len(),
            "Artifact augmented"
        );
        Ok(artifact)
    }

    /// Read the current artifact. It must exist and hold a JSON object.
    pub fn read_existing(&self) -> Result<Artifact> {
        let raw = std::fs::read_to_string(&self.path).map_err(|e| {
            Error::artifact_merge(format!("cannot read {}: {e}", self.path.display()))
        })?;
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(Error::artifact_merge(format!(
                "{} does not hold a JSON object",
                self.path.display()
            ))),
            Err(e) => Err(Error::artifact_merge(format!(
                "{} is not valid JSON: {e}",
                self.path.display()
            ))),
        }
    }

    fn write_atomic(&self, artifact: &Artifact) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let tmp = NamedTempFile::new_in(dir)?;

        let indent = vec![b' '; self.indent];
        {
            let mut writer = BufWriter::new(tmp.as_file());
            let mut ser = serde_json::Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(&indent));
            artifact.serialize(&mut ser)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }
}
