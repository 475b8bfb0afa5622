//! Process setup shared by the executables.

use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tradeflow_core::{Config, Result};

/// Environment variable naming the JSON configuration file.
pub const CONFIG_ENV: &str = "TRADEFLOW_CONFIG";

/// Install the `fmt` subscriber, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Configuration from the file named by [`CONFIG_ENV`], or defaults when unset.
pub fn config_from_env() -> Result<Config> {
    config_from(std::env::var_os(CONFIG_ENV).map(PathBuf::from))
}

fn config_from(path: Option<PathBuf>) -> Result<Config> {
    match path {
        Some(path) => {
            info!(path = %path.display(), "Loading configuration");
            Config::from_file(&path)
        }
        None => {
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
    }
}
