//! `sodalite.toml` configuration.
//!
//! Discovery order: an explicit `--config` path, else `sodalite.toml` in the
//! working directory, else built-in defaults. File values fill in whatever
//! the command line leaves unset; unknown fields are ignored so the file can
//! grow without breaking older binaries.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

pub const CONFIG_FILE: &str = "sodalite.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default output directory for all commands.
    pub output: Option<PathBuf>,
    pub restore: RestoreSection,
    pub log: LogSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RestoreSection {
    /// Expression search budget in seconds.
    pub timeout: Option<f64>,
    /// Worker threads for the per-material fan-out.
    pub max_workers: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// When set, logs also go to this file.
    pub file: Option<PathBuf>,
    /// Default `tracing` filter, overridden by `RUST_LOG`.
    pub filter: Option<String>,
}

/// Load the configuration, if any. A missing discovered file is fine; a
/// missing explicit file is an error.
pub fn load(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let discovered = PathBuf::from(CONFIG_FILE);
            if !discovered.is_file() {
                return Ok(Config::default());
            }
            discovered
        }
    };
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: Config = toml::from_str(&raw)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    info!(path = %path.display(), "loaded configuration");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_is_all_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.output.is_none());
        assert!(config.restore.timeout.is_none());
    }

    #[test]
    fn sections_parse_and_unknown_fields_are_ignored() {
        let config: Config = toml::from_str(
            "output = \"out\"\nfuture_knob = 3\n\n[restore]\ntimeout = 2.5\nmax_workers = 4\n\n[log]\nfilter = \"debug\"\n",
        )
        .unwrap();
        assert_eq!(config.output.as_deref(), Some(Path::new("out")));
        assert_eq!(config.restore.timeout, Some(2.5));
        assert_eq!(config.restore.max_workers, Some(4));
        assert_eq!(config.log.filter.as_deref(), Some("debug"));
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        assert!(load(Some(Path::new("/nonexistent/sodalite.toml"))).is_err());
    }
}
