use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

use crate::models::config_model::TrackerConfig;

pub const DEFAULT_CONFIG_FILE: &str = "watchtrack.json";

static CONFIG_CACHE: OnceLock<TrackerConfig> = OnceLock::new();

/// Reads a config file; a missing file yields the defaults.
///
/// Runs before the log subscriber is installed, so its own log lines are
/// only seen when a caller set one up earlier.
pub fn load_config(path: &Path) -> Result<TrackerConfig> {
    if !path.exists() {
        debug!("no config at {}, using defaults", path.display());
        return Ok(TrackerConfig::default());
    }
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: TrackerConfig = serde_json::from_str(&data)
        .with_context(|| format!("parsing config {}", path.display()))?;
    Ok(config)
}

pub fn init_config(path: Option<&Path>) -> Result<&'static TrackerConfig> {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
    let config = load_config(path)?;

    CONFIG_CACHE
        .set(config)
        .map_err(|_| anyhow::anyhow!("Config already initialized"))?;

    Ok(get_cached_config())
}

pub fn get_cached_config() -> &'static TrackerConfig {
    CONFIG_CACHE.get_or_init(TrackerConfig::default)
}

/// Finds an input file: as given if it exists, else in the first data
/// folder that has it.
pub fn resolve_input(name: &Path, data_dirs: &[PathBuf]) -> Result<PathBuf> {
    if name.exists() || name.is_absolute() {
        return Ok(name.to_path_buf());
    }
    data_dirs
        .iter()
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.exists())
        .with_context(|| {
            format!(
                "{} not found here or in {} data folder(s)",
                name.display(),
                data_dirs.len()
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use watchtrack::{MedianMode, TimeUnit};

    #[test]
    fn test_missing_config_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("none.json")).unwrap();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.smoothing.size, 3);
        assert_eq!(config.export.run_comment, "watchtrack");
        assert!(config.export.watch_comment.is_empty());
    }

    #[test]
    fn test_partial_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watchtrack.json");
        fs::write(
            &path,
            r#"{"data_dirs":["/data/runs"],"plot":{"time_unit":"weeks"},"smoothing":{"mode":"wrap"}}"#,
        )
        .unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.data_dirs, vec![PathBuf::from("/data/runs")]);
        assert_eq!(config.plot.time_unit, TimeUnit::Weeks);
        assert_eq!(config.smoothing.mode, MedianMode::Wrap);
        assert_eq!(config.smoothing.size, 3);
    }

    #[test]
    fn test_bad_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watchtrack.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_resolve_input() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("run.csv"), "").unwrap();
        let dirs = vec![PathBuf::from("/nonexistent"), dir.path().to_path_buf()];
        assert_eq!(
            resolve_input(Path::new("run.csv"), &dirs).unwrap(),
            dir.path().join("run.csv")
        );
        assert!(resolve_input(Path::new("other.csv"), &dirs).is_err());
    }
}
