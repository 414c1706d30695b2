use crate::stats::SummaryOptions;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "notify_analytics.json";

/// Dashboard configuration, read from JSON. Every field has a default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub default_data_path: PathBuf,
    pub sample_size: usize,
    pub sample_seed: Option<u64>,
    pub top_apps: usize,
    pub top_engaging_apps: usize,
    pub top_priority_combinations: usize,
    /// Offset from UTC used when deriving the hour of day.
    pub utc_offset_minutes: i32,
    pub export_width: u32,
    pub export_height: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_data_path: PathBuf::from("notification_data.csv"),
            sample_size: 20,
            sample_seed: None,
            top_apps: 10,
            top_engaging_apps: 5,
            top_priority_combinations: 11,
            utc_offset_minutes: 0,
            export_width: 1200,
            export_height: 800,
        }
    }
}

impl AppConfig {
    /// Load from `path`, or from `notify_analytics.json` if it exists, or
    /// fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::from_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {:?}", path))?;
        let config: AppConfig =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;
        Ok(config)
    }

    /// Aggregate options from this config. Sample times stay in UTC here; the
    /// pipeline sets the offset once the cleaner has validated it.
    pub fn summary_options(&self) -> SummaryOptions {
        SummaryOptions {
            top_apps: self.top_apps,
            top_engaging_apps: self.top_engaging_apps,
            top_priority_combinations: self.top_priority_combinations,
            sample_size: self.sample_size,
            sample_seed: self.sample_seed,
            ..SummaryOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        fs::write(&path, r#"{ "sample_size": 5, "utc_offset_minutes": 120 }"#).unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.sample_size, 5);
        assert_eq!(config.utc_offset_minutes, 120);
        assert_eq!(config.top_apps, 10);
        assert_eq!(config.default_data_path, PathBuf::from("notification_data.csv"));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AppConfig::load(Some(&dir.path().join("nope.json"))).is_err());
    }

    #[test]
    fn malformed_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        fs::write(&path, "{ sample_size: ").unwrap();
        assert!(AppConfig::from_file(&path).is_err());
    }

    #[test]
    fn summary_options_mirror_config() {
        let config = AppConfig {
            top_priority_combinations: 3,
            sample_seed: Some(9),
            ..AppConfig::default()
        };
        let options = config.summary_options();
        assert_eq!(options.top_priority_combinations, 3);
        assert_eq!(options.sample_seed, Some(9));
    }
}
