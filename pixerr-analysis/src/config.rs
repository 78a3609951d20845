//! Analysis configuration.
//!
//! All fields have defaults so a JSON file only needs the values it changes:
//!
//! ```json
//! { "data_dir": "/data/procErrors", "campaign": "201703" }
//! ```

use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Paths and labels shared by every analysis of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Directory holding the `run<NNN>-<HV>-<CURRENT>.<ext>` files.
    pub data_dir: PathBuf,
    /// Root of the result cache.
    pub cache_dir: PathBuf,
    /// Run plan table.
    pub run_plan_path: PathBuf,
    /// Root for plot output.
    pub results_dir: PathBuf,
    /// Test campaign tag added to cache keys; empty for none.
    pub campaign: String,
    /// Cache version. Bump after changing how cached values are computed.
    pub cache_version: u32,
    /// Module name shown in run info legends.
    pub module_name: String,
    /// Nominal run duration in minutes, shown in run info legends.
    pub run_duration_min: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("/data/procErrors"),
            cache_dir: PathBuf::from("pickles"),
            run_plan_path: PathBuf::from("runPlans.json"),
            results_dir: PathBuf::from("Results"),
            campaign: String::new(),
            cache_version: 1,
            module_name: "M1109".to_string(),
            run_duration_min: 5,
        }
    }
}

impl AnalysisConfig {
    /// Parses a (partial) JSON configuration.
    ///
    /// # Errors
    /// Returns an error if the JSON is malformed or has wrongly typed fields.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a JSON configuration file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    #[must_use]
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    #[must_use]
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    #[must_use]
    pub fn with_run_plan_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.run_plan_path = path.into();
        self
    }

    #[must_use]
    pub fn with_results_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.results_dir = dir.into();
        self
    }

    #[must_use]
    pub fn with_campaign(mut self, campaign: impl Into<String>) -> Self {
        self.campaign = campaign.into();
        self
    }

    #[must_use]
    pub fn with_cache_version(mut self, version: u32) -> Self {
        self.cache_version = version;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            AnalysisConfig::from_json(r#"{ "data_dir": "/tmp/runs", "campaign": "201703" }"#)
                .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/runs"));
        assert_eq!(config.campaign, "201703");
        assert_eq!(config.cache_version, 1);
        assert_eq!(config.module_name, "M1109");
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        assert!(AnalysisConfig::from_json(r#"{ "cache_version": "two" }"#).is_err());
    }

    #[test]
    fn test_builders() {
        let config = AnalysisConfig::default()
            .with_cache_dir("/c")
            .with_cache_version(3);
        assert_eq!(config.cache_dir, PathBuf::from("/c"));
        assert_eq!(config.cache_version, 3);
    }
}
