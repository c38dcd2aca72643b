//! Monitor Configuration
//!
//! Where the schema and reference data live, and how drift is judged.
use crate::constants::DEFAULT_DRIFT_THRESHOLD;
use crate::errors::DriftWatchError;
use crate::io::JsonIO;
use crate::utils::validate_threshold;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

pub const MODEL_NAME_ENV: &str = "MODEL_NAME";
pub const MODEL_VERSION_ENV: &str = "MODEL_VERSION";

fn default_model_name() -> String {
    "example_model".to_string()
}
fn default_model_version() -> String {
    "1".to_string()
}
fn default_drift_threshold() -> f64 {
    DEFAULT_DRIFT_THRESHOLD
}

/// Configuration for a [`Monitor`](crate::monitor::Monitor).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Name of the monitored model.
    #[serde(default = "default_model_name")]
    pub model_name: String,
    /// Version of the monitored model.
    #[serde(default = "default_model_version")]
    pub model_version: String,
    /// Schema document. Defaults to `models/<model_name>/schema.json`.
    #[serde(default)]
    pub schema_path: Option<PathBuf>,
    /// Reference dataset. Defaults to `models/<model_name>/reference_data.csv`.
    #[serde(default)]
    pub reference_path: Option<PathBuf>,
    /// Previously saved reference profile. When set it is loaded instead of
    /// profiling the reference dataset.
    #[serde(default)]
    pub profile_path: Option<PathBuf>,
    /// Drift threshold, within (0, 1].
    #[serde(default = "default_drift_threshold")]
    pub drift_threshold: f64,
    /// Compare features in parallel.
    #[serde(default)]
    pub parallel: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            model_name: default_model_name(),
            model_version: default_model_version(),
            schema_path: None,
            reference_path: None,
            profile_path: None,
            drift_threshold: DEFAULT_DRIFT_THRESHOLD,
            parallel: false,
        }
    }
}

impl MonitorConfig {
    /// Replace the model name and version with `MODEL_NAME` / `MODEL_VERSION`
    /// from the environment, when set.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(name) = env::var(MODEL_NAME_ENV) {
            self.model_name = name;
        }
        if let Ok(version) = env::var(MODEL_VERSION_ENV) {
            self.model_version = version;
        }
        self
    }

    pub fn set_model(mut self, model_name: &str, model_version: &str) -> Self {
        self.model_name = model_name.to_string();
        self.model_version = model_version.to_string();
        self
    }

    pub fn set_schema_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.schema_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn set_reference_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.reference_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn set_profile_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.profile_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the drift threshold.
    /// * `drift_threshold` - Significance level for KS, divergence limit for JS.
    pub fn set_drift_threshold(mut self, drift_threshold: f64) -> Self {
        self.drift_threshold = drift_threshold;
        self
    }

    pub fn set_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    fn model_dir(&self) -> PathBuf {
        Path::new("models").join(&self.model_name)
    }

    pub fn resolved_schema_path(&self) -> PathBuf {
        self.schema_path
            .clone()
            .unwrap_or_else(|| self.model_dir().join("schema.json"))
    }

    pub fn resolved_reference_path(&self) -> PathBuf {
        self.reference_path
            .clone()
            .unwrap_or_else(|| self.model_dir().join("reference_data.csv"))
    }

    pub fn validate(&self) -> Result<(), DriftWatchError> {
        validate_threshold(self.drift_threshold)
    }
}

impl JsonIO for MonitorConfig {
    fn check(&self) -> Result<(), DriftWatchError> {
        self.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_default() {
        let config = MonitorConfig::default();
        assert_eq!(config.model_name, "example_model");
        assert_eq!(config.model_version, "1");
        assert_eq!(config.drift_threshold, 0.05);
        assert!(!config.parallel);
        assert!(config.profile_path.is_none());
        assert_eq!(
            config.resolved_schema_path(),
            Path::new("models/example_model/schema.json")
        );
        assert_eq!(
            config.resolved_reference_path(),
            Path::new("models/example_model/reference_data.csv")
        );
    }

    #[test]
    fn test_config_partial_json() {
        let json = r#"{"model_name": "churn", "schema_path": "resources/schema.json"}"#;
        let config = MonitorConfig::from_json(json).unwrap();
        assert_eq!(config.model_name, "churn");
        assert_eq!(config.model_version, "1");
        assert_eq!(config.drift_threshold, 0.05);
        assert_eq!(config.resolved_schema_path(), Path::new("resources/schema.json"));
        assert_eq!(
            config.resolved_reference_path(),
            Path::new("models/churn/reference_data.csv")
        );
    }

    #[test]
    fn test_config_io_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("monitor.json");
        let config = MonitorConfig::default()
            .set_model("churn", "7")
            .set_profile_path("models/churn/profile.json")
            .set_drift_threshold(0.01)
            .set_parallel(true);
        config.save_json(&file_path).unwrap();
        let config2 = MonitorConfig::load_json(&file_path).unwrap();
        assert_eq!(config, config2);
    }

    #[test]
    fn test_config_validate() {
        assert!(MonitorConfig::default().validate().is_ok());
        assert!(MonitorConfig::default().set_drift_threshold(1.5).validate().is_err());
        assert!(matches!(
            MonitorConfig::from_json(r#"{"drift_threshold": 0.0}"#),
            Err(DriftWatchError::InvalidParameter(..))
        ));
    }

    #[test]
    fn test_env_overrides() {
        env::set_var(MODEL_NAME_ENV, "env_model");
        env::set_var(MODEL_VERSION_ENV, "42");
        let config = MonitorConfig::default().with_env_overrides();
        env::remove_var(MODEL_NAME_ENV);
        env::remove_var(MODEL_VERSION_ENV);
        assert_eq!(config.model_name, "env_model");
        assert_eq!(config.model_version, "42");
    }
}
