//! TOML-based estimator configuration.
//!
//! ```toml
//! model_path = "/opt/better-rest/sleep_calculator.json"
//! wake_encoding = "legacy"
//! time_format = "24h"
//! ```
//!
//! Every key is optional; an empty file yields the defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::EstimationError;
use crate::features::WakeEncoding;
use crate::types::TimeFormat;

/// Estimator configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EstimatorConfig {
    /// Model artifact to load instead of the bundled one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_path: Option<PathBuf>,
    /// Wake encoding for models that do not declare one
    #[serde(default)]
    pub wake_encoding: WakeEncoding,
    #[serde(default)]
    pub time_format: TimeFormat,
}

impl EstimatorConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, EstimationError> {
        toml::from_str(s).map_err(|e| EstimationError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// A relative `model_path` is resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self, EstimationError> {
        let content = fs::read_to_string(path).map_err(|e| {
            EstimationError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_toml_str(&content)?;

        if let (Some(model_path), Some(dir)) = (&config.model_path, path.parent()) {
            if model_path.is_relative() {
                config.model_path = Some(dir.join(model_path));
            }
        }

        tracing::debug!(path = %path.display(), ?config, "loaded estimator config");
        Ok(config)
    }

    /// Apply explicit overrides on top of this configuration.
    ///
    /// `None` keeps the value from the file (or the default).
    pub fn with_overrides(
        mut self,
        model_path: Option<PathBuf>,
        wake_encoding: Option<WakeEncoding>,
        time_format: Option<TimeFormat>,
    ) -> Self {
        if let Some(model_path) = model_path {
            self.model_path = Some(model_path);
        }
        if let Some(wake_encoding) = wake_encoding {
            self.wake_encoding = wake_encoding;
        }
        if let Some(time_format) = time_format {
            self.time_format = time_format;
        }
        self
    }

    pub fn to_toml_string(&self) -> Result<String, EstimationError> {
        toml::to_string_pretty(self).map_err(|e| EstimationError::Config(e.to_string()))
    }
}
