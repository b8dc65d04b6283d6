//! Sleep regression model
//!
//! The model is an opaque, pre-trained function from `(wake, estimatedSleep, coffee)`
//! to `actualSleep` in seconds. This module defines the `SleepModel` seam and the
//! linear regression implementation loaded from a JSON artifact.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::EstimationError;
use crate::features::{SleepFeatures, WakeEncoding, FEATURE_NAMES};

/// Artifact `format` value for linear regression models
pub const MODEL_FORMAT: &str = "linear_regression";

/// Model output name
pub const OUTPUT_NAME: &str = "actualSleep";

/// Model artifact compiled into the crate
pub const BUNDLED_MODEL_JSON: &str = include_str!("../models/sleep_calculator.json");

/// A fitted model that predicts actual sleep need in seconds.
///
/// Implementations must be pure: the same features always yield the same prediction.
pub trait SleepModel: Send + Sync + fmt::Debug {
    /// Predict `actualSleep` (seconds) for a feature vector
    fn predict(&self, features: &SleepFeatures) -> Result<f64, EstimationError>;

    /// Wake encoding the model was trained with, if it declares one
    fn wake_encoding(&self) -> Option<WakeEncoding> {
        None
    }

    /// Human-readable model version
    fn version(&self) -> &str {
        "unknown"
    }
}

/// On-disk model artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format: String,
    pub version: String,
    pub inputs: Vec<String>,
    pub output: String,
    pub intercept: f64,
    pub coefficients: HashMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wake_encoding: Option<WakeEncoding>,
}

impl ModelArtifact {
    /// Check the artifact matches the fixed input/output schema
    pub fn validate(&self) -> Result<(), EstimationError> {
        if self.format != MODEL_FORMAT {
            return Err(EstimationError::ModelUnavailable(format!(
                "unsupported model format '{}'",
                self.format
            )));
        }

        if self.inputs.len() != FEATURE_NAMES.len()
            || self.inputs.iter().zip(FEATURE_NAMES).any(|(a, b)| a != b)
        {
            return Err(EstimationError::ModelUnavailable(format!(
                "model inputs {:?} do not match {:?}",
                self.inputs, FEATURE_NAMES
            )));
        }

        if self.output != OUTPUT_NAME {
            return Err(EstimationError::ModelUnavailable(format!(
                "model output '{}' is not '{}'",
                self.output, OUTPUT_NAME
            )));
        }

        if !self.intercept.is_finite() {
            return Err(EstimationError::ModelUnavailable(
                "intercept is not finite".to_string(),
            ));
        }

        for name in FEATURE_NAMES {
            match self.coefficients.get(name) {
                Some(value) if value.is_finite() => {}
                Some(_) => {
                    return Err(EstimationError::ModelUnavailable(format!(
                        "coefficient '{}' is not finite",
                        name
                    )))
                }
                None => {
                    return Err(EstimationError::ModelUnavailable(format!(
                        "missing coefficient '{}'",
                        name
                    )))
                }
            }
        }

        Ok(())
    }
}

/// Linear regression: `intercept + Σ weight_i × feature_i`
#[derive(Debug, Clone, PartialEq)]
pub struct LinearSleepModel {
    intercept: f64,
    /// Weights in `FEATURE_NAMES` order
    weights: [f64; 3],
    wake_encoding: Option<WakeEncoding>,
    version: String,
}

impl LinearSleepModel {
    /// Build a model directly from its parameters
    pub fn new(intercept: f64, weights: [f64; 3]) -> Self {
        Self {
            intercept,
            weights,
            wake_encoding: None,
            version: "inline".to_string(),
        }
    }

    /// Declare the wake encoding this model was trained with
    pub fn with_wake_encoding(mut self, encoding: WakeEncoding) -> Self {
        self.wake_encoding = Some(encoding);
        self
    }

    pub fn from_artifact(artifact: &ModelArtifact) -> Result<Self, EstimationError> {
        artifact.validate()?;

        let mut weights = [0.0; 3];
        for (slot, name) in weights.iter_mut().zip(FEATURE_NAMES) {
            // presence checked by validate()
            *slot = artifact.coefficients.get(name).copied().unwrap_or_default();
        }

        Ok(Self {
            intercept: artifact.intercept,
            weights,
            wake_encoding: artifact.wake_encoding,
            version: artifact.version.clone(),
        })
    }

    /// Parse and validate a model artifact from JSON
    pub fn from_json(json: &str) -> Result<Self, EstimationError> {
        let artifact: ModelArtifact = serde_json::from_str(json)
            .map_err(|e| EstimationError::ModelUnavailable(format!("malformed artifact: {}", e)))?;
        Self::from_artifact(&artifact)
    }

    /// Load a model artifact from disk
    pub fn load(path: &Path) -> Result<Self, EstimationError> {
        let json = fs::read_to_string(path).map_err(|e| {
            EstimationError::ModelUnavailable(format!("cannot read {}: {}", path.display(), e))
        })?;
        let model = Self::from_json(&json)?;
        tracing::debug!(path = %path.display(), version = %model.version, "loaded sleep model");
        Ok(model)
    }

    /// The model compiled into the crate
    pub fn bundled() -> Result<Self, EstimationError> {
        Self::from_json(BUNDLED_MODEL_JSON)
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn weights(&self) -> [f64; 3] {
        self.weights
    }

    /// Export parameters back into an artifact
    pub fn to_artifact(&self) -> ModelArtifact {
        ModelArtifact {
            format: MODEL_FORMAT.to_string(),
            version: self.version.clone(),
            inputs: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            output: OUTPUT_NAME.to_string(),
            intercept: self.intercept,
            coefficients: FEATURE_NAMES
                .iter()
                .zip(self.weights)
                .map(|(name, w)| (name.to_string(), w))
                .collect(),
            wake_encoding: self.wake_encoding,
        }
    }
}

impl SleepModel for LinearSleepModel {
    fn predict(&self, features: &SleepFeatures) -> Result<f64, EstimationError> {
        features.validate()?;

        let prediction = self.intercept
            + self
                .weights
                .iter()
                .zip(features.to_array())
                .map(|(w, x)| w * x)
                .sum::<f64>();

        if !prediction.is_finite() {
            return Err(EstimationError::Inference(
                "prediction is not finite".to_string(),
            ));
        }

        Ok(prediction)
    }

    fn wake_encoding(&self) -> Option<WakeEncoding> {
        self.wake_encoding
    }

    fn version(&self) -> &str {
        &self.version
    }
}

/// JSON schema describing the model artifact format
pub fn artifact_json_schema() -> serde_json::Value {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "sleep_calculator",
        "description": "Linear regression predicting actual sleep need in seconds",
        "type": "object",
        "required": ["format", "version", "inputs", "output", "intercept", "coefficients"],
        "properties": {
            "format": { "type": "string", "const": MODEL_FORMAT },
            "version": { "type": "string" },
            "inputs": {
                "type": "array",
                "items": { "type": "string" },
                "const": FEATURE_NAMES
            },
            "output": { "type": "string", "const": OUTPUT_NAME },
            "intercept": { "type": "number" },
            "coefficients": {
                "type": "object",
                "required": FEATURE_NAMES,
                "additionalProperties": { "type": "number" }
            },
            "wake_encoding": {
                "type": "string",
                "enum": ["legacy", "seconds"]
            }
        }
    })
}
