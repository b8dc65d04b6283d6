//! Report encoding
//!
//! This module encodes estimate outcomes into JSON reports carrying producer
//! and model metadata.

use crate::error::EstimationError;
use crate::features::WakeEncoding;
use crate::types::{
    Bedtime, BedtimeInputs, BedtimeReport, FailureReport, ReportModel, ReportProducer, TimeFormat,
};
use crate::{PRODUCER_NAME, REST_VERSION};
use chrono::{SecondsFormat, Utc};
use uuid::Uuid;

/// Encoder for bedtime reports
#[derive(Debug, Clone)]
pub struct ReportEncoder {
    instance_id: String,
    time_format: TimeFormat,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
            time_format: TimeFormat::default(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self {
            instance_id,
            time_format: TimeFormat::default(),
        }
    }

    pub fn with_time_format(mut self, time_format: TimeFormat) -> Self {
        self.time_format = time_format;
        self
    }

    fn producer(&self) -> ReportProducer {
        ReportProducer {
            name: PRODUCER_NAME.to_string(),
            version: REST_VERSION.to_string(),
            instance_id: self.instance_id.clone(),
        }
    }

    /// Encode a successful estimate
    pub fn encode(
        &self,
        inputs: &BedtimeInputs,
        bedtime: &Bedtime,
        model_version: &str,
        encoding: WakeEncoding,
    ) -> BedtimeReport {
        BedtimeReport {
            producer: self.producer(),
            model: ReportModel {
                version: model_version.to_string(),
                wake_encoding: encoding.as_str().to_string(),
            },
            inputs: *inputs,
            wake_feature: bedtime.wake_feature,
            predicted_sleep_seconds: bedtime.predicted_sleep_seconds,
            bedtime: bedtime.time.format("%H:%M:%S").to_string(),
            bedtime_display: bedtime.format(self.time_format),
            computed_at_utc: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    /// Encode a successful estimate to JSON
    pub fn encode_to_json(
        &self,
        inputs: &BedtimeInputs,
        bedtime: &Bedtime,
        model_version: &str,
        encoding: WakeEncoding,
    ) -> Result<String, EstimationError> {
        let report = self.encode(inputs, bedtime, model_version, encoding);
        Ok(serde_json::to_string(&report)?)
    }

    /// Encode a failed estimate. Only the generic message is exposed.
    pub fn encode_failure(&self, error: &EstimationError) -> FailureReport {
        FailureReport {
            producer: self.producer(),
            code: error.code().to_string(),
            message: error.user_message().to_string(),
        }
    }
}
