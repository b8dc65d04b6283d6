//! Feature encoding
//!
//! This module turns typed inputs into the numeric feature vector the sleep
//! model was trained on: `(wake, estimatedSleep, coffee)`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EstimationError;
use crate::types::{BedtimeInputs, WakeTime};

/// Model input names, in feature-vector order
pub const FEATURE_NAMES: [&str; 3] = ["wake", "estimatedSleep", "coffee"];

/// Convention mapping a wake time to its numeric feature.
///
/// `Legacy` scales minutes by 3600, matching the feature encoding the bundled
/// model was fitted against. `Seconds` is true seconds since midnight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WakeEncoding {
    #[default]
    Legacy,
    Seconds,
}

impl WakeEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            WakeEncoding::Legacy => "legacy",
            WakeEncoding::Seconds => "seconds",
        }
    }

    /// Encode a wake time as a model feature
    pub fn encode(&self, wake: WakeTime) -> f64 {
        let hour = f64::from(wake.hour()) * 3600.0;
        match self {
            WakeEncoding::Legacy => hour + f64::from(wake.minute()) * 3600.0,
            WakeEncoding::Seconds => hour + f64::from(wake.minute()) * 60.0,
        }
    }
}

impl fmt::Display for WakeEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WakeEncoding {
    type Err = EstimationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy" => Ok(WakeEncoding::Legacy),
            "seconds" => Ok(WakeEncoding::Seconds),
            other => Err(EstimationError::InvalidInput(format!(
                "unknown wake encoding '{}'",
                other
            ))),
        }
    }
}

/// Feature vector presented to a sleep model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepFeatures {
    pub wake: f64,
    pub estimated_sleep: f64,
    pub coffee: f64,
}

impl SleepFeatures {
    /// Build features from validated inputs
    pub fn from_inputs(inputs: &BedtimeInputs, encoding: WakeEncoding) -> Self {
        Self {
            wake: encoding.encode(inputs.wake),
            estimated_sleep: inputs.sleep_hours.hours(),
            coffee: f64::from(inputs.coffee_cups.cups()),
        }
    }

    /// Features in `FEATURE_NAMES` order
    pub fn to_array(&self) -> [f64; 3] {
        [self.wake, self.estimated_sleep, self.coffee]
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        match name {
            "wake" => Some(self.wake),
            "estimatedSleep" => Some(self.estimated_sleep),
            "coffee" => Some(self.coffee),
            _ => None,
        }
    }

    /// Reject feature vectors with NaN or infinite entries
    pub fn validate(&self) -> Result<(), EstimationError> {
        for (name, value) in FEATURE_NAMES.iter().zip(self.to_array()) {
            if !value.is_finite() {
                return Err(EstimationError::Inference(format!(
                    "feature '{}' is not finite",
                    name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CoffeeIntake, SleepAmount};

    #[test]
    fn test_legacy_encoding_scales_minutes_by_hour() {
        let wake = WakeTime::new(7, 30).unwrap();
        assert_eq!(WakeEncoding::Legacy.encode(wake), 7.0 * 3600.0 + 30.0 * 3600.0);
    }

    #[test]
    fn test_seconds_encoding() {
        let wake = WakeTime::new(7, 30).unwrap();
        assert_eq!(WakeEncoding::Seconds.encode(wake), 27_000.0);
    }

    #[test]
    fn test_encodings_agree_on_the_hour() {
        let wake = WakeTime::new(7, 0).unwrap();
        assert_eq!(
            WakeEncoding::Legacy.encode(wake),
            WakeEncoding::Seconds.encode(wake)
        );
    }

    #[test]
    fn test_from_inputs() {
        let inputs = BedtimeInputs {
            wake: WakeTime::new(6, 0).unwrap(),
            sleep_hours: SleepAmount::new(7.25).unwrap(),
            coffee_cups: CoffeeIntake::new(3).unwrap(),
        };
        let features = SleepFeatures::from_inputs(&inputs, WakeEncoding::Legacy);
        assert_eq!(features.to_array(), [21_600.0, 7.25, 3.0]);
        assert_eq!(features.get("estimatedSleep"), Some(7.25));
        assert_eq!(features.get("tea"), None);
        assert!(features.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_nan() {
        let features = SleepFeatures {
            wake: 0.0,
            estimated_sleep: f64::NAN,
            coffee: 0.0,
        };
        assert!(matches!(
            features.validate(),
            Err(EstimationError::Inference(_))
        ));
    }

    #[test]
    fn test_encoding_parse() {
        assert_eq!("Seconds".parse::<WakeEncoding>().unwrap(), WakeEncoding::Seconds);
        assert!("minutes".parse::<WakeEncoding>().is_err());
    }
}
