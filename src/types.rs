//! Core types for BetterRest
//!
//! This module defines the values that flow through an estimate: the three
//! user inputs, the recommended bedtime, and the JSON report built from them.

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EstimationError;

/// Upper bound of the desired sleep amount (hours)
pub const MAX_SLEEP_HOURS: f64 = 24.0;

/// Stepper increment for the desired sleep amount (hours)
pub const SLEEP_STEP_HOURS: f64 = 0.25;

/// Upper bound of the daily coffee intake (cups)
pub const MAX_COFFEE_CUPS: u32 = 20;

/// Time of day the user wants to wake up.
///
/// Serialized as `"HH:MM"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WakeTime(NaiveTime);

impl WakeTime {
    /// Create a wake time, rejecting hours outside 0-23 and minutes outside 0-59
    pub fn new(hour: u32, minute: u32) -> Result<Self, EstimationError> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self).ok_or_else(|| {
            EstimationError::InvalidInput(format!(
                "wake time {:02}:{:02} is not a valid time of day",
                hour, minute
            ))
        })
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn minute(&self) -> u32 {
        self.0.minute()
    }

    /// Wake time as a chrono time of day (seconds are always zero)
    pub fn to_naive_time(&self) -> NaiveTime {
        self.0
    }
}

impl Default for WakeTime {
    fn default() -> Self {
        Self(NaiveTime::from_hms_opt(7, 0, 0).unwrap_or_else(|| unreachable!()))
    }
}

impl From<NaiveTime> for WakeTime {
    /// Seconds and fractions are dropped
    fn from(time: NaiveTime) -> Self {
        Self(time.with_second(0).and_then(|t| t.with_nanosecond(0)).unwrap_or(time))
    }
}

impl FromStr for WakeTime {
    type Err = EstimationError;

    /// Accepts `07:00`, `7:00`, `7:00 AM` and `7:00am`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parsed = NaiveTime::parse_from_str(trimmed, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(trimmed, "%I:%M %p"))
            .or_else(|_| NaiveTime::parse_from_str(trimmed, "%I:%M%p"))
            .map_err(|_| {
                EstimationError::InvalidInput(format!("cannot parse wake time '{}'", s))
            })?;
        Ok(Self::from(parsed))
    }
}

impl TryFrom<String> for WakeTime {
    type Error = EstimationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WakeTime> for String {
    fn from(value: WakeTime) -> Self {
        value.to_string()
    }
}

impl fmt::Display for WakeTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

/// Desired amount of sleep in hours, within [0, 24]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct SleepAmount(f64);

impl SleepAmount {
    pub fn new(hours: f64) -> Result<Self, EstimationError> {
        if !hours.is_finite() || !(0.0..=MAX_SLEEP_HOURS).contains(&hours) {
            return Err(EstimationError::InvalidInput(format!(
                "desired sleep of {} hours is outside 0-{}",
                hours, MAX_SLEEP_HOURS
            )));
        }
        Ok(Self(hours))
    }

    pub fn hours(&self) -> f64 {
        self.0
    }

    /// One stepper increment up, clamped to 24 hours
    pub fn increment(&self) -> Self {
        Self((self.0 + SLEEP_STEP_HOURS).min(MAX_SLEEP_HOURS))
    }

    /// One stepper increment down, clamped to 0 hours
    pub fn decrement(&self) -> Self {
        Self((self.0 - SLEEP_STEP_HOURS).max(0.0))
    }

    /// Stepper label, e.g. `8 hours` or `7.75 hours`
    pub fn label(&self) -> String {
        format!("{} hours", self.0)
    }
}

impl Default for SleepAmount {
    fn default() -> Self {
        Self(8.0)
    }
}

impl TryFrom<f64> for SleepAmount {
    type Error = EstimationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SleepAmount> for f64 {
    fn from(value: SleepAmount) -> Self {
        value.0
    }
}

/// Daily coffee intake in cups, within [0, 20]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct CoffeeIntake(u32);

impl CoffeeIntake {
    pub fn new(cups: u32) -> Result<Self, EstimationError> {
        if cups > MAX_COFFEE_CUPS {
            return Err(EstimationError::InvalidInput(format!(
                "coffee intake of {} cups is outside 0-{}",
                cups, MAX_COFFEE_CUPS
            )));
        }
        Ok(Self(cups))
    }

    pub fn cups(&self) -> u32 {
        self.0
    }

    pub fn increment(&self) -> Self {
        Self((self.0 + 1).min(MAX_COFFEE_CUPS))
    }

    pub fn decrement(&self) -> Self {
        Self(self.0.saturating_sub(1))
    }

    /// Stepper label, `1 cup` or `N cups`
    pub fn label(&self) -> String {
        if self.0 == 1 {
            "1 cup".to_string()
        } else {
            format!("{} cups", self.0)
        }
    }
}

impl Default for CoffeeIntake {
    fn default() -> Self {
        Self(1)
    }
}

impl TryFrom<u32> for CoffeeIntake {
    type Error = EstimationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CoffeeIntake> for u32 {
    fn from(value: CoffeeIntake) -> Self {
        value.0
    }
}

/// The three inputs of one estimate; missing fields take the form defaults
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BedtimeInputs {
    pub wake: WakeTime,
    pub sleep_hours: SleepAmount,
    pub coffee_cups: CoffeeIntake,
}

impl BedtimeInputs {
    /// Validate raw scalars into typed inputs
    pub fn new(
        wake: WakeTime,
        sleep_hours: f64,
        coffee_cups: u32,
    ) -> Result<Self, EstimationError> {
        Ok(Self {
            wake,
            sleep_hours: SleepAmount::new(sleep_hours)?,
            coffee_cups: CoffeeIntake::new(coffee_cups)?,
        })
    }
}

/// One request line as received, before domain checks.
///
/// Parsing splits malformed JSON (`Json`) from well-formed requests whose
/// values fall outside the input domains (`InvalidInput`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EstimateRequest {
    pub wake: String,
    pub sleep_hours: f64,
    pub coffee_cups: u32,
}

impl Default for EstimateRequest {
    fn default() -> Self {
        let inputs = BedtimeInputs::default();
        Self {
            wake: inputs.wake.to_string(),
            sleep_hours: inputs.sleep_hours.hours(),
            coffee_cups: inputs.coffee_cups.cups(),
        }
    }
}

impl EstimateRequest {
    /// Parse a JSON request and validate it into inputs
    pub fn parse_json(s: &str) -> Result<BedtimeInputs, EstimationError> {
        let request: Self = serde_json::from_str(s)?;
        request.validate()
    }

    pub fn validate(&self) -> Result<BedtimeInputs, EstimationError> {
        BedtimeInputs::new(self.wake.parse()?, self.sleep_hours, self.coffee_cups)
    }
}

/// How a bedtime is rendered for people
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeFormat {
    /// Short 12-hour clock, e.g. `10:47 PM`
    #[default]
    #[serde(rename = "short")]
    Short,
    /// 24-hour clock, e.g. `22:47`
    #[serde(rename = "24h")]
    Clock24h,
}

impl TimeFormat {
    pub fn render(&self, time: NaiveTime) -> String {
        match self {
            TimeFormat::Short => time.format("%-I:%M %p").to_string(),
            TimeFormat::Clock24h => time.format("%H:%M").to_string(),
        }
    }
}

/// A recommended bedtime
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bedtime {
    /// Time of day to go to bed (date discarded)
    pub time: NaiveTime,
    /// Sleep need predicted by the model (seconds)
    pub predicted_sleep_seconds: f64,
    /// Numeric wake feature presented to the model
    pub wake_feature: f64,
}

impl Bedtime {
    pub fn format(&self, format: TimeFormat) -> String {
        format.render(self.time)
    }
}

impl fmt::Display for Bedtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(TimeFormat::Short))
    }
}

/// Producer metadata attached to every report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Model metadata attached to every report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportModel {
    pub version: String,
    pub wake_encoding: String,
}

/// JSON report for one successful estimate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BedtimeReport {
    pub producer: ReportProducer,
    pub model: ReportModel,
    pub inputs: BedtimeInputs,
    pub wake_feature: f64,
    pub predicted_sleep_seconds: f64,
    /// Bedtime as `HH:MM:SS`
    pub bedtime: String,
    /// Bedtime rendered for display
    pub bedtime_display: String,
    pub computed_at_utc: String,
}

/// JSON report for a failed estimate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureReport {
    pub producer: ReportProducer,
    pub code: String,
    pub message: String,
}
