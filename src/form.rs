//! Form session
//!
//! Holds the three inputs of a bedtime form, applies stepper bounds, and
//! notifies an explicit callback whenever a value changes. `calculate` turns
//! the current inputs into the alert shown to the user.

use std::fmt;

use crate::error::EstimationError;
use crate::estimator::BedtimeEstimator;
use crate::model::{LinearSleepModel, SleepModel};
use crate::types::{BedtimeInputs, CoffeeIntake, SleepAmount, TimeFormat, WakeTime};

/// Alert title after a successful estimate
pub const SUCCESS_TITLE: &str = "You should go in bed at...";

/// Alert title after a failed estimate
pub const FAILURE_TITLE: &str = "Error";

type ChangeCallback = Box<dyn FnMut(&BedtimeInputs) + Send>;

/// Alert presented after `calculate`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

/// One interactive form session
pub struct BedtimeForm<M: SleepModel = LinearSleepModel> {
    inputs: BedtimeInputs,
    estimator: BedtimeEstimator<M>,
    time_format: TimeFormat,
    on_change: Option<ChangeCallback>,
}

impl<M: SleepModel> fmt::Debug for BedtimeForm<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BedtimeForm")
            .field("inputs", &self.inputs)
            .field("estimator", &self.estimator)
            .field("time_format", &self.time_format)
            .field("on_change", &self.on_change.is_some())
            .finish()
    }
}

impl<M: SleepModel> BedtimeForm<M> {
    /// New form with default inputs (8 hours, 07:00, 1 cup)
    pub fn new(estimator: BedtimeEstimator<M>) -> Self {
        Self {
            inputs: BedtimeInputs::default(),
            estimator,
            time_format: TimeFormat::default(),
            on_change: None,
        }
    }

    pub fn with_time_format(mut self, time_format: TimeFormat) -> Self {
        self.time_format = time_format;
        self
    }

    /// Register a callback invoked after any input changes
    pub fn on_change<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&BedtimeInputs) + Send + 'static,
    {
        self.on_change = Some(Box::new(callback));
        self
    }

    pub fn inputs(&self) -> &BedtimeInputs {
        &self.inputs
    }

    fn update(&mut self, next: BedtimeInputs) {
        if next == self.inputs {
            return;
        }
        self.inputs = next;
        if let Some(callback) = self.on_change.as_mut() {
            callback(&self.inputs);
        }
    }

    pub fn set_wake_time(&mut self, wake: WakeTime) {
        self.update(BedtimeInputs { wake, ..self.inputs });
    }

    pub fn set_sleep_hours(&mut self, hours: f64) -> Result<(), EstimationError> {
        let sleep_hours = SleepAmount::new(hours)?;
        self.update(BedtimeInputs { sleep_hours, ..self.inputs });
        Ok(())
    }

    pub fn set_coffee_cups(&mut self, cups: u32) -> Result<(), EstimationError> {
        let coffee_cups = CoffeeIntake::new(cups)?;
        self.update(BedtimeInputs { coffee_cups, ..self.inputs });
        Ok(())
    }

    pub fn increment_sleep(&mut self) {
        let sleep_hours = self.inputs.sleep_hours.increment();
        self.update(BedtimeInputs { sleep_hours, ..self.inputs });
    }

    pub fn decrement_sleep(&mut self) {
        let sleep_hours = self.inputs.sleep_hours.decrement();
        self.update(BedtimeInputs { sleep_hours, ..self.inputs });
    }

    pub fn increment_coffee(&mut self) {
        let coffee_cups = self.inputs.coffee_cups.increment();
        self.update(BedtimeInputs { coffee_cups, ..self.inputs });
    }

    pub fn decrement_coffee(&mut self) {
        let coffee_cups = self.inputs.coffee_cups.decrement();
        self.update(BedtimeInputs { coffee_cups, ..self.inputs });
    }

    pub fn sleep_label(&self) -> String {
        self.inputs.sleep_hours.label()
    }

    pub fn coffee_label(&self) -> String {
        self.inputs.coffee_cups.label()
    }

    /// Estimate a bedtime for the current inputs and build the alert
    pub fn calculate(&self) -> Alert {
        match self.estimator.estimate_inputs(&self.inputs) {
            Ok(bedtime) => Alert {
                title: SUCCESS_TITLE.to_string(),
                message: bedtime.format(self.time_format),
            },
            Err(e) => Alert {
                title: FAILURE_TITLE.to_string(),
                message: e.user_message().to_string(),
            },
        }
    }
}
