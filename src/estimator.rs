//! Bedtime estimation
//!
//! This module provides the public estimate operation. One call encodes the
//! inputs, runs a single model inference, and subtracts the predicted sleep
//! need from the wake time.

use chrono::TimeDelta;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use crate::config::EstimatorConfig;
use crate::error::EstimationError;
use crate::features::{SleepFeatures, WakeEncoding};
use crate::model::{LinearSleepModel, SleepModel};
use crate::types::{Bedtime, BedtimeInputs, WakeTime};

/// Estimate a bedtime with the bundled model.
///
/// # Arguments
/// * `wake` - Time the user wants to wake up
/// * `sleep_hours` - Desired amount of sleep, 0-24 hours
/// * `coffee_cups` - Daily coffee intake, 0-20 cups
///
/// # Example
/// ```ignore
/// let bedtime = estimate(WakeTime::new(7, 0)?, 8.0, 1)?;
/// println!("{}", bedtime);
/// ```
pub fn estimate(
    wake: WakeTime,
    sleep_hours: f64,
    coffee_cups: u32,
) -> Result<Bedtime, EstimationError> {
    shared_bundled()?.estimate(wake, sleep_hours, coffee_cups)
}

/// Bundled estimator, parsed once per process
pub(crate) fn shared_bundled() -> Result<&'static BedtimeEstimator, EstimationError> {
    static BUNDLED: OnceLock<Result<BedtimeEstimator, String>> = OnceLock::new();

    BUNDLED
        .get_or_init(|| BedtimeEstimator::bundled().map_err(|e| e.to_string()))
        .as_ref()
        .map_err(|e| EstimationError::ModelUnavailable(e.clone()))
}

/// Estimator bound to one read-only model.
///
/// Cloning shares the model; no call mutates it.
#[derive(Debug)]
pub struct BedtimeEstimator<M: SleepModel = LinearSleepModel> {
    model: Arc<M>,
    default_encoding: WakeEncoding,
}

impl<M: SleepModel> Clone for BedtimeEstimator<M> {
    fn clone(&self) -> Self {
        Self {
            model: Arc::clone(&self.model),
            default_encoding: self.default_encoding,
        }
    }
}

impl BedtimeEstimator<LinearSleepModel> {
    /// Estimator over the model compiled into the crate
    pub fn bundled() -> Result<Self, EstimationError> {
        Ok(Self::new(LinearSleepModel::bundled()?))
    }

    /// Estimator over a model artifact on disk
    pub fn from_path(path: &Path) -> Result<Self, EstimationError> {
        Ok(Self::new(LinearSleepModel::load(path)?))
    }

    /// Estimator built from configuration, falling back to the bundled model
    pub fn from_config(config: &EstimatorConfig) -> Result<Self, EstimationError> {
        let estimator = match &config.model_path {
            Some(path) => Self::from_path(path)?,
            None => Self::bundled()?,
        };
        Ok(estimator.with_default_encoding(config.wake_encoding))
    }
}

impl<M: SleepModel> BedtimeEstimator<M> {
    pub fn new(model: M) -> Self {
        Self::from_shared(Arc::new(model))
    }

    pub fn from_shared(model: Arc<M>) -> Self {
        Self {
            model,
            default_encoding: WakeEncoding::default(),
        }
    }

    /// Encoding used when the model does not declare its own
    pub fn with_default_encoding(mut self, encoding: WakeEncoding) -> Self {
        self.default_encoding = encoding;
        self
    }

    /// Encoding actually applied to wake times
    pub fn wake_encoding(&self) -> WakeEncoding {
        self.model.wake_encoding().unwrap_or(self.default_encoding)
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Estimate a bedtime from raw scalars, validating their domains
    pub fn estimate(
        &self,
        wake: WakeTime,
        sleep_hours: f64,
        coffee_cups: u32,
    ) -> Result<Bedtime, EstimationError> {
        let inputs = BedtimeInputs::new(wake, sleep_hours, coffee_cups)?;
        self.estimate_inputs(&inputs)
    }

    /// Estimate a bedtime from validated inputs
    pub fn estimate_inputs(&self, inputs: &BedtimeInputs) -> Result<Bedtime, EstimationError> {
        self.try_estimate(inputs).map_err(|e| {
            tracing::warn!(error = %e, wake = %inputs.wake, "bedtime estimate failed");
            e
        })
    }

    fn try_estimate(&self, inputs: &BedtimeInputs) -> Result<Bedtime, EstimationError> {
        let features = SleepFeatures::from_inputs(inputs, self.wake_encoding());
        let predicted = self.model.predict(&features)?;

        tracing::debug!(
            wake_feature = features.wake,
            estimated_sleep = features.estimated_sleep,
            coffee = features.coffee,
            predicted_seconds = predicted,
            "sleep model prediction"
        );

        if !predicted.is_finite() || predicted < 0.0 {
            return Err(EstimationError::Inference(format!(
                "predicted sleep of {} seconds is out of range",
                predicted
            )));
        }

        let offset = TimeDelta::try_seconds(predicted.round() as i64).ok_or_else(|| {
            EstimationError::Inference(format!(
                "predicted sleep of {} seconds is out of range",
                predicted
            ))
        })?;
        let (time, _) = inputs.wake.to_naive_time().overflowing_sub_signed(offset);

        Ok(Bedtime {
            time,
            predicted_sleep_seconds: predicted,
            wake_feature: features.wake,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TimeFormat;
    use chrono::NaiveTime;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct FixedModel(f64);

    impl SleepModel for FixedModel {
        fn predict(&self, _features: &SleepFeatures) -> Result<f64, EstimationError> {
            Ok(self.0)
        }
    }

    #[derive(Debug)]
    struct BrokenModel;

    impl SleepModel for BrokenModel {
        fn predict(&self, _features: &SleepFeatures) -> Result<f64, EstimationError> {
            Err(EstimationError::Inference("feature shape mismatch".to_string()))
        }
    }

    #[derive(Debug, Default)]
    struct CountingModel {
        calls: AtomicUsize,
    }

    impl SleepModel for CountingModel {
        fn predict(&self, features: &SleepFeatures) -> Result<f64, EstimationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(features.estimated_sleep * 3600.0)
        }
    }

    fn seven() -> WakeTime {
        WakeTime::new(7, 0).unwrap()
    }

    #[test]
    fn test_default_scenario_matches_model_output() {
        let estimator = BedtimeEstimator::bundled().unwrap();
        let bedtime = estimator.estimate(seven(), 8.0, 1).unwrap();

        let inputs = BedtimeInputs::new(seven(), 8.0, 1).unwrap();
        let features = SleepFeatures::from_inputs(&inputs, WakeEncoding::Legacy);
        let predicted = estimator.model().predict(&features).unwrap();

        let expected = seven()
            .to_naive_time()
            .overflowing_sub_signed(TimeDelta::try_seconds(predicted.round() as i64).unwrap())
            .0;
        assert_eq!(bedtime.time, expected);
        assert_eq!(bedtime.predicted_sleep_seconds, predicted);
        assert_eq!(bedtime.wake_feature, 25_200.0);
    }

    #[test]
    fn test_default_scenario_is_the_evening_before() {
        let bedtime = estimate(seven(), 8.0, 1).unwrap();
        assert_eq!(bedtime.time, NaiveTime::from_hms_opt(22, 47, 10).unwrap());
        assert_eq!(bedtime.format(TimeFormat::Short), "10:47 PM");
        assert!(bedtime.predicted_sleep_seconds > 0.0);
    }

    #[test]
    fn test_bedtime_before_wake_on_same_day() {
        let estimator = BedtimeEstimator::new(FixedModel(2.0 * 3600.0));
        let bedtime = estimator
            .estimate(WakeTime::new(9, 30).unwrap(), 2.0, 0)
            .unwrap();
        assert_eq!(bedtime.time, NaiveTime::from_hms_opt(7, 30, 0).unwrap());
    }

    #[test]
    fn test_wraps_past_midnight_and_beyond_a_day() {
        let estimator = BedtimeEstimator::new(FixedModel(26.0 * 3600.0));
        let bedtime = estimator.estimate(seven(), 8.0, 1).unwrap();
        assert_eq!(bedtime.time, NaiveTime::from_hms_opt(5, 0, 0).unwrap());
    }

    #[test]
    fn test_zero_sleep_and_zero_coffee() {
        let bedtime = estimate(seven(), 0.0, 0).unwrap();
        assert!(bedtime.predicted_sleep_seconds.is_finite());
    }

    #[test]
    fn test_out_of_domain_inputs() {
        assert!(matches!(
            estimate(seven(), 25.0, 1),
            Err(EstimationError::InvalidInput(_))
        ));
        assert!(matches!(
            estimate(seven(), 8.0, 21),
            Err(EstimationError::InvalidInput(_))
        ));
        assert!(matches!(
            estimate(seven(), f64::NAN, 1),
            Err(EstimationError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_model_failure_propagates() {
        let estimator = BedtimeEstimator::new(BrokenModel);
        let err = estimator.estimate(seven(), 8.0, 1).unwrap_err();
        assert!(matches!(err, EstimationError::Inference(_)));
    }

    #[test]
    fn test_negative_and_huge_predictions_rejected() {
        let negative = BedtimeEstimator::new(FixedModel(-60.0));
        assert!(matches!(
            negative.estimate(seven(), 8.0, 1),
            Err(EstimationError::Inference(_))
        ));

        let huge = BedtimeEstimator::new(FixedModel(1e300));
        assert!(matches!(
            huge.estimate(seven(), 8.0, 1),
            Err(EstimationError::Inference(_))
        ));
    }

    #[test]
    fn test_missing_model_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let result = BedtimeEstimator::from_path(&dir.path().join("SleepCalculator.json"));
        assert!(matches!(result, Err(EstimationError::ModelUnavailable(_))));
    }

    #[test]
    fn test_model_declared_encoding_wins() {
        let declared =
            LinearSleepModel::new(0.0, [1.0, 0.0, 0.0]).with_wake_encoding(WakeEncoding::Legacy);
        let estimator =
            BedtimeEstimator::new(declared).with_default_encoding(WakeEncoding::Seconds);
        assert_eq!(estimator.wake_encoding(), WakeEncoding::Legacy);

        let undeclared = LinearSleepModel::new(0.0, [1.0, 0.0, 0.0]);
        let estimator =
            BedtimeEstimator::new(undeclared).with_default_encoding(WakeEncoding::Seconds);
        assert_eq!(estimator.wake_encoding(), WakeEncoding::Seconds);

        let bedtime = estimator
            .estimate(WakeTime::new(7, 30).unwrap(), 8.0, 1)
            .unwrap();
        assert_eq!(bedtime.wake_feature, 27_000.0);
    }

    #[test]
    fn test_from_config_applies_encoding_to_undeclared_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = LinearSleepModel::new(0.0, [1.0, 0.0, 0.0]).to_artifact();
        assert!(artifact.wake_encoding.is_none());
        std::fs::write(
            dir.path().join("plain.json"),
            serde_json::to_string(&artifact).unwrap(),
        )
        .unwrap();

        let config_path = dir.path().join("rest.toml");
        std::fs::write(
            &config_path,
            "model_path = \"plain.json\"\nwake_encoding = \"seconds\"\n",
        )
        .unwrap();

        let config = EstimatorConfig::load(&config_path).unwrap();
        let estimator = BedtimeEstimator::from_config(&config).unwrap();
        assert_eq!(estimator.wake_encoding(), WakeEncoding::Seconds);

        let bedtime = estimator
            .estimate(WakeTime::new(7, 30).unwrap(), 8.0, 1)
            .unwrap();
        assert_eq!(bedtime.wake_feature, 27_000.0);
        assert_eq!(bedtime.time, NaiveTime::from_hms_opt(0, 0, 0).unwrap());
    }

    #[test]
    fn test_from_config_bundled_declaration_beats_config() {
        let config = EstimatorConfig::from_toml_str("wake_encoding = \"seconds\"").unwrap();
        let estimator = BedtimeEstimator::from_config(&config).unwrap();
        assert_eq!(estimator.wake_encoding(), WakeEncoding::Legacy);

        let bedtime = estimator.estimate(seven(), 8.0, 1).unwrap();
        assert_eq!(bedtime.wake_feature, 25_200.0);
        assert_eq!(bedtime.time, NaiveTime::from_hms_opt(22, 47, 10).unwrap());
    }

    #[test]
    fn test_from_config_missing_model_path() {
        let config = EstimatorConfig::default().with_overrides(
            Some(std::path::PathBuf::from("/nonexistent/SleepCalculator.json")),
            None,
            None,
        );
        let result = BedtimeEstimator::from_config(&config);
        assert!(matches!(result, Err(EstimationError::ModelUnavailable(_))));
    }

    #[test]
    fn test_clones_share_model() {
        let estimator = BedtimeEstimator::new(CountingModel::default());
        let clone = estimator.clone();

        estimator.estimate(seven(), 8.0, 1).unwrap();
        clone.estimate(seven(), 8.0, 1).unwrap();

        assert_eq!(estimator.model().calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_concurrent_estimates() {
        let estimator = BedtimeEstimator::bundled().unwrap();
        let expected = estimator.estimate(seven(), 8.0, 1).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let estimator = estimator.clone();
                std::thread::spawn(move || estimator.estimate(seven(), 8.0, 1).unwrap())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    }

    proptest! {
        #[test]
        fn prop_total_over_valid_domain(
            hour in 0u32..24,
            minute in 0u32..60,
            quarters in 0u32..=96,
            cups in 0u32..=20,
        ) {
            let wake = WakeTime::new(hour, minute).unwrap();
            let hours = f64::from(quarters) * 0.25;
            let result = estimate(wake, hours, cups);
            prop_assert!(result.is_ok());
        }

        #[test]
        fn prop_deterministic(
            hour in 0u32..24,
            minute in 0u32..60,
            hours in 0.0f64..=24.0,
            cups in 0u32..=20,
        ) {
            let estimator = BedtimeEstimator::bundled().unwrap();
            let wake = WakeTime::new(hour, minute).unwrap();
            let first = estimator.estimate(wake, hours, cups).unwrap();
            let second = estimator.estimate(wake, hours, cups).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
