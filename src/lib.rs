//! BetterRest - On-device bedtime estimation
//!
//! BetterRest recommends a bedtime from three inputs: the desired wake time, the
//! desired amount of sleep, and daily coffee intake. The inputs are encoded as
//! features, passed once through a pre-trained sleep regression model, and the
//! predicted sleep need is subtracted from the wake time.
//!
//! ## Modules
//!
//! - **Estimator**: [`estimate`] and [`BedtimeEstimator`], the single public operation
//! - **Model**: [`SleepModel`] seam and the JSON-backed [`LinearSleepModel`]
//! - **Form**: [`BedtimeForm`], stepper-bounded inputs with an explicit change callback

pub mod config;
pub mod encoder;
pub mod error;
pub mod estimator;
pub mod features;
pub mod form;
pub mod model;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::EstimatorConfig;
pub use encoder::ReportEncoder;
pub use error::EstimationError;
pub use estimator::{estimate, BedtimeEstimator};
pub use features::{SleepFeatures, WakeEncoding};
pub use form::{Alert, BedtimeForm};
pub use model::{LinearSleepModel, ModelArtifact, SleepModel};
pub use types::{
    Bedtime, BedtimeInputs, CoffeeIntake, EstimateRequest, SleepAmount, TimeFormat, WakeTime,
};

/// Crate version embedded in all reports
pub const REST_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "better-rest";
