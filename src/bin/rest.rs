//! rest CLI - Command-line interface for BetterRest
//!
//! Commands:
//! - estimate: Recommend a bedtime for one set of inputs
//! - run: Estimate bedtimes for NDJSON requests on stdin (streaming mode)
//! - doctor: Diagnose model and configuration health
//! - schema: Print the model artifact schema

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use better_rest::form::SUCCESS_TITLE;
use better_rest::model::{artifact_json_schema, SleepModel};
use better_rest::{
    BedtimeEstimator, BedtimeInputs, EstimateRequest, EstimationError, EstimatorConfig,
    ReportEncoder, TimeFormat, WakeEncoding, WakeTime, PRODUCER_NAME, REST_VERSION,
};

/// rest - Recommend a bedtime from wake time, sleep goal, and coffee intake
#[derive(Parser)]
#[command(name = "rest")]
#[command(version = REST_VERSION)]
#[command(about = "Estimate when to go to bed", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend a bedtime for one set of inputs
    Estimate {
        /// Wake time (e.g. 07:00 or "7:00 AM")
        #[arg(short, long, default_value = "07:00")]
        wake: String,

        /// Desired amount of sleep in hours (0-24)
        #[arg(short, long, default_value = "8.0")]
        sleep: f64,

        /// Daily coffee intake in cups (0-20)
        #[arg(short, long, default_value = "1")]
        coffee: u32,

        #[command(flatten)]
        estimator: EstimatorArgs,

        /// Output a JSON report
        #[arg(long)]
        json: bool,
    },

    /// Estimate bedtimes for NDJSON requests on stdin (streaming mode)
    Run {
        #[command(flatten)]
        estimator: EstimatorArgs,

        /// Flush output after each record
        #[arg(long, default_value = "true")]
        flush: bool,
    },

    /// Diagnose model and configuration health
    Doctor {
        #[command(flatten)]
        estimator: EstimatorArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the model artifact JSON schema
    Schema,
}

#[derive(Args, Clone)]
struct EstimatorArgs {
    /// Model artifact (JSON); defaults to the bundled model
    #[arg(long)]
    model: Option<PathBuf>,

    /// Configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Wake encoding for models that do not declare one
    #[arg(long)]
    encoding: Option<EncodingArg>,

    /// Bedtime display format
    #[arg(long)]
    format: Option<FormatArg>,
}

#[derive(Clone, Copy, ValueEnum)]
enum EncodingArg {
    /// Minutes scaled by 3600 (bundled model convention)
    Legacy,
    /// Seconds since midnight
    Seconds,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    /// 12-hour clock, e.g. 10:47 PM
    Short,
    /// 24-hour clock, e.g. 22:47
    #[value(name = "24h")]
    Clock24h,
}

impl From<EncodingArg> for WakeEncoding {
    fn from(value: EncodingArg) -> Self {
        match value {
            EncodingArg::Legacy => WakeEncoding::Legacy,
            EncodingArg::Seconds => WakeEncoding::Seconds,
        }
    }
}

impl From<FormatArg> for TimeFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Short => TimeFormat::Short,
            FormatArg::Clock24h => TimeFormat::Clock24h,
        }
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let err = CliError::from(e);
            eprintln!(
                "{}",
                serde_json::to_string(&err).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so stdout stays machine-readable
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), RestCliError> {
    match cli.command {
        Commands::Estimate {
            wake,
            sleep,
            coffee,
            estimator,
            json,
        } => cmd_estimate(&wake, sleep, coffee, &estimator, json),

        Commands::Run { estimator, flush } => cmd_run(&estimator, flush),

        Commands::Doctor { estimator, json } => cmd_doctor(&estimator, json),

        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&artifact_json_schema())?);
            Ok(())
        }
    }
}

/// Merge the config file (if any) with command-line overrides
fn resolve_config(args: &EstimatorArgs) -> Result<EstimatorConfig, RestCliError> {
    let config = match &args.config {
        Some(path) => EstimatorConfig::load(path)?,
        None => EstimatorConfig::default(),
    };

    Ok(config.with_overrides(
        args.model.clone(),
        args.encoding.map(Into::into),
        args.format.map(Into::into),
    ))
}

fn cmd_estimate(
    wake: &str,
    sleep: f64,
    coffee: u32,
    args: &EstimatorArgs,
    json: bool,
) -> Result<(), RestCliError> {
    let config = resolve_config(args)?;
    let estimator = BedtimeEstimator::from_config(&config)?;

    let wake: WakeTime = wake.parse()?;
    let inputs = BedtimeInputs::new(wake, sleep, coffee)?;
    let bedtime = estimator.estimate_inputs(&inputs)?;

    if json {
        let encoder = ReportEncoder::new().with_time_format(config.time_format);
        let report = encoder.encode(
            &inputs,
            &bedtime,
            estimator.model().version(),
            estimator.wake_encoding(),
        );
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", SUCCESS_TITLE);
        println!("{}", bedtime.format(config.time_format));
    }

    Ok(())
}

fn cmd_run(args: &EstimatorArgs, flush: bool) -> Result<(), RestCliError> {
    let config = resolve_config(args)?;
    let estimator = BedtimeEstimator::from_config(&config)?;
    let encoder = ReportEncoder::new().with_time_format(config.time_format);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        // A bad request produces a failure record; the stream keeps going
        let record = match EstimateRequest::parse_json(trimmed) {
            Ok(inputs) => match estimator.estimate_inputs(&inputs) {
                Ok(bedtime) => serde_json::to_string(&encoder.encode(
                    &inputs,
                    &bedtime,
                    estimator.model().version(),
                    estimator.wake_encoding(),
                ))?,
                Err(e) => serde_json::to_string(&encoder.encode_failure(&e))?,
            },
            Err(e) => {
                tracing::debug!(error = %e, "rejected request line");
                serde_json::to_string(&encoder.encode_failure(&e))?
            }
        };

        writeln!(stdout, "{}", record)?;
        if flush {
            stdout.flush()?;
        }
    }

    stdout.flush()?;
    Ok(())
}

fn cmd_doctor(args: &EstimatorArgs, json: bool) -> Result<(), RestCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("{} {}", PRODUCER_NAME, REST_VERSION),
    });

    let config = match resolve_config(args) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Ok,
                message: match &args.config {
                    Some(path) => format!("Loaded {}", path.display()),
                    None => "Using defaults".to_string(),
                },
            });
            Some(config)
        }
        Err(e) => {
            checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Error,
                message: detail(&e),
            });
            None
        }
    };

    if let Some(config) = config {
        checks.extend(model_checks(&config));
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (streaming mode ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: REST_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("rest Doctor Report");
        println!("==================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(RestCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn model_checks(config: &EstimatorConfig) -> Vec<DoctorCheck> {
    let source = config
        .model_path
        .as_deref()
        .map(Path::display)
        .map(|p| p.to_string())
        .unwrap_or_else(|| "bundled".to_string());

    let estimator = match BedtimeEstimator::from_config(config) {
        Ok(estimator) => estimator,
        Err(e) => {
            return vec![DoctorCheck {
                name: "model".to_string(),
                status: CheckStatus::Error,
                message: format!("Cannot load {} model: {}", source, e),
            }]
        }
    };

    let mut checks = vec![DoctorCheck {
        name: "model".to_string(),
        status: CheckStatus::Ok,
        message: format!("Loaded {} model (version {})", source, estimator.model().version()),
    }];

    let encoding = estimator.wake_encoding();
    checks.push(match estimator.model().wake_encoding() {
        Some(_) => DoctorCheck {
            name: "wake_encoding".to_string(),
            status: CheckStatus::Ok,
            message: format!("Declared by model: {}", encoding),
        },
        None => DoctorCheck {
            name: "wake_encoding".to_string(),
            status: CheckStatus::Warning,
            message: format!("Model does not declare an encoding; assuming {}", encoding),
        },
    });

    checks.push(match estimator.estimate_inputs(&BedtimeInputs::default()) {
        Ok(bedtime) => DoctorCheck {
            name: "self_test".to_string(),
            status: CheckStatus::Ok,
            message: format!("07:00, 8 hours, 1 cup -> {}", bedtime.format(config.time_format)),
        },
        Err(e) => DoctorCheck {
            name: "self_test".to_string(),
            status: CheckStatus::Error,
            message: format!("Estimate failed: {}", e),
        },
    });

    checks
}

fn detail(e: &RestCliError) -> String {
    match e {
        RestCliError::Io(e) => e.to_string(),
        RestCliError::Estimation(e) => e.to_string(),
        RestCliError::Json(e) => e.to_string(),
        RestCliError::DoctorFailed => "doctor failed".to_string(),
    }
}

// Error types

#[derive(Debug)]
enum RestCliError {
    Io(io::Error),
    Estimation(EstimationError),
    Json(serde_json::Error),
    DoctorFailed,
}

impl From<io::Error> for RestCliError {
    fn from(e: io::Error) -> Self {
        RestCliError::Io(e)
    }
}

impl From<EstimationError> for RestCliError {
    fn from(e: EstimationError) -> Self {
        RestCliError::Estimation(e)
    }
}

impl From<serde_json::Error> for RestCliError {
    fn from(e: serde_json::Error) -> Self {
        RestCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<RestCliError> for CliError {
    fn from(e: RestCliError) -> Self {
        match e {
            RestCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            RestCliError::Estimation(e) => {
                tracing::debug!(error = %e, "estimation error detail");
                let hint = match &e {
                    EstimationError::InvalidInput(_) => {
                        "Wake time is HH:MM, sleep is 0-24 hours, coffee is 0-20 cups"
                    }
                    EstimationError::ModelUnavailable(_) => "Run 'rest doctor' to check the model",
                    EstimationError::Config(_) => "Check the configuration file",
                    _ => "Run with RUST_LOG=debug for details",
                };
                CliError {
                    code: e.code().to_string(),
                    message: e.user_message().to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            RestCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            RestCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
