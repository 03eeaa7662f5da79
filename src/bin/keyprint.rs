//! Keyprint CLI - Command-line interface for Keyprint
//!
//! Commands:
//! - extract: Derive a feature vector from an interaction stream
//! - enroll: Build an enrolled profile from an interaction stream
//! - verify: Score an interaction stream against an enrolled profile
//! - compare: Score two stored feature vectors
//! - validate: Validate raw interaction schema
//! - doctor: Diagnose configuration and profile files
//! - schema: Print schema information

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use keyprint::config::KeyprintConfig;
use keyprint::pipeline::{self, parse_profile};
use keyprint::schema::{InteractionAdapter, RawInteraction, SCHEMA_VERSION};
use keyprint::types::BehavioralFeatureVector;
use keyprint::{logging, score, ComputeError, MATCH_THRESHOLD};
use keyprint::{KEYPRINT_VERSION, PRODUCER_NAME};

/// Exit code for a completed verification that did not match
const EXIT_REJECTED: u8 = 2;

/// Keyprint - On-device behavioral biometric signatures
#[derive(Parser)]
#[command(name = "keyprint")]
#[command(version = KEYPRINT_VERSION)]
#[command(about = "Derive and compare keystroke/pointer behavioral signatures", long_about = None)]
struct Cli {
    /// Configuration file (JSON); defaults apply when it does not exist
    #[arg(long, global = true, default_value = "keyprint.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive a feature vector from an interaction stream
    Extract {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "auto")]
        input_format: InputFormat,
    },

    /// Build an enrolled profile from an interaction stream
    Enroll {
        /// User the profile belongs to
        #[arg(short, long)]
        user: String,

        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "auto")]
        input_format: InputFormat,
    },

    /// Score an interaction stream against an enrolled profile
    Verify {
        /// Enrolled profile file
        #[arg(short, long)]
        profile: PathBuf,

        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "auto")]
        input_format: InputFormat,
    },

    /// Score two stored feature vectors against each other
    Compare {
        /// Enrolled feature vector file
        enrolled: PathBuf,

        /// Current feature vector file
        current: PathBuf,
    },

    /// Validate raw interaction schema
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "auto")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and profile files
    Doctor {
        /// Check an enrolled profile file
        #[arg(long)]
        profile: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,

        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// JSON array if the input starts with '[', NDJSON otherwise
    Auto,
    /// Newline-delimited JSON (one interaction per line)
    Ndjson,
    /// JSON array of interactions
    Json,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (keyprint.interaction.v1)
    Input,
    /// Output schema (feature vector and verification report)
    Output,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = KeyprintConfig::load(&cli.config);
    logging::init(&config.log);

    match run(cli.command, &config) {
        Ok(code) => code,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands, config: &KeyprintConfig) -> Result<ExitCode, KeyprintCliError> {
    let pretty = config.output.pretty;
    match command {
        Commands::Extract {
            input,
            output,
            input_format,
        } => {
            let events = read_events(&input, &input_format)?;
            let features = pipeline::extract_features(&events);
            write_output(&output, &to_json(&features, pretty)?)?;
            Ok(ExitCode::SUCCESS)
        }

        Commands::Enroll {
            user,
            input,
            output,
            input_format,
        } => {
            if user.trim().is_empty() {
                return Err(KeyprintCliError::EmptyUser);
            }
            let events = read_events(&input, &input_format)?;
            let profile = pipeline::enroll(&user, &events);
            write_output(&output, &to_json(&profile, pretty)?)?;
            Ok(ExitCode::SUCCESS)
        }

        Commands::Verify {
            profile,
            input,
            input_format,
        } => {
            let profile = parse_profile(&read_input(&profile)?)?;
            let events = read_events(&input, &input_format)?;
            let report = pipeline::verify_report(&profile, &pipeline::extract_features(&events));
            println!("{}", to_json(&report, pretty)?);
            Ok(decision_exit_code(report.result.is_match))
        }

        Commands::Compare { enrolled, current } => {
            let enrolled = read_feature_vector(&enrolled)?;
            let current = read_feature_vector(&current)?;
            let result = score(&enrolled, &current);
            println!("{}", to_json(&result, pretty)?);
            Ok(decision_exit_code(result.is_match))
        }

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Doctor { profile, json } => cmd_doctor(config, profile.as_deref(), json),

        Commands::Schema {
            schema_type,
            json_schema,
        } => cmd_schema(schema_type, json_schema),
    }
}

fn decision_exit_code(is_match: bool) -> ExitCode {
    if is_match {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_REJECTED)
    }
}

fn cmd_validate(
    input: &Path,
    input_format: InputFormat,
    json: bool,
) -> Result<ExitCode, KeyprintCliError> {
    let events = read_events(input, &input_format)?;
    let results = InteractionAdapter::validate_events(&events);

    let report = ValidationReport {
        schema_version: SCHEMA_VERSION.to_string(),
        total_events: events.len(),
        valid_events: events.len() - results.len(),
        invalid_events: results.len(),
        errors: results
            .iter()
            .map(|r| ValidationErrorDetail {
                index: r.index,
                timestamp_ms: events[r.index].timestamp_ms,
                error: r.error.to_string(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total events:   {}", report.total_events);
        println!("Valid events:   {}", report.valid_events);
        println!("Invalid events: {}", report.invalid_events);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!(
                    "  - Event at {} ms (index {}): {}",
                    err.timestamp_ms, err.index, err.error
                );
            }
        }
    }

    if report.invalid_events > 0 {
        Err(KeyprintCliError::ValidationFailed(report.invalid_events))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn cmd_doctor(
    config: &KeyprintConfig,
    profile: Option<&Path>,
    json: bool,
) -> Result<ExitCode, KeyprintCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "keyprint_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Keyprint version {}", KEYPRINT_VERSION),
    });

    checks.push(DoctorCheck {
        name: "schema_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Input schema: {}", SCHEMA_VERSION),
    });

    checks.push(DoctorCheck {
        name: "config".to_string(),
        status: CheckStatus::Ok,
        message: format!(
            "log level '{}', json logs {}, pretty output {}",
            config.log.level, config.log.json, config.output.pretty
        ),
    });

    checks.push(DoctorCheck {
        name: "threshold".to_string(),
        status: CheckStatus::Ok,
        message: format!("Match threshold {:.2}", MATCH_THRESHOLD),
    });

    if let Some(profile_path) = profile {
        checks.push(check_profile(profile_path));
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
            message: "stdin is a pipe (ready for '-i -')".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: KEYPRINT_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Keyprint Doctor Report");
        println!("======================");
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

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(KeyprintCliError::DoctorFailed)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn check_profile(path: &Path) -> DoctorCheck {
    if !path.exists() {
        return DoctorCheck {
            name: "profile".to_string(),
            status: CheckStatus::Warning,
            message: "Profile file does not exist".to_string(),
        };
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            return DoctorCheck {
                name: "profile".to_string(),
                status: CheckStatus::Error,
                message: format!("Cannot read profile file: {}", e),
            }
        }
    };

    match parse_profile(&content) {
        Ok(profile) if profile.features.signature.len() == keyprint::features::SIGNATURE_LEN => {
            DoctorCheck {
                name: "profile".to_string(),
                status: CheckStatus::Ok,
                message: format!(
                    "Profile for '{}' enrolled {}",
                    profile.user_id,
                    profile.enrolled_at.to_rfc3339()
                ),
            }
        }
        Ok(profile) => DoctorCheck {
            name: "profile".to_string(),
            status: CheckStatus::Warning,
            message: format!(
                "Signature has {} values, expected {}; comparisons will score 0",
                profile.features.signature.len(),
                keyprint::features::SIGNATURE_LEN
            ),
        },
        Err(e) => DoctorCheck {
            name: "profile".to_string(),
            status: CheckStatus::Error,
            message: e.to_string(),
        },
    }
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<ExitCode, KeyprintCliError> {
    match schema_type {
        SchemaType::Input => {
            if json_schema {
                println!("{}", get_input_json_schema());
            } else {
                println!("Input Schema: {}", SCHEMA_VERSION);
                println!();
                println!("One record per host input event:");
                println!();
                println!("- timestamp_ms: integer milliseconds, non-decreasing");
                println!("- kind: key_down | key_up | pointer_move");
                println!("- key: key identifier (key_down, key_up)");
                println!("- x, y: pointer position (pointer_move)");
                println!();
                println!("Backspace and Delete count as corrections.");
                println!("Key-ups without a preceding key-down are ignored.");
            }
        }
        SchemaType::Output => {
            if json_schema {
                println!("{}", get_output_json_schema());
            } else {
                println!("Output: feature vector");
                println!();
                println!("- avg_key_press_duration, key_press_variance (ms, holds in (0, 1000))");
                println!("- avg_inter_key_delay, inter_key_variance (ms, delays in (0, 2000))");
                println!("- rhythm_histogram: 10 bins, sums to 1 or all zero");
                println!("- burst_typing_rate, pause_frequency, backspace_rate: [0, 1]");
                println!("- correction_timings: ms since the previous key-down");
                println!("- avg_pointer_velocity, pointer_acceleration: absent without pointer data");
                println!("- signature: 19 z-score normalized values");
                println!();
                println!("Output: verification report");
                println!();
                println!("- result: {{ is_match, confidence_score, metrics }}");
                println!("- metrics: {{ typing_rhythm, key_dynamics, pointer_dynamics, overall }}");
                println!("- threshold, profile_id, user_id, verified_at");
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

// Helper functions

fn read_input(path: &Path) -> Result<String, KeyprintCliError> {
    if path.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn write_output(path: &Path, data: &str) -> Result<(), KeyprintCliError> {
    if path.to_string_lossy() == "-" {
        println!("{}", data);
    } else {
        fs::write(path, data)?;
    }
    Ok(())
}

fn read_events(
    path: &Path,
    input_format: &InputFormat,
) -> Result<Vec<RawInteraction>, KeyprintCliError> {
    let data = read_input(path)?;
    let events = match input_format {
        InputFormat::Auto => pipeline::parse_interactions(&data)?,
        InputFormat::Ndjson => InteractionAdapter::parse_ndjson(&data)?,
        InputFormat::Json => InteractionAdapter::parse_array(&data)?,
    };

    if events.is_empty() {
        return Err(KeyprintCliError::NoEvents);
    }
    Ok(events)
}

fn read_feature_vector(path: &Path) -> Result<BehavioralFeatureVector, KeyprintCliError> {
    let data = read_input(path)?;
    Ok(serde_json::from_str(&data)?)
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String, KeyprintCliError> {
    if pretty {
        Ok(serde_json::to_string_pretty(value)?)
    } else {
        Ok(serde_json::to_string(value)?)
    }
}

fn get_input_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": SCHEMA_VERSION,
        "description": "Keyprint raw interaction schema",
        "type": "object",
        "required": ["timestamp_ms", "kind"],
        "properties": {
            "timestamp_ms": { "type": "integer", "minimum": 0 },
            "kind": {
                "type": "string",
                "enum": ["key_down", "key_up", "pointer_move"]
            },
            "key": { "type": "string", "minLength": 1 },
            "x": { "type": "number" },
            "y": { "type": "number" }
        }
    })
    .to_string()
}

fn get_output_json_schema() -> String {
    let unit = serde_json::json!({ "type": "number", "minimum": 0, "maximum": 1 });
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "keyprint.feature_vector.v1",
        "description": "Keyprint behavioral feature vector",
        "type": "object",
        "required": [
            "avg_key_press_duration", "avg_inter_key_delay", "key_press_variance",
            "inter_key_variance", "rhythm_histogram", "burst_typing_rate",
            "pause_frequency", "backspace_rate", "correction_timings", "signature"
        ],
        "properties": {
            "avg_key_press_duration": { "type": "number" },
            "avg_inter_key_delay": { "type": "number" },
            "key_press_variance": { "type": "number" },
            "inter_key_variance": { "type": "number" },
            "rhythm_histogram": {
                "type": "array",
                "items": unit.clone(),
                "minItems": 10,
                "maxItems": 10
            },
            "burst_typing_rate": unit.clone(),
            "pause_frequency": unit.clone(),
            "backspace_rate": unit,
            "correction_timings": { "type": "array", "items": { "type": "integer" } },
            "avg_pointer_velocity": { "type": "number" },
            "pointer_acceleration": { "type": "number" },
            "signature": {
                "type": "array",
                "items": { "type": "number" },
                "minItems": 19,
                "maxItems": 19
            }
        }
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum KeyprintCliError {
    Io(io::Error),
    Compute(ComputeError),
    Json(serde_json::Error),
    NoEvents,
    EmptyUser,
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for KeyprintCliError {
    fn from(e: io::Error) -> Self {
        KeyprintCliError::Io(e)
    }
}

impl From<ComputeError> for KeyprintCliError {
    fn from(e: ComputeError) -> Self {
        KeyprintCliError::Compute(e)
    }
}

impl From<serde_json::Error> for KeyprintCliError {
    fn from(e: serde_json::Error) -> Self {
        KeyprintCliError::Json(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<KeyprintCliError> for CliError {
    fn from(e: KeyprintCliError) -> Self {
        match e {
            KeyprintCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            KeyprintCliError::Compute(ComputeError::InvalidProfile(msg)) => CliError {
                code: "INVALID_PROFILE".to_string(),
                message: msg,
                hint: Some("Run 'keyprint doctor --profile <file>' for details".to_string()),
            },
            KeyprintCliError::Compute(e) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some(format!("Ensure input matches {} schema", SCHEMA_VERSION)),
            },
            KeyprintCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            KeyprintCliError::NoEvents => CliError {
                code: "NO_EVENTS".to_string(),
                message: "No interactions found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            KeyprintCliError::EmptyUser => CliError {
                code: "EMPTY_USER".to_string(),
                message: "User identifier must not be empty".to_string(),
                hint: Some("Pass --user <id>".to_string()),
            },
            KeyprintCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} events failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            KeyprintCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(Serialize)]
struct ValidationReport {
    schema_version: String,
    total_events: usize,
    valid_events: usize,
    invalid_events: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(Serialize)]
struct ValidationErrorDetail {
    index: usize,
    timestamp_ms: i64,
    error: String,
}

#[derive(Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
