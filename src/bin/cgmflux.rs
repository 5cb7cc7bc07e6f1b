//! cgmflux CLI - Command-line interface for CGM Flux
//!
//! Commands:
//! - analyze: Summarize a CGM payload into an interpretation report
//! - validate: Check which records of a payload are usable
//! - interpret: Analyze, narrate and store an editable interpretation
//! - finalize: Lock a stored interpretation and bill it when eligible
//! - config: Print the default analysis configuration

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use serde_json::Value;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use cgm_flux::encoder::data_span;
use cgm_flux::normalizer::Normalizer;
use cgm_flux::pipeline::CgmProcessor;
use cgm_flux::workflow::{
    finalize_and_bill, run_interpretation, JsonFileStore, TemplateNarrator,
};
use cgm_flux::{AnalysisConfig, AnalysisError, CGM_FLUX_VERSION};

/// cgmflux - Glucose time-series analytics for CGM interpretation
#[derive(Parser)]
#[command(name = "cgmflux")]
#[command(version = CGM_FLUX_VERSION)]
#[command(about = "Summarize CGM data into metrics, patterns and advisories", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a CGM payload into an interpretation report
    Analyze {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Analysis config file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        format: OutputFormat,
    },

    /// Check which records of a payload are usable
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Analyze, narrate and store an editable interpretation
    Interpret {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        #[arg(long)]
        patient_id: String,

        #[arg(long)]
        provider_id: String,

        /// Directory holding interpretations and billing events
        #[arg(long, default_value = "cgm-data")]
        store_dir: PathBuf,

        /// Analysis config file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Lock a stored interpretation and bill it when eligible
    Finalize {
        /// Interpretation ID returned by `interpret`
        #[arg(long)]
        id: String,

        #[arg(long)]
        patient_id: String,

        #[arg(long)]
        provider_id: String,

        /// Monitored duration in whole days
        #[arg(long)]
        duration_days: u32,

        /// Directory holding interpretations and billing events
        #[arg(long, default_value = "cgm-data")]
        store_dir: PathBuf,
    },

    /// Print the default analysis configuration
    Config,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
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

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn run(cli: Cli) -> Result<(), CgmCliError> {
    match cli.command {
        Commands::Analyze {
            input,
            output,
            config,
            format,
        } => cmd_analyze(&input, &output, config.as_deref(), format),
        Commands::Validate { input, json } => cmd_validate(&input, json),
        Commands::Interpret {
            input,
            patient_id,
            provider_id,
            store_dir,
            config,
        } => cmd_interpret(&input, &patient_id, &provider_id, &store_dir, config.as_deref()),
        Commands::Finalize {
            id,
            patient_id,
            provider_id,
            duration_days,
            store_dir,
        } => cmd_finalize(&id, &patient_id, &provider_id, duration_days, &store_dir),
        Commands::Config => {
            println!("{}", AnalysisConfig::default().to_json()?);
            Ok(())
        }
    }
}

fn read_input(input: &Path) -> Result<String, CgmCliError> {
    if input.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            return Err(CgmCliError::NoInput);
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig, CgmCliError> {
    match path {
        Some(path) => Ok(AnalysisConfig::from_path(path)?),
        None => Ok(AnalysisConfig::default()),
    }
}

fn cmd_analyze(
    input: &Path,
    output: &Path,
    config: Option<&Path>,
    format: OutputFormat,
) -> Result<(), CgmCliError> {
    let raw: Value = serde_json::from_str(&read_input(input)?)?;
    let processor = CgmProcessor::with_config(load_config(config)?)?;
    let report = processor.process_value(&raw)?;

    let output_data = match format {
        OutputFormat::Json => serde_json::to_string(&report)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(&report)?,
    };

    if output.to_string_lossy() == "-" {
        println!("{output_data}");
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_validate(input: &Path, json: bool) -> Result<(), CgmCliError> {
    let raw: Value = serde_json::from_str(&read_input(input)?)?;
    let total_records = match &raw {
        Value::Array(items) => items.len(),
        Value::Object(obj) => obj
            .get("records")
            .and_then(Value::as_array)
            .map_or(0, Vec::len),
        _ => 0,
    };

    let series = Normalizer::normalize(&raw)?;
    let span = data_span(&series).ok();

    let report = ValidationReport {
        total_records,
        accepted_records: series.len(),
        dropped_records: total_records.saturating_sub(series.len()),
        first_reading: span.as_ref().map(|s| s.first_reading.to_rfc3339()),
        last_reading: span.as_ref().map(|s| s.last_reading.to_rfc3339()),
        duration_days: span.as_ref().map(|s| s.duration_days),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total records:    {}", report.total_records);
        println!("Accepted records: {}", report.accepted_records);
        println!("Dropped records:  {}", report.dropped_records);
        if let (Some(first), Some(last), Some(days)) =
            (&report.first_reading, &report.last_reading, report.duration_days)
        {
            println!("Span:             {first} .. {last} ({days} days)");
        }
    }

    if report.accepted_records == 0 {
        Err(CgmCliError::Analysis(AnalysisError::EmptySeries))
    } else {
        Ok(())
    }
}

fn cmd_interpret(
    input: &Path,
    patient_id: &str,
    provider_id: &str,
    store_dir: &Path,
    config: Option<&Path>,
) -> Result<(), CgmCliError> {
    let raw_json = read_input(input)?;
    let config = load_config(config)?;
    let store = JsonFileStore::open(store_dir)?;

    let outcome = run_interpretation(
        &raw_json,
        patient_id,
        provider_id,
        &config,
        &TemplateNarrator,
        &store,
    )?;

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

fn cmd_finalize(
    id: &str,
    patient_id: &str,
    provider_id: &str,
    duration_days: u32,
    store_dir: &Path,
) -> Result<(), CgmCliError> {
    let store = JsonFileStore::open(store_dir)?;
    let outcome = finalize_and_bill(&store, id, patient_id, provider_id, duration_days)?;

    let report = FinalizeReport {
        interpretation_id: outcome.record.interpretation_id,
        finalized: outcome.record.finalized,
        billing_id: outcome.billing.map(|(billing_id, _)| billing_id),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

// Error types

#[derive(Debug)]
enum CgmCliError {
    Io(io::Error),
    Analysis(AnalysisError),
    Json(serde_json::Error),
    NoInput,
}

impl From<io::Error> for CgmCliError {
    fn from(e: io::Error) -> Self {
        CgmCliError::Io(e)
    }
}

impl From<AnalysisError> for CgmCliError {
    fn from(e: AnalysisError) -> Self {
        CgmCliError::Analysis(e)
    }
}

impl From<serde_json::Error> for CgmCliError {
    fn from(e: serde_json::Error) -> Self {
        CgmCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<CgmCliError> for CliError {
    fn from(e: CgmCliError) -> Self {
        match e {
            CgmCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            CgmCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            CgmCliError::NoInput => CliError {
                code: "NO_INPUT".to_string(),
                message: "stdin is a terminal".to_string(),
                hint: Some("Pipe a CGM JSON payload into stdin or pass --input <file>".to_string()),
            },
            CgmCliError::Analysis(e) => {
                let (code, hint) = match &e {
                    AnalysisError::UnrecognizedFormat(_) => (
                        "UNRECOGNIZED_FORMAT",
                        Some("Expected {\"records\": [...]} or a flat array of readings"),
                    ),
                    AnalysisError::MalformedTimestamp(_) => (
                        "MALFORMED_TIMESTAMP",
                        Some("Timestamps must be ISO-8601"),
                    ),
                    AnalysisError::EmptySeries => (
                        "EMPTY_SERIES",
                        Some("Run 'cgmflux validate' to see which records were dropped"),
                    ),
                    AnalysisError::JsonError(_) => ("JSON_ERROR", Some("Check JSON syntax")),
                    AnalysisError::InvalidConfig(_) => (
                        "INVALID_CONFIG",
                        Some("Run 'cgmflux config' for a valid starting point"),
                    ),
                    AnalysisError::Io(_) => ("IO_ERROR", Some("Check file paths and permissions")),
                    AnalysisError::RecordNotFound(_) => ("RECORD_NOT_FOUND", None),
                    AnalysisError::RecordFinalized(_) => ("RECORD_FINALIZED", None),
                    AnalysisError::Narrative(_) => ("NARRATIVE_ERROR", None),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: hint.map(str::to_string),
                }
            }
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_records: usize,
    accepted_records: usize,
    dropped_records: usize,
    first_reading: Option<String>,
    last_reading: Option<String>,
    duration_days: Option<f64>,
}

#[derive(serde::Serialize)]
struct FinalizeReport {
    interpretation_id: String,
    finalized: bool,
    billing_id: Option<String>,
}
