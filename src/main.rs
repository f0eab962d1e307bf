//! CLI entry point for the attendance recap tool.
//!
//! Provides subcommands for analyzing an exported attendance sheet into a
//! lateness recap, printing summary statistics, and inspecting the shift
//! configuration.

use anyhow::Result;
use attendance_recap::{
    engine::process_rows,
    ingest::load_rows,
    output::{append_records, print_summary_json},
    shifts::ShiftConfig,
    timeparse::time_to_minutes,
};
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "attendance_recap")]
#[command(about = "A tool to recap employee lateness from attendance exports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze an attendance export and append recap rows to a CSV
    Analyze {
        /// Path to the exported attendance CSV
        #[arg(value_name = "FILE")]
        input: String,

        /// CSV file to append recap rows to
        #[arg(short, long, default_value = "recap.csv")]
        output: String,

        /// Optional JSON file with shifts, threshold, and exemptions
        #[arg(short, long)]
        config: Option<String>,
    },
    /// Print only the summary statistics as JSON
    Summary {
        /// Path to the exported attendance CSV
        #[arg(value_name = "FILE")]
        input: String,

        /// Optional JSON file with shifts, threshold, and exemptions
        #[arg(short, long)]
        config: Option<String>,
    },
    /// Show the effective shift configuration
    Shifts {
        /// Optional JSON file with shifts, threshold, and exemptions
        #[arg(short, long)]
        config: Option<String>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/attendance_recap.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("attendance_recap.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            output,
            config,
        } => {
            let config = load_config(config.as_deref())?;
            let rows = load_rows(&input)?;
            let report = process_rows(&rows, &config)?;

            append_records(&output, &report.records)?;
            print_summary_json(&report.summary)?;

            info!(
                records = report.records.len(),
                cases = report.summary.total_cases,
                output = %output,
                "Recap written"
            );
        }
        Commands::Summary { input, config } => {
            let config = load_config(config.as_deref())?;
            let rows = load_rows(&input)?;
            let report = process_rows(&rows, &config)?;

            print_summary_json(&report.summary)?;
        }
        Commands::Shifts { config } => {
            let config = load_config(config.as_deref())?;

            for shift in config.known_shifts() {
                println!("{}  ({} min)", shift, time_to_minutes(&shift));
            }
            println!("threshold: {} min", config.threshold);
            for rule in &config.exemptions {
                println!("exempt: {} / {}", rule.organization, rule.shift_code);
            }
        }
    }

    Ok(())
}

/// Loads the shift configuration file, or the built-in defaults when no
/// path was given.
fn load_config(path: Option<&str>) -> Result<ShiftConfig> {
    match path {
        Some(p) => {
            let config = ShiftConfig::load(p)?;
            info!(path = p, shifts = config.shifts.len(), "Config loaded");
            Ok(config)
        }
        None => Ok(ShiftConfig::default()),
    }
}
