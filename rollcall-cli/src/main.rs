//! Rollcall CLI - face-recognition attendance kiosk for the terminal.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{ArgAction, ArgGroup, Parser, Subcommand};
use colored::Colorize;
use rollcall_core::{Facing, Field, SubmitFlow};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod exit_codes;
mod terminal;
mod utils;

use exit_codes::ExitCode;

const EXIT_CODES_HELP: &str = "\
Exit codes:
  0   Success (including students already marked today)
  1   General error
  64  Usage error
  65  No face match, rejected field value, or rejected export
  66  Input image not found
  69  Attendance server or camera unavailable
  74  Could not write output file";

#[derive(Parser)]
#[command(name = "rollcall")]
#[command(author, version, about = "Face-recognition attendance kiosk", long_about = None)]
#[command(after_help = EXIT_CODES_HELP)]
struct Cli {
    /// Attendance server base URL (overrides ROLLCALL_SERVER_URL)
    #[arg(long, global = true, value_name = "URL")]
    server: Option<String>,

    /// Submission flow: multipart or json (overrides ROLLCALL_SUBMIT_FLOW)
    #[arg(long, global = true, value_name = "FLOW")]
    flow: Option<SubmitFlow>,

    /// Only print machine-readable results
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the kiosk: periodic scans plus interactive capture from stdin
    #[command(group(ArgGroup::new("source").required(true).multiple(true).args(["front", "back"])))]
    Scan {
        /// Camera to start with
        #[arg(long, default_value = "front", value_name = "FACING")]
        facing: Facing,

        /// Image served by the front camera
        #[arg(long, value_name = "IMAGE")]
        front: Option<PathBuf>,

        /// Image served by the back camera
        #[arg(long, value_name = "IMAGE")]
        back: Option<PathBuf>,
    },

    /// Upload an image file for recognition
    Submit {
        /// Path to the image
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Show today's attendance
    Today,

    /// Download the attendance sheet as CSV
    Export {
        /// Day to export (YYYY-MM-DD, default: today)
        #[arg(long, value_name = "DATE")]
        date: Option<NaiveDate>,

        /// Directory to write the sheet into
        #[arg(long, default_value = ".", value_name = "DIR")]
        out: PathBuf,
    },

    /// Apply an input mask and validate the result
    Check {
        /// Field preset (university_id, university_code, phone, bus_number, roll_number)
        #[arg(value_name = "FIELD")]
        field: Field,

        /// Raw input
        #[arg(value_name = "VALUE", allow_hyphen_values = true)]
        value: String,
    },
}

/// Logs go to stderr so stdout stays clean for results.
fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("rollcall_core=debug,rollcall=debug,info"),
        _ => EnvFilter::new("trace"),
    };

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose > 0)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = utils::resolve_config(cli.server, cli.flow);
    let quiet = cli.quiet;

    match cli.command {
        Commands::Scan {
            facing,
            front,
            back,
        } => commands::scan::execute(&config, facing, front, back, quiet).await,
        Commands::Submit { file } => commands::submit::execute(&config, file, quiet).await,
        Commands::Today => commands::today::execute(&config, quiet).await,
        Commands::Export { date, out } => {
            commands::export::execute(&config, date, out, quiet).await
        }
        Commands::Check { field, value } => commands::check::execute(field, &value, quiet),
    }
}

fn main() -> std::process::ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() {
                exit_codes::USAGE_ERROR
            } else {
                exit_codes::SUCCESS
            };
            if e.print().is_err() {
                return std::process::ExitCode::from(exit_codes::IO_ERROR as u8);
            }
            return std::process::ExitCode::from(code as u8);
        }
    };

    init_tracing(cli.verbose);

    // The whole kiosk runs on one logical thread.
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("{} Failed to start runtime: {e}", "Error:".red().bold());
            return std::process::ExitCode::from(exit_codes::GENERAL_ERROR as u8);
        }
    };

    let result = runtime.block_on(run(cli));
    // A pending stdin read must not hold the process open.
    runtime.shutdown_timeout(Duration::from_millis(100));

    match result {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            let exit = ExitCode::from_anyhow(&err);
            if let Some(message) = &exit.message {
                eprintln!("{} {}", "Error:".red().bold(), message);
            }
            std::process::ExitCode::from(exit.code as u8)
        }
    }
}
