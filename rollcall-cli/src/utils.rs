//! Common utility functions shared across CLI commands.

use anyhow::{bail, Result};
use colored::Colorize;
use rollcall_core::{AttendanceOutcome, KioskConfig, RollcallError, SubmitFlow};
use tracing::debug;

/// Environment configuration with command-line overrides applied.
pub fn resolve_config(server: Option<String>, flow: Option<SubmitFlow>) -> KioskConfig {
    let mut config = KioskConfig::from_env();
    if let Some(server) = server {
        config.server_url = server.trim().trim_end_matches('/').to_string();
    }
    if let Some(flow) = flow {
        config.submit_flow = flow;
    }
    debug!(
        server_url = %config.server_url,
        flow = %config.submit_flow,
        "Resolved configuration"
    );
    config
}

/// Turn a terminal outcome into the command result.
///
/// Matches and repeat scans succeed; everything else becomes an error that
/// maps to a distinct exit code.
pub fn outcome_result(outcome: &AttendanceOutcome) -> Result<()> {
    match outcome {
        AttendanceOutcome::Matched { .. } | AttendanceOutcome::AlreadyMarked { .. } => Ok(()),
        AttendanceOutcome::NoMatch { message } => bail!("No match: {message}"),
        AttendanceOutcome::TransportError { message } => {
            Err(RollcallError::Transport(message.clone()).into())
        }
    }
}

/// Print a dimmed hint line unless quiet.
pub fn hint(quiet: bool, text: &str) {
    if !quiet {
        println!("{}", text.dimmed());
    }
}
