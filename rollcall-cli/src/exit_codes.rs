//! Exit codes following sysexits.h conventions.
//!
//! Kiosk wrappers and cron jobs branch on these to tell a rejected scan
//! apart from a server that is down.

use rollcall_core::{DeviceError, RollcallError};

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// General error (catch-all).
pub const GENERAL_ERROR: i32 = 1;

/// Command line usage error (invalid arguments).
/// Maps to EX_USAGE from sysexits.h.
pub const USAGE_ERROR: i32 = 64;

/// Data error (no face match, rejected field value, rejected export).
/// Maps to EX_DATAERR from sysexits.h.
pub const DATA_ERROR: i32 = 65;

/// Cannot open input file.
/// Maps to EX_NOINPUT from sysexits.h.
pub const INPUT_ERROR: i32 = 66;

/// Service unavailable (attendance server, camera).
/// Maps to EX_UNAVAILABLE from sysexits.h.
pub const UNAVAILABLE: i32 = 69;

/// I/O error (cannot write output file).
/// Maps to EX_IOERR from sysexits.h.
pub const IO_ERROR: i32 = 74;

/// Represents an exit code with optional error context.
pub struct ExitCode {
    pub code: i32,
    pub message: Option<String>,
}

impl ExitCode {
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let message = format!("{err:#}");
        Self {
            code: classify(err, &message),
            message: Some(message),
        }
    }
}

fn classify(err: &anyhow::Error, message: &str) -> i32 {
    // Context added by the commands names the failing step.
    if message.contains("Failed to read file") {
        return INPUT_ERROR;
    }
    if message.contains("Failed to write") {
        return IO_ERROR;
    }
    if message.contains("Validation failed") || message.contains("No match") {
        return DATA_ERROR;
    }

    if let Some(core) = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<RollcallError>())
    {
        return match core {
            RollcallError::Device(DeviceError::NotFound) => INPUT_ERROR,
            RollcallError::Device(_) | RollcallError::Transport(_) | RollcallError::HttpError(_) => {
                UNAVAILABLE
            }
            RollcallError::ServerRejection(_) | RollcallError::Encoding(_) => DATA_ERROR,
            RollcallError::Config(_) => USAGE_ERROR,
            RollcallError::Io(_) => IO_ERROR,
        };
    }

    GENERAL_ERROR
}
