//! Scan command implementation.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;
use rollcall_core::{
    AttendanceApi, AttendanceClient, CaptureAttempt, CaptureBackend, CaptureScheduler, Facing,
    FrameCapture, KioskConfig, MediaSource, RollcallError, StillImageCamera, Trigger,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use crate::terminal::TerminalView;
use crate::utils::hint;

const HELP: &str = "Commands: c = capture now, s = switch camera, u FILE = upload image, q = quit";

const NO_CAMERA_HINT: &str = "No camera is active. Press s to retry.";

/// One line of interactive input.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Capture,
    Switch,
    Upload(PathBuf),
    Quit,
    Help,
    Empty,
    Unknown(String),
}

fn parse_command(line: &str) -> Command {
    let line = line.trim();
    let (head, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(head, rest)| (head, rest.trim()));

    match head.to_lowercase().as_str() {
        "" => Command::Empty,
        "c" | "capture" => Command::Capture,
        "s" | "switch" => Command::Switch,
        "q" | "quit" | "exit" => Command::Quit,
        "h" | "help" | "?" => Command::Help,
        "u" | "upload" if !rest.is_empty() => Command::Upload(PathBuf::from(rest)),
        _ => Command::Unknown(line.to_string()),
    }
}

/// Execute the scan command.
pub async fn execute(
    config: &KioskConfig,
    facing: Facing,
    front: Option<PathBuf>,
    back: Option<PathBuf>,
    quiet: bool,
) -> Result<()> {
    let client = AttendanceClient::new(config)?;
    let media = MediaSource::with_quality(StillImageCamera::new(front, back), config.jpeg_quality);
    let scheduler =
        CaptureScheduler::new(media, client, Arc::new(TerminalView::new(quiet))).with_config(config);

    if let Err(e) = scheduler.start(facing).await {
        scheduler.teardown().await;
        return Err(RollcallError::Device(e)).context("Camera access failed");
    }

    info!(
        server_url = %config.server_url,
        flow = %config.submit_flow,
        %facing,
        "Kiosk scanning"
    );
    hint(quiet, HELP);

    let stop = Notify::new();
    let periodic = scheduler.run(stop.notified());
    let interactive = async {
        read_commands(&scheduler, quiet).await;
        stop.notify_one();
    };
    tokio::join!(periodic, interactive);

    scheduler.teardown().await;
    hint(quiet, "Scanner stopped.");
    Ok(())
}

/// Handle stdin commands until `q` or Ctrl-C. Closed stdin leaves the
/// periodic scan running until interrupted.
async fn read_commands<B, A>(scheduler: &CaptureScheduler<B, A>, quiet: bool)
where
    B: CaptureBackend,
    A: AttendanceApi,
{
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    // Installed once so a Ctrl-C during a command is still seen.
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Interrupted");
                break;
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => {
                    if !handle(scheduler, parse_command(&line), quiet).await {
                        break;
                    }
                }
                Ok(None) => {
                    debug!("stdin closed, scanning until interrupted");
                    stdin_open = false;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to read stdin");
                    stdin_open = false;
                }
            },
        }
    }
}

/// Returns `false` when the user asked to quit.
async fn handle<B, A>(scheduler: &CaptureScheduler<B, A>, command: Command, quiet: bool) -> bool
where
    B: CaptureBackend,
    A: AttendanceApi,
{
    match command {
        Command::Capture => report(scheduler.trigger(Trigger::Manual).await, quiet),
        Command::Switch => match scheduler.switch_facing().await {
            Ok(handle) => debug!(device_id = %handle.id(), "Switched camera"),
            Err(_) => hint(quiet, NO_CAMERA_HINT),
        },
        Command::Upload(path) => match FrameCapture::from_file(&path) {
            Ok(frame) => report(scheduler.trigger(Trigger::Upload(frame)).await, quiet),
            Err(e) => {
                scheduler
                    .notifications()
                    .error(format!("Failed to read file: {}: {e}", path.display()));
            }
        },
        Command::Quit => return false,
        Command::Help => hint(quiet, HELP),
        Command::Empty => {}
        Command::Unknown(text) => {
            if !quiet {
                eprintln!("{} '{}'. {}", "Unknown command".yellow(), text, HELP);
            }
        }
    }
    true
}

fn report(attempt: CaptureAttempt, quiet: bool) {
    debug!(?attempt, "Manual capture finished");
    match attempt {
        CaptureAttempt::Busy => hint(quiet, "A scan is already in progress."),
        CaptureAttempt::NoDevice => hint(quiet, NO_CAMERA_HINT),
        CaptureAttempt::Completed(_) | CaptureAttempt::Failed { .. } => {}
    }
}
