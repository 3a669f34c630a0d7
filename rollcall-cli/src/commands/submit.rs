//! Submit command implementation.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use rollcall_core::{
    AttendanceClient, CaptureAttempt, CaptureScheduler, FrameCapture, KioskConfig, MediaSource,
    StillImageCamera, Trigger,
};
use tracing::info;

use crate::terminal::TerminalView;
use crate::utils::outcome_result;

/// Execute the submit command: upload an image file for recognition.
///
/// The file goes through the same scheduler path as the kiosk's upload
/// button, without opening a camera.
pub async fn execute(config: &KioskConfig, file: PathBuf, quiet: bool) -> Result<()> {
    let frame = FrameCapture::from_file(&file)
        .with_context(|| format!("Failed to read file: {}", file.display()))?;
    info!(path = %file.display(), bytes = frame.len(), "Read image");

    let client = AttendanceClient::new(config)?;
    let scheduler = CaptureScheduler::new(
        MediaSource::new(StillImageCamera::default()),
        client,
        Arc::new(TerminalView::new(quiet)),
    );

    let attempt = scheduler.trigger(Trigger::Upload(frame)).await;
    scheduler.teardown().await;

    let outcome = match attempt {
        CaptureAttempt::Completed(outcome) => outcome,
        other => bail!("Image was not submitted: {other:?}"),
    };
    if quiet {
        println!("{}", serde_json::to_string(&outcome)?);
    }
    outcome_result(&outcome)
}
