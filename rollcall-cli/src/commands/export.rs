//! Export command implementation.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use colored::Colorize;
use rollcall_core::{
    AttendanceClient, KioskConfig, NotificationService, ResultPresenter, RollcallError,
};

use crate::terminal::TerminalView;

/// Execute the export command.
pub async fn execute(
    config: &KioskConfig,
    date: Option<NaiveDate>,
    out: PathBuf,
    quiet: bool,
) -> Result<()> {
    let client = AttendanceClient::new(config)?;
    let view = Arc::new(TerminalView::new(quiet));
    let notifications = NotificationService::new(view.clone());
    let presenter = ResultPresenter::new(view);

    let result = client.fetch_export(date).await;
    let export = match result {
        Ok(export) => export,
        Err(e) => {
            match e {
                RollcallError::ServerRejection(_) => {
                    notifications.error("Error downloading attendance sheet")
                }
                _ => notifications.error("Network error downloading file"),
            };
            return Err(e).context("Attendance export failed");
        }
    };

    let path = presenter
        .save_export(&export, &out)
        .with_context(|| format!("Failed to write attendance sheet into {}", out.display()))?;
    notifications.success("Attendance sheet downloaded successfully");
    notifications.shutdown();

    if quiet {
        println!("{}", path.display());
    } else {
        println!("   {} {}", "Saved to:".dimmed(), path.display());
    }
    Ok(())
}
