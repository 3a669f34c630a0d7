//! Today command implementation.

use std::sync::Arc;

use anyhow::{Context, Result};
use rollcall_core::{AttendanceClient, KioskConfig, ResultPresenter};
use tracing::info;

use crate::terminal::TerminalView;

/// Execute the today command.
///
/// Quiet mode prints the raw records as JSON for scripting.
pub async fn execute(config: &KioskConfig, quiet: bool) -> Result<()> {
    let client = AttendanceClient::new(config)?;
    let presenter = ResultPresenter::new(Arc::new(TerminalView::new(quiet)));

    presenter.show_loading_today();
    let today = match client.fetch_today().await {
        Ok(today) => today,
        Err(e) => {
            presenter.present_today_error();
            return Err(e).context("Failed to load today's attendance");
        }
    };

    info!(
        records = today.records.len(),
        present = today.stats.present,
        "Loaded today's attendance"
    );
    presenter.present_today(&today);

    if quiet {
        println!("{}", serde_json::to_string_pretty(&today)?);
    }
    Ok(())
}
