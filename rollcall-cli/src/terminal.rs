//! Terminal rendering of the kiosk view.

use colored::{ColoredString, Colorize};
use rollcall_core::{Notice, NoticeId, Panel, Region, Severity, View};
use tracing::debug;

/// Prints notifications and panels to stdout as they appear.
///
/// A terminal cannot take text back, so dismissals and cleared regions are
/// only logged. With `quiet` set nothing is printed.
pub struct TerminalView {
    quiet: bool,
}

impl TerminalView {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

fn paint(text: &str, severity: Severity) -> ColoredString {
    match severity {
        Severity::Info => text.cyan(),
        Severity::Success => text.green(),
        Severity::Warning => text.yellow(),
        Severity::Error => text.red(),
    }
}

fn badge(severity: Severity) -> ColoredString {
    let mark = match severity {
        Severity::Info => "[i]",
        Severity::Success => "[ok]",
        Severity::Warning => "[!]",
        Severity::Error => "[x]",
    };
    paint(mark, severity).bold()
}

fn title(region: Region) -> &'static str {
    match region {
        Region::Result => "Scan result",
        Region::StudentInfo => "Student",
        Region::AttendanceList => "Today's attendance",
    }
}

/// Render a panel as a titled block.
pub fn format_panel(region: Region, panel: &Panel) -> String {
    let mut out = format!("{}", paint(&format!("== {} ==", title(region)), panel.severity).bold());
    for line in &panel.lines {
        out.push_str("\n   ");
        out.push_str(line);
    }
    out
}

impl View for TerminalView {
    fn set_capture_busy(&self, busy: bool) {
        debug!(busy, "Capture control");
    }

    fn show_notification(&self, id: NoticeId, notice: &Notice) {
        debug!(id = id.0, severity = %notice.severity, "Notification shown");
        if !self.quiet {
            println!("{} {}", badge(notice.severity), notice.message);
        }
    }

    fn dismiss_notification(&self, id: NoticeId) {
        debug!(id = id.0, "Notification dismissed");
    }

    fn render(&self, region: Region, panel: Option<&Panel>) {
        match panel {
            Some(panel) if !self.quiet => println!("\n{}", format_panel(region, panel)),
            Some(_) => {}
            None => debug!(?region, "Region cleared"),
        }
    }
}
