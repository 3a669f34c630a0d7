//! Rendering of scan outcomes and the attendance dashboard.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, NaiveDateTime};
use tracing::{debug, info};

use crate::error::Result;
use crate::outcome::{AttendanceOutcome, CsvExport, TodayAttendance};
use crate::timer::TimerSet;
use crate::view::{Panel, Region, Severity, View};

/// How long a non-error scan result stays visible.
pub const RESULT_TTL: Duration = Duration::from_millis(5000);

/// How long the student-info panel stays visible after a match.
pub const STUDENT_INFO_TTL: Duration = Duration::from_millis(3000);

pub const NO_RECORDS_MESSAGE: &str = "No attendance records for today.";

pub const LOAD_ERROR_MESSAGE: &str = "Error loading attendance data.";

const TABLE_HEADERS: [&str; 3] = ["University ID", "Name", "Time"];

/// Renders outcomes and tables into the regions of a [`View`].
///
/// Each region owns a single hide timer; rendering into a region replaces
/// its pending timer, so an older timer can never hide newer content.
pub struct ResultPresenter {
    view: Arc<dyn View>,
    timers: TimerSet<Region>,
}

impl ResultPresenter {
    pub fn new(view: Arc<dyn View>) -> Self {
        Self {
            view,
            timers: TimerSet::new(),
        }
    }

    fn show(&self, region: Region, panel: Panel, ttl: Duration) {
        let persists = panel.severity.persists();
        self.view.render(region, Some(&panel));

        if persists {
            self.timers.cancel(&region);
        } else {
            let view = Arc::clone(&self.view);
            self.timers.schedule(region, ttl, move || view.render(region, None));
        }
    }

    /// Busy indicator shown while a frame is being recognised.
    pub fn show_processing(&self) {
        self.show(
            Region::Result,
            Panel::line(Severity::Info, "Processing image..."),
            RESULT_TTL,
        );
    }

    pub fn present_outcome(&self, outcome: &AttendanceOutcome) {
        debug!(severity = %outcome.severity(), "Presenting outcome");
        self.show(Region::Result, outcome_panel(outcome), RESULT_TTL);

        if let Some(panel) = student_panel(outcome) {
            self.show(Region::StudentInfo, panel, STUDENT_INFO_TTL);
        }
    }

    pub fn show_loading_today(&self) {
        self.timers.cancel(&Region::AttendanceList);
        self.view.render(
            Region::AttendanceList,
            Some(&Panel::line(Severity::Info, "Loading attendance...")),
        );
    }

    pub fn present_today(&self, today: &TodayAttendance) {
        self.timers.cancel(&Region::AttendanceList);
        self.view
            .render(Region::AttendanceList, Some(&attendance_table(today)));
    }

    pub fn present_today_error(&self) {
        self.timers.cancel(&Region::AttendanceList);
        self.view.render(
            Region::AttendanceList,
            Some(&Panel::line(Severity::Error, LOAD_ERROR_MESSAGE)),
        );
    }

    /// Write an exported sheet into `dir` under the server-chosen name.
    pub fn save_export(&self, export: &CsvExport, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(export_file_name(&export.filename));
        std::fs::write(&path, &export.csv)?;
        info!(path = %path.display(), bytes = export.csv.len(), "Attendance sheet saved");
        Ok(path)
    }

    /// Cancel all pending hide timers and stop scheduling new ones.
    /// Teardown hook.
    pub fn shutdown(&self) {
        self.timers.close();
    }
}

/// Only the last path component of a server-provided name is trusted.
fn export_file_name(name: &str) -> String {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("attendance.csv")
        .to_string()
}

pub fn outcome_panel(outcome: &AttendanceOutcome) -> Panel {
    let severity = outcome.severity();
    let lines = match outcome {
        AttendanceOutcome::Matched {
            person_name,
            person_id,
            timestamp,
            message,
        } => vec![
            message.clone(),
            format!("Name: {person_name}"),
            format!("Roll number: {person_id}"),
            format!("Time: {timestamp}"),
        ],
        AttendanceOutcome::AlreadyMarked { timestamp, message } => {
            vec![message.clone(), format!("Time: {timestamp}")]
        }
        AttendanceOutcome::NoMatch { message } => vec![format!("Error: {message}")],
        AttendanceOutcome::TransportError { message } => {
            vec![message.clone(), "Please try again.".to_string()]
        }
    };
    Panel::new(severity, lines)
}

fn student_panel(outcome: &AttendanceOutcome) -> Option<Panel> {
    match outcome {
        AttendanceOutcome::Matched {
            person_name,
            person_id,
            timestamp,
            ..
        } if !person_name.is_empty() => Some(Panel::new(
            Severity::Success,
            vec![
                "Attendance Marked".to_string(),
                format!("Name: {person_name}"),
                format!("University ID: {person_id}"),
                format!("Time: {timestamp}"),
            ],
        )),
        _ => None,
    }
}

/// Show a record time as a local time of day, or verbatim if unparseable.
pub fn format_record_time(raw: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Local).format("%H:%M:%S").to_string();
    }
    for pattern in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, pattern) {
            return naive.format("%H:%M:%S").to_string();
        }
    }
    raw.to_string()
}

pub fn attendance_table(today: &TodayAttendance) -> Panel {
    if today.records.is_empty() {
        return Panel::line(Severity::Info, NO_RECORDS_MESSAGE);
    }

    let rows: Vec<[String; 3]> = today
        .records
        .iter()
        .map(|r| [r.id.clone(), r.name.clone(), format_record_time(&r.timestamp)])
        .collect();

    let mut widths = TABLE_HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_row = |cells: [&str; 3]| {
        format!(
            "{:<w0$}  {:<w1$}  {}",
            cells[0],
            cells[1],
            cells[2],
            w0 = widths[0],
            w1 = widths[1]
        )
        .trim_end()
        .to_string()
    };

    let stats = today.stats;
    let mut lines = vec![
        format!(
            "Present: {} | Absent: {} | Total: {}",
            stats.present, stats.absent, stats.total
        ),
        format_row(TABLE_HEADERS),
        "-".repeat(widths.iter().sum::<usize>() + 4),
    ];
    lines.extend(
        rows.iter()
            .map(|row| format_row([row[0].as_str(), row[1].as_str(), row[2].as_str()])),
    );

    Panel::new(Severity::Info, lines)
}
