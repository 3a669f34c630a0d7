//! Results produced by the attendance server, as seen by the kiosk.

use serde::{Deserialize, Serialize};

use crate::view::Severity;

/// Classified result of submitting one frame for recognition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttendanceOutcome {
    /// Attendance was recorded for a recognised student.
    Matched {
        person_name: String,
        person_id: String,
        timestamp: String,
        message: String,
    },
    /// The student was recognised but had already been marked today.
    AlreadyMarked { timestamp: String, message: String },
    /// The server processed the frame but found no match (`success=false`).
    NoMatch { message: String },
    /// No usable answer came back from the server.
    TransportError { message: String },
}

impl AttendanceOutcome {
    pub fn severity(&self) -> Severity {
        match self {
            Self::Matched { .. } => Severity::Success,
            Self::AlreadyMarked { .. } => Severity::Warning,
            Self::NoMatch { .. } | Self::TransportError { .. } => Severity::Error,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Matched { message, .. }
            | Self::AlreadyMarked { message, .. }
            | Self::NoMatch { message }
            | Self::TransportError { message } => message,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, Self::Matched { .. })
    }
}

/// One row of today's attendance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    #[serde(rename = "university_id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "time")]
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceStats {
    pub present: u32,
    pub absent: u32,
    pub total: u32,
}

/// Body of `GET /attendance/today-attendance`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodayAttendance {
    #[serde(rename = "attendance", default)]
    pub records: Vec<AttendanceRecord>,
    #[serde(default)]
    pub stats: AttendanceStats,
}

/// CSV attendance sheet ready to be written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub filename: String,
    pub csv: Vec<u8>,
}
