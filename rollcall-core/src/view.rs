//! The bindings seam between the pipeline and whatever draws it.
//!
//! Components never look up UI elements themselves; they receive a [`View`]
//! at construction and address named [`Region`]s and notification ids
//! through it.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};

/// Severity of a user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    /// Errors stay on screen until dismissed by hand.
    pub fn persists(self) -> bool {
        matches!(self, Self::Error)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Success => write!(f, "success"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Identifier of one notification element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoticeId(pub u64);

impl fmt::Display for NoticeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub severity: Severity,
}

impl Notice {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
        }
    }
}

/// Named areas of the kiosk screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Region {
    /// Outcome of the latest scan.
    Result,
    /// Details of the student whose attendance was just marked.
    StudentInfo,
    /// Dashboard table of today's attendance.
    AttendanceList,
}

/// Rendered content of a region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Panel {
    pub severity: Severity,
    pub lines: Vec<String>,
}

impl Panel {
    pub fn new(severity: Severity, lines: Vec<String>) -> Self {
        Self { severity, lines }
    }

    pub fn line(severity: Severity, line: impl Into<String>) -> Self {
        Self::new(severity, vec![line.into()])
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

pub trait View: Send + Sync {
    /// Disable (busy) or re-enable the manual capture control.
    fn set_capture_busy(&self, busy: bool);

    fn show_notification(&self, id: NoticeId, notice: &Notice);

    fn dismiss_notification(&self, id: NoticeId);

    /// Replace the content of `region`; `None` hides it.
    fn render(&self, region: Region, panel: Option<&Panel>);
}

/// Everything a [`RecordingView`] observed, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    CaptureBusy(bool),
    NotificationShown(NoticeId, Notice),
    NotificationDismissed(NoticeId),
    Rendered(Region, Option<Panel>),
}

/// In-memory [`View`] that records calls. Used by tests and headless runs.
#[derive(Debug, Default)]
pub struct RecordingView {
    events: Mutex<Vec<ViewEvent>>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: ViewEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    pub fn events(&self) -> Vec<ViewEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Notifications shown and not yet dismissed.
    pub fn visible_notifications(&self) -> Vec<(NoticeId, Notice)> {
        let mut visible = BTreeMap::new();
        for event in self.events() {
            match event {
                ViewEvent::NotificationShown(id, notice) => {
                    visible.insert(id, notice);
                }
                ViewEvent::NotificationDismissed(id) => {
                    visible.remove(&id);
                }
                _ => {}
            }
        }
        visible.into_iter().collect()
    }

    /// Current content of `region`.
    pub fn region(&self, region: Region) -> Option<Panel> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ViewEvent::Rendered(r, panel) if r == region => Some(panel),
                _ => None,
            })
            .last()
            .flatten()
    }

    pub fn busy_transitions(&self) -> Vec<bool> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ViewEvent::CaptureBusy(busy) => Some(busy),
                _ => None,
            })
            .collect()
    }
}

impl View for RecordingView {
    fn set_capture_busy(&self, busy: bool) {
        self.push(ViewEvent::CaptureBusy(busy));
    }

    fn show_notification(&self, id: NoticeId, notice: &Notice) {
        self.push(ViewEvent::NotificationShown(id, notice.clone()));
    }

    fn dismiss_notification(&self, id: NoticeId) {
        self.push(ViewEvent::NotificationDismissed(id));
    }

    fn render(&self, region: Region, panel: Option<&Panel>) {
        self.push(ViewEvent::Rendered(region, panel.cloned()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_view_tracks_visible_notifications() {
        let view = RecordingView::new();
        view.show_notification(NoticeId(1), &Notice::new("one", Severity::Info));
        view.show_notification(NoticeId(2), &Notice::new("two", Severity::Error));
        view.dismiss_notification(NoticeId(1));

        let visible = view.visible_notifications();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].0, NoticeId(2));
    }

    #[test]
    fn test_recording_view_region_latest_content() {
        let view = RecordingView::new();
        assert!(view.region(Region::Result).is_none());

        view.render(Region::Result, Some(&Panel::line(Severity::Info, "first")));
        view.render(Region::Result, Some(&Panel::line(Severity::Success, "second")));
        assert_eq!(view.region(Region::Result).unwrap().text(), "second");

        view.render(Region::Result, None);
        assert!(view.region(Region::Result).is_none());
    }

    #[test]
    fn test_only_errors_persist() {
        assert!(Severity::Error.persists());
        assert!(!Severity::Warning.persists());
        assert!(!Severity::Success.persists());
        assert!(!Severity::Info.persists());
    }
}
