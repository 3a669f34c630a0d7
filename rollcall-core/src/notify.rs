//! Transient, auto-dismissing notifications.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::timer::TimerSet;
use crate::view::{Notice, NoticeId, Severity, View};

/// How long non-error notifications stay visible.
pub const NOTIFICATION_TTL: Duration = Duration::from_millis(5000);

/// Shows notices through a [`View`] and dismisses them on a timer.
///
/// Each notification is a separate element with its own timer, so showing
/// the same message twice yields two elements that expire independently.
/// Error notices never expire; they stay until [`dismiss`](Self::dismiss).
pub struct NotificationService {
    view: Arc<dyn View>,
    ttl: Duration,
    next_id: AtomicU64,
    timers: TimerSet<NoticeId>,
}

impl NotificationService {
    pub fn new(view: Arc<dyn View>) -> Self {
        Self::with_ttl(view, NOTIFICATION_TTL)
    }

    pub fn with_ttl(view: Arc<dyn View>, ttl: Duration) -> Self {
        Self {
            view,
            ttl,
            next_id: AtomicU64::new(1),
            timers: TimerSet::new(),
        }
    }

    pub fn show(&self, message: impl Into<String>, severity: Severity) -> NoticeId {
        let id = NoticeId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let notice = Notice::new(message, severity);
        debug!(id = id.0, severity = %severity, message = %notice.message, "Showing notification");

        self.view.show_notification(id, &notice);

        if !severity.persists() {
            let view = Arc::clone(&self.view);
            self.timers.schedule(id, self.ttl, move || {
                view.dismiss_notification(id);
            });
        }
        id
    }

    pub fn info(&self, message: impl Into<String>) -> NoticeId {
        self.show(message, Severity::Info)
    }

    pub fn success(&self, message: impl Into<String>) -> NoticeId {
        self.show(message, Severity::Success)
    }

    pub fn warning(&self, message: impl Into<String>) -> NoticeId {
        self.show(message, Severity::Warning)
    }

    pub fn error(&self, message: impl Into<String>) -> NoticeId {
        self.show(message, Severity::Error)
    }

    /// Manual dismissal (the close button).
    pub fn dismiss(&self, id: NoticeId) {
        self.timers.cancel(&id);
        self.view.dismiss_notification(id);
    }

    /// Cancel every pending auto-dismiss. Called on teardown; notices shown
    /// afterwards are rendered but never scheduled for dismissal.
    pub fn shutdown(&self) {
        self.timers.close();
    }
}
