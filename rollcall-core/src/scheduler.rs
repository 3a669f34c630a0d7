//! Capture-and-submit scheduling.
//!
//! ```text
//! Idle --(timer | manual | upload)--> Capturing --(frame)--> Submitting --> Idle
//! ```
//!
//! At most one round-trip is in flight. A trigger that arrives while the
//! scheduler is not idle is dropped, never queued. The return to `Idle` is
//! performed by a guard, so it happens on every exit path: success, capture
//! failure, panic, or the caller dropping the future.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

use crate::client::AttendanceApi;
use crate::config::{KioskConfig, DEFAULT_SCAN_INTERVAL, DEFAULT_WARMUP};
use crate::error::{DeviceError, RollcallError};
use crate::media::{CaptureBackend, DeviceHandle, Facing, FrameCapture, MediaSource};
use crate::notify::NotificationService;
use crate::outcome::AttendanceOutcome;
use crate::presenter::ResultPresenter;
use crate::view::View;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Capturing,
    Submitting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSession {
    pub state: ScanState,
    pub active_device: Option<DeviceHandle>,
}

impl Default for ScanSession {
    fn default() -> Self {
        Self {
            state: ScanState::Idle,
            active_device: None,
        }
    }
}

/// What started a capture.
#[derive(Debug)]
pub enum Trigger {
    /// Periodic scan tick.
    Timer,
    /// The manual capture button.
    Manual,
    /// A user-selected image file; bypasses the camera.
    Upload(FrameCapture),
}

impl Trigger {
    fn label(&self) -> &'static str {
        match self {
            Self::Timer => "timer",
            Self::Manual => "manual",
            Self::Upload(_) => "upload",
        }
    }
}

/// Result of one trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureAttempt {
    /// A frame was submitted and the server's answer presented.
    Completed(AttendanceOutcome),
    /// Another capture was in flight; the trigger was dropped.
    Busy,
    /// No camera is active.
    NoDevice,
    /// The camera could not produce a frame.
    Failed { reason: String },
}

/// Restores `Idle` (and the capture control) when dropped.
struct ScanGuard<'a> {
    session: &'a Mutex<ScanSession>,
    view: &'a dyn View,
    busy_shown: bool,
}

impl ScanGuard<'_> {
    fn submitting(&mut self) {
        lock(self.session).state = ScanState::Submitting;
        self.view.set_capture_busy(true);
        self.busy_shown = true;
    }
}

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        lock(self.session).state = ScanState::Idle;
        if self.busy_shown {
            self.view.set_capture_busy(false);
        }
    }
}

/// Shortest accepted scan period; `interval_at` rejects zero.
const MIN_SCAN_INTERVAL: Duration = Duration::from_millis(1);

fn lock(session: &Mutex<ScanSession>) -> std::sync::MutexGuard<'_, ScanSession> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Drives captures from timers, the manual control, and uploads.
pub struct CaptureScheduler<B: CaptureBackend, A: AttendanceApi> {
    media: tokio::sync::Mutex<MediaSource<B>>,
    api: A,
    view: Arc<dyn View>,
    notifications: Arc<NotificationService>,
    presenter: Arc<ResultPresenter>,
    session: Mutex<ScanSession>,
    interval: Duration,
    warmup: Duration,
}

impl<B: CaptureBackend, A: AttendanceApi> CaptureScheduler<B, A> {
    pub fn new(media: MediaSource<B>, api: A, view: Arc<dyn View>) -> Self {
        Self {
            media: tokio::sync::Mutex::new(media),
            api,
            notifications: Arc::new(NotificationService::new(Arc::clone(&view))),
            presenter: Arc::new(ResultPresenter::new(Arc::clone(&view))),
            view,
            session: Mutex::new(ScanSession::default()),
            interval: DEFAULT_SCAN_INTERVAL,
            warmup: DEFAULT_WARMUP,
        }
    }

    /// Set the periodic capture timing. The interval is at least 1 ms.
    pub fn with_timing(mut self, interval: Duration, warmup: Duration) -> Self {
        self.interval = interval.max(MIN_SCAN_INTERVAL);
        self.warmup = warmup;
        self
    }

    pub fn with_config(self, config: &KioskConfig) -> Self {
        self.with_timing(config.scan_interval, config.warmup)
    }

    pub fn notifications(&self) -> &NotificationService {
        &self.notifications
    }

    pub fn presenter(&self) -> &ResultPresenter {
        &self.presenter
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn session(&self) -> ScanSession {
        *lock(&self.session)
    }

    pub fn state(&self) -> ScanState {
        self.session().state
    }

    fn set_active_device(&self, handle: Option<DeviceHandle>) {
        lock(&self.session).active_device = handle;
    }

    /// Acquire the camera. Failures are reported to the user, never raised
    /// past the returned `Err`.
    #[instrument(level = "debug", skip(self))]
    pub async fn start(&self, facing: Facing) -> Result<DeviceHandle, DeviceError> {
        let result = self.media.lock().await.acquire(facing).await;
        match result {
            Ok(handle) => {
                self.set_active_device(Some(handle));
                self.notifications.success("Camera ready for attendance scanning");
                Ok(handle)
            }
            Err(e) => {
                self.set_active_device(None);
                self.notifications.error(format!("Camera access failed: {e}"));
                Err(e)
            }
        }
    }

    /// Toggle between front and back cameras.
    #[instrument(level = "debug", skip(self))]
    pub async fn switch_facing(&self) -> Result<DeviceHandle, DeviceError> {
        let result = self.media.lock().await.switch_facing().await;
        match result {
            Ok(handle) => {
                self.set_active_device(Some(handle));
                let label = handle.facing().label();
                self.notifications.success(format!("Switched to {label} Camera"));
                Ok(handle)
            }
            Err(e) => {
                self.set_active_device(None);
                self.notifications.error(format!("Camera access failed: {e}"));
                Err(e)
            }
        }
    }

    /// Claim the scheduler for one capture, or `None` if it is busy.
    fn begin(&self) -> Option<ScanGuard<'_>> {
        let mut session = lock(&self.session);
        if session.state != ScanState::Idle {
            return None;
        }
        session.state = ScanState::Capturing;
        Some(ScanGuard {
            session: &self.session,
            view: self.view.as_ref(),
            busy_shown: false,
        })
    }

    async fn capture(&self) -> Result<FrameCapture, CaptureAttempt> {
        let handle = self.session().active_device.ok_or(CaptureAttempt::NoDevice)?;
        let snapshot = self.media.lock().await.snapshot(&handle);

        snapshot.map_err(|e| {
            warn!(error = %e, device_id = %handle.id(), "Frame capture failed");
            if matches!(e, RollcallError::Device(DeviceError::Inactive)) {
                self.set_active_device(None);
            }
            self.notifications.error(format!("Capture failed: {e}"));
            CaptureAttempt::Failed {
                reason: e.to_string(),
            }
        })
    }

    /// Run one capture-and-submit cycle.
    pub async fn trigger(&self, trigger: Trigger) -> CaptureAttempt {
        let Some(mut guard) = self.begin() else {
            debug!(trigger = trigger.label(), "Capture in flight, dropping trigger");
            return CaptureAttempt::Busy;
        };

        let frame = match trigger {
            Trigger::Upload(frame) => frame,
            Trigger::Timer | Trigger::Manual => match self.capture().await {
                Ok(frame) => frame,
                Err(attempt) => return attempt,
            },
        };

        guard.submitting();
        self.presenter.show_processing();

        let outcome = self.api.submit(frame).await;
        self.presenter.present_outcome(&outcome);
        self.notifications.show(outcome.message(), outcome.severity());
        CaptureAttempt::Completed(outcome)
    }

    /// Periodic capture loop. The first capture follows the warm-up delay;
    /// ticks that fall due while a capture is in flight are skipped.
    ///
    /// Returns when `shutdown` resolves. An in-flight submission is allowed
    /// to finish first.
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.warmup, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        info!(
            interval_ms = self.interval.as_millis() as u64,
            warmup_ms = self.warmup.as_millis() as u64,
            "Periodic scanning started"
        );

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    let attempt = self.trigger(Trigger::Timer).await;
                    debug!(?attempt, "Periodic capture finished");
                }
            }
        }

        info!("Periodic scanning stopped");
    }

    /// Release the camera and cancel every pending timer. A submission still
    /// in flight may render its outcome afterwards but starts no new timers.
    pub async fn teardown(&self) {
        self.media.lock().await.release_all();
        self.set_active_device(None);
        self.notifications.shutdown();
        self.presenter.shutdown();
        info!("Scanner torn down");
    }
}
