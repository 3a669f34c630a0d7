//! Rollcall Core - capture-and-submit pipeline for attendance kiosks
//!
//! This crate turns a camera into an attendance terminal: it grabs still
//! frames, ships them to a face-recognition server, and reports who was
//! marked present.
//!
//! # Features
//!
//! - Single-owner camera access with front/back switching
//! - Periodic and manual capture with a strict one-in-flight guard
//! - Multipart and base64-JSON submission flows
//! - Self-dismissing notifications and result panels
//! - Digit-only input masking for registration fields
//!
//! The `network` feature (on by default) gates everything that needs a
//! runtime, a camera, or HTTP. Field masking, configuration, and the data
//! model build without it.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use rollcall_core::{
//!     AttendanceClient, CaptureScheduler, Facing, KioskConfig, MediaSource, MockCamera,
//!     RecordingView, Trigger,
//! };
//!
//! # async fn example() -> rollcall_core::Result<()> {
//! let config = KioskConfig::from_env();
//! let client = AttendanceClient::new(&config)?;
//! let view = Arc::new(RecordingView::new());
//!
//! let scheduler = CaptureScheduler::new(MediaSource::new(MockCamera::new()), client, view)
//!     .with_config(&config);
//! scheduler.start(Facing::Front).await?;
//!
//! // One manual capture; `run` drives the periodic ones.
//! let attempt = scheduler.trigger(Trigger::Manual).await;
//! println!("{attempt:?}");
//!
//! scheduler.teardown().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod mask;
pub mod outcome;
pub mod view;

#[cfg(feature = "network")]
pub mod client;
#[cfg(feature = "network")]
pub mod media;
#[cfg(feature = "network")]
pub mod notify;
#[cfg(feature = "network")]
pub mod presenter;
#[cfg(feature = "network")]
pub mod scheduler;
#[cfg(feature = "network")]
pub mod timer;

// Re-export main types for convenience
pub use config::{KioskConfig, SubmitFlow};
pub use error::{DeviceError, Result, RollcallError};
pub use mask::{validate_phone, validate_university_id, Field, FieldMask, Masked, Validity};
pub use outcome::{AttendanceOutcome, AttendanceRecord, AttendanceStats, CsvExport, TodayAttendance};
pub use view::{Notice, NoticeId, Panel, RecordingView, Region, Severity, View, ViewEvent};

#[cfg(feature = "network")]
pub use client::{AttendanceApi, AttendanceClient};
#[cfg(feature = "network")]
pub use media::{
    CaptureBackend, CaptureConstraints, DeviceHandle, Facing, FrameCapture, MediaSource,
    MockCamera, StillImageCamera, VideoStream,
};
#[cfg(feature = "network")]
pub use notify::NotificationService;
#[cfg(feature = "network")]
pub use presenter::ResultPresenter;
#[cfg(feature = "network")]
pub use scheduler::{CaptureAttempt, CaptureScheduler, ScanSession, ScanState, Trigger};
