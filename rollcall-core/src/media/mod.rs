//! Camera access and still-frame capture.
//!
//! A [`MediaSource`] owns at most one live camera stream at a time. Camera
//! implementations plug in through [`CaptureBackend`]:
//!
//! - **StillImageCamera** - serves frames from image files (kiosk replay, demos)
//! - **MockCamera** - synthetic frames with injectable failures (testing)
//!
//! ## Quick Start
//!
//! ```no_run
//! use rollcall_core::media::{Facing, MediaSource, MockCamera};
//!
//! # async fn example() -> rollcall_core::Result<()> {
//! let mut media = MediaSource::new(MockCamera::new());
//! let handle = media.acquire(Facing::Front).await?;
//! let frame = media.snapshot(&handle)?;
//! println!("captured {} bytes", frame.len());
//! media.release(&handle);
//! # Ok(())
//! # }
//! ```

mod mock;
mod source;
mod still;

pub use mock::{MockCamera, MockCameraStats};
pub use source::{encode_jpeg, MediaSource};
pub use still::StillImageCamera;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use image::DynamicImage;

use crate::error::{DeviceError, Result};

/// Preferred capture width; backends may negotiate a different one.
pub const IDEAL_WIDTH: u32 = 1280;

/// Preferred capture height; backends may negotiate a different one.
pub const IDEAL_HEIGHT: u32 = 720;

/// Logical camera orientation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Facing {
    /// User-facing camera.
    #[default]
    Front,
    /// Environment-facing camera.
    Back,
}

impl Facing {
    pub fn toggled(self) -> Self {
        match self {
            Self::Front => Self::Back,
            Self::Back => Self::Front,
        }
    }

    /// Human label used in notifications ("Front Camera").
    pub fn label(self) -> &'static str {
        match self {
            Self::Front => "Front",
            Self::Back => "Back",
        }
    }
}

impl fmt::Display for Facing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Front => write!(f, "front"),
            Self::Back => write!(f, "back"),
        }
    }
}

impl FromStr for Facing {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "front" | "user" => Ok(Self::Front),
            "back" | "environment" | "rear" => Ok(Self::Back),
            other => Err(format!("unknown facing '{other}' (expected 'front' or 'back')")),
        }
    }
}

/// What a backend is asked for when a stream is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConstraints {
    pub facing: Facing,
    pub ideal_width: u32,
    pub ideal_height: u32,
}

impl CaptureConstraints {
    pub fn new(facing: Facing) -> Self {
        Self {
            facing,
            ideal_width: IDEAL_WIDTH,
            ideal_height: IDEAL_HEIGHT,
        }
    }
}

/// Opaque identifier of one acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(u64);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cam-{}", self.0)
    }
}

/// Proof of an acquisition. Only the handle returned by the most recent
/// successful [`MediaSource::acquire`] is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceHandle {
    id: DeviceId,
    facing: Facing,
}

impl DeviceHandle {
    pub(crate) fn new(id: u64, facing: Facing) -> Self {
        Self {
            id: DeviceId(id),
            facing,
        }
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }
}

/// An encoded still image and the moment it was taken.
///
/// Frames are consumed once by the attendance client and never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameCapture {
    bytes: Vec<u8>,
    captured_at: DateTime<Utc>,
    filename: String,
    content_type: String,
}

impl FrameCapture {
    /// A JPEG snapshot named after its capture time (`scan-<timestamp>.jpg`).
    pub fn jpeg(bytes: Vec<u8>, captured_at: DateTime<Utc>) -> Self {
        let filename = format!("scan-{}.jpg", captured_at.format("%Y-%m-%dT%H-%M-%S-%3fZ"));
        Self {
            bytes,
            captured_at,
            filename,
            content_type: "image/jpeg".to_string(),
        }
    }

    /// A user-provided image, submitted as-is under its own name.
    pub fn upload(bytes: Vec<u8>, filename: impl Into<String>) -> Self {
        let filename = filename.into();
        let content_type = guess_content_type(&filename).to_string();
        Self {
            bytes,
            captured_at: Utc::now(),
            filename,
            content_type,
        }
    }

    /// Read an image file for the upload flow.
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.jpg")
            .to_string();
        Ok(Self::upload(bytes, filename))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Capture time as a local time of day (`HH:MM:SS`).
    pub fn local_time(&self) -> String {
        self.captured_at
            .with_timezone(&Local)
            .format("%H:%M:%S")
            .to_string()
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }
}

fn guess_content_type(filename: &str) -> &'static str {
    match Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|s| s.to_lowercase())
        .as_deref()
    {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}

/// A source of camera streams (one per physical or simulated device).
///
/// Implementations must be thread-safe (`Send + Sync`).
#[async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Open a live stream matching `constraints`.
    ///
    /// Rejections map to [`DeviceError::PermissionDenied`],
    /// [`DeviceError::NotFound`] or [`DeviceError::Busy`].
    async fn open(
        &self,
        constraints: &CaptureConstraints,
    ) -> std::result::Result<Box<dyn VideoStream>, DeviceError>;

    /// Backend name for logs.
    fn name(&self) -> &str;
}

/// A live stream handed out by a [`CaptureBackend`].
pub trait VideoStream: Send {
    /// The frame currently on screen.
    fn current_frame(&mut self) -> std::result::Result<DynamicImage, DeviceError>;

    /// Stop the underlying device. Must be idempotent.
    fn stop(&mut self);
}
