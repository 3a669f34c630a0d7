//! Exclusive owner of the active camera stream.

use std::io::Cursor;

use chrono::Utc;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView};
use tracing::{debug, info, instrument, warn};

use super::{CaptureBackend, CaptureConstraints, DeviceHandle, Facing, FrameCapture, VideoStream};
use crate::config::DEFAULT_JPEG_QUALITY;
use crate::error::{DeviceError, Result, RollcallError};

struct ActiveStream {
    handle: DeviceHandle,
    stream: Box<dyn VideoStream>,
}

/// Owns at most one active camera stream.
///
/// Acquiring a new stream always stops the previous one first, so two
/// devices are never held at once. The stream is stopped on drop.
pub struct MediaSource<B: CaptureBackend> {
    backend: B,
    active: Option<ActiveStream>,
    facing: Facing,
    jpeg_quality: u8,
    next_id: u64,
}

impl<B: CaptureBackend> MediaSource<B> {
    pub fn new(backend: B) -> Self {
        Self::with_quality(backend, DEFAULT_JPEG_QUALITY)
    }

    pub fn with_quality(backend: B, jpeg_quality: u8) -> Self {
        Self {
            backend,
            active: None,
            facing: Facing::default(),
            jpeg_quality: jpeg_quality.clamp(1, 100),
            next_id: 1,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Facing of the last successful acquisition.
    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn active_handle(&self) -> Option<DeviceHandle> {
        self.active.as_ref().map(|active| active.handle)
    }

    pub fn is_active(&self, handle: &DeviceHandle) -> bool {
        self.active_handle() == Some(*handle)
    }

    /// Release any current stream, then open one for `facing`.
    #[instrument(level = "debug", skip(self), fields(backend = self.backend.name()))]
    pub async fn acquire(&mut self, facing: Facing) -> std::result::Result<DeviceHandle, DeviceError> {
        self.stop_active();

        let constraints = CaptureConstraints::new(facing);
        let stream = self.backend.open(&constraints).await.map_err(|e| {
            warn!(error = %e, %facing, "Camera acquisition rejected");
            e
        })?;

        let handle = DeviceHandle::new(self.next_id, facing);
        self.next_id += 1;
        self.facing = facing;
        self.active = Some(ActiveStream { handle, stream });

        info!(device_id = %handle.id(), %facing, "Camera acquired");
        Ok(handle)
    }

    /// Toggle front/back and re-acquire.
    pub async fn switch_facing(&mut self) -> std::result::Result<DeviceHandle, DeviceError> {
        let facing = self.facing.toggled();
        self.acquire(facing).await
    }

    /// Encode the frame currently shown by the active stream.
    ///
    /// Fails with [`DeviceError::Inactive`] if `handle` has been released or
    /// superseded.
    pub fn snapshot(&mut self, handle: &DeviceHandle) -> Result<FrameCapture> {
        let active = self
            .active
            .as_mut()
            .filter(|active| active.handle == *handle)
            .ok_or(DeviceError::Inactive)?;

        let frame = active.stream.current_frame()?;
        let bytes = encode_jpeg(&frame, self.jpeg_quality)?;

        debug!(
            device_id = %handle.id(),
            width = frame.width(),
            height = frame.height(),
            bytes = bytes.len(),
            "Captured frame"
        );
        Ok(FrameCapture::jpeg(bytes, Utc::now()))
    }

    /// Stop the stream behind `handle`. Releasing a stale handle is a no-op.
    pub fn release(&mut self, handle: &DeviceHandle) {
        if self.is_active(handle) {
            self.stop_active();
        }
    }

    /// Stop whatever stream is active. Teardown hook.
    pub fn release_all(&mut self) {
        self.stop_active();
    }

    fn stop_active(&mut self) {
        if let Some(mut active) = self.active.take() {
            active.stream.stop();
            info!(device_id = %active.handle.id(), "Camera released");
        }
    }
}

impl<B: CaptureBackend> Drop for MediaSource<B> {
    fn drop(&mut self) {
        self.stop_active();
    }
}

/// Encode `image` as JPEG at `quality` (1-100).
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(RollcallError::Encoding("frame has no pixels yet".into()));
    }

    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
    DynamicImage::ImageRgb8(image.to_rgb8())
        .write_with_encoder(encoder)
        .map_err(|e| RollcallError::Encoding(format!("JPEG encoding failed: {e}")))?;

    Ok(buffer.into_inner())
}
