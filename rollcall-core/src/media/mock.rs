//! Synthetic camera for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use image::{DynamicImage, Rgb, RgbImage};

use super::{CaptureBackend, CaptureConstraints, Facing, VideoStream};
use crate::error::DeviceError;

/// Counters shared between a [`MockCamera`] and the streams it opened.
#[derive(Debug, Default)]
pub struct MockCameraStats {
    opened: AtomicUsize,
    stopped: AtomicUsize,
    open_now: AtomicUsize,
    max_open: AtomicUsize,
    frames: AtomicUsize,
}

impl MockCameraStats {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn stopped(&self) -> usize {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Streams currently open.
    pub fn open_now(&self) -> usize {
        self.open_now.load(Ordering::SeqCst)
    }

    /// Highest number of streams ever open at the same time.
    pub fn max_open(&self) -> usize {
        self.max_open.load(Ordering::SeqCst)
    }

    pub fn frames(&self) -> usize {
        self.frames.load(Ordering::SeqCst)
    }
}

/// Mock camera producing a small deterministic test pattern.
/// WARNING: Frames contain no faces - for pipeline tests only!
///
/// Clones share failure queues and counters, so a test can keep one clone
/// while a `MediaSource` owns the other.
#[derive(Debug, Clone)]
pub struct MockCamera {
    width: u32,
    height: u32,
    facings: Vec<Facing>,
    failures: Arc<Mutex<VecDeque<DeviceError>>>,
    stats: Arc<MockCameraStats>,
}

impl MockCamera {
    pub fn new() -> Self {
        Self::with_resolution(64, 36)
    }

    pub fn with_resolution(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            facings: vec![Facing::Front, Facing::Back],
            failures: Arc::default(),
            stats: Arc::default(),
        }
    }

    /// A device that only has a front camera.
    pub fn front_only() -> Self {
        Self {
            facings: vec![Facing::Front],
            ..Self::new()
        }
    }

    /// The first open fails with `error`.
    pub fn failing(error: DeviceError) -> Self {
        let camera = Self::new();
        camera.fail_next_with(error);
        camera
    }

    /// Queue a failure for the next `open` call.
    pub fn fail_next_with(&self, error: DeviceError) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(error);
    }

    pub fn stats(&self) -> Arc<MockCameraStats> {
        Arc::clone(&self.stats)
    }
}

impl Default for MockCamera {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaptureBackend for MockCamera {
    async fn open(
        &self,
        constraints: &CaptureConstraints,
    ) -> Result<Box<dyn VideoStream>, DeviceError> {
        let queued = self
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        if let Some(error) = queued {
            return Err(error);
        }
        if !self.facings.contains(&constraints.facing) {
            return Err(DeviceError::NotFound);
        }

        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        let now = self.stats.open_now.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.max_open.fetch_max(now, Ordering::SeqCst);

        Ok(Box::new(MockStream {
            width: self.width,
            height: self.height,
            tint: match constraints.facing {
                Facing::Front => 40,
                Facing::Back => 160,
            },
            stats: Arc::clone(&self.stats),
            stopped: false,
        }))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

struct MockStream {
    width: u32,
    height: u32,
    tint: u8,
    stats: Arc<MockCameraStats>,
    stopped: bool,
}

impl VideoStream for MockStream {
    fn current_frame(&mut self) -> Result<DynamicImage, DeviceError> {
        if self.stopped {
            return Err(DeviceError::Inactive);
        }
        let n = self.stats.frames.fetch_add(1, Ordering::SeqCst) as u32;
        let (w, h, tint) = (self.width, self.height, self.tint);
        let img = RgbImage::from_fn(w, h, |x, y| {
            let r = ((x + n) * 255 / w.max(1)) as u8;
            let g = (y * 255 / h.max(1)) as u8;
            Rgb([r, g, tint])
        });
        Ok(DynamicImage::ImageRgb8(img))
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.stats.stopped.fetch_add(1, Ordering::SeqCst);
            self.stats.open_now.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Drop for MockStream {
    fn drop(&mut self) {
        self.stop();
    }
}
