//! Camera backend that replays still images.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use image::{DynamicImage, ImageError};
use tracing::debug;

use super::{CaptureBackend, CaptureConstraints, Facing, VideoStream};
use crate::error::DeviceError;

/// Serves a fixed image per facing, as if a camera were pointed at it.
///
/// A facing without an image behaves like a missing camera.
#[derive(Debug, Clone, Default)]
pub struct StillImageCamera {
    front: Option<PathBuf>,
    back: Option<PathBuf>,
}

impl StillImageCamera {
    pub fn new(front: Option<PathBuf>, back: Option<PathBuf>) -> Self {
        Self { front, back }
    }

    fn path_for(&self, facing: Facing) -> Option<&PathBuf> {
        match facing {
            Facing::Front => self.front.as_ref(),
            Facing::Back => self.back.as_ref(),
        }
    }
}

fn map_image_error(err: ImageError) -> DeviceError {
    match err {
        ImageError::IoError(io) => match io.kind() {
            ErrorKind::NotFound => DeviceError::NotFound,
            ErrorKind::PermissionDenied => DeviceError::PermissionDenied,
            _ => DeviceError::Unreadable {
                reason: io.to_string(),
            },
        },
        other => DeviceError::Unreadable {
            reason: other.to_string(),
        },
    }
}

#[async_trait]
impl CaptureBackend for StillImageCamera {
    async fn open(
        &self,
        constraints: &CaptureConstraints,
    ) -> Result<Box<dyn VideoStream>, DeviceError> {
        let path = self
            .path_for(constraints.facing)
            .ok_or(DeviceError::NotFound)?
            .clone();

        let image = tokio::task::spawn_blocking(move || image::open(&path))
            .await
            .map_err(|e| DeviceError::Unreadable {
                reason: e.to_string(),
            })?
            .map_err(map_image_error)?;

        debug!(
            facing = %constraints.facing,
            width = image.width(),
            height = image.height(),
            "Opened still image source"
        );
        Ok(Box::new(StillStream { image: Some(image) }))
    }

    fn name(&self) -> &str {
        "still-image"
    }
}

struct StillStream {
    image: Option<DynamicImage>,
}

impl VideoStream for StillStream {
    fn current_frame(&mut self) -> Result<DynamicImage, DeviceError> {
        self.image.clone().ok_or(DeviceError::Inactive)
    }

    fn stop(&mut self) {
        self.image = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_facing_is_not_found() {
        let camera = StillImageCamera::new(None, None);
        let result = camera.open(&CaptureConstraints::new(Facing::Front)).await;
        assert_eq!(result.err(), Some(DeviceError::NotFound));
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let camera = StillImageCamera::new(
            Some(std::env::temp_dir().join("rollcall-does-not-exist.png")),
            None,
        );
        let result = camera.open(&CaptureConstraints::new(Facing::Front)).await;
        assert_eq!(result.err(), Some(DeviceError::NotFound));
    }

    #[tokio::test]
    async fn test_serves_image_until_stopped() {
        let path = std::env::temp_dir().join(format!("rollcall-still-{}.png", std::process::id()));
        image::RgbImage::from_pixel(8, 6, image::Rgb([10, 20, 30]))
            .save(&path)
            .unwrap();

        let camera = StillImageCamera::new(None, Some(path.clone()));
        let mut stream = camera
            .open(&CaptureConstraints::new(Facing::Back))
            .await
            .unwrap();
        let frame = stream.current_frame().unwrap();
        assert_eq!((frame.width(), frame.height()), (8, 6));

        stream.stop();
        assert_eq!(stream.current_frame().err(), Some(DeviceError::Inactive));
        std::fs::remove_file(path).ok();
    }
}
