/// Webcam backend built on nokhwa
///
/// Only compiled with the `webcam` feature. Frames are decoded to RGB by
/// nokhwa and copied into this crate's `image` buffers, so the two crates'
/// `image` versions never have to agree.
use image::RgbImage;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;
use tracing::{info, warn};

use super::camera::{CameraError, CameraSession, VideoSource, VideoStream};

/// Opens the system camera at a fixed index
#[derive(Debug, Clone, Copy)]
pub struct WebcamSource {
    index: u32,
}

impl WebcamSource {
    pub fn new(index: u32) -> Self {
        Self { index }
    }
}

impl VideoSource for WebcamSource {
    fn open(&mut self) -> Result<CameraSession, CameraError> {
        let format =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);

        let mut camera = Camera::new(CameraIndex::Index(self.index), format)
            .map_err(|e| CameraError::Device(e.to_string()))?;
        camera
            .open_stream()
            .map_err(|e| CameraError::Device(e.to_string()))?;

        info!("🎥 Opened camera {} ({})", self.index, camera.info().human_name());

        Ok(CameraSession::new(Box::new(WebcamStream { camera })))
    }
}

struct WebcamStream {
    camera: Camera,
}

impl VideoStream for WebcamStream {
    fn frame(&mut self) -> Result<RgbImage, CameraError> {
        let buffer = self
            .camera
            .frame()
            .map_err(|e| CameraError::Device(e.to_string()))?;
        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| CameraError::Device(e.to_string()))?;

        let (width, height) = (decoded.width(), decoded.height());
        RgbImage::from_raw(width, height, decoded.into_raw()).ok_or(CameraError::EmptyFrame)
    }

    fn stop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            warn!("⚠️  Failed to stop camera stream: {}", e);
        }
    }
}
