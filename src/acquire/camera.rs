/// Live camera sessions
///
/// A `VideoSource` opens the capture device and hands back a `CameraSession`.
/// The session owns the stream and is the only thing allowed to stop it:
/// `capture()` and `stop()` consume the session, and `Drop` covers every
/// other exit path, so the device tracks are released exactly once.
use iced::widget::image::Handle;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbImage};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

use crate::state::AcquiredImage;

/// File name given to captured frames
pub const CAPTURE_FILE_NAME: &str = "captured-image.jpg";

/// JPEG quality for captured frames
const JPEG_QUALITY: u8 = 90;

#[derive(Debug, Error)]
pub enum CameraError {
    #[error("no capture device is available")]
    Unavailable,

    #[error("camera device error: {0}")]
    Device(String),

    #[error("camera returned an empty frame")]
    EmptyFrame,

    #[error("failed to encode frame: {0}")]
    Encode(#[from] image::ImageError),
}

/// Something that can open a capture device
pub trait VideoSource {
    fn open(&mut self) -> Result<CameraSession, CameraError>;
}

/// An open video stream
pub trait VideoStream {
    /// Grab the current frame as an RGB raster of the stream's dimensions
    fn frame(&mut self) -> Result<RgbImage, CameraError>;

    /// Stop every track of the stream and release the device
    fn stop(&mut self);
}

/// Source used when no capture backend is compiled in
#[derive(Debug, Default)]
pub struct NoCamera;

impl VideoSource for NoCamera {
    fn open(&mut self) -> Result<CameraSession, CameraError> {
        Err(CameraError::Unavailable)
    }
}

/// A live handle on an opened capture device
pub struct CameraSession {
    stream: Box<dyn VideoStream>,
    stopped: bool,
}

impl CameraSession {
    pub fn new(stream: Box<dyn VideoStream>) -> Self {
        info!("📷 Camera session started");
        Self {
            stream,
            stopped: false,
        }
    }

    /// Current frame as an RGBA handle for the live view
    pub fn preview(&mut self) -> Result<Handle, CameraError> {
        let frame = self.stream.frame()?;
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Err(CameraError::EmptyFrame);
        }

        let rgba = DynamicImage::ImageRgb8(frame).to_rgba8();
        Ok(Handle::from_rgba(width, height, rgba.into_raw()))
    }

    /// Snapshot the current frame as a JPEG and end the session.
    ///
    /// The stream is stopped whether or not the capture succeeded.
    pub fn capture(mut self) -> Result<AcquiredImage, CameraError> {
        let encoded = self
            .stream
            .frame()
            .and_then(|frame| encode_jpeg(&frame));
        self.release();

        let bytes = encoded?;
        info!("📸 Captured frame ({} bytes)", bytes.len());
        Ok(AcquiredImage::new(bytes, "image/jpeg", CAPTURE_FILE_NAME))
    }

    /// End the session without capturing
    pub fn stop(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.stopped {
            return;
        }
        self.stream.stop();
        self.stopped = true;
        info!("📷 Camera session stopped");
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        if !self.stopped {
            debug!("Camera session dropped while live, stopping stream");
        }
        self.release();
    }
}

impl fmt::Debug for CameraSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CameraSession")
            .field("stopped", &self.stopped)
            .finish()
    }
}

/// Encode a raster frame as JPEG
pub fn encode_jpeg(frame: &RgbImage) -> Result<Vec<u8>, CameraError> {
    if frame.width() == 0 || frame.height() == 0 {
        return Err(CameraError::EmptyFrame);
    }

    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY).encode_image(frame)?;
    Ok(out)
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedSource;
    use super::*;

    #[test]
    fn test_capture_encodes_jpeg_and_stops_all_tracks() {
        let mut source = ScriptedSource::with_frame(32, 24);
        let session = source.open().unwrap();

        let image = session.capture().unwrap();

        assert_eq!(image.mime_type, "image/jpeg");
        assert_eq!(image.file_name, CAPTURE_FILE_NAME);
        assert_eq!(image.dimensions, Some((32, 24)));
        assert_eq!(&image.bytes[..2], &[0xFF, 0xD8]);

        let probe = source.last_probe();
        assert_eq!(probe.live_tracks(), 0);
        assert_eq!(probe.stop_calls(), 1);
    }

    #[test]
    fn test_failed_capture_still_stops_stream() {
        let mut source = ScriptedSource::without_frames();
        let session = source.open().unwrap();

        assert!(session.capture().is_err());
        assert_eq!(source.last_probe().live_tracks(), 0);
        assert_eq!(source.last_probe().stop_calls(), 1);
    }

    #[test]
    fn test_stop_and_drop_release_once() {
        let mut source = ScriptedSource::with_frame(8, 8);
        source.open().unwrap().stop();
        assert_eq!(source.last_probe().stop_calls(), 1);

        {
            let _session = source.open().unwrap();
        }
        assert_eq!(source.last_probe().live_tracks(), 0);
        assert_eq!(source.last_probe().stop_calls(), 1);
    }

    #[test]
    fn test_preview_keeps_stream_live() {
        let mut source = ScriptedSource::with_frame(4, 4);
        let mut session = source.open().unwrap();

        assert!(session.preview().is_ok());
        assert_eq!(source.last_probe().live_tracks(), 2);
        drop(session);
        assert_eq!(source.last_probe().live_tracks(), 0);
    }

    #[test]
    fn test_empty_frame_is_rejected() {
        let empty = RgbImage::new(0, 0);
        assert!(matches!(encode_jpeg(&empty), Err(CameraError::EmptyFrame)));
    }

    #[test]
    fn test_no_camera_is_unavailable() {
        assert!(matches!(NoCamera.open(), Err(CameraError::Unavailable)));
    }
}
