/// Shared data structures for the detector state
///
/// These structs represent the data model that flows between
/// the acquisition layer, the prediction client and the UI layer.
use chrono::{DateTime, Local};
use iced::widget::image::Handle;
use std::io::Cursor;

use crate::error::Fault;

/// The image currently held for submission
#[derive(Debug, Clone)]
pub struct AcquiredImage {
    /// Raw bytes exactly as they will be uploaded
    pub bytes: Vec<u8>,
    /// MIME type sent with the multipart field (e.g. "image/jpeg")
    pub mime_type: String,
    /// File name sent with the multipart field
    pub file_name: String,
    /// Renderable handle over the same bytes
    pub preview: Handle,
    /// Pixel dimensions, when the header could be probed locally
    pub dimensions: Option<(u32, u32)>,
}

impl AcquiredImage {
    /// Wrap raw bytes as an acquired image.
    ///
    /// No validation happens here: bytes that are not a recognizable image
    /// are still accepted and simply have no known dimensions. The service
    /// is the one that rejects bad content.
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>, file_name: impl Into<String>) -> Self {
        let dimensions = probe_dimensions(&bytes);
        let preview = Handle::from_bytes(bytes.clone());

        Self {
            bytes,
            mime_type: mime_type.into(),
            file_name: file_name.into(),
            preview,
            dimensions,
        }
    }

    /// Short description for the status line, e.g. "leaf.png (640×480, 12 KB)"
    pub fn summary(&self) -> String {
        let kb = (self.bytes.len() as f64 / 1024.0).ceil() as u64;
        match self.dimensions {
            Some((w, h)) => format!("{} ({}×{}, {} KB)", self.file_name, w, h, kb),
            None => format!("{} ({} KB)", self.file_name, kb),
        }
    }
}

/// Read width/height from the image header without decoding pixels
fn probe_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

/// A diagnosis returned by the classification service
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    /// Disease label, e.g. "Leaf Blight"
    pub disease: String,
    /// Confidence in percent (0-100)
    pub confidence: f64,
    /// When the response arrived
    pub received_at: DateTime<Local>,
}

impl PredictionResult {
    pub fn new(disease: impl Into<String>, confidence: f64) -> Self {
        Self {
            disease: disease.into(),
            confidence,
            received_at: Local::now(),
        }
    }

    /// Confidence formatted the way the result card shows it ("92%", "87.5%")
    pub fn confidence_label(&self) -> String {
        format!("{}%", self.confidence)
    }
}

/// Where the current submission attempt stands
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SubmissionPhase {
    /// Nothing submitted, or the previous outcome was invalidated
    #[default]
    Idle,
    /// A request has been sent and no response has arrived yet
    InFlight,
    Succeeded(PredictionResult),
    Failed(Fault),
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, image::Rgb([40, 160, 60]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_dimensions_probed_from_header() {
        let image = AcquiredImage::new(png_bytes(64, 48), "image/png", "leaf.png");
        assert_eq!(image.dimensions, Some((64, 48)));
        assert!(image.summary().starts_with("leaf.png (64×48"));
    }

    #[test]
    fn test_undecodable_bytes_are_still_accepted() {
        let image = AcquiredImage::new(b"not an image".to_vec(), "text/plain", "notes.txt");
        assert_eq!(image.dimensions, None);
        assert_eq!(image.bytes, b"not an image");
        assert_eq!(image.summary(), "notes.txt (1 KB)");
    }

    #[test]
    fn test_confidence_label() {
        assert_eq!(PredictionResult::new("Leaf Blight", 92.0).confidence_label(), "92%");
        assert_eq!(PredictionResult::new("Rust", 87.5).confidence_label(), "87.5%");
    }
}
