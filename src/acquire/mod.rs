/// Image acquisition module
///
/// This module handles:
/// - Picking and reading image files from disk
/// - Live camera sessions and frame capture
/// - The optional webcam backend (`webcam` feature)

pub mod camera;
pub mod file;
#[cfg(feature = "webcam")]
pub mod webcam;

pub use camera::{CameraSession, NoCamera, VideoSource};
