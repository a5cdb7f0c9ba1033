/// User-facing faults
///
/// Every fault that can end an acquisition or submission attempt. The
/// `Display` text of each variant is exactly what the window shows, so the
/// messages here are part of the UI contract.
use std::path::PathBuf;
use thiserror::Error;

/// Generic message used when the service gives no usable explanation
pub const GENERIC_FAULT: &str = "An error occurred";

/// A terminal, user-visible fault for the current attempt
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Fault {
    /// Submit was pressed with no image acquired
    #[error("Please select an image")]
    NoImage,

    /// An operation was attempted while a prediction is in flight
    #[error("A prediction is already in progress")]
    Busy,

    /// The capture device could not be opened (denied, missing, or broken)
    #[error("Camera access denied")]
    CameraDenied,

    /// The camera was open but no usable frame could be captured
    #[error("Could not capture a frame from the camera")]
    CaptureFailed,

    /// The chosen file could not be read from disk
    #[error("Could not read the selected file")]
    FileUnreadable,

    /// The service rejected the image and explained why
    #[error("{0}")]
    Remote(String),

    /// Transport failure or a response we could not make sense of
    #[error("{}", GENERIC_FAULT)]
    Generic,
}

/// Failure while loading an image from disk
#[derive(Debug, Clone, Error)]
pub enum AcquireError {
    #[error("failed to read {path}: {reason}")]
    Read { path: PathBuf, reason: String },
}
