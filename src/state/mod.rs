/// State management module
///
/// This module holds all application state:
/// - Shared data structures (data.rs)
/// - The acquisition/submission state machine (detector.rs)

pub mod data;
pub mod detector;

pub use data::{AcquiredImage, PredictionResult};
pub use detector::DetectorState;
