/// Custom widgets for the detector window
///
/// - `confidence.rs` - canvas gauge for the prediction confidence

pub mod confidence;

pub use confidence::ConfidenceBar;
