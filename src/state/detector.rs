/// The detector's state container
///
/// Holds the acquired image, the submission phase and the live camera
/// session, and enforces the transitions between them:
/// - a new acquisition replaces the image and drops any previous outcome
/// - nothing is acquired, cleared or submitted while a request is in flight
/// - leaving camera mode (capture, cancel, failure) always ends the session
///
/// Operations that are refused because a request is in flight return
/// `Err(Fault::Busy)` and leave the state untouched. Every other fault is
/// recorded as `SubmissionPhase::Failed` so the view can show it.
use iced::widget::image::Handle;
use tracing::{debug, info, warn};

use super::data::{AcquiredImage, PredictionResult, SubmissionPhase};
use crate::acquire::{CameraSession, VideoSource};
use crate::error::{AcquireError, Fault};

#[derive(Debug, Default)]
pub struct DetectorState {
    image: Option<AcquiredImage>,
    phase: SubmissionPhase,
    camera: Option<CameraSession>,
    /// Most recent frame from the live camera view
    live_frame: Option<Handle>,
}

impl DetectorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image(&self) -> Option<&AcquiredImage> {
        self.image.as_ref()
    }

    pub fn is_in_flight(&self) -> bool {
        self.phase == SubmissionPhase::InFlight
    }

    pub fn prediction(&self) -> Option<&PredictionResult> {
        match &self.phase {
            SubmissionPhase::Succeeded(result) => Some(result),
            _ => None,
        }
    }

    pub fn fault(&self) -> Option<&Fault> {
        match &self.phase {
            SubmissionPhase::Failed(fault) => Some(fault),
            _ => None,
        }
    }

    pub fn camera_active(&self) -> bool {
        self.camera.is_some()
    }

    pub fn live_frame(&self) -> Option<&Handle> {
        self.live_frame.as_ref()
    }

    /// Whether the submit action should be offered
    pub fn can_submit(&self) -> bool {
        self.image.is_some() && !self.is_in_flight() && !self.camera_active()
    }

    fn ensure_idle(&self) -> Result<(), Fault> {
        if self.is_in_flight() {
            debug!("Rejected operation while a prediction is in flight");
            return Err(Fault::Busy);
        }
        Ok(())
    }

    fn fail(&mut self, fault: Fault) {
        warn!("⚠️  {}", fault);
        self.phase = SubmissionPhase::Failed(fault);
    }

    /// Store a new image, invalidating any previous outcome
    fn set_image(&mut self, image: AcquiredImage) {
        info!("🖼️  Acquired {}", image.summary());
        self.image = Some(image);
        self.phase = SubmissionPhase::Idle;
    }

    /// Accept the result of reading a picked or dropped file
    pub fn select_file(&mut self, loaded: Result<AcquiredImage, AcquireError>) -> Result<(), Fault> {
        self.ensure_idle()?;

        match loaded {
            Ok(image) => self.set_image(image),
            Err(e) => {
                warn!("⚠️  {}", e);
                self.fail(Fault::FileUnreadable);
            }
        }
        Ok(())
    }

    /// Enter camera mode by opening a session on `source`.
    ///
    /// If the device cannot be opened the phase becomes
    /// `Failed(CameraDenied)` and camera mode is not entered.
    pub fn start_camera(&mut self, source: &mut dyn VideoSource) -> Result<(), Fault> {
        self.ensure_idle()?;
        if self.camera.is_some() {
            return Ok(());
        }

        match source.open() {
            Ok(session) => {
                self.camera = Some(session);
                self.live_frame = None;
            }
            Err(e) => {
                warn!("⚠️  Camera unavailable: {}", e);
                self.fail(Fault::CameraDenied);
            }
        }
        Ok(())
    }

    /// Pull a fresh frame for the live view; errors only skip the frame
    pub fn refresh_live_frame(&mut self) {
        let Some(session) = self.camera.as_mut() else {
            return;
        };

        match session.preview() {
            Ok(handle) => self.live_frame = Some(handle),
            Err(e) => debug!("Skipped live frame: {}", e),
        }
    }

    /// Snapshot the camera into the acquired image and leave camera mode.
    ///
    /// The session is consumed, so the stream is stopped on success and
    /// failure alike. Without an active session this does nothing.
    pub fn capture_image(&mut self) -> Result<(), Fault> {
        self.ensure_idle()?;
        let Some(session) = self.camera.take() else {
            return Ok(());
        };
        self.live_frame = None;

        match session.capture() {
            Ok(image) => self.set_image(image),
            Err(e) => {
                warn!("⚠️  Capture failed: {}", e);
                self.fail(Fault::CaptureFailed);
            }
        }
        Ok(())
    }

    /// Leave camera mode without capturing. Always allowed.
    pub fn stop_camera(&mut self) {
        if let Some(session) = self.camera.take() {
            session.stop();
        }
        self.live_frame = None;
    }

    /// Drop the acquired image and any outcome. Idempotent.
    pub fn clear(&mut self) -> Result<(), Fault> {
        self.ensure_idle()?;
        if self.image.take().is_some() {
            info!("🧹 Cleared image");
        }
        self.phase = SubmissionPhase::Idle;
        Ok(())
    }

    /// Start a submission.
    ///
    /// Without an image this records `Failed(NoImage)` and returns it, so
    /// the caller performs no I/O. Otherwise the phase becomes `InFlight`
    /// and a copy of the image to upload is returned.
    pub fn begin_submission(&mut self) -> Result<AcquiredImage, Fault> {
        self.ensure_idle()?;

        let Some(image) = self.image.clone() else {
            self.fail(Fault::NoImage);
            return Err(Fault::NoImage);
        };

        self.phase = SubmissionPhase::InFlight;
        Ok(image)
    }

    /// Record the outcome of the request started by `begin_submission`
    pub fn finish_submission(&mut self, outcome: Result<PredictionResult, Fault>) {
        if !self.is_in_flight() {
            debug!("Ignoring prediction outcome with no request in flight");
            return;
        }

        match outcome {
            Ok(result) => self.phase = SubmissionPhase::Succeeded(result),
            Err(fault) => self.fail(fault),
        }
    }
}
