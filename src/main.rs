use clap::Parser;
use iced::widget::{
    button, column, container, horizontal_space, row, text, Canvas, Column, Image,
};
use iced::{event, window, Alignment, Color, Element, Length, Subscription, Task, Theme};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod acquire;
mod client;
mod config;
mod error;
mod state;
mod ui;

use acquire::VideoSource;
use client::{Classifier, HttpClassifier};
use config::{Cli, Settings};
use error::{AcquireError, Fault};
use state::{AcquiredImage, DetectorState, PredictionResult};

const ACCENT: Color = Color::from_rgb(0.13, 0.50, 0.24);
const FAULT_COLOR: Color = Color::from_rgb(0.80, 0.20, 0.20);
const INFO_COLOR: Color = Color::from_rgb(0.20, 0.45, 0.85);

/// Main application state
struct CropDetector {
    /// Acquired image, submission phase and camera session
    state: DetectorState,
    /// The remote prediction service
    classifier: Arc<dyn Classifier>,
    /// Capture device backend
    camera: Box<dyn VideoSource>,
    /// How often the live camera view is refreshed
    preview_refresh: Duration,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    /// User clicked the drop zone
    PickFile,
    /// A file was dropped onto the window
    FileDropped(PathBuf),
    /// Background file read completed
    FileLoaded(Result<AcquiredImage, AcquireError>),
    StartCamera,
    /// Refresh the live camera view
    CameraTick,
    Capture,
    StopCamera,
    Clear,
    /// User clicked "Detect Disease"
    Submit,
    /// The prediction request resolved
    PredictionReady(Result<PredictionResult, Fault>),
}

impl CropDetector {
    /// Create a new instance of the application
    fn new(settings: Settings, classifier: Arc<dyn Classifier>) -> (Self, Task<Message>) {
        info!("🌱 Crop Disease Detector ready");

        (
            CropDetector {
                state: DetectorState::new(),
                classifier,
                camera: camera_source(&settings),
                preview_refresh: settings.preview_refresh(),
            },
            Task::none(),
        )
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::PickFile => {
                if self.state.is_in_flight() {
                    return Task::none();
                }
                // Show the native file picker dialog
                if let Some(path) = acquire::file::pick_image() {
                    return Task::perform(acquire::file::read_image(path), Message::FileLoaded);
                }
                Task::none()
            }
            Message::FileDropped(path) => {
                if self.state.is_in_flight() || self.state.camera_active() {
                    info!("Ignored dropped file {}", path.display());
                    return Task::none();
                }
                Task::perform(acquire::file::read_image(path), Message::FileLoaded)
            }
            Message::FileLoaded(loaded) => {
                if let Err(fault) = self.state.select_file(loaded) {
                    warn!("⚠️  Discarded loaded file: {}", fault);
                }
                Task::none()
            }
            Message::StartCamera => {
                if let Err(fault) = self.state.start_camera(self.camera.as_mut()) {
                    warn!("⚠️  Camera not started: {}", fault);
                }
                Task::none()
            }
            Message::CameraTick => {
                self.state.refresh_live_frame();
                Task::none()
            }
            Message::Capture => {
                if let Err(fault) = self.state.capture_image() {
                    warn!("⚠️  Capture refused: {}", fault);
                }
                Task::none()
            }
            Message::StopCamera => {
                self.state.stop_camera();
                Task::none()
            }
            Message::Clear => {
                if let Err(fault) = self.state.clear() {
                    warn!("⚠️  Clear refused: {}", fault);
                }
                Task::none()
            }
            Message::Submit => match self.state.begin_submission() {
                Ok(image) => Task::perform(
                    client::run_submission(Arc::clone(&self.classifier), image),
                    Message::PredictionReady,
                ),
                // The state already shows the fault; nothing to send
                Err(_) => Task::none(),
            },
            Message::PredictionReady(outcome) => {
                self.state.finish_submission(outcome);
                Task::none()
            }
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let busy = self.state.is_in_flight();

        let mut content: Column<Message> = column![text("Crop Disease Detector")
            .size(32)
            .color(ACCENT)]
        .spacing(16)
        .padding(32)
        .max_width(560.0)
        .align_x(Alignment::Center);

        if self.state.camera_active() {
            content = content.push(self.camera_panel());
        } else {
            content = content
                .push(self.upload_panel())
                .push(
                    button(text("Open Camera"))
                        .on_press_maybe((!busy).then_some(Message::StartCamera))
                        .style(button::primary)
                        .padding(10),
                )
                .push(
                    button(
                        container(text(if busy { "Analyzing..." } else { "Detect Disease" }))
                            .center_x(Length::Fill),
                    )
                    .on_press_maybe(self.state.can_submit().then_some(Message::Submit))
                    .style(button::success)
                    .width(Length::Fill)
                    .padding(12),
                );
        }

        if busy {
            content = content.push(text("Processing image...").color(INFO_COLOR));
        }

        if let Some(fault) = self.state.fault() {
            content = content.push(text(fault.to_string()).color(FAULT_COLOR));
        }

        if let Some(result) = self.state.prediction() {
            content = content.push(result_card(result));
        }

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x(Length::Fill)
            .center_y(Length::Fill)
            .into()
    }

    /// Drop zone, or the preview of the acquired image
    fn upload_panel(&self) -> Element<Message> {
        let busy = self.state.is_in_flight();

        match self.state.image() {
            Some(image) => column![
                Image::new(image.preview.clone()).height(Length::Fixed(256.0)),
                text(image.summary()).size(14),
                button(text("Clear"))
                    .on_press_maybe((!busy).then_some(Message::Clear))
                    .style(button::danger)
                    .padding(6),
            ]
            .spacing(8)
            .align_x(Alignment::Center)
            .into(),
            None => button(
                container(text("Click to upload or drag and drop an image"))
                    .center_x(Length::Fill)
                    .center_y(Length::Fixed(160.0)),
            )
            .on_press_maybe((!busy).then_some(Message::PickFile))
            .style(button::secondary)
            .width(Length::Fill)
            .into(),
        }
    }

    /// Live view with capture and cancel actions
    fn camera_panel(&self) -> Element<Message> {
        let live: Element<Message> = match self.state.live_frame() {
            Some(frame) => Image::new(frame.clone()).height(Length::Fixed(320.0)).into(),
            None => container(text("Starting camera..."))
                .center_x(Length::Fill)
                .center_y(Length::Fixed(320.0))
                .into(),
        };

        column![
            live,
            row![
                button(text("Capture"))
                    .on_press(Message::Capture)
                    .style(button::success)
                    .padding(10),
                button(text("Cancel"))
                    .on_press(Message::StopCamera)
                    .style(button::secondary)
                    .padding(10),
            ]
            .spacing(12),
        ]
        .spacing(12)
        .align_x(Alignment::Center)
        .into()
    }

    fn subscription(&self) -> Subscription<Message> {
        let drops = event::listen_with(|event, _status, _window| match event {
            iced::Event::Window(window::Event::FileDropped(path)) => {
                Some(Message::FileDropped(path))
            }
            _ => None,
        });

        if self.state.camera_active() {
            Subscription::batch([
                drops,
                iced::time::every(self.preview_refresh).map(|_| Message::CameraTick),
            ])
        } else {
            drops
        }
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Light
    }
}

/// The "Disease Detection Result" card
fn result_card(result: &PredictionResult) -> Element<'_, Message> {
    container(
        column![
            text("Disease Detection Result").size(20).color(ACCENT),
            row![
                text("Disease:"),
                horizontal_space(),
                text(&result.disease).color(ACCENT)
            ],
            row![
                text("Confidence:"),
                horizontal_space(),
                text(result.confidence_label()).color(ACCENT)
            ],
            Canvas::new(ui::ConfidenceBar::new(result.confidence))
                .width(Length::Fill)
                .height(Length::Fixed(10.0)),
            text(format!("Analyzed at {}", result.received_at.format("%H:%M:%S"))).size(12),
        ]
        .spacing(8),
    )
    .padding(16)
    .width(Length::Fill)
    .style(container::rounded_box)
    .into()
}

#[cfg(feature = "webcam")]
fn camera_source(settings: &Settings) -> Box<dyn VideoSource> {
    Box::new(acquire::webcam::WebcamSource::new(settings.camera_index))
}

#[cfg(not(feature = "webcam"))]
fn camera_source(_settings: &Settings) -> Box<dyn VideoSource> {
    info!("No webcam backend compiled in (enable the `webcam` feature)");
    Box::new(acquire::NoCamera)
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> iced::Result {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let settings = match config::load_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            error!("❌ {}", e);
            std::process::exit(2);
        }
    };

    let classifier: Arc<dyn Classifier> = match HttpClassifier::new(&settings) {
        Ok(classifier) => {
            info!("🔗 Using prediction service at {}", classifier.endpoint());
            Arc::new(classifier)
        }
        Err(e) => {
            error!("❌ Failed to create HTTP client: {}", e);
            std::process::exit(2);
        }
    };

    iced::application(
        "Crop Disease Detector",
        CropDetector::update,
        CropDetector::view,
    )
    .theme(CropDetector::theme)
    .subscription(CropDetector::subscription)
    .window_size((600.0, 860.0))
    .centered()
    .run_with(move || CropDetector::new(settings.clone(), Arc::clone(&classifier)))
}
