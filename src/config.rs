use clap::Parser;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;
use tracing::info;

/// Prediction endpoint used when nothing else is configured
pub const DEFAULT_ENDPOINT: &str = "https://plantdiseaseapi.vercel.app/predict";

pub const ENV_ENDPOINT: &str = "CROP_DETECTOR_ENDPOINT";
pub const ENV_TIMEOUT_SECS: &str = "CROP_DETECTOR_TIMEOUT_SECS";

/// Command line flags
#[derive(Debug, Default, Parser)]
#[command(name = "crop-disease-detector", version, about)]
pub struct Cli {
    /// Settings file (defaults to <config dir>/crop-disease-detector/settings.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Prediction endpoint URL
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Request timeout in seconds (no timeout when unset)
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Index of the capture device to open
    #[arg(long)]
    pub camera_index: Option<u32>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub endpoint: String,
    pub request_timeout_secs: Option<u64>,
    pub camera_index: u32,
    /// Live camera view refresh interval
    pub preview_refresh_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.into(),
            request_timeout_secs: None,
            camera_index: 0,
            preview_refresh_ms: 66,
        }
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },
}

impl Settings {
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let raw = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overlay environment variables, read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_ENDPOINT) {
            self.endpoint = v;
        }
        if let Some(v) = lookup(ENV_TIMEOUT_SECS) {
            let secs = v.trim().parse().map_err(|_| SettingsError::InvalidEnv {
                name: ENV_TIMEOUT_SECS,
                value: v.clone(),
            })?;
            self.request_timeout_secs = Some(secs);
        }
        Ok(())
    }

    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(v) = &cli.endpoint {
            self.endpoint = v.clone();
        }
        if let Some(v) = cli.timeout_secs {
            self.request_timeout_secs = Some(v);
        }
        if let Some(v) = cli.camera_index {
            self.camera_index = v;
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    pub fn preview_refresh(&self) -> Duration {
        Duration::from_millis(self.preview_refresh_ms.max(10))
    }
}

/// Default settings file location
/// - Linux: ~/.config/crop-disease-detector/settings.toml
/// - macOS: ~/Library/Application Support/crop-disease-detector/settings.toml
/// - Windows: %APPDATA%\crop-disease-detector\settings.toml
pub fn default_settings_path() -> Option<PathBuf> {
    let mut path = dirs::config_dir()?;
    path.push("crop-disease-detector");
    path.push("settings.toml");
    Some(path)
}

/// Resolve settings: file, then environment, then command line.
///
/// A missing default file is fine; a file named with `--config` must exist.
pub fn load_settings(cli: &Cli) -> Result<Settings, SettingsError> {
    let mut settings = match &cli.config {
        Some(path) => Settings::from_file(path)?,
        None => match default_settings_path() {
            Some(path) if path.exists() => Settings::from_file(&path)?,
            _ => Settings::default(),
        },
    };

    settings.apply_env(|name| std::env::var(name).ok())?;
    settings.apply_cli(cli);

    info!("⚙️  Prediction endpoint: {}", settings.endpoint);
    Ok(settings)
}
