use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classification::domain::mouth_state_machine::ClassifierConfig;
use crate::detection::domain::landmark_set::MouthRange;
use crate::shared::constants::{
    DEFAULT_DIAGNOSTIC_INTERVAL_MS, DEFAULT_MAR_THRESHOLD, DEFAULT_MAX_READ_FAILURES,
    DEFAULT_RENDER_CAPACITY, DEFAULT_RETRY_DELAY_MS, MOUTH_LANDMARK_END, MOUTH_LANDMARK_START,
    SETTINGS_DIR_NAME, SETTINGS_FILE_NAME,
};

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// Session tunables, persisted as JSON.
///
/// Every field is optional in the file; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub mar_threshold: f64,
    pub mouth_start: usize,
    pub mouth_end: usize,
    pub hysteresis: f64,
    pub dwell_frames: u32,
    pub retry_delay_ms: u64,
    pub diagnostic_interval_ms: u64,
    pub max_read_failures: usize,
    pub render_capacity: usize,
    pub trigger_command: Option<String>,
    pub trigger_args: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mar_threshold: DEFAULT_MAR_THRESHOLD,
            mouth_start: MOUTH_LANDMARK_START,
            mouth_end: MOUTH_LANDMARK_END,
            hysteresis: 0.0,
            dwell_frames: 1,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            diagnostic_interval_ms: DEFAULT_DIAGNOSTIC_INTERVAL_MS,
            max_read_failures: DEFAULT_MAX_READ_FAILURES,
            render_capacity: DEFAULT_RENDER_CAPACITY,
            trigger_command: None,
            trigger_args: Vec::new(),
        }
    }
}

impl Settings {
    /// `<config dir>/MouthKey/settings.json`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(SETTINGS_DIR_NAME).join(SETTINGS_FILE_NAME))
    }

    /// Loads settings from `path`, or from [`Settings::default_path`] when
    /// `path` is `None`.
    ///
    /// An explicit path must exist. A missing default file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        match path {
            Some(path) => Self::load_from(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load_from(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Settings =
            serde_json::from_str(&json).map_err(|source| SettingsError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !self.mar_threshold.is_finite() || self.mar_threshold <= 0.0 {
            return Err(SettingsError::Invalid(format!(
                "mar_threshold must be a positive number, got {}",
                self.mar_threshold
            )));
        }
        if !self.hysteresis.is_finite() || self.hysteresis < 0.0 {
            return Err(SettingsError::Invalid(format!(
                "hysteresis must be zero or positive, got {}",
                self.hysteresis
            )));
        }
        if self.hysteresis >= self.mar_threshold {
            return Err(SettingsError::Invalid(format!(
                "hysteresis ({}) must be smaller than mar_threshold ({})",
                self.hysteresis, self.mar_threshold
            )));
        }
        if self.dwell_frames == 0 {
            return Err(SettingsError::Invalid(
                "dwell_frames must be at least 1".to_string(),
            ));
        }
        if self.render_capacity == 0 {
            return Err(SettingsError::Invalid(
                "render_capacity must be at least 1".to_string(),
            ));
        }
        if self.max_read_failures == 0 {
            return Err(SettingsError::Invalid(
                "max_read_failures must be at least 1".to_string(),
            ));
        }
        MouthRange::new(self.mouth_start, self.mouth_end)
            .map_err(|e| SettingsError::Invalid(e.to_string()))?;
        Ok(())
    }

    pub fn mouth_range(&self) -> Result<MouthRange, SettingsError> {
        MouthRange::new(self.mouth_start, self.mouth_end)
            .map_err(|e| SettingsError::Invalid(e.to_string()))
    }

    pub fn classifier_config(&self) -> ClassifierConfig {
        ClassifierConfig::new(self.mar_threshold)
            .with_hysteresis(self.hysteresis)
            .with_dwell_frames(self.dwell_frames)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn diagnostic_interval(&self) -> Duration {
        Duration::from_millis(self.diagnostic_interval_ms)
    }
}
