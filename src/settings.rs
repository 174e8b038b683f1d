use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::controls;
use crate::timer::state::DEFAULT_DURATION_MINUTES;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// Frequencies used by the next Start Beats / Start All.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToneSettings {
    pub base_frequency_hz: f32,
    pub beat_frequency_hz: f32,
}

impl Default for ToneSettings {
    fn default() -> Self {
        Self {
            base_frequency_hz: controls::DEFAULT_BASE_FREQUENCY_HZ,
            beat_frequency_hz: controls::DEFAULT_BEAT_FREQUENCY_HZ,
        }
    }
}

/// Startup values. Read from an optional JSON file and never written back.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub base_frequency_hz: f32,
    pub beat_frequency_hz: f32,
    pub timer_duration_minutes: u32,
}

impl Default for AppSettings {
    fn default() -> Self {
        let tone = ToneSettings::default();
        Self {
            base_frequency_hz: tone.base_frequency_hz,
            beat_frequency_hz: tone.beat_frequency_hz,
            timer_duration_minutes: DEFAULT_DURATION_MINUTES,
        }
    }
}

impl AppSettings {
    /// Without a path the defaults are used. A file that exists but does not
    /// parse falls back to the defaults with a warning.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;

        let settings = match serde_json::from_str::<Self>(&contents) {
            Ok(settings) => {
                log_info!("loaded settings from {}", path.display());
                settings
            }
            Err(err) => {
                log_warn!("ignoring unreadable settings in {}: {}", path.display(), err);
                Self::default()
            }
        };

        Ok(settings.clamped())
    }

    pub fn clamped(self) -> Self {
        Self {
            base_frequency_hz: controls::base_frequency(self.base_frequency_hz),
            beat_frequency_hz: controls::beat_frequency(self.beat_frequency_hz),
            timer_duration_minutes: controls::timer_duration(self.timer_duration_minutes),
        }
    }

    /// Applies command-line values on top of the file, clamped the same way.
    pub fn with_overrides(
        mut self,
        base_frequency_hz: Option<f32>,
        beat_frequency_hz: Option<f32>,
        timer_duration_minutes: Option<u32>,
    ) -> Self {
        if let Some(base) = base_frequency_hz {
            self.base_frequency_hz = base;
        }
        if let Some(beat) = beat_frequency_hz {
            self.beat_frequency_hz = beat;
        }
        if let Some(minutes) = timer_duration_minutes {
            self.timer_duration_minutes = minutes;
        }
        self.clamped()
    }

    pub fn tone(&self) -> ToneSettings {
        ToneSettings {
            base_frequency_hz: self.base_frequency_hz,
            beat_frequency_hz: self.beat_frequency_hz,
        }
    }
}
