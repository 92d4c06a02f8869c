//! Gameplay settings
//!
//! Persisted as JSON next to the binary (or wherever the host chooses).
//! Defaults mirror `crate::consts`.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::Difficulty;

/// Failure loading, saving or validating settings
#[derive(Debug)]
pub enum SettingsError {
    /// Reading or writing the settings file failed
    Io(std::io::Error),
    /// The file was not valid settings JSON
    Parse(serde_json::Error),
    /// A field holds an unusable value
    Invalid(&'static str),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Io(e) => write!(f, "settings io error: {e}"),
            SettingsError::Parse(e) => write!(f, "settings parse error: {e}"),
            SettingsError::Invalid(field) => write!(f, "invalid setting: {field}"),
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingsError::Io(e) => Some(e),
            SettingsError::Parse(e) => Some(e),
            SettingsError::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for SettingsError {
    fn from(e: std::io::Error) -> Self {
        SettingsError::Io(e)
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(e: serde_json::Error) -> Self {
        SettingsError::Parse(e)
    }
}

/// Tunable gameplay parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Player-chosen base difficulty (waves may override it)
    pub difficulty: Difficulty,
    /// Run seed for reproducibility
    pub seed: u64,

    // === Playfield ===
    pub arena_width: f32,
    pub arena_height: f32,
    pub spawn_margin: f32,
    pub avatar_radius: f32,

    // === Timing (ms) ===
    pub travel_time_ms: f32,
    pub destruction_animation_ms: f32,
    /// Frame deltas above this are clamped
    pub max_frame_dt_ms: f32,
    pub spawn_delay_ms: f32,
    pub feedback_clear_ms: f32,
    pub wave_advance_ms: f32,

    // === Progression ===
    pub start_health: u32,
    pub questions_per_wave: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Easy,
            seed: 0x5eed_0f_4d6d,

            arena_width: ARENA_WIDTH,
            arena_height: ARENA_HEIGHT,
            spawn_margin: SPAWN_MARGIN,
            avatar_radius: AVATAR_RADIUS,

            travel_time_ms: TRAVEL_TIME_MS,
            destruction_animation_ms: DESTRUCTION_ANIMATION_MS,
            max_frame_dt_ms: MAX_FRAME_DT_MS,
            spawn_delay_ms: SPAWN_DELAY_MS,
            feedback_clear_ms: FEEDBACK_CLEAR_MS,
            wave_advance_ms: WAVE_ADVANCE_MS,

            start_health: START_HEALTH,
            questions_per_wave: QUESTIONS_PER_WAVE,
        }
    }
}

impl Settings {
    /// Default settings at a given base difficulty
    pub fn with_difficulty(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            ..Self::default()
        }
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.arena_width > 0.0 && self.arena_height > 0.0) {
            return Err(SettingsError::Invalid("arena size must be positive"));
        }
        if !(self.travel_time_ms > 0.0) {
            return Err(SettingsError::Invalid("travel_time_ms must be positive"));
        }
        if !(self.max_frame_dt_ms > 0.0) {
            return Err(SettingsError::Invalid("max_frame_dt_ms must be positive"));
        }
        if self.destruction_animation_ms < 0.0
            || self.spawn_delay_ms < 0.0
            || self.feedback_clear_ms < 0.0
            || self.wave_advance_ms < 0.0
        {
            return Err(SettingsError::Invalid("delays must not be negative"));
        }
        if self.avatar_radius < 0.0 || self.spawn_margin < 0.0 {
            return Err(SettingsError::Invalid("radii must not be negative"));
        }
        if self.start_health == 0 {
            return Err(SettingsError::Invalid("start_health must be at least 1"));
        }
        if self.questions_per_wave == 0 {
            return Err(SettingsError::Invalid("questions_per_wave must be at least 1"));
        }
        Ok(())
    }

    /// These settings if they validate, otherwise the defaults
    pub fn or_default(self) -> Self {
        match self.validate() {
            Ok(()) => self,
            Err(e) => {
                log::warn!("Rejecting settings ({e}), using defaults");
                Self::default()
            }
        }
    }

    /// Parse and validate settings JSON
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.as_ref().display());
        Ok(settings)
    }

    /// Load settings, falling back to defaults on any failure
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path.as_ref()) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Using default settings ({e})");
                Self::default()
            }
        }
    }

    /// Save settings as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        log::info!("Settings saved to {}", path.as_ref().display());
        Ok(())
    }
}
