//! Engine configuration
//!
//! Stored in `~/.config/readalong/config.yaml`. Every recognized option is a
//! field here with its default; unknown keys are rejected.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const MIN_PLAYBACK_RATE: f64 = 0.5;
pub const MAX_PLAYBACK_RATE: f64 = 2.0;

/// Clamp a playback rate into `[0.5, 2.0]`; non-finite rates fall back to 1.0
pub fn clamp_rate(rate: f64) -> f64 {
    if rate.is_finite() {
        rate.clamp(MIN_PLAYBACK_RATE, MAX_PLAYBACK_RATE)
    } else {
        1.0
    }
}

/// Class names used by DOM-style highlight sinks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HighlightClasses {
    #[serde(default = "default_current_class")]
    pub current: String,
    #[serde(default = "default_trail_class")]
    pub trail: String,
}

fn default_current_class() -> String {
    "audio-highlight".to_string()
}

fn default_trail_class() -> String {
    "audio-trail".to_string()
}

impl Default for HighlightClasses {
    fn default() -> Self {
        Self {
            current: default_current_class(),
            trail: default_trail_class(),
        }
    }
}

/// Read-along configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// Initial playback rate, clamped to `[0.5, 2.0]`
    #[serde(default = "default_rate")]
    pub playback_rate: f64,
    /// Scroll by the line delta whenever highlighting wraps to a new line
    #[serde(default = "default_true")]
    pub force_line_scroll: bool,
    #[serde(default = "default_true")]
    pub keep_highlight_on_pause: bool,
    /// Leave a fading marker on the previously spoken word
    #[serde(default = "default_true")]
    pub highlight_trail: bool,
    /// Move on to the next block once the current one completes
    #[serde(default)]
    pub auto_continue: bool,
    #[serde(default = "default_true")]
    pub click_to_play: bool,
    #[serde(default = "default_true")]
    pub spacebar_toggle: bool,

    /// Time the transport takes to honor a stop request
    #[serde(default = "default_stop_latency")]
    pub stop_latency_ms: u64,
    /// How long to wait after a seek before treating an unmoved position as a stall
    #[serde(default = "default_stall_grace")]
    pub stall_grace_ms: u64,
    /// Nudge applied to a stalled position
    #[serde(default = "default_epsilon")]
    pub stall_nudge_ms: f64,
    /// Offset past `word.begin` used when jumping to a word
    #[serde(default = "default_epsilon")]
    pub seek_epsilon_ms: f64,
    /// Words behind the previous word whose trail is retracted on each advance
    #[serde(default = "default_trail_window")]
    pub trail_window: usize,
    /// Words scanned back when flushing the trail on a line break
    #[serde(default = "default_flush_window")]
    pub newline_flush_window: usize,
    #[serde(default = "default_scroll_duration")]
    pub scroll_duration_ms: u64,

    #[serde(default)]
    pub classes: HighlightClasses,
}

fn default_rate() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

fn default_stop_latency() -> u64 {
    200
}

fn default_stall_grace() -> u64 {
    500
}

fn default_epsilon() -> f64 {
    10.0
}

fn default_trail_window() -> usize {
    4
}

fn default_flush_window() -> usize {
    14
}

fn default_scroll_duration() -> u64 {
    300
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            playback_rate: default_rate(),
            force_line_scroll: true,
            keep_highlight_on_pause: true,
            highlight_trail: true,
            auto_continue: false,
            click_to_play: true,
            spacebar_toggle: true,
            stop_latency_ms: default_stop_latency(),
            stall_grace_ms: default_stall_grace(),
            stall_nudge_ms: default_epsilon(),
            seek_epsilon_ms: default_epsilon(),
            trail_window: default_trail_window(),
            newline_flush_window: default_flush_window(),
            scroll_duration_ms: default_scroll_duration(),
            classes: HighlightClasses::default(),
        }
    }
}

impl SyncConfig {
    /// Validate and normalize; the rate is clamped rather than rejected
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        if !self.playback_rate.is_finite() {
            return Err(ConfigError::InvalidRate(self.playback_rate));
        }
        self.playback_rate = clamp_rate(self.playback_rate);

        if self.trail_window == 0 {
            return Err(ConfigError::EmptyTrailWindow);
        }
        if self.newline_flush_window < self.trail_window {
            return Err(ConfigError::FlushWindowTooSmall {
                flush: self.newline_flush_window,
                trail: self.trail_window,
            });
        }

        self.stall_nudge_ms = self.stall_nudge_ms.abs();
        self.seek_epsilon_ms = self.seek_epsilon_ms.abs();
        Ok(self)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: SyncConfig =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validated()
    }

    /// Load and validate a config file at an explicit path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml_str(&content)
    }

    /// Load config from the user config directory, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = crate::config_paths::config_file() else {
            tracing::debug!("No config directory available, using defaults");
            return Self::default();
        };

        if !path.exists() {
            tracing::debug!(
                "Config file not found at {}, using defaults",
                path.display()
            );
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(config) => {
                tracing::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                tracing::warn!("Failed to load config at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save config to the user config directory
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = crate::config_paths::config_file()
            .ok_or_else(|| ConfigError::Io("No config directory available".to_string()))?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConfigError::Io(format!("Failed to create config directory: {}", e)))?;
        }

        let content =
            serde_yaml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))?;

        std::fs::write(path, content)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;

        tracing::info!("Saved config to {}", path.display());
        Ok(())
    }
}
