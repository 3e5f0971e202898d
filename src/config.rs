use crate::error::GamepadError;
use crate::input::layout::{LEFT_STICK, RIGHT_STICK};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const CONFIG_DIR: &str = "padctl";
const CONFIG_FILE: &str = "config.toml";

/// Default dead zone, 5% of the stick range
pub const DEFAULT_DEAD_ZONE: f32 = 0.05;

/// Default frame pacing, roughly one display refresh at 60 Hz
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 16;

/// Stick configuration shared by subscription, emission and diffing
///
/// `left_stick_index` and `right_stick_index` name the button indices whose
/// buckets receive `axes` events. The left stick reads axes 0/1 of a device
/// snapshot, the right stick axes 2/3.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
#[serde(default)]
pub struct AxisConfig {
    pub left_stick_index: usize,
    pub right_stick_index: usize,

    /// Per-component delta a stick has to exceed before `axes` fires (0.0-1.0)
    pub dead_zone_radius: f32,
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self {
            left_stick_index: LEFT_STICK,
            right_stick_index: RIGHT_STICK,
            dead_zone_radius: DEFAULT_DEAD_ZONE,
        }
    }
}

impl AxisConfig {
    /// Whether `index` is one of the two configured stick indices
    pub fn is_stick(&self, index: usize) -> bool {
        index == self.left_stick_index || index == self.right_stick_index
    }

    // Out-of-range values are clamped rather than rejected
    pub fn sanitized(mut self) -> Self {
        if self.dead_zone_radius.is_nan() {
            warn!(
                "Dead zone radius is not a number, falling back to {}",
                DEFAULT_DEAD_ZONE
            );
            self.dead_zone_radius = DEFAULT_DEAD_ZONE;
        }
        let clamped = self.dead_zone_radius.clamp(0.0, 1.0);
        if clamped != self.dead_zone_radius {
            warn!(
                "Dead zone radius {} out of range, clamped to {}",
                self.dead_zone_radius, clamped
            );
            self.dead_zone_radius = clamped;
        }
        self
    }
}

/// Complete configuration of a [`GamepadContext`](crate::GamepadContext)
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct InputConfig {
    pub axes: AxisConfig,

    /// Poll driver pacing in milliseconds
    pub frame_interval_ms: u64,

    /// Maximum number of history entries kept, 0 keeps everything
    pub history_capacity: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            axes: AxisConfig::default(),
            frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
            history_capacity: 0,
        }
    }
}

impl InputConfig {
    pub fn sanitized(mut self) -> Self {
        self.axes = self.axes.sanitized();
        if self.frame_interval_ms == 0 {
            warn!("Frame interval of 0ms requested, using 1ms");
            self.frame_interval_ms = 1;
        }
        self
    }

    /// Parses a TOML document, missing fields take their defaults
    pub fn from_toml(content: &str) -> Result<Self, GamepadError> {
        let config: InputConfig = toml::from_str(content)
            .map_err(|e| GamepadError::ConfigError(format!("Failed to parse config: {}", e)))?;
        Ok(config.sanitized())
    }

    pub fn to_toml(&self) -> Result<String, GamepadError> {
        toml::to_string_pretty(self)
            .map_err(|e| GamepadError::ConfigError(format!("Failed to serialize config: {}", e)))
    }

    /// Loads the configuration at `path`
    ///
    /// A missing file is not an error: the defaults are returned so the input
    /// loop can always start.
    pub fn load_or_default(path: &Path) -> Result<Self, GamepadError> {
        if !path.exists() {
            info!(
                "No config found at {}, using default input config",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            GamepadError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        debug!("Loaded config from {}", path.display());
        Self::from_toml(&content)
    }
}

/// `<config dir>/padctl/config.toml`, falling back to the working directory
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIR))
        .unwrap_or_else(|| {
            warn!("Could not determine config directory, using working directory");
            PathBuf::from(".")
        })
        .join(CONFIG_FILE)
}
