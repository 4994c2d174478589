//! Configuration module for blink-swipe
//!
//! Holds every tunable of the pipeline. The thresholds and swipe geometry
//! have no principled derivation; the defaults below are the values the
//! pipeline has always used and should only change against a stated need.
//!
//! # Config Location
//!
//! The config file is TOML, stored in the platform config directory under
//! `dev.blinkswipe`:
//!
//! - **Linux**: `~/.config/dev.blinkswipe/config.toml`
//! - **macOS**: `~/Library/Application Support/dev.blinkswipe/config.toml`
//! - **Windows**: `%APPDATA%\dev.blinkswipe\config.toml`
//!
//! # Example
//!
//! ```ignore
//! use blink_swipe::config::AppConfig;
//!
//! let mut config = AppConfig::load_or_default();
//! config.gesture.duration_ms = 150;
//! config.save()?;
//! ```

pub mod detector;

pub use detector::*;

use crate::error::{BlinkSwipeError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for config directories
pub const APP_ID: &str = "dev.blinkswipe";

/// Config filename
pub const CONFIG_FILE: &str = "config.toml";

/// Eye-open probability below which an eye counts as closed
pub const BLINK_THRESHOLD: f32 = 0.01;

/// Smallest detectable face, as a fraction of frame height
pub const MIN_FACE_SIZE: f32 = 0.1;

/// Swipe starts at this fraction of screen height (from the top)
pub const SWIPE_START_FRACTION: f32 = 0.75;

/// Swipe ends at this fraction of screen height (from the top)
pub const SWIPE_END_FRACTION: f32 = 0.25;

/// Delay before the first swipe after the service connects
pub const STARTUP_DELAY_MS: u64 = 2000;

/// Duration of every synthesized swipe
pub const SWIPE_DURATION_MS: u64 = 100;

/// Frames waiting for the analysis worker; anything beyond this is dropped
pub const DEFAULT_FRAME_QUEUE_CAPACITY: usize = 1;

/// How long shutdown waits for a busy analysis worker before detaching it
pub const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 1000;

/// Events buffered per bridge subscriber
pub const DEFAULT_SUBSCRIBER_CAPACITY: usize = 64;

// ==================== Config Directory ====================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID))
}

/// Get the path to the default config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join(CONFIG_FILE))
}

// ==================== App Config ====================

/// Complete pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AppConfig {
    /// Face inference and blink rule
    #[serde(default)]
    pub detector: DetectorConfig,

    /// Swipe synthesis and dispatch
    #[serde(default)]
    pub gesture: GestureConfig,

    /// Frame analysis worker
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Signal bridge
    #[serde(default)]
    pub bridge: BridgeConfig,

    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the config from the default location, or defaults if no file exists
    pub fn load() -> Result<Self> {
        let path = config_path().ok_or_else(|| {
            BlinkSwipeError::Config("Could not determine config path".to_string())
        })?;

        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load the config, returning defaults on any error
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Load and validate a config file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            BlinkSwipeError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            BlinkSwipeError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save the config to the default location
    pub fn save(&self) -> Result<()> {
        let path = config_path().ok_or_else(|| {
            BlinkSwipeError::Config("Could not determine config path".to_string())
        })?;
        self.save_to(path)
    }

    /// Save the config as TOML
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                BlinkSwipeError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)?;

        std::fs::write(path, content).map_err(|e| {
            BlinkSwipeError::Config(format!("Failed to write config file {:?}: {}", path, e))
        })
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        self.detector.validate()?;
        self.gesture.validate()?;

        if self.analysis.frame_queue_capacity == 0 {
            return Err(BlinkSwipeError::Config(
                "analysis.frame_queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.bridge.subscriber_capacity == 0 {
            return Err(BlinkSwipeError::Config(
                "bridge.subscriber_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

// ==================== Gesture Config ====================

/// How concurrent triggers are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DispatchPolicy {
    /// Every trigger dispatches independently, even while a gesture is running
    #[default]
    Concurrent,
    /// Triggers arriving while the previous gesture is still executing are dropped
    DropWhileInFlight,
}

impl std::fmt::Display for DispatchPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchPolicy::Concurrent => write!(f, "Concurrent"),
            DispatchPolicy::DropWhileInFlight => write!(f, "Drop while in flight"),
        }
    }
}

/// Swipe synthesis settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GestureConfig {
    /// Start delay of the swipe issued when the service connects
    pub startup_delay_ms: u64,

    /// Duration of every swipe
    pub duration_ms: u64,

    /// Vertical start of the stroke, as a fraction of screen height
    pub start_fraction: f32,

    /// Vertical end of the stroke, as a fraction of screen height
    pub end_fraction: f32,

    /// Handling of triggers that overlap a running gesture
    #[serde(default)]
    pub dispatch_policy: DispatchPolicy,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            startup_delay_ms: STARTUP_DELAY_MS,
            duration_ms: SWIPE_DURATION_MS,
            start_fraction: SWIPE_START_FRACTION,
            end_fraction: SWIPE_END_FRACTION,
            dispatch_policy: DispatchPolicy::default(),
        }
    }
}

impl GestureConfig {
    pub fn validate(&self) -> Result<()> {
        if self.duration_ms == 0 {
            return Err(BlinkSwipeError::Config(
                "gesture.duration_ms must be greater than zero".to_string(),
            ));
        }
        let in_unit = |v: f32| (0.0..=1.0).contains(&v);
        if !in_unit(self.start_fraction) || !in_unit(self.end_fraction) {
            return Err(BlinkSwipeError::Config(
                "gesture fractions must lie in [0, 1]".to_string(),
            ));
        }
        if self.start_fraction <= self.end_fraction {
            return Err(BlinkSwipeError::Config(
                "gesture.start_fraction must be greater than end_fraction".to_string(),
            ));
        }
        Ok(())
    }
}

// ==================== Analysis Config ====================

/// Frame analysis worker settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisConfig {
    /// Frames allowed to wait while one is being analyzed
    pub frame_queue_capacity: usize,

    /// How often the idle worker re-checks its running flag, in milliseconds
    pub idle_poll_ms: u64,

    /// Upper bound on waiting for an in-flight inference at shutdown, in milliseconds
    #[serde(default = "default_shutdown_timeout_ms")]
    pub shutdown_timeout_ms: u64,
}

fn default_shutdown_timeout_ms() -> u64 {
    DEFAULT_SHUTDOWN_TIMEOUT_MS
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            frame_queue_capacity: DEFAULT_FRAME_QUEUE_CAPACITY,
            idle_poll_ms: 50,
            shutdown_timeout_ms: DEFAULT_SHUTDOWN_TIMEOUT_MS,
        }
    }
}

// ==================== Bridge Config ====================

/// Signal bridge settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BridgeConfig {
    /// Events buffered per subscriber before new events are dropped
    pub subscriber_capacity: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            subscriber_capacity: DEFAULT_SUBSCRIBER_CAPACITY,
        }
    }
}

// ==================== Logging Config ====================

/// Log output settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set
    pub filter: String,

    /// Directory for daily-rolling log files (console only when unset)
    pub file_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info,blink_swipe=debug".to_string(),
            file_dir: None,
        }
    }
}

// ==================== Tests ====================
