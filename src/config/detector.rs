//! Face inference settings and the blink threshold
//!
//! [`DetectorOptions`] is handed verbatim to the inference service with every
//! frame. The defaults favour detection quality over latency because a
//! handheld front camera gives a narrow, close field of view.

use super::{BLINK_THRESHOLD, MIN_FACE_SIZE};
use crate::error::{BlinkSwipeError, Result};
use serde::{Deserialize, Serialize};

/// Which facial landmarks the service should locate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LandmarkMode {
    None,
    #[default]
    All,
}

/// Latency/quality trade-off of the inference model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceMode {
    Fast,
    #[default]
    Accurate,
}

/// Whether faces are classified (eye-open probabilities)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationMode {
    None,
    #[default]
    All,
}

/// Whether face contours are detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContourMode {
    None,
    #[default]
    All,
}

/// Feature configuration for the inference service
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorOptions {
    pub landmark_mode: LandmarkMode,
    pub performance_mode: PerformanceMode,
    pub classification_mode: ClassificationMode,
    pub contour_mode: ContourMode,
    /// Smallest detectable face, as a fraction of frame height
    pub min_face_size: f32,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            landmark_mode: LandmarkMode::All,
            performance_mode: PerformanceMode::Accurate,
            classification_mode: ClassificationMode::All,
            contour_mode: ContourMode::All,
            min_face_size: MIN_FACE_SIZE,
        }
    }
}

/// Blink detection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Eye-open probability strictly below which an eye counts as closed
    pub blink_threshold: f32,

    /// Options forwarded to the inference service
    pub options: DetectorOptions,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            blink_threshold: BLINK_THRESHOLD,
            options: DetectorOptions::default(),
        }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.blink_threshold) {
            return Err(BlinkSwipeError::Config(format!(
                "detector.blink_threshold must lie in [0, 1], got {}",
                self.blink_threshold
            )));
        }
        if !(self.options.min_face_size > 0.0 && self.options.min_face_size <= 1.0) {
            return Err(BlinkSwipeError::Config(format!(
                "detector.options.min_face_size must lie in (0, 1], got {}",
                self.options.min_face_size
            )));
        }
        // Without classification there are no eye probabilities to threshold
        if self.options.classification_mode == ClassificationMode::None {
            tracing::warn!("Classification disabled; no blink will ever be reported");
        }
        Ok(())
    }
}
