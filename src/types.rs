//! Core data types shared across the pipeline
//!
//! Everything in here is ephemeral: readings and observations live for one
//! analysis cycle, and nothing is persisted between frames.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Image rotation reported by the camera, needed by the inference service to
/// orient the face search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Rotation in degrees
    pub fn degrees(&self) -> u32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// Parse a rotation from degrees; only right angles are valid
    pub fn from_degrees(degrees: u32) -> Option<Self> {
        match degrees % 360 {
            0 => Some(Rotation::Deg0),
            90 => Some(Rotation::Deg90),
            180 => Some(Rotation::Deg180),
            270 => Some(Rotation::Deg270),
            _ => None,
        }
    }
}

impl std::fmt::Display for Rotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Mean pixel intensity of a frame's luminance plane, 0.0–255.0.
///
/// An empty plane yields NaN; see [`LuminosityReading::is_defined`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LuminosityReading(pub f64);

impl LuminosityReading {
    pub fn value(&self) -> f64 {
        self.0
    }

    /// False for the reading of an empty plane
    pub fn is_defined(&self) -> bool {
        !self.0.is_nan()
    }
}

impl std::fmt::Display for LuminosityReading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// One face found by the inference service in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FaceObservation {
    /// Probability in [0, 1] that the left eye is open, if classifiable
    pub left_eye_open: Option<f32>,
    /// Probability in [0, 1] that the right eye is open, if classifiable
    pub right_eye_open: Option<f32>,
}

impl FaceObservation {
    /// Observation with both eye probabilities present
    pub fn with_eyes(left: f32, right: f32) -> Self {
        Self {
            left_eye_open: Some(left),
            right_eye_open: Some(right),
        }
    }

    /// Face detected, but classification produced no eye data
    pub fn without_eyes() -> Self {
        Self::default()
    }
}

/// Result of applying the blink rule to one face.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BlinkEvent {
    pub luma: LuminosityReading,
    pub blinked: bool,
}

/// Current display size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayMetrics {
    pub width_px: u32,
    pub height_px: u32,
}

impl DisplayMetrics {
    pub fn new(width_px: u32, height_px: u32) -> Self {
        Self {
            width_px,
            height_px,
        }
    }
}

/// A point in screen space (pixels, origin top-left)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

/// Gesture service connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ConnectionStatus {
    /// Not bound to the privileged service context
    #[default]
    Disconnected,
    /// Bound and accepting triggers
    Connected,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionStatus::Disconnected => write!(f, "Disconnected"),
            ConnectionStatus::Connected => write!(f, "Connected"),
        }
    }
}

/// Counters for the vision side of the pipeline
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineStats {
    /// Frames handed to the sampler by the camera
    pub frames_received: u64,
    /// Frames that went through a full inference pass
    pub frames_analyzed: u64,
    /// Frames dropped because the analysis worker was busy
    pub frames_dropped: u64,
    /// Inference passes that ended in failure
    pub analysis_failures: u64,
    /// Faces reported across all analyzed frames
    pub faces_observed: u64,
    /// Faces for which the blink rule fired
    pub blinks_detected: u64,
}

impl PipelineStats {
    /// Share of received frames that were analyzed, as a percentage
    pub fn analysis_rate(&self) -> f64 {
        if self.frames_received == 0 {
            100.0
        } else {
            (self.frames_analyzed as f64 / self.frames_received as f64) * 100.0
        }
    }
}

/// Counters for the gesture side of the pipeline
#[derive(Debug, Clone, Default, Serialize)]
pub struct DispatchStats {
    /// Gestures the platform accepted for execution
    pub accepted: u64,
    /// Gestures the platform rejected
    pub rejected: u64,
    /// Triggers dropped because a gesture was still in flight
    pub dropped_in_flight: u64,
    /// Events received that were not of the recognized kind
    pub ignored_events: u64,
}

/// User-visible side effects, consumed on the UI-owning thread.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum UiNotice {
    /// A blink was detected (the "BLINK" toast)
    Blink {
        luma: LuminosityReading,
        at: DateTime<Utc>,
    },
}
