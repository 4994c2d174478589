//! Swipe-up gesture construction
//!
//! A swipe is a single straight stroke at horizontal center, moving from
//! `start_fraction` of the display height up to `end_fraction`. Screen
//! coordinates grow downward, so the stroke's end `y` is always smaller than
//! its start `y`.

use crate::config::GestureConfig;
use crate::types::{DisplayMetrics, ScreenPoint};
use serde::Serialize;
use std::time::Duration;

/// Vertical extent of the swipe as fractions of display height
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwipeGeometry {
    pub start_fraction: f32,
    pub end_fraction: f32,
}

impl SwipeGeometry {
    pub fn from_config(config: &GestureConfig) -> Self {
        Self {
            start_fraction: config.start_fraction,
            end_fraction: config.end_fraction,
        }
    }
}

impl Default for SwipeGeometry {
    fn default() -> Self {
        Self::from_config(&GestureConfig::default())
    }
}

/// Straight line between two screen points
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SwipePath {
    pub start: ScreenPoint,
    pub end: ScreenPoint,
}

impl SwipePath {
    /// Upward scroll stroke for the given display
    pub fn vertical_scroll(metrics: DisplayMetrics, geometry: &SwipeGeometry) -> Self {
        let x = (metrics.width_px / 2) as f32;
        let height = metrics.height_px as f32;
        Self {
            start: ScreenPoint {
                x,
                y: height * geometry.start_fraction,
            },
            end: ScreenPoint {
                x,
                y: height * geometry.end_fraction,
            },
        }
    }

    /// Distance traveled upward, in pixels
    pub fn rise(&self) -> f32 {
        self.start.y - self.end.y
    }
}

/// One stroke of a gesture: a path plus its timing
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StrokeDescription {
    pub path: SwipePath,
    /// Delay between submission and the start of the stroke
    pub start_delay: Duration,
    pub duration: Duration,
}

impl StrokeDescription {
    pub fn new(path: SwipePath, start_delay: Duration, duration: Duration) -> Self {
        Self {
            path,
            start_delay,
            duration,
        }
    }
}

/// A gesture ready to be handed to a [`GestureInjector`](crate::platform::GestureInjector)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GestureDescription {
    strokes: Vec<StrokeDescription>,
}

impl GestureDescription {
    pub fn builder() -> GestureBuilder {
        GestureBuilder::default()
    }

    /// Single-stroke upward swipe
    pub fn swipe_up(
        metrics: DisplayMetrics,
        geometry: &SwipeGeometry,
        start_delay: Duration,
        duration: Duration,
    ) -> Self {
        Self::builder()
            .add_stroke(StrokeDescription::new(
                SwipePath::vertical_scroll(metrics, geometry),
                start_delay,
                duration,
            ))
            .build()
    }

    pub fn strokes(&self) -> &[StrokeDescription] {
        &self.strokes
    }

    /// Time from submission until the last stroke finishes
    pub fn total_duration(&self) -> Duration {
        self.strokes
            .iter()
            .map(|s| s.start_delay + s.duration)
            .max()
            .unwrap_or(Duration::ZERO)
    }
}

#[derive(Debug, Default)]
pub struct GestureBuilder {
    strokes: Vec<StrokeDescription>,
}

impl GestureBuilder {
    pub fn add_stroke(mut self, stroke: StrokeDescription) -> Self {
        self.strokes.push(stroke);
        self
    }

    pub fn build(self) -> GestureDescription {
        GestureDescription {
            strokes: self.strokes,
        }
    }
}
