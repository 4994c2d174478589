//! Platform collaborator traits
//!
//! The pipeline never talks to the platform directly. Camera frames arrive as
//! [`Frame`](crate::vision::Frame) values, and everything else sits behind one
//! of the traits below so the same pipeline runs against real platform
//! bindings or the simulated devices in [`mock`](super::mock).
//!
//! All implementations must be `Send + Sync`: the inference service is called
//! from the analysis thread, the display and injector from the gesture service
//! thread, and the settings probe from whichever thread owns the UI.

use crate::config::DetectorOptions;
use crate::error::Result;
use crate::gesture::GestureDescription;
use crate::types::{DisplayMetrics, FaceObservation, Rotation};
use async_trait::async_trait;

/// Image data handed to the inference service, borrowed from a frame for the
/// duration of one inference call.
#[derive(Debug, Clone, Copy)]
pub struct InputImage<'a> {
    /// Luminance plane, row-major, one byte per pixel
    pub data: &'a [u8],
    pub width: u32,
    pub height: u32,
    pub rotation: Rotation,
}

impl InputImage<'_> {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Face landmark inference
///
/// Returns one observation per detected face, or an error when inference
/// fails. An empty vector means no face was found, which is not an error.
/// The returned future may complete on a different thread than the caller.
#[async_trait]
pub trait FaceInferenceService: Send + Sync {
    async fn process(
        &self,
        image: &InputImage<'_>,
        options: &DetectorOptions,
    ) -> Result<Vec<FaceObservation>>;
}

/// Privileged synthetic input injection
#[cfg_attr(test, mockall::automock)]
pub trait GestureInjector: Send + Sync {
    /// Submit a gesture for execution.
    ///
    /// Returns whether the platform accepted it. Acceptance says nothing about
    /// whether the gesture later completed.
    fn dispatch(&self, gesture: &GestureDescription) -> bool;
}

/// Current display geometry
#[cfg_attr(test, mockall::automock)]
pub trait DisplayMetricsSource: Send + Sync {
    /// Queried fresh on every dispatch; never cache the result.
    fn metrics(&self) -> DisplayMetrics;
}

/// Read access to the platform accessibility setting
#[cfg_attr(test, mockall::automock)]
pub trait AccessibilitySettings: Send + Sync {
    fn accessibility_enabled(&self) -> Result<bool>;
}

/// Whether the gesture service can be expected to run.
///
/// A failed settings read is logged and reported as "not enabled", leaving
/// the caller's permission state as it was.
pub fn check_accessibility_enabled(settings: &dyn AccessibilitySettings) -> bool {
    match settings.accessibility_enabled() {
        Ok(enabled) => {
            if !enabled {
                tracing::info!("Accessibility service is disabled; gestures will not be injected");
            }
            enabled
        }
        Err(e) => {
            tracing::warn!("Could not read accessibility setting: {}", e);
            false
        }
    }
}
