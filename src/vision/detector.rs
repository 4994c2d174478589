//! Blink detection on top of face landmark inference
//!
//! Each frame goes through one inference pass. For every face found, the
//! eye-open probabilities are thresholded into a blink boolean and the
//! listener is invoked once with that boolean and the frame's luminosity.
//!
//! # Blink rule
//!
//! A face blinks when both eye probabilities are present and at least one is
//! strictly below the threshold. A single closed eye is enough; a face with
//! missing eye data never blinks.
//!
//! # Frame lifetime
//!
//! [`BlinkDetector::analyze`] takes the frame by value and releases it on
//! every exit path: explicitly once inference settles (success or failure),
//! and through `Drop` if the analysis future is dropped mid-flight.

use crate::config::{DetectorConfig, DetectorOptions};
use crate::error::BlinkSwipeError;
use crate::platform::FaceInferenceService;
use crate::types::{BlinkEvent, FaceObservation, LuminosityReading};
use std::sync::Arc;

use super::frame::Frame;

/// Receives one result per detected face
pub trait BlinkListener: Send + Sync {
    fn on_result(&self, luma: LuminosityReading, blinked: bool);
}

impl<F> BlinkListener for F
where
    F: Fn(LuminosityReading, bool) + Send + Sync,
{
    fn on_result(&self, luma: LuminosityReading, blinked: bool) {
        self(luma, blinked)
    }
}

/// How one frame's analysis ended
#[derive(Debug)]
pub enum AnalysisOutcome {
    /// Inference succeeded; one event per detected face (possibly none)
    Completed(Vec<BlinkEvent>),
    /// Inference failed; the listener was not invoked
    Failed(BlinkSwipeError),
}

impl AnalysisOutcome {
    pub fn events(&self) -> &[BlinkEvent] {
        match self {
            AnalysisOutcome::Completed(events) => events,
            AnalysisOutcome::Failed(_) => &[],
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, AnalysisOutcome::Failed(_))
    }
}

/// Apply the blink rule to one face
pub fn blink_from_observation(face: &FaceObservation, threshold: f32) -> bool {
    match (face.left_eye_open, face.right_eye_open) {
        (Some(left), Some(right)) => left < threshold || right < threshold,
        _ => false,
    }
}

/// Runs inference for a frame and derives blink events
pub struct BlinkDetector {
    service: Arc<dyn FaceInferenceService>,
    options: DetectorOptions,
    threshold: f32,
}

impl BlinkDetector {
    pub fn new(service: Arc<dyn FaceInferenceService>, config: &DetectorConfig) -> Self {
        Self {
            service,
            options: config.options,
            threshold: config.blink_threshold,
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Analyze one frame and report each face to `listener`.
    pub async fn analyze(
        &self,
        mut frame: Frame,
        luma: LuminosityReading,
        listener: &dyn BlinkListener,
    ) -> AnalysisOutcome {
        let result = {
            let image = frame.input_image();
            if image.is_empty() {
                tracing::debug!("Empty luminance plane at {:?}", frame.timestamp());
            }
            self.service.process(&image, &self.options).await
        };

        let outcome = match result {
            Ok(faces) => {
                let events: Vec<BlinkEvent> = faces
                    .iter()
                    .map(|face| {
                        if let Some(left) = face.left_eye_open {
                            tracing::debug!("Left eye open probability: {}", left);
                        }
                        if let Some(right) = face.right_eye_open {
                            tracing::debug!("Right eye open probability: {}", right);
                        }
                        let blinked = blink_from_observation(face, self.threshold);
                        if blinked {
                            tracing::debug!("Blinking");
                        }
                        BlinkEvent { luma, blinked }
                    })
                    .collect();

                for event in &events {
                    listener.on_result(event.luma, event.blinked);
                }
                AnalysisOutcome::Completed(events)
            }
            Err(e) => {
                tracing::error!("Face inference failed at {:?}: {}", frame.timestamp(), e);
                AnalysisOutcome::Failed(e)
            }
        };

        frame.release();
        outcome
    }
}
