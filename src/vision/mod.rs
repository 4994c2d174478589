//! Camera-side half of the pipeline: frames, luminosity, blink detection and
//! the sampler that ties them to a single analysis worker.

pub mod detector;
pub mod frame;
pub mod luminosity;
pub mod sampler;

pub use detector::{blink_from_observation, AnalysisOutcome, BlinkDetector, BlinkListener};
pub use frame::Frame;
pub use luminosity::average_luminosity;
pub use sampler::{FrameSampler, FrameSink, LiveListener};
