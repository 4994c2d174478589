//! # blink-swipe: blink-triggered scrolling
//!
//! Watches the front camera for eye blinks and answers each blink with a
//! synthetic swipe-up gesture. The architecture keeps the camera-facing
//! analysis and the privileged gesture service in separate execution
//! contexts that only share an announcement bus.
//!
//! ## Architecture
//!
//! - **Vision**: frame sampling, luminosity, and blink detection on a dedicated
//!   `blink-analysis` thread running async face inference
//! - **Pipeline**: the `SignalBridge` pub/sub bus and the UI notice channel
//! - **Gesture**: swipe construction and the `accessibility-service` thread
//!   that dispatches it
//! - **Platform**: traits for camera-adjacent collaborators, plus simulated
//!   devices behind the `mock-devices` feature
//!
//! ## Configuration
//!
//! Settings are stored as TOML in the platform-appropriate config directory
//! under `dev.blinkswipe`:
//!
//! - **Linux**: `~/.config/dev.blinkswipe/config.toml`
//! - **macOS**: `~/Library/Application Support/dev.blinkswipe/config.toml`
//! - **Windows**: `%APPDATA%\dev.blinkswipe\config.toml`
//!
//! ## Example
//!
//! ```ignore
//! use blink_swipe::{
//!     config::AppConfig,
//!     pipeline::PipelineBuilder,
//!     platform::mock::{MockCamera, MockDisplay, MockInferenceService, MockInjector},
//! };
//! use std::sync::Arc;
//!
//! let (mut pipeline, notices) = PipelineBuilder::new(AppConfig::load_or_default())
//!     .build(Arc::new(MockInferenceService::new().blinking_every(10)))?;
//! pipeline.bind_gesture_service(
//!     Arc::new(MockDisplay::new(1080, 2400)),
//!     Arc::new(MockInjector::new()),
//! )?;
//!
//! let camera = MockCamera::new(640, 480);
//! camera.stream(pipeline.frame_sink(), 30, 90)?.join().ok();
//!
//! for notice in notices.drain() {
//!     println!("{:?}", notice);
//! }
//! pipeline.shutdown();
//! ```

pub mod config;
pub mod error;
pub mod gesture;
pub mod pipeline;
pub mod platform;
pub mod types;
pub mod vision;

// Re-export commonly used types
pub use config::{AppConfig, DetectorConfig, DetectorOptions, DispatchPolicy, GestureConfig};
pub use error::{BlinkSwipeError, Result};
pub use gesture::{GestureDescription, GestureService, SwipePath};
pub use pipeline::{BlinkPipeline, PipelineBuilder, SignalBridge};
pub use types::{BlinkEvent, FaceObservation, LuminosityReading, UiNotice};
pub use vision::{average_luminosity, blink_from_observation, BlinkDetector, Frame};
