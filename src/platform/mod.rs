//! Platform boundary
//!
//! Camera, face inference, gesture injection, display metrics and the
//! accessibility setting are all platform services. This module defines the
//! seams the pipeline talks through.
//!
//! # Components
//!
//! - [`FaceInferenceService`] - Asynchronous face landmark inference
//! - [`GestureInjector`] - Synthetic gesture submission
//! - [`DisplayMetricsSource`] - Current screen size
//! - [`AccessibilitySettings`] - Whether the gesture service is enabled
//! - [`mock`] - Simulated devices for running without hardware (feature-gated)
//!
//! # Enabling the simulated devices
//!
//! ```bash
//! cargo run --features mock-devices
//! ```

pub mod collaborators;
#[cfg(feature = "mock-devices")]
pub mod mock;

pub use collaborators::{
    check_accessibility_enabled, AccessibilitySettings, DisplayMetricsSource,
    FaceInferenceService, GestureInjector, InputImage,
};
#[cfg(feature = "mock-devices")]
pub use mock::{MockCamera, MockDisplay, MockInferenceService, MockInjector, MockResponse, MockSettings};
