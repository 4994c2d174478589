//! Error handling for blink-swipe
//!
//! This module defines the crate error type and a Result alias. None of these
//! errors is fatal to a running pipeline: analysis failures skip a frame,
//! rejected gestures are dropped, and lost triggers are never observed at all.

use thiserror::Error;

/// Main error type for blink-swipe operations
#[derive(Error, Debug)]
pub enum BlinkSwipeError {
    /// The face inference service failed to process a frame
    #[error("Inference error: {0}")]
    Inference(String),

    /// The inference service is missing or misconfigured
    #[error("Detector unavailable: {0}")]
    DetectorUnavailable(String),

    /// Errors related to configuration loading/saving/validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// Platform settings could not be read
    #[error("Settings error: {0}")]
    Settings(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<BlinkSwipeError>,
    },
}

impl BlinkSwipeError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        BlinkSwipeError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

impl From<toml::de::Error> for BlinkSwipeError {
    fn from(err: toml::de::Error) -> Self {
        BlinkSwipeError::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for BlinkSwipeError {
    fn from(err: toml::ser::Error) -> Self {
        BlinkSwipeError::Serialization(err.to_string())
    }
}

/// Result type alias for blink-swipe operations
pub type Result<T> = std::result::Result<T, BlinkSwipeError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
