//! Privileged side of the pipeline: swipe construction and the service that
//! dispatches it.

pub mod service;
pub mod swipe;

pub use service::{DispatchOutcome, GestureService, ServiceHandle};
pub use swipe::{GestureBuilder, GestureDescription, StrokeDescription, SwipeGeometry, SwipePath};
