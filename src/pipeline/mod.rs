//! Pipeline wiring between the vision and gesture sides.
//!
//! # Architecture
//!
//! ```text
//! [camera] ──► [FrameSampler] ──► [BlinkDetector] ──► [BlinkRelay] ──► SignalBridge ──► [GestureService]
//!                                                              └──► UiNotifier ──► UI thread
//! ```
//!
//! # Design
//!
//! - **No shared references across contexts**: the vision side and the gesture
//!   service only share the `SignalBridge`.
//! - **Dedicated threads**: `blink-analysis` for inference, `accessibility-service`
//!   for dispatch; the UI thread only drains notices.
//! - **Best-effort delivery**: a trigger published while no service is bound is lost.

pub mod bridge;
pub mod runner;

pub use bridge::{
    ui_channel, BridgeStats, EventType, PlatformEvent, SignalBridge, Subscription, UiNoticeReceiver,
    UiNotifier,
};
pub use runner::{BlinkPipeline, BlinkRelay, PipelineBuilder};
