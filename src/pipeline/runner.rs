//! Pipeline assembly and lifecycle
//!
//! ```text
//! camera ──► FrameSink ──► [blink-analysis] BlinkDetector ──► BlinkRelay
//!                                                              ├──► UiNotifier (BLINK notice)
//!                                                              └──► SignalBridge::announce
//!                                                                     │
//!                            [accessibility-service] GestureService ◄─┘
//! ```
//!
//! The gesture service is bound and unbound independently of the vision
//! side. While it is unbound, blinks still produce notices but their
//! triggers are lost.

use crate::config::AppConfig;
use crate::error::{Result, ResultExt};
use crate::gesture::{GestureService, ServiceHandle};
use crate::platform::{DisplayMetricsSource, FaceInferenceService, GestureInjector};
use crate::types::{ConnectionStatus, DispatchStats, LuminosityReading, PipelineStats, UiNotice};
use crate::vision::{BlinkDetector, BlinkListener, FrameSampler, FrameSink};
use chrono::Utc;
use std::sync::Arc;

use super::bridge::{ui_channel, BridgeStats, SignalBridge, UiNoticeReceiver, UiNotifier};

/// Turns detector results into user notices and gesture triggers
pub struct BlinkRelay {
    bridge: SignalBridge,
    notifier: UiNotifier,
}

impl BlinkRelay {
    pub fn new(bridge: SignalBridge, notifier: UiNotifier) -> Self {
        Self { bridge, notifier }
    }
}

impl BlinkListener for BlinkRelay {
    fn on_result(&self, luma: LuminosityReading, blinked: bool) {
        tracing::debug!("Frame luminosity: {}", luma);
        if !blinked {
            return;
        }

        self.notifier.notify(UiNotice::Blink {
            luma,
            at: Utc::now(),
        });
        if self.bridge.announce() == 0 {
            tracing::debug!("Gesture trigger lost: no service listening");
        }
    }
}

pub struct PipelineBuilder {
    config: AppConfig,
}

impl PipelineBuilder {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Start the vision side.
    ///
    /// Returns the pipeline and the receiver the UI thread drains notices
    /// from. The gesture service is not bound yet.
    pub fn build(
        self,
        inference: Arc<dyn FaceInferenceService>,
    ) -> Result<(BlinkPipeline, UiNoticeReceiver)> {
        self.config.validate().context("Invalid pipeline configuration")?;

        let bridge = SignalBridge::new(&self.config.bridge);
        let (notifier, notices) = ui_channel();
        let relay: Arc<dyn BlinkListener> = Arc::new(BlinkRelay::new(bridge.clone(), notifier));

        let detector = BlinkDetector::new(inference, &self.config.detector);
        let threshold = detector.threshold();
        let sampler = FrameSampler::spawn(&self.config.analysis, detector, relay)
            .context("Failed to start frame analysis")?;

        tracing::info!(
            "Pipeline started (threshold={}, policy={})",
            threshold,
            self.config.gesture.dispatch_policy
        );

        Ok((
            BlinkPipeline {
                config: self.config,
                sampler,
                bridge,
                service: None,
                retired_stats: DispatchStats::default(),
            },
            notices,
        ))
    }
}

/// A running pipeline
pub struct BlinkPipeline {
    config: AppConfig,
    sampler: FrameSampler,
    bridge: SignalBridge,
    service: Option<ServiceHandle>,
    /// Dispatch counters of services that have been unbound
    retired_stats: DispatchStats,
}

impl BlinkPipeline {
    /// Handle for the camera
    pub fn frame_sink(&self) -> FrameSink {
        self.sampler.sink()
    }

    pub fn bridge(&self) -> &SignalBridge {
        &self.bridge
    }

    pub fn vision_stats(&self) -> PipelineStats {
        self.sampler.stats()
    }

    pub fn bridge_stats(&self) -> BridgeStats {
        self.bridge.stats()
    }

    /// Start the gesture service, replacing any service already bound
    pub fn bind_gesture_service(
        &mut self,
        display: Arc<dyn DisplayMetricsSource>,
        injector: Arc<dyn GestureInjector>,
    ) -> Result<()> {
        self.unbind_gesture_service();
        let service = GestureService::new(self.config.gesture.clone(), display, injector);
        let handle = service
            .start(&self.bridge)
            .context("Failed to start gesture service")?;
        self.service = Some(handle);
        Ok(())
    }

    /// Interrupt the gesture service, if bound
    pub fn unbind_gesture_service(&mut self) {
        if let Some(mut handle) = self.service.take() {
            handle.stop();
            let stats = handle.stats();
            self.retired_stats.accepted += stats.accepted;
            self.retired_stats.rejected += stats.rejected;
            self.retired_stats.dropped_in_flight += stats.dropped_in_flight;
            self.retired_stats.ignored_events += stats.ignored_events;
        }
    }

    pub fn service_status(&self) -> ConnectionStatus {
        self.service
            .as_ref()
            .map_or(ConnectionStatus::Disconnected, ServiceHandle::status)
    }

    /// Dispatch counters across every service bound so far
    pub fn dispatch_stats(&self) -> DispatchStats {
        let mut total = self.retired_stats.clone();
        if let Some(handle) = &self.service {
            let stats = handle.stats();
            total.accepted += stats.accepted;
            total.rejected += stats.rejected;
            total.dropped_in_flight += stats.dropped_in_flight;
            total.ignored_events += stats.ignored_events;
        }
        total
    }

    /// Tear down both sides.
    ///
    /// The gesture service goes first so a hung inference call can only delay
    /// the analysis side, and only up to `analysis.shutdown_timeout_ms`.
    pub fn shutdown(&mut self) {
        self.unbind_gesture_service();
        if !self.sampler.shutdown() {
            tracing::warn!("Pipeline stopped with inference still in flight");
        }
        tracing::info!("Pipeline stopped");
    }
}
