//! Gesture service: the privileged side of the pipeline
//!
//! This module contains the service object that turns bridge events into
//! synthetic swipes. It runs on its own `accessibility-service` thread,
//! separate from both the analysis worker and the UI thread.
//!
//! # Lifecycle
//!
//! ```text
//! Disconnected --connect--> Connected --interrupt--> Disconnected
//! ```
//!
//! Connecting issues one swipe with the startup delay. While connected, every
//! announcement issues a swipe with no delay. Display metrics are queried at
//! every dispatch, never cached.
//!
//! # Overlapping triggers
//!
//! Under [`DispatchPolicy::Concurrent`] every trigger dispatches, even while
//! the previous gesture is still running. [`DispatchPolicy::DropWhileInFlight`]
//! drops triggers that arrive inside the previous gesture's window.

use crate::config::{DispatchPolicy, GestureConfig};
use crate::error::Result;
use crate::pipeline::bridge::{EventType, PlatformEvent, SignalBridge, Subscription};
use crate::platform::{DisplayMetricsSource, GestureInjector};
use crate::types::{ConnectionStatus, DispatchStats};
use crossbeam_channel::RecvTimeoutError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use super::swipe::{GestureDescription, SwipeGeometry};

/// How often the service thread re-checks its running flag while idle
const SERVICE_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// What happened to one dispatch request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The platform accepted the gesture
    Accepted,
    /// The platform refused the gesture, or the display had no size
    Rejected,
    /// A gesture was still running and the policy drops overlapping triggers
    DroppedInFlight,
    /// Not connected, or not a trigger event
    Ignored,
}

/// State visible from outside the service thread
#[derive(Debug, Default)]
struct ServiceShared {
    connected: AtomicBool,
    stats: Mutex<DispatchStats>,
}

impl ServiceShared {
    fn status(&self) -> ConnectionStatus {
        if self.connected.load(Ordering::SeqCst) {
            ConnectionStatus::Connected
        } else {
            ConnectionStatus::Disconnected
        }
    }

    fn stats(&self) -> DispatchStats {
        self.stats.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn update(&self, f: impl FnOnce(&mut DispatchStats)) {
        f(&mut self.stats.lock().unwrap_or_else(|e| e.into_inner()));
    }
}

/// Service object with injected display and injector collaborators
pub struct GestureService {
    config: GestureConfig,
    geometry: SwipeGeometry,
    display: Arc<dyn DisplayMetricsSource>,
    injector: Arc<dyn GestureInjector>,
    shared: Arc<ServiceShared>,
    /// End of the most recently accepted gesture
    in_flight_until: Option<Instant>,
}

impl GestureService {
    pub fn new(
        config: GestureConfig,
        display: Arc<dyn DisplayMetricsSource>,
        injector: Arc<dyn GestureInjector>,
    ) -> Self {
        Self {
            geometry: SwipeGeometry::from_config(&config),
            config,
            display,
            injector,
            shared: Arc::new(ServiceShared::default()),
            in_flight_until: None,
        }
    }

    /// Bound to the privileged context: go Connected and swipe once after
    /// the startup delay.
    pub fn on_service_connected(&mut self) -> DispatchOutcome {
        self.shared.connected.store(true, Ordering::SeqCst);
        tracing::info!("Gesture service connected");
        self.dispatch_swipe(Duration::from_millis(self.config.startup_delay_ms))
    }

    /// Handle one event from the bridge
    pub fn on_event(&mut self, event: &PlatformEvent) -> DispatchOutcome {
        if !self.shared.connected.load(Ordering::SeqCst) {
            return DispatchOutcome::Ignored;
        }
        if event.event_type != EventType::Announcement {
            self.shared.update(|s| s.ignored_events += 1);
            return DispatchOutcome::Ignored;
        }

        if self.config.dispatch_policy == DispatchPolicy::DropWhileInFlight {
            if let Some(until) = self.in_flight_until {
                if Instant::now() < until {
                    tracing::debug!("Gesture in flight, dropping trigger");
                    self.shared.update(|s| s.dropped_in_flight += 1);
                    return DispatchOutcome::DroppedInFlight;
                }
            }
        }

        self.dispatch_swipe(Duration::ZERO)
    }

    /// Service torn down. Gestures already submitted may not complete.
    pub fn on_interrupt(&mut self) {
        self.shared.connected.store(false, Ordering::SeqCst);
        self.in_flight_until = None;
        tracing::info!("Gesture service interrupted");
    }

    pub fn status(&self) -> ConnectionStatus {
        self.shared.status()
    }

    pub fn stats(&self) -> DispatchStats {
        self.shared.stats()
    }

    fn dispatch_swipe(&mut self, start_delay: Duration) -> DispatchOutcome {
        let metrics = self.display.metrics();
        if metrics.width_px == 0 || metrics.height_px == 0 {
            tracing::warn!(
                "Display reports {}x{}, not dispatching",
                metrics.width_px,
                metrics.height_px
            );
            self.shared.update(|s| s.rejected += 1);
            return DispatchOutcome::Rejected;
        }

        let gesture = GestureDescription::swipe_up(
            metrics,
            &self.geometry,
            start_delay,
            Duration::from_millis(self.config.duration_ms),
        );
        let accepted = self.injector.dispatch(&gesture);
        let rise: f32 = gesture.strokes().iter().map(|s| s.path.rise()).sum();
        tracing::debug!("Gesture dispatched: {} (rise {}px)", accepted, rise);

        if accepted {
            self.in_flight_until = Some(Instant::now() + gesture.total_duration());
            self.shared.update(|s| s.accepted += 1);
            DispatchOutcome::Accepted
        } else {
            tracing::warn!("Platform rejected swipe gesture");
            self.shared.update(|s| s.rejected += 1);
            DispatchOutcome::Rejected
        }
    }

    /// Run the service on its own thread, listening to `bridge`.
    ///
    /// The subscription is registered before this returns, so triggers
    /// published afterwards are not lost while the thread starts up.
    pub fn start(self, bridge: &SignalBridge) -> Result<ServiceHandle> {
        let subscription = bridge.subscribe_to(&EventType::ALL);
        let running = Arc::new(AtomicBool::new(true));
        let shared = Arc::clone(&self.shared);

        let thread_running = Arc::clone(&running);
        let handle = std::thread::Builder::new()
            .name("accessibility-service".to_string())
            .spawn(move || run_service(self, subscription, thread_running))?;

        Ok(ServiceHandle {
            running,
            shared,
            handle: Some(handle),
        })
    }
}

fn run_service(mut service: GestureService, subscription: Subscription, running: Arc<AtomicBool>) {
    service.on_service_connected();

    while running.load(Ordering::SeqCst) {
        match subscription.recv_timeout(SERVICE_POLL_INTERVAL) {
            Ok(event) => {
                service.on_event(&event);
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    service.on_interrupt();
}

/// Owner of a running service thread
pub struct ServiceHandle {
    running: Arc<AtomicBool>,
    shared: Arc<ServiceShared>,
    handle: Option<JoinHandle<()>>,
}

impl ServiceHandle {
    pub fn status(&self) -> ConnectionStatus {
        self.shared.status()
    }

    pub fn stats(&self) -> DispatchStats {
        self.shared.stats()
    }

    /// Interrupt the service and wait for its thread to exit
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("Gesture service thread panicked");
            }
        }
    }
}

impl Drop for ServiceHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
