//! Simulated platform devices
//!
//! Lets the whole pipeline run without a camera, a face model or a privileged
//! input service. Used by the demo binary and by the integration tests.
//!
//! # Devices
//!
//! - [`MockCamera`] - Produces uniform frames from a bounded buffer pool
//! - [`MockInferenceService`] - Scripted face observations with optional latency
//! - [`MockInjector`] - Records every gesture it is asked to dispatch
//! - [`MockDisplay`] - Display metrics that can change between queries
//! - [`MockSettings`] - Accessibility setting, optionally unreadable
//!
//! # Example
//!
//! ```ignore
//! use blink_swipe::platform::mock::{MockCamera, MockInferenceService};
//!
//! let inference = MockInferenceService::new().blinking_every(10);
//! let camera = MockCamera::new(640, 480).with_luma(90);
//! let handle = camera.stream(pipeline.frame_sink(), 30, 300);
//! ```

use crate::config::DetectorOptions;
use crate::error::{BlinkSwipeError, Result};
use crate::gesture::GestureDescription;
use crate::types::{DisplayMetrics, FaceObservation, Rotation};
use crate::vision::{Frame, FrameSink};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use super::collaborators::{
    AccessibilitySettings, DisplayMetricsSource, FaceInferenceService, GestureInjector, InputImage,
};

// ============================================================================
// Camera
// ============================================================================

/// Camera producing uniform luminance frames
///
/// Buffers come from a pool of `pool_size`; once every buffer is out and
/// unreleased the camera stalls and [`MockCamera::next_frame`] yields nothing.
#[derive(Debug, Clone)]
pub struct MockCamera {
    width: u32,
    height: u32,
    luma: u8,
    rotation: Rotation,
    pool_size: usize,
    started: Instant,
    outstanding: Arc<AtomicUsize>,
    released: Arc<AtomicU64>,
    stalls: Arc<AtomicU64>,
}

impl MockCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            luma: 128,
            rotation: Rotation::Deg0,
            pool_size: 4,
            started: Instant::now(),
            outstanding: Arc::new(AtomicUsize::new(0)),
            released: Arc::new(AtomicU64::new(0)),
            stalls: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Set the value every pixel of the luminance plane takes
    pub fn with_luma(mut self, luma: u8) -> Self {
        self.luma = luma;
        self
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size.max(1);
        self
    }

    /// Capture one frame, or `None` while the buffer pool is exhausted
    pub fn next_frame(&self) -> Option<Frame> {
        let acquired = self
            .outstanding
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < self.pool_size).then_some(n + 1)
            })
            .is_ok();
        if !acquired {
            self.stalls.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        let plane = vec![self.luma; (self.width as usize) * (self.height as usize)];
        let outstanding = Arc::clone(&self.outstanding);
        let released = Arc::clone(&self.released);
        Some(
            Frame::new(
                plane,
                self.width,
                self.height,
                self.rotation,
                self.started.elapsed(),
            )
            .with_release_hook(move || {
                outstanding.fetch_sub(1, Ordering::SeqCst);
                released.fetch_add(1, Ordering::SeqCst);
            }),
        )
    }

    /// Buffers returned to the pool so far
    pub fn released(&self) -> u64 {
        self.released.load(Ordering::SeqCst)
    }

    /// Buffers currently held by consumers
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    /// Capture attempts that found the pool empty
    pub fn stalls(&self) -> u64 {
        self.stalls.load(Ordering::Relaxed)
    }

    /// Push `frames` frames into `sink` at `fps` on a `mock-camera` thread
    pub fn stream(&self, sink: FrameSink, fps: u32, frames: usize) -> Result<JoinHandle<()>> {
        let camera = self.clone();
        let interval = Duration::from_secs_f64(1.0 / f64::from(fps.max(1)));

        let handle = std::thread::Builder::new()
            .name("mock-camera".to_string())
            .spawn(move || {
                for _ in 0..frames {
                    let tick = Instant::now();
                    match camera.next_frame() {
                        Some(frame) => {
                            sink.on_frame(frame);
                        }
                        None => tracing::trace!("Camera stalled: no free buffers"),
                    }
                    if let Some(rest) = interval.checked_sub(tick.elapsed()) {
                        std::thread::sleep(rest);
                    }
                }
                tracing::debug!("Mock camera finished streaming {} frames", frames);
            })?;
        Ok(handle)
    }
}

// ============================================================================
// Face inference
// ============================================================================

/// One scripted inference result
#[derive(Debug, Clone, PartialEq)]
pub enum MockResponse {
    Faces(Vec<FaceObservation>),
    Failure(String),
    /// The model is not loaded
    Unavailable(String),
}

impl MockResponse {
    /// A single face with both eyes open
    pub fn open_eyes() -> Self {
        MockResponse::Faces(vec![FaceObservation::with_eyes(0.95, 0.95)])
    }

    /// A single face with both eyes closed
    pub fn closed_eyes() -> Self {
        MockResponse::Faces(vec![FaceObservation::with_eyes(0.001, 0.001)])
    }

    pub fn no_face() -> Self {
        MockResponse::Faces(Vec::new())
    }
}

/// Inference service answering from a script
///
/// Queued responses are consumed in order. When the queue is empty the
/// service answers with the fallback, or with closed eyes on every n-th call
/// if [`MockInferenceService::blinking_every`] was set.
#[derive(Debug)]
pub struct MockInferenceService {
    script: Mutex<VecDeque<MockResponse>>,
    fallback: MockResponse,
    blink_every: Option<u64>,
    latency: Duration,
    calls: AtomicU64,
    last_image: Mutex<Option<(u32, u32, Rotation)>>,
}

impl MockInferenceService {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: MockResponse::open_eyes(),
            blink_every: None,
            latency: Duration::ZERO,
            calls: AtomicU64::new(0),
            last_image: Mutex::new(None),
        }
    }

    pub fn with_fallback(mut self, fallback: MockResponse) -> Self {
        self.fallback = fallback;
        self
    }

    /// Simulated inference time per call
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Report closed eyes on every `n`-th unscripted call
    pub fn blinking_every(mut self, n: u64) -> Self {
        self.blink_every = (n > 0).then_some(n);
        self
    }

    pub fn push_response(&self, response: MockResponse) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(response);
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Dimensions and rotation of the most recent image
    pub fn last_image(&self) -> Option<(u32, u32, Rotation)> {
        *self.last_image.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn next_response(&self, call: u64) -> MockResponse {
        let scripted = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        match (scripted, self.blink_every) {
            (Some(response), _) => response,
            (None, Some(n)) if call % n == 0 => MockResponse::closed_eyes(),
            (None, _) => self.fallback.clone(),
        }
    }
}

impl Default for MockInferenceService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FaceInferenceService for MockInferenceService {
    async fn process(
        &self,
        image: &InputImage<'_>,
        _options: &DetectorOptions,
    ) -> Result<Vec<FaceObservation>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        *self.last_image.lock().unwrap_or_else(|e| e.into_inner()) =
            Some((image.width, image.height, image.rotation));

        let response = self.next_response(call);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match response {
            MockResponse::Faces(faces) => Ok(faces),
            MockResponse::Failure(reason) => Err(BlinkSwipeError::Inference(reason)),
            MockResponse::Unavailable(reason) => Err(BlinkSwipeError::DetectorUnavailable(reason)),
        }
    }
}

// ============================================================================
// Gesture injection and display
// ============================================================================

/// Injector that records gestures instead of performing them
#[derive(Debug)]
pub struct MockInjector {
    dispatched: Mutex<Vec<GestureDescription>>,
    accepting: AtomicBool,
}

impl MockInjector {
    pub fn new() -> Self {
        Self {
            dispatched: Mutex::new(Vec::new()),
            accepting: AtomicBool::new(true),
        }
    }

    /// Whether later dispatches are reported as accepted
    pub fn set_accepting(&self, accepting: bool) {
        self.accepting.store(accepting, Ordering::SeqCst);
    }

    /// Every gesture submitted so far, accepted or not
    pub fn dispatched(&self) -> Vec<GestureDescription> {
        self.dispatched
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn dispatch_count(&self) -> usize {
        self.dispatched
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

impl Default for MockInjector {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureInjector for MockInjector {
    fn dispatch(&self, gesture: &GestureDescription) -> bool {
        self.dispatched
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(gesture.clone());
        self.accepting.load(Ordering::SeqCst)
    }
}

/// Display whose size can change at runtime (rotation, resize)
#[derive(Debug)]
pub struct MockDisplay {
    metrics: RwLock<DisplayMetrics>,
    queries: AtomicU64,
}

impl MockDisplay {
    pub fn new(width_px: u32, height_px: u32) -> Self {
        Self {
            metrics: RwLock::new(DisplayMetrics::new(width_px, height_px)),
            queries: AtomicU64::new(0),
        }
    }

    pub fn set_metrics(&self, metrics: DisplayMetrics) {
        *self.metrics.write().unwrap_or_else(|e| e.into_inner()) = metrics;
    }

    pub fn query_count(&self) -> u64 {
        self.queries.load(Ordering::SeqCst)
    }
}

impl DisplayMetricsSource for MockDisplay {
    fn metrics(&self) -> DisplayMetrics {
        self.queries.fetch_add(1, Ordering::SeqCst);
        *self.metrics.read().unwrap_or_else(|e| e.into_inner())
    }
}

// ============================================================================
// Settings
// ============================================================================

/// Accessibility setting; `None` simulates a setting that cannot be read
#[derive(Debug, Clone, Copy)]
pub struct MockSettings {
    enabled: Option<bool>,
}

impl MockSettings {
    pub fn enabled() -> Self {
        Self {
            enabled: Some(true),
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: Some(false),
        }
    }

    pub fn unreadable() -> Self {
        Self { enabled: None }
    }
}

impl AccessibilitySettings for MockSettings {
    fn accessibility_enabled(&self) -> Result<bool> {
        self.enabled.ok_or_else(|| {
            BlinkSwipeError::Settings("accessibility_enabled setting not found".to_string())
        })
    }
}
