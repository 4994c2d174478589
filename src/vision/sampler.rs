//! Frame Sampler: the single-worker analysis context
//!
//! The camera calls [`FrameSink::on_frame`] at its own cadence. The sink
//! computes luminosity on the calling thread and hands the frame to a
//! dedicated `blink-analysis` thread through a bounded crossbeam queue.
//!
//! # Throttling
//!
//! The worker analyzes strictly one frame at a time. When it is busy and the
//! queue is full, new frames are dropped and released immediately, so slow
//! inference throttles the stream instead of growing a backlog.
//!
//! # Teardown
//!
//! [`FrameSampler::shutdown`] clears the running flag and waits for the
//! worker for at most `shutdown_timeout_ms`. Inference already in flight is
//! not cancelled. A worker still busy at the deadline is detached; if its
//! continuation fires later the listener call is suppressed by
//! [`LiveListener`]. Frames still queued are released when the worker drains
//! the queue on its way out.

use crate::config::AnalysisConfig;
use crate::error::{BlinkSwipeError, Result};
use crate::types::{LuminosityReading, PipelineStats};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use super::detector::{AnalysisOutcome, BlinkDetector, BlinkListener};
use super::frame::Frame;
use super::luminosity::average_luminosity;

/// A frame waiting for analysis, with its luminosity already computed
struct FrameJob {
    frame: Frame,
    luma: LuminosityReading,
}

/// Counters shared between the camera thread and the analysis worker
#[derive(Debug, Default)]
struct SamplerCounters {
    frames_received: AtomicU64,
    frames_analyzed: AtomicU64,
    frames_dropped: AtomicU64,
    analysis_failures: AtomicU64,
    faces_observed: AtomicU64,
    blinks_detected: AtomicU64,
}

impl SamplerCounters {
    fn snapshot(&self) -> PipelineStats {
        PipelineStats {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_analyzed: self.frames_analyzed.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            analysis_failures: self.analysis_failures.load(Ordering::Relaxed),
            faces_observed: self.faces_observed.load(Ordering::Relaxed),
            blinks_detected: self.blinks_detected.load(Ordering::Relaxed),
        }
    }
}

/// Listener wrapper that goes quiet once the sampler is torn down
pub struct LiveListener {
    inner: Arc<dyn BlinkListener>,
    running: Arc<AtomicBool>,
}

impl BlinkListener for LiveListener {
    fn on_result(&self, luma: LuminosityReading, blinked: bool) {
        if self.running.load(Ordering::SeqCst) {
            self.inner.on_result(luma, blinked);
        } else {
            tracing::debug!("Dropping analysis result after teardown (blinked={})", blinked);
        }
    }
}

/// Camera-facing handle of the sampler
#[derive(Clone)]
pub struct FrameSink {
    job_tx: Sender<FrameJob>,
    running: Arc<AtomicBool>,
    counters: Arc<SamplerCounters>,
}

impl FrameSink {
    /// Accept one frame from the camera.
    ///
    /// Never blocks beyond the luminosity pass. Returns whether the frame was
    /// queued for analysis; a frame that was not queued has already been
    /// released.
    pub fn on_frame(&self, frame: Frame) -> bool {
        self.counters.frames_received.fetch_add(1, Ordering::Relaxed);

        if !self.running.load(Ordering::SeqCst) {
            return false;
        }

        let luma = average_luminosity(frame.luminance_plane());
        tracing::trace!("Average luminosity: {}", luma);

        match self.job_tx.try_send(FrameJob { frame, luma }) {
            Ok(()) => true,
            Err(TrySendError::Full(_job)) => {
                self.counters.frames_dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
            Err(TrySendError::Disconnected(_job)) => false,
        }
    }
}

/// Owner of the analysis worker thread
pub struct FrameSampler {
    sink: FrameSink,
    running: Arc<AtomicBool>,
    counters: Arc<SamplerCounters>,
    handle: Option<JoinHandle<()>>,
    shutdown_timeout: Duration,
}

/// Interval between checks on a worker that is winding down
const SHUTDOWN_POLL: Duration = Duration::from_millis(5);

impl FrameSampler {
    /// Start the analysis worker
    pub fn spawn(
        config: &AnalysisConfig,
        detector: BlinkDetector,
        listener: Arc<dyn BlinkListener>,
    ) -> Result<Self> {
        if config.frame_queue_capacity == 0 {
            return Err(BlinkSwipeError::Config(
                "frame queue capacity must be at least 1".to_string(),
            ));
        }

        let (job_tx, job_rx) = bounded(config.frame_queue_capacity);
        let running = Arc::new(AtomicBool::new(true));
        let counters = Arc::new(SamplerCounters::default());

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;

        let worker = AnalysisWorker {
            job_rx,
            running: Arc::clone(&running),
            detector,
            listener: LiveListener {
                inner: listener,
                running: Arc::clone(&running),
            },
            counters: Arc::clone(&counters),
            idle_poll: Duration::from_millis(config.idle_poll_ms.max(1)),
        };

        let handle = std::thread::Builder::new()
            .name("blink-analysis".to_string())
            .spawn(move || worker.run(runtime))?;

        Ok(Self {
            sink: FrameSink {
                job_tx,
                running: Arc::clone(&running),
                counters: Arc::clone(&counters),
            },
            running,
            counters,
            handle: Some(handle),
            shutdown_timeout: Duration::from_millis(config.shutdown_timeout_ms),
        })
    }

    /// Handle for the camera to push frames into
    pub fn sink(&self) -> FrameSink {
        self.sink.clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> PipelineStats {
        self.counters.snapshot()
    }

    /// Stop the worker, waiting at most the configured shutdown timeout.
    ///
    /// Returns `false` when the worker was still inside an inference call at
    /// the deadline and had to be detached.
    pub fn shutdown(&mut self) -> bool {
        self.running.store(false, Ordering::SeqCst);
        let Some(handle) = self.handle.take() else {
            return true;
        };

        let deadline = Instant::now() + self.shutdown_timeout;
        while !handle.is_finished() && Instant::now() < deadline {
            std::thread::sleep(SHUTDOWN_POLL);
        }

        if !handle.is_finished() {
            tracing::warn!(
                "Frame analysis worker still busy after {:?}, detaching it",
                self.shutdown_timeout
            );
            return false;
        }
        if handle.join().is_err() {
            tracing::error!("Frame analysis worker panicked");
        }
        true
    }
}

impl Drop for FrameSampler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// State owned by the analysis thread
struct AnalysisWorker {
    job_rx: Receiver<FrameJob>,
    running: Arc<AtomicBool>,
    detector: BlinkDetector,
    listener: LiveListener,
    counters: Arc<SamplerCounters>,
    idle_poll: Duration,
}

impl AnalysisWorker {
    fn run(self, runtime: tokio::runtime::Runtime) {
        tracing::info!("Frame analysis worker started");

        while self.running.load(Ordering::SeqCst) {
            match self.job_rx.recv_timeout(self.idle_poll) {
                Ok(job) => {
                    if !self.running.load(Ordering::SeqCst) {
                        break;
                    }
                    let outcome =
                        runtime.block_on(self.detector.analyze(job.frame, job.luma, &self.listener));
                    self.record(&outcome);
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        // Queued frames go back to the camera
        let mut discarded = 0usize;
        while let Ok(job) = self.job_rx.try_recv() {
            drop(job);
            discarded += 1;
        }

        tracing::info!(
            "Frame analysis worker stopped ({} queued frames released)",
            discarded
        );
    }

    fn record(&self, outcome: &AnalysisOutcome) {
        self.counters.frames_analyzed.fetch_add(1, Ordering::Relaxed);
        match outcome {
            AnalysisOutcome::Completed(events) => {
                let blinks = events.iter().filter(|e| e.blinked).count() as u64;
                self.counters
                    .faces_observed
                    .fetch_add(events.len() as u64, Ordering::Relaxed);
                self.counters
                    .blinks_detected
                    .fetch_add(blinks, Ordering::Relaxed);
            }
            AnalysisOutcome::Failed(_) => {
                self.counters
                    .analysis_failures
                    .fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}
