//! blink-swipe - Demo Entry Point
//!
//! Runs the full pipeline against the simulated devices: a camera streaming
//! uniform frames, an inference service that reports a blink every few
//! frames, and an injector that records the swipes it receives.

use anyhow::{Context, Result};
use blink_swipe::{
    config::{AppConfig, LoggingConfig},
    pipeline::PipelineBuilder,
    platform::{
        check_accessibility_enabled,
        mock::{MockCamera, MockDisplay, MockInferenceService, MockInjector, MockSettings},
    },
    types::UiNotice,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Environment variable pointing at an explicit config file
const CONFIG_ENV: &str = "BLINK_SWIPE_CONFIG";

const CAMERA_FPS: u32 = 30;
const CAMERA_FRAMES: usize = 150;

fn main() -> Result<()> {
    let config = match std::env::var_os(CONFIG_ENV) {
        Some(path) => AppConfig::load_from(&path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => AppConfig::load_or_default(),
    };

    let _guard = init_logging(&config.logging)?;
    tracing::info!("Starting blink-swipe demo");

    if !check_accessibility_enabled(&MockSettings::enabled()) {
        tracing::warn!("Accessibility service not enabled, swipes will not be injected");
    }

    let inference = Arc::new(
        MockInferenceService::new()
            .blinking_every(15)
            .with_latency(Duration::from_millis(20)),
    );
    let (mut pipeline, notices) = PipelineBuilder::new(config).build(inference)?;

    let display = Arc::new(MockDisplay::new(1080, 2400));
    let injector = Arc::new(MockInjector::new());
    pipeline.bind_gesture_service(display, injector.clone())?;

    let camera = MockCamera::new(640, 480).with_luma(96);
    let stream = camera.stream(pipeline.frame_sink(), CAMERA_FPS, CAMERA_FRAMES)?;

    // This thread plays the UI: it owns the notice receiver
    while !stream.is_finished() {
        if let Some(UiNotice::Blink { luma, at }) = notices.recv_timeout(Duration::from_millis(50))
        {
            println!("BLINK (luma {}, {})", luma, at.format("%H:%M:%S%.3f"));
        }
    }
    if stream.join().is_err() {
        tracing::error!("Camera thread panicked");
    }

    // Let the last analysis and dispatch settle
    std::thread::sleep(Duration::from_millis(200));
    for UiNotice::Blink { luma, at } in notices.drain() {
        println!("BLINK (luma {}, {})", luma, at.format("%H:%M:%S%.3f"));
    }

    pipeline.shutdown();

    let report = serde_json::json!({
        "vision": pipeline.vision_stats(),
        "bridge": pipeline.bridge_stats(),
        "dispatch": pipeline.dispatch_stats(),
        "gestures_recorded": injector.dispatch_count(),
        "camera": {
            "released": camera.released(),
            "outstanding": camera.outstanding(),
            "stalls": camera.stalls(),
        },
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

/// Console logging, plus a daily-rolling file when a log directory is set.
///
/// `RUST_LOG` takes precedence over the configured filter.
fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter))
    };

    let console_layer = fmt::layer().with_writer(std::io::stderr).with_filter(filter());

    let (file_layer, guard) = match &config.file_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory: {:?}", dir))?;
            let appender = tracing_appender::rolling::daily(dir, "blink-swipe.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(filter());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}
