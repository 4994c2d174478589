//! End-to-end tests: camera frames in, swipes out
//!
//! Runs the full pipeline on the simulated devices. Every test binds real
//! threads, so waits are bounded by `common::test_timeout()`.

#![cfg(feature = "mock-devices")]

mod common;

use blink_swipe::config::{AppConfig, DispatchPolicy, GestureConfig};
use blink_swipe::platform::mock::{MockCamera, MockInferenceService, MockResponse};
use blink_swipe::types::{ConnectionStatus, DisplayMetrics, LuminosityReading, ScreenPoint, UiNotice};
use blink_swipe::vision::{BlinkDetector, BlinkListener, FrameSampler};
use common::builders::FrameBuilder;
use common::mock_helpers::{create_bound_pipeline, create_test_pipeline, TestDevices};
use common::{test_timeout, wait_for};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Calls = Arc<Mutex<Vec<(f64, bool)>>>;

/// Sampler wired straight to a recording listener
fn recording_sampler(inference: MockInferenceService) -> (FrameSampler, Calls) {
    let calls: Calls = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&calls);
    let listener: Arc<dyn BlinkListener> =
        Arc::new(move |luma: LuminosityReading, blinked: bool| {
            sink.lock().unwrap().push((luma.value(), blinked));
        });

    let config = AppConfig::default();
    let detector = BlinkDetector::new(Arc::new(inference), &config.detector);
    let sampler = FrameSampler::spawn(&config.analysis, detector, listener).unwrap();
    (sampler, calls)
}

// ============================================================================
// Vision side
// ============================================================================

#[test]
fn test_open_eyes_frame_reports_no_blink() {
    let inference = MockInferenceService::new();
    inference.push_response(MockResponse::Faces(vec![
        blink_swipe::FaceObservation::with_eyes(0.5, 0.5),
    ]));
    let (mut sampler, calls) = recording_sampler(inference);
    let released = Arc::new(AtomicUsize::new(0));

    assert!(sampler
        .sink()
        .on_frame(FrameBuilder::new().luma(128).counted(&released).build()));
    assert!(wait_for(test_timeout(), || released.load(Ordering::SeqCst) == 1));

    assert_eq!(*calls.lock().unwrap(), vec![(128.0, false)]);
    sampler.shutdown();
}

#[test]
fn test_single_closed_eye_reports_blink() {
    let inference = MockInferenceService::new();
    inference.push_response(MockResponse::Faces(vec![
        blink_swipe::FaceObservation::with_eyes(0.005, 0.9),
    ]));
    let (mut sampler, calls) = recording_sampler(inference);
    let released = Arc::new(AtomicUsize::new(0));

    sampler
        .sink()
        .on_frame(FrameBuilder::new().luma(128).counted(&released).build());
    assert!(wait_for(test_timeout(), || released.load(Ordering::SeqCst) == 1));

    assert_eq!(*calls.lock().unwrap(), vec![(128.0, true)]);
    assert_eq!(sampler.stats().blinks_detected, 1);
    sampler.shutdown();
}

#[test]
fn test_no_face_means_no_callback() {
    let (mut sampler, calls) =
        recording_sampler(MockInferenceService::new().with_fallback(MockResponse::no_face()));
    let released = Arc::new(AtomicUsize::new(0));

    sampler
        .sink()
        .on_frame(FrameBuilder::new().counted(&released).build());
    assert!(wait_for(test_timeout(), || released.load(Ordering::SeqCst) == 1));

    assert!(calls.lock().unwrap().is_empty());
    assert_eq!(sampler.stats().frames_analyzed, 1);
    assert_eq!(sampler.stats().faces_observed, 0);
    sampler.shutdown();
}

#[test]
fn test_inference_failure_releases_frame() {
    let inference = MockInferenceService::new();
    inference.push_response(MockResponse::Failure("model unavailable".into()));
    let (mut sampler, calls) = recording_sampler(inference);
    let released = Arc::new(AtomicUsize::new(0));

    sampler
        .sink()
        .on_frame(FrameBuilder::new().counted(&released).build());
    assert!(wait_for(test_timeout(), || released.load(Ordering::SeqCst) == 1));

    assert!(calls.lock().unwrap().is_empty());
    assert_eq!(sampler.stats().analysis_failures, 1);
    sampler.shutdown();
}

#[test]
fn test_camera_buffers_all_returned() {
    let devices = TestDevices::new(
        MockInferenceService::new()
            .blinking_every(4)
            .with_latency(Duration::from_millis(15)),
    );
    let (mut pipeline, _notices) = create_test_pipeline(AppConfig::default(), &devices);
    let camera = MockCamera::new(64, 48).with_pool_size(4);

    let stream = camera.stream(pipeline.frame_sink(), 200, 40).unwrap();
    stream.join().unwrap();
    pipeline.shutdown();

    let stats = pipeline.vision_stats();
    assert_eq!(stats.frames_received + camera.stalls(), 40);
    assert_eq!(camera.outstanding(), 0);
    assert_eq!(camera.released(), stats.frames_received);
    assert!(stats.frames_analyzed + stats.frames_dropped <= stats.frames_received);
}

#[test]
fn test_rotation_reaches_inference() {
    let devices = TestDevices::new(MockInferenceService::new());
    let (mut pipeline, _notices) = create_test_pipeline(AppConfig::default(), &devices);
    let released = Arc::new(AtomicUsize::new(0));

    pipeline.frame_sink().on_frame(
        FrameBuilder::new()
            .size(32, 24)
            .rotation(blink_swipe::types::Rotation::Deg90)
            .counted(&released)
            .build(),
    );
    assert!(wait_for(test_timeout(), || released.load(Ordering::SeqCst) == 1));

    assert_eq!(
        devices.inference.last_image(),
        Some((32, 24, blink_swipe::types::Rotation::Deg90))
    );
    pipeline.shutdown();
}

// ============================================================================
// End to end
// ============================================================================

#[test]
fn test_connect_issues_startup_swipe() {
    let devices = TestDevices::new(MockInferenceService::new());
    let (mut pipeline, _notices) = create_bound_pipeline(AppConfig::default(), &devices);

    assert!(wait_for(test_timeout(), || devices.injector.dispatch_count() == 1));
    assert_eq!(pipeline.service_status(), ConnectionStatus::Connected);

    let gesture = &devices.injector.dispatched()[0];
    let stroke = gesture.strokes()[0];
    assert_eq!(stroke.start_delay, Duration::from_millis(2000));
    assert_eq!(stroke.duration, Duration::from_millis(100));
    assert_eq!(stroke.path.start, ScreenPoint { x: 540.0, y: 1800.0 });
    assert_eq!(stroke.path.end, ScreenPoint { x: 540.0, y: 600.0 });
    assert!(devices.display.query_count() >= 1);

    pipeline.shutdown();
    assert_eq!(pipeline.service_status(), ConnectionStatus::Disconnected);
}

#[test]
fn test_blink_drives_swipe_and_notice() {
    let devices = TestDevices::new(MockInferenceService::new());
    devices.inference.push_response(MockResponse::closed_eyes());
    let (mut pipeline, notices) = create_bound_pipeline(AppConfig::default(), &devices);
    assert!(wait_for(test_timeout(), || devices.injector.dispatch_count() == 1));

    pipeline
        .frame_sink()
        .on_frame(FrameBuilder::new().luma(90).build());
    assert!(wait_for(test_timeout(), || devices.injector.dispatch_count() == 2));

    let trigger = &devices.injector.dispatched()[1];
    assert_eq!(trigger.strokes()[0].start_delay, Duration::ZERO);
    assert_eq!(trigger.strokes()[0].duration, Duration::from_millis(100));

    let drained = notices.drain();
    assert_eq!(drained.len(), 1);
    let UiNotice::Blink { luma, .. } = &drained[0];
    assert_eq!(luma.value(), 90.0);

    pipeline.shutdown();
    assert_eq!(pipeline.dispatch_stats().accepted, 2);
}

#[test]
fn test_trigger_lost_without_service() {
    let devices = TestDevices::new(MockInferenceService::new());
    devices.inference.push_response(MockResponse::closed_eyes());
    let (mut pipeline, notices) = create_test_pipeline(AppConfig::default(), &devices);
    let released = Arc::new(AtomicUsize::new(0));

    pipeline
        .frame_sink()
        .on_frame(FrameBuilder::new().counted(&released).build());
    assert!(wait_for(test_timeout(), || released.load(Ordering::SeqCst) == 1));

    // The user still sees the blink, but nothing swipes
    assert_eq!(notices.drain().len(), 1);
    assert_eq!(pipeline.bridge_stats().lost, 1);
    assert_eq!(devices.injector.dispatch_count(), 0);
    pipeline.shutdown();
}

#[test]
fn test_display_change_between_dispatches() {
    let devices = TestDevices::new(MockInferenceService::new());
    let (mut pipeline, _notices) = create_bound_pipeline(AppConfig::default(), &devices);
    assert!(wait_for(test_timeout(), || devices.injector.dispatch_count() == 1));

    devices.display.set_metrics(DisplayMetrics::new(2400, 1080));
    pipeline.bridge().announce();
    assert!(wait_for(test_timeout(), || devices.injector.dispatch_count() == 2));

    let rotated = devices.injector.dispatched()[1].strokes()[0].path;
    assert_eq!(rotated.start, ScreenPoint { x: 1200.0, y: 810.0 });
    assert_eq!(rotated.end, ScreenPoint { x: 1200.0, y: 270.0 });
    pipeline.shutdown();
}

#[test]
fn test_overlapping_triggers_both_dispatch() {
    let devices = TestDevices::new(MockInferenceService::new());
    let (mut pipeline, _notices) = create_bound_pipeline(AppConfig::default(), &devices);
    assert!(wait_for(test_timeout(), || devices.injector.dispatch_count() == 1));

    pipeline.bridge().announce();
    pipeline.bridge().announce();
    assert!(wait_for(test_timeout(), || devices.injector.dispatch_count() == 3));

    pipeline.shutdown();
    let stats = pipeline.dispatch_stats();
    assert_eq!(stats.accepted, 3);
    assert_eq!(stats.dropped_in_flight, 0);
}

#[test]
fn test_overlapping_triggers_dropped_when_serialized() {
    let config = AppConfig {
        gesture: GestureConfig {
            startup_delay_ms: 0,
            duration_ms: 300,
            dispatch_policy: DispatchPolicy::DropWhileInFlight,
            ..Default::default()
        },
        ..Default::default()
    };
    let devices = TestDevices::new(MockInferenceService::new());
    let (mut pipeline, _notices) = create_bound_pipeline(config, &devices);
    assert!(wait_for(test_timeout(), || devices.injector.dispatch_count() == 1));
    std::thread::sleep(Duration::from_millis(400));

    pipeline.bridge().announce();
    pipeline.bridge().announce();
    assert!(wait_for(test_timeout(), || pipeline.dispatch_stats().dropped_in_flight == 1));

    pipeline.shutdown();
    assert_eq!(devices.injector.dispatch_count(), 2);
}

#[test]
fn test_rejected_gesture_is_not_retried() {
    let devices = TestDevices::new(MockInferenceService::new());
    devices.injector.set_accepting(false);
    let (mut pipeline, _notices) = create_bound_pipeline(AppConfig::default(), &devices);
    assert!(wait_for(test_timeout(), || pipeline.dispatch_stats().rejected == 1));

    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(devices.injector.dispatch_count(), 1);
    assert_eq!(pipeline.service_status(), ConnectionStatus::Connected);
    pipeline.shutdown();
}

#[test]
fn test_rebind_keeps_dispatch_totals() {
    let devices = TestDevices::new(MockInferenceService::new());
    let (mut pipeline, _notices) = create_bound_pipeline(AppConfig::default(), &devices);
    assert!(wait_for(test_timeout(), || devices.injector.dispatch_count() == 1));

    pipeline.unbind_gesture_service();
    assert_eq!(pipeline.service_status(), ConnectionStatus::Disconnected);
    assert_eq!(pipeline.bridge().announce(), 0);

    pipeline
        .bind_gesture_service(devices.display.clone(), devices.injector.clone())
        .unwrap();
    assert!(wait_for(test_timeout(), || devices.injector.dispatch_count() == 2));
    assert!(wait_for(test_timeout(), || pipeline.dispatch_stats().accepted == 2));

    pipeline.shutdown();
}

#[test]
fn test_shutdown_with_hung_inference_stops_service() {
    // Inference that will not settle for the life of the test
    let devices = TestDevices::new(
        MockInferenceService::new().with_latency(Duration::from_secs(3600)),
    );
    let mut config = AppConfig::default();
    config.analysis.shutdown_timeout_ms = 100;
    let (mut pipeline, notices) = create_bound_pipeline(config, &devices);
    assert!(wait_for(test_timeout(), || devices.injector.dispatch_count() == 1));

    let released = Arc::new(AtomicUsize::new(0));
    assert!(pipeline
        .frame_sink()
        .on_frame(FrameBuilder::new().counted(&released).build()));
    assert!(wait_for(test_timeout(), || devices.inference.calls() == 1));

    let (done_tx, done_rx) = crossbeam_channel::bounded(1);
    let stopper = std::thread::spawn(move || {
        pipeline.shutdown();
        done_tx.send(()).ok();
        pipeline
    });

    assert!(done_rx.recv_timeout(test_timeout()).is_ok());
    let pipeline = stopper.join().unwrap();
    assert_eq!(pipeline.service_status(), ConnectionStatus::Disconnected);
    assert!(notices.drain().is_empty());
    assert_eq!(devices.injector.dispatch_count(), 1);
}

#[test]
fn test_invalid_config_rejected() {
    let mut config = AppConfig::default();
    config.gesture.start_fraction = 0.2;
    config.gesture.end_fraction = 0.8;

    let devices = TestDevices::new(MockInferenceService::new());
    let result = blink_swipe::pipeline::PipelineBuilder::new(config).build(devices.inference.clone());
    assert!(result.is_err());
}
