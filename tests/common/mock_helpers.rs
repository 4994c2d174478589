//! Mock construction helpers

use blink_swipe::config::AppConfig;
use blink_swipe::pipeline::{BlinkPipeline, PipelineBuilder, UiNoticeReceiver};
use blink_swipe::platform::mock::{MockDisplay, MockInferenceService, MockInjector};
use std::sync::Arc;

/// Devices shared between a test and the pipeline under test
pub struct TestDevices {
    pub inference: Arc<MockInferenceService>,
    pub display: Arc<MockDisplay>,
    pub injector: Arc<MockInjector>,
}

impl TestDevices {
    /// Portrait 1080x2400 display and an injector that accepts everything
    pub fn new(inference: MockInferenceService) -> Self {
        Self {
            inference: Arc::new(inference),
            display: Arc::new(MockDisplay::new(1080, 2400)),
            injector: Arc::new(MockInjector::new()),
        }
    }
}

/// Build a pipeline on the test devices without binding the gesture service
pub fn create_test_pipeline(
    config: AppConfig,
    devices: &TestDevices,
) -> (BlinkPipeline, UiNoticeReceiver) {
    PipelineBuilder::new(config)
        .build(devices.inference.clone())
        .expect("pipeline should start")
}

/// Build a pipeline and bind the gesture service to the test devices
pub fn create_bound_pipeline(
    config: AppConfig,
    devices: &TestDevices,
) -> (BlinkPipeline, UiNoticeReceiver) {
    let (mut pipeline, notices) = create_test_pipeline(config, devices);
    pipeline
        .bind_gesture_service(devices.display.clone(), devices.injector.clone())
        .expect("gesture service should start");
    (pipeline, notices)
}
