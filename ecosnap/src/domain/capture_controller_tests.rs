//! Tests for the capture controller.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{FrameEncoder, VideoDeviceError};
use crate::domain::{ErrorCode, LocationWatcherConfig, LockState};
use crate::test_support::camera::{
    FailingFrameEncoder, FakeStreamHandle, FakeVideoDevice, StaticFrameEncoder,
};
use crate::test_support::clock::MutableClock;
use crate::test_support::location::ScriptedLocationSource;

const JPEG_BYTES: [u8; 4] = [0xFF, 0xD8, 0xFF, 0xD9];

struct Harness {
    device: Arc<FakeVideoDevice>,
    encoder: StaticFrameEncoder,
    location: Arc<ScriptedLocationSource>,
    watcher: Arc<LocationWatcher>,
    clock: Arc<MutableClock>,
}

impl Harness {
    fn controller(&self) -> CaptureController {
        self.controller_with(Arc::new(self.encoder.clone()))
    }

    fn controller_with(&self, encoder: Arc<dyn FrameEncoder>) -> CaptureController {
        CaptureController::new(
            CaptureControllerPorts::new(self.device.clone(), encoder, self.watcher.clone()),
            self.clock.clone(),
            CaptureControllerConfig {
                device_fallbacks: DeviceConfiguration::fallback_chain(),
                frame_ready_timeout: Duration::from_millis(100),
                frame_poll_interval: Duration::from_millis(10),
            },
        )
    }
}

#[fixture]
fn harness() -> Harness {
    let clock = Arc::new(MutableClock::new(
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0)
            .single()
            .expect("valid time"),
    ));
    let location = Arc::new(ScriptedLocationSource::default());
    let watcher = Arc::new(LocationWatcher::new(
        location.clone(),
        clock.clone(),
        LocationWatcherConfig::default(),
    ));
    Harness {
        device: Arc::new(FakeVideoDevice::default()),
        encoder: StaticFrameEncoder::new(JPEG_BYTES),
        location,
        watcher,
        clock,
    }
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn initialize_reaches_ready_on_first_configuration(harness: Harness) {
    harness
        .device
        .push_outcome(Ok(FakeStreamHandle::ready(640, 480)));
    let mut controller = harness.controller();

    controller.initialize().await.expect("camera opens");

    assert_eq!(controller.state(), &CaptureState::Ready);
    assert_eq!(
        harness.device.attempts(),
        vec![DeviceConfiguration::fallback_chain()[0].clone()]
    );
    assert!(harness.watcher.is_running());
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn initialize_falls_back_through_configurations(harness: Harness) {
    harness
        .device
        .push_outcome(Err(VideoDeviceError::not_found("no rear camera")));
    harness
        .device
        .push_outcome(Err(VideoDeviceError::busy("in use")));
    harness
        .device
        .push_outcome(Ok(FakeStreamHandle::ready(320, 240)));
    let mut controller = harness.controller();

    controller.initialize().await.expect("third configuration opens");

    let attempts = harness.device.attempts();
    assert_eq!(attempts.len(), 3);
    assert_eq!(attempts[2].facing, Some(crate::domain::ports::FacingMode::User));
    assert_eq!(controller.state(), &CaptureState::Ready);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn exhausted_configurations_fail_with_device_unavailable(harness: Harness) {
    let mut controller = harness.controller();

    let err = controller.initialize().await.expect_err("no camera");

    assert_eq!(err.code(), ErrorCode::DeviceUnavailable);
    assert_eq!(harness.device.attempts().len(), 4);
    assert!(matches!(controller.state(), CaptureState::Failed(_)));
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn initialize_waits_for_first_decodable_frame(harness: Harness) {
    let stream = FakeStreamHandle::ready_after(3, 640, 480);
    harness.device.push_outcome(Ok(stream.clone()));
    let mut controller = harness.controller();

    controller.initialize().await.expect("frame arrives");

    assert_eq!(controller.state(), &CaptureState::Ready);
    assert!(!stream.is_closed());
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn stream_without_frames_fails_and_is_released(harness: Harness) {
    let stream = FakeStreamHandle::never_ready();
    harness.device.push_outcome(Ok(stream.clone()));
    let mut controller = harness.controller();

    let err = controller.initialize().await.expect_err("no frame");

    assert_eq!(err.code(), ErrorCode::DeviceUnavailable);
    assert_eq!(
        harness.device.attempts(),
        DeviceConfiguration::fallback_chain()
    );
    assert!(stream.is_closed());
    assert_eq!(controller.state(), &CaptureState::Failed(err));
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn frameless_stream_falls_back_to_next_configuration(harness: Harness) {
    let silent = FakeStreamHandle::never_ready();
    let working = FakeStreamHandle::ready(320, 240);
    harness.device.push_outcome(Ok(silent.clone()));
    harness.device.push_outcome(Ok(working.clone()));
    let mut controller = harness.controller();

    controller.initialize().await.expect("second configuration works");

    assert_eq!(controller.state(), &CaptureState::Ready);
    assert_eq!(harness.device.attempts().len(), 2);
    assert!(silent.is_closed());
    assert!(!working.is_closed());
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn every_frameless_stream_is_released(harness: Harness) {
    let streams: Vec<_> = (0..4).map(|_| FakeStreamHandle::never_ready()).collect();
    for stream in &streams {
        harness.device.push_outcome(Ok(stream.clone()));
    }
    let mut controller = harness.controller();

    let err = controller.initialize().await.expect_err("no frame anywhere");

    assert_eq!(err.code(), ErrorCode::DeviceUnavailable);
    assert!(err.message().contains("no decodable frame"));
    assert!(streams.iter().all(|stream| stream.is_closed()));
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn stream_ending_before_first_frame_is_device_failure(harness: Harness) {
    let stream = FakeStreamHandle::ready_after(5, 640, 480);
    stream.end();
    harness.device.push_outcome(Ok(stream.clone()));
    let mut controller = harness.controller();

    let err = controller.initialize().await.expect_err("stream ended");

    assert_eq!(err.code(), ErrorCode::DeviceUnavailable);
    assert!(stream.is_closed());
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn failed_controller_can_retry(harness: Harness) {
    let mut controller = harness.controller();
    controller.initialize().await.expect_err("no camera yet");

    harness
        .device
        .push_outcome(Ok(FakeStreamHandle::ready(640, 480)));
    controller.initialize().await.expect("retry succeeds");

    assert_eq!(controller.state(), &CaptureState::Ready);
    assert_eq!(harness.device.attempts().len(), 5);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn capture_outside_ready_has_no_side_effects(harness: Harness) {
    let mut controller = harness.controller();

    let err = controller.capture().await.expect_err("not ready");

    assert_eq!(err.code(), ErrorCode::FrameNotReady);
    assert_eq!(harness.encoder.calls(), 0);
    assert!(harness.device.attempts().is_empty());
    assert!(harness.device.opened().is_empty());
    assert_eq!(harness.watcher.snapshot().lock_state, LockState::Unlocked);
    assert_eq!(controller.state(), &CaptureState::Uninitialized);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn capture_after_failed_initialize_touches_no_stream(harness: Harness) {
    let stream = FakeStreamHandle::never_ready();
    harness.device.push_outcome(Ok(stream.clone()));
    let mut controller = harness.controller();
    controller.initialize().await.expect_err("no frame");
    let attempts = harness.device.attempts().len();

    let err = controller.capture().await.expect_err("not ready");

    assert_eq!(err.code(), ErrorCode::FrameNotReady);
    assert_eq!(stream.snapshots(), 0);
    assert_eq!(harness.device.attempts().len(), attempts);
    assert_eq!(harness.encoder.calls(), 0);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn capture_pairs_photo_with_locked_fix(harness: Harness) {
    let stream = FakeStreamHandle::ready(16, 12);
    harness.device.push_outcome(Ok(stream.clone()));
    let mut controller = harness.controller();
    controller.initialize().await.expect("camera opens");
    harness.location.emit_fix(51.5, -0.12, 12.0, Some(99));
    settle().await;

    let captured = controller.capture().await.expect("photo taken");

    let fix = captured.fix.expect("fix attached");
    assert_eq!(fix.latitude(), 51.5);
    assert_eq!(captured.image.bytes(), JPEG_BYTES.as_slice());
    assert_eq!(captured.image.content_type(), "image/jpeg");
    assert_eq!(captured.image.extension(), "jpg");
    assert_eq!(
        captured.image.captured_at_epoch_ms(),
        harness.clock.utc().timestamp_millis()
    );
    assert_eq!(stream.snapshots(), 1);
    assert_eq!(harness.watcher.snapshot().lock_state, LockState::Locked);
    assert_eq!(controller.state(), &CaptureState::Ready);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn capture_without_fix_succeeds(harness: Harness) {
    harness
        .device
        .push_outcome(Ok(FakeStreamHandle::ready(16, 12)));
    let mut controller = harness.controller();
    controller.initialize().await.expect("camera opens");

    let captured = controller.capture().await.expect("photo taken");

    assert!(captured.fix.is_none());
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn locked_fix_ignores_samples_after_capture(harness: Harness) {
    harness
        .device
        .push_outcome(Ok(FakeStreamHandle::ready(16, 12)));
    let mut controller = harness.controller();
    controller.initialize().await.expect("camera opens");
    harness.location.emit_fix(1.0, 1.0, 5.0, Some(1));
    settle().await;

    let captured = controller.capture().await.expect("photo taken");
    harness.location.emit_fix(2.0, 2.0, 5.0, Some(2));
    settle().await;

    assert_eq!(harness.watcher.current_fix(), captured.fix);
}

#[rstest]
#[case::empty_output(Arc::new(StaticFrameEncoder::new(Vec::new())) as Arc<dyn FrameEncoder>)]
#[case::codec_error(Arc::new(FailingFrameEncoder) as Arc<dyn FrameEncoder>)]
#[tokio::test(start_paused = true)]
async fn encode_failure_is_transient(harness: Harness, #[case] encoder: Arc<dyn FrameEncoder>) {
    harness
        .device
        .push_outcome(Ok(FakeStreamHandle::ready(16, 12)));
    let mut controller = harness.controller_with(encoder);
    controller.initialize().await.expect("camera opens");

    let err = controller.capture().await.expect_err("encode fails");

    assert_eq!(err.code(), ErrorCode::EncodeFailed);
    assert_eq!(controller.state(), &CaptureState::Ready);
    assert_eq!(harness.watcher.snapshot().lock_state, LockState::Unlocked);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn frame_read_failure_keeps_controller_ready(harness: Harness) {
    let stream = FakeStreamHandle::ready(16, 12);
    harness.device.push_outcome(Ok(stream.clone()));
    let mut controller = harness.controller();
    controller.initialize().await.expect("camera opens");
    stream.fail_snapshots();

    let err = controller.capture().await.expect_err("read fails");

    assert_eq!(err.code(), ErrorCode::FrameNotReady);
    assert_eq!(controller.state(), &CaptureState::Ready);
    assert_eq!(harness.watcher.snapshot().lock_state, LockState::Unlocked);
    assert_eq!(harness.encoder.calls(), 0);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn stream_ending_mid_capture_fails_controller(harness: Harness) {
    let stream = FakeStreamHandle::ready(16, 12);
    harness.device.push_outcome(Ok(stream.clone()));
    let mut controller = harness.controller();
    controller.initialize().await.expect("camera opens");
    stream.end();

    let err = controller.capture().await.expect_err("stream gone");

    assert_eq!(err.code(), ErrorCode::DeviceUnavailable);
    assert!(matches!(controller.state(), CaptureState::Failed(_)));
    assert!(stream.is_closed());
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn resume_location_unlocks_after_capture(harness: Harness) {
    harness
        .device
        .push_outcome(Ok(FakeStreamHandle::ready(16, 12)));
    let mut controller = harness.controller();
    controller.initialize().await.expect("camera opens");
    controller.capture().await.expect("photo taken");

    controller.resume_location();

    assert_eq!(harness.watcher.snapshot().lock_state, LockState::Unlocked);
    assert_eq!(harness.location.subscribe_calls(), 1);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn dispose_releases_stream_and_location(harness: Harness) {
    let stream = FakeStreamHandle::ready(16, 12);
    harness.device.push_outcome(Ok(stream.clone()));
    let mut controller = harness.controller();
    controller.initialize().await.expect("camera opens");

    controller.dispose();

    assert!(stream.is_closed());
    assert!(!harness.watcher.is_running());
    assert_eq!(harness.location.active_subscriptions(), 0);
    assert_eq!(controller.state(), &CaptureState::Uninitialized);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn dispose_is_safe_before_initialize(harness: Harness) {
    let mut controller = harness.controller();
    controller.dispose();
    controller.dispose();
    assert_eq!(controller.state(), &CaptureState::Uninitialized);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn dropping_controller_releases_stream(harness: Harness) {
    let stream = FakeStreamHandle::ready(16, 12);
    harness.device.push_outcome(Ok(stream.clone()));
    let mut controller = harness.controller();
    controller.initialize().await.expect("camera opens");

    drop(controller);

    assert!(stream.is_closed());
    assert_eq!(stream.close_calls(), 1);
    assert!(!harness.watcher.is_running());
}
