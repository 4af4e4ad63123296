//! End-to-end capture and submission with scripted hardware.
//!
//! Drives the camera and location fakes through the capture controller,
//! encodes a real JPEG, and commits it through the submission pipeline into
//! the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeDelta, TimeZone, Utc};
use ecosnap::domain::ports::{ActionSubmissionRequest, ActionSubmissionService};
use ecosnap::domain::{
    AccuracyClass, ActionSubmissionPipeline, ActionSubmissionPorts, CaptureController,
    CaptureControllerConfig, CaptureControllerPorts, CaptureState, LocationWatcher,
    LocationWatcherConfig, LockState, Session, UserId,
};
use ecosnap::outbound::jpeg::JpegFrameEncoder;
use ecosnap::outbound::memory::InMemoryEcoActionStore;
use ecosnap::outbound::session::StaticSessionProvider;
use ecosnap::test_support::camera::{FakeStreamHandle, FakeVideoDevice};
use ecosnap::test_support::clock::MutableClock;
use ecosnap::test_support::location::ScriptedLocationSource;

async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

#[tokio::test]
async fn captured_photo_is_committed_with_its_locked_fix() {
    let now = Utc
        .with_ymd_and_hms(2026, 3, 14, 9, 30, 0)
        .single()
        .expect("valid time");
    let clock = Arc::new(MutableClock::new(now));
    let location = Arc::new(ScriptedLocationSource::default());
    let watcher = Arc::new(LocationWatcher::new(
        location.clone(),
        clock.clone(),
        LocationWatcherConfig::default(),
    ));
    let stream = FakeStreamHandle::ready(64, 48);
    let device = Arc::new(FakeVideoDevice::with_outcomes([Ok(stream.clone())]));
    let mut controller = CaptureController::new(
        CaptureControllerPorts::new(device, Arc::new(JpegFrameEncoder::default()), watcher.clone()),
        clock.clone(),
        CaptureControllerConfig {
            frame_ready_timeout: Duration::from_secs(1),
            frame_poll_interval: Duration::from_millis(5),
            ..CaptureControllerConfig::default()
        },
    );

    controller.initialize().await.expect("camera opens");
    assert_eq!(controller.state(), &CaptureState::Ready);

    assert_eq!(location.emit_fix(51.5074, -0.1278, 8.0, None), 1);
    settle().await;
    let snapshot = watcher.snapshot();
    assert_eq!(snapshot.accuracy_class(), Some(AccuracyClass::High));

    let captured = controller.capture().await.expect("photo captured");
    assert_eq!(watcher.snapshot().lock_state, LockState::Locked);

    // Samples after the shutter must not move the paired fix.
    location.emit_fix(48.8566, 2.3522, 5.0, None);
    settle().await;
    let fix = captured.fix.clone().expect("fix locked at capture");
    assert_eq!(fix.latitude(), 51.5074);
    assert_eq!(watcher.current_fix(), Some(fix.clone()));

    let image_bytes = captured.image.bytes().to_vec();
    assert_eq!(&image_bytes[..2], &[0xFF, 0xD8]);
    assert_eq!(captured.image.content_type(), "image/jpeg");

    let user_id = UserId::new("b5e0c7f2-1a3d-4e6b-8c9f-0d2e4f6a8b1c").expect("valid id");
    let session =
        Session::new(user_id, "access-token", now + TimeDelta::hours(1)).expect("valid session");
    let store = Arc::new(InMemoryEcoActionStore::new());
    let pipeline = ActionSubmissionPipeline::new(
        ActionSubmissionPorts::new(
            Arc::new(StaticSessionProvider::signed_in(session)),
            store.clone(),
            store.clone(),
        ),
        clock.clone(),
    );

    let response = pipeline
        .submit(ActionSubmissionRequest::new(captured.image, captured.fix))
        .await
        .expect("submission succeeds");
    assert_eq!(response.streak, 1);

    let images = store.images();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].path, response.storage_path);
    assert_eq!(images[0].bytes, image_bytes);

    let actions = store.actions();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].latitude, Some(51.5074));
    assert_eq!(actions[0].longitude, Some(-0.1278));

    controller.resume_location();
    assert_eq!(watcher.snapshot().lock_state, LockState::Unlocked);

    controller.dispose();
    assert!(stream.is_closed());
    assert_eq!(location.active_subscriptions(), 0);
}
