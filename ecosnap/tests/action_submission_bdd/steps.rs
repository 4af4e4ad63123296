//! Step definitions and scenario bindings for submission BDD tests.

use super::*;
use ecosnap::domain::ErrorCode;
use rstest_bdd_macros::{given, scenario, then, when};

// -----------------------------------------------------------------------------
// Given Steps
// -----------------------------------------------------------------------------

#[given("a signed-in user with no streak")]
fn a_signed_in_user_with_no_streak(world: &SubmissionWorld) {
    world.prepare();
    world.sign_in(now() + TimeDelta::hours(1));
}

#[given("a signed-in user whose streak is {streak} with the last action {days} days ago")]
fn a_signed_in_user_with_a_streak(world: &SubmissionWorld, streak: u32, days: i64) {
    world.prepare();
    world.sign_in(now() + TimeDelta::hours(1));
    world.store().seed_streak(StreakRecord {
        user_id: user_id(),
        current_streak: streak,
        last_action_date: Some(today() - TimeDelta::days(days)),
        updated_at: now() - TimeDelta::days(days),
    });
}

#[given("a signed-in user whose uploads are rejected")]
fn a_signed_in_user_whose_uploads_are_rejected(world: &SubmissionWorld) {
    world.prepare();
    world.sign_in(now() + TimeDelta::hours(1));
    world
        .failing_storage
        .set(Arc::new(FailingImageStorage::new(ImageStorageError::rejected(
            "bucket quota exceeded",
        ))));
}

#[given("a user whose session has expired")]
fn a_user_whose_session_has_expired(world: &SubmissionWorld) {
    world.prepare();
    world.sign_in(now() - TimeDelta::minutes(5));
}

// -----------------------------------------------------------------------------
// When Steps
// -----------------------------------------------------------------------------

#[when("the user submits a photo taken at {latitude}, {longitude}")]
fn the_user_submits_a_photo_taken_at(world: &SubmissionWorld, latitude: f64, longitude: f64) {
    let fix = GeoFix::new(latitude, longitude, 12.0, now().timestamp_millis())
        .expect("valid fix");
    world.submit(Some(fix));
}

#[when("the user submits a photo without a location")]
fn the_user_submits_a_photo_without_a_location(world: &SubmissionWorld) {
    world.submit(None);
}

// -----------------------------------------------------------------------------
// Then Steps
// -----------------------------------------------------------------------------

#[then("the submission succeeds with streak {expected}")]
fn the_submission_succeeds_with_streak(world: &SubmissionWorld, expected: u32) {
    let result = world.last_result.get().expect("last result should be set");
    let response = result.expect("submission should succeed");
    assert_eq!(response.streak, expected);
    assert_eq!(response.action_date, today());
}

#[then("the submission fails with code {code}")]
fn the_submission_fails_with_code(world: &SubmissionWorld, code: String) {
    let result = world.last_result.get().expect("last result should be set");
    let error = result.expect_err("submission should fail");
    let expected: ErrorCode =
        serde_json::from_value(serde_json::Value::String(code)).expect("known error code");
    assert_eq!(error.code(), expected);
}

#[then("the action is recorded with coordinates {latitude}, {longitude}")]
fn the_action_is_recorded_with_coordinates(
    world: &SubmissionWorld,
    latitude: f64,
    longitude: f64,
) {
    let actions = world.store().actions();
    assert_eq!(actions.len(), 1);
    let action = &actions[0];
    assert_eq!(action.user_id, user_id());
    assert_eq!(action.latitude, Some(latitude));
    assert_eq!(action.longitude, Some(longitude));
    assert_eq!(action.action_date, today());
}

#[then("the action is recorded without coordinates")]
fn the_action_is_recorded_without_coordinates(world: &SubmissionWorld) {
    let actions = world.store().actions();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].latitude, None);
    assert_eq!(actions[0].longitude, None);
}

#[then("the photo is stored under the user's folder")]
fn the_photo_is_stored_under_the_users_folder(world: &SubmissionWorld) {
    let images = world.store().images();
    assert_eq!(images.len(), 1);
    let image = &images[0];
    assert_eq!(
        image.path,
        format!("{USER_ID}/{}.jpg", now().timestamp_millis())
    );
    assert_eq!(image.bytes, PHOTO_BYTES.to_vec());
    assert_eq!(image.content_type, "image/jpeg");

    let action = &world.store().actions()[0];
    assert_eq!(action.storage_path, image.path);
}

#[then("the stored streak is {expected}")]
fn the_stored_streak_is(world: &SubmissionWorld, expected: u32) {
    let streak = world
        .store()
        .streak(&user_id())
        .expect("streak should be stored");
    assert_eq!(streak.current_streak, expected);
    assert_eq!(streak.last_action_date, Some(today()));
}

#[then("no action is recorded")]
fn no_action_is_recorded(world: &SubmissionWorld) {
    assert!(world.store().actions().is_empty());
    assert!(world.store().streak(&user_id()).is_none());
}

#[then("no photo is stored")]
fn no_photo_is_stored(world: &SubmissionWorld) {
    assert!(world.store().images().is_empty());
    if let Some(failing) = world.failing_storage.get() {
        assert_eq!(failing.attempts(), 0);
    }
}

// -----------------------------------------------------------------------------
// Scenarios
// -----------------------------------------------------------------------------

#[scenario(
    path = "tests/features/action_submission.feature",
    name = "First action starts a streak"
)]
fn first_action_starts_a_streak(world: SubmissionWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/action_submission.feature",
    name = "Action on the day after the last one extends the streak"
)]
fn action_on_the_next_day_extends_the_streak(world: SubmissionWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/action_submission.feature",
    name = "Action after a gap resets the streak"
)]
fn action_after_a_gap_resets_the_streak(world: SubmissionWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/action_submission.feature",
    name = "Second action on the same day keeps the streak"
)]
fn second_action_on_the_same_day_keeps_the_streak(world: SubmissionWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/action_submission.feature",
    name = "Rejected upload stops the submission"
)]
fn rejected_upload_stops_the_submission(world: SubmissionWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/action_submission.feature",
    name = "Expired session is refused before any upload"
)]
fn expired_session_is_refused_before_any_upload(world: SubmissionWorld) {
    drop(world);
}
