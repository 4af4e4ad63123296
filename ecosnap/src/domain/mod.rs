//! Domain primitives, services, and ports.
//!
//! Purpose: model the capture-to-commit flow independently of any platform.
//! Value types validate on construction; services talk to the outside world
//! only through the traits in [`ports`].
//!
//! Public surface:
//! - [`LocationWatcher`] keeps the freshest fix and locks it at capture.
//! - [`CaptureController`] owns the camera stream and produces
//!   [`CapturedAction`]s.
//! - [`ActionSubmissionPipeline`] uploads, records, and advances the streak.
//! - [`compute_next_streak`] is the pure streak calculator.

pub mod action_submission;
pub mod capture_controller;
pub mod eco_action;
pub mod error;
pub mod geo_fix;
pub mod image_payload;
pub mod location_watcher;
pub mod ports;
pub mod session;
pub mod streak;
pub mod user;

pub use self::action_submission::{
    ActionSubmissionPipeline, ActionSubmissionPorts, SubmissionStage,
};
pub use self::capture_controller::{
    CaptureController, CaptureControllerConfig, CaptureControllerPorts, CaptureState,
    CapturedAction,
};
pub use self::eco_action::ActionRecord;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::geo_fix::{
    AccuracyClass, GeoFix, GeoFixValidationError, HIGH_ACCURACY_METERS, MEDIUM_ACCURACY_METERS,
};
pub use self::image_payload::{
    CAPTURED_FILE_NAME, DEFAULT_CONTENT_TYPE, DEFAULT_EXTENSION, ImagePayload,
    ImagePayloadValidationError,
};
pub use self::location_watcher::{
    AcquisitionStatus, LocationSnapshot, LocationWatcher, LocationWatcherConfig, LockState,
};
pub use self::session::{Session, SessionValidationError};
pub use self::streak::{StreakRecord, compute_next_streak};
pub use self::user::{USER_ID_MAX, UserId, UserValidationError};
