//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod action_submission;
mod eco_action_repository;
mod frame_encoder;
mod image_storage;
mod location_source;
mod session_provider;
mod video_device;

pub use action_submission::{
    ActionSubmissionRequest, ActionSubmissionResponse, ActionSubmissionService,
    FixtureActionSubmissionService,
};
#[cfg(test)]
pub use eco_action_repository::MockEcoActionRepository;
pub use eco_action_repository::{
    EcoActionRepository, EcoActionRepositoryError, FixtureEcoActionRepository,
};
#[cfg(test)]
pub use frame_encoder::MockFrameEncoder;
pub use frame_encoder::{FrameEncoder, FrameEncoderError};
#[cfg(test)]
pub use image_storage::MockImageStorage;
pub use image_storage::{FixtureImageStorage, ImageStorage, ImageStorageError};
#[cfg(test)]
pub use location_source::MockLocationSource;
pub use location_source::{
    FixtureLocationSource, LocationSource, LocationSourceError, PositionErrorKind, PositionEvent,
    PositionFailure, PositionSample, SubscriptionId, WatchOptions,
};
#[cfg(test)]
pub use session_provider::MockSessionProvider;
pub use session_provider::{FixtureSessionProvider, SessionProvider, SessionProviderError};
#[cfg(test)]
pub use video_device::MockVideoDevice;
pub use video_device::{
    DeviceConfiguration, FacingMode, FixtureVideoDevice, FrameDimensions, RawFrame,
    RawFrameValidationError, VideoDevice, VideoDeviceError, VideoStream,
};
