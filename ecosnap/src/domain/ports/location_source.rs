//! Driven port for continuous platform geolocation.
//!
//! The platform pushes position events into a channel owned by the
//! subscriber. Subscribing and unsubscribing are synchronous because the
//! underlying platform calls are; everything after delivery is handled by the
//! location watcher.

use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;

use super::define_port_error;

/// Options for a continuous position subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
    /// Request the most precise positioning mode available.
    pub high_accuracy: bool,
    /// Oldest cached position the platform may hand back.
    pub maximum_age: Duration,
    /// Per-attempt deadline for the platform to produce a position.
    pub timeout: Duration,
}

impl WatchOptions {
    /// High accuracy, no cached positions, and the given per-attempt timeout.
    pub fn precise(timeout: Duration) -> Self {
        Self {
            high_accuracy: true,
            maximum_age: Duration::ZERO,
            timeout,
        }
    }
}

/// Raw position sample as reported by the platform, before validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSample {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_meters: f64,
    /// Platform timestamp; `None` when the platform omits it.
    pub timestamp_epoch_ms: Option<i64>,
}

/// Category of a platform positioning failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionErrorKind {
    PermissionDenied,
    PositionUnavailable,
    Timeout,
}

/// Platform positioning failure delivered through the subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionFailure {
    pub kind: PositionErrorKind,
    pub message: String,
}

impl PositionFailure {
    /// Build a failure of `kind` with a platform message.
    pub fn new(kind: PositionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Event pushed by the platform: a sample or a failure.
pub type PositionEvent = Result<PositionSample, PositionFailure>;

/// Handle identifying an active subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

define_port_error! {
    /// Errors raised when a subscription cannot be established.
    pub enum LocationSourceError {
        /// The platform has no geolocation capability.
        Unsupported { message: String } =>
            "geolocation not supported: {message}",
        /// The platform refused to open the subscription.
        Subscription { message: String } =>
            "location subscription failed: {message}",
    }
}

/// Port for continuous platform geolocation.
#[cfg_attr(test, mockall::automock)]
pub trait LocationSource: Send + Sync {
    /// Start pushing events for `options` into `sink`.
    ///
    /// The source stops delivering once [`LocationSource::unsubscribe`] is
    /// called with the returned id or once the sink is closed.
    fn subscribe(
        &self,
        options: &WatchOptions,
        sink: UnboundedSender<PositionEvent>,
    ) -> Result<SubscriptionId, LocationSourceError>;

    /// Cancel a subscription. Unknown ids are ignored.
    fn unsubscribe(&self, id: SubscriptionId);
}

/// Fixture implementation reporting that no geolocation is available.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureLocationSource;

impl LocationSource for FixtureLocationSource {
    fn subscribe(
        &self,
        _options: &WatchOptions,
        _sink: UnboundedSender<PositionEvent>,
    ) -> Result<SubscriptionId, LocationSourceError> {
        Err(LocationSourceError::unsupported("fixture source"))
    }

    fn unsubscribe(&self, _id: SubscriptionId) {}
}
