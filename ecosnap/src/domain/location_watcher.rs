//! Continuous location acquisition with an explicit capture lock.
//!
//! The watcher subscribes to a [`LocationSource`], validates every sample, and
//! publishes the latest fix through a `tokio::sync::watch` channel. Locking
//! freezes the published fix so the photo and its coordinates stay paired;
//! samples arriving while locked are dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use mockable::Clock;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::ports::{
    LocationSource, LocationSourceError, PositionErrorKind, PositionEvent, PositionFailure,
    PositionSample, SubscriptionId, WatchOptions,
};
use crate::domain::{AccuracyClass, Error, GeoFix};

/// Watcher tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationWatcherConfig {
    /// Longest wait for one fix before the status becomes `TimedOut`.
    pub fix_timeout: Duration,
    /// Request high-accuracy positioning from the platform.
    pub high_accuracy: bool,
}

impl Default for LocationWatcherConfig {
    fn default() -> Self {
        Self {
            fix_timeout: Duration::from_secs(10),
            high_accuracy: true,
        }
    }
}

/// Where acquisition stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionStatus {
    Idle,
    Acquiring,
    Granted,
    Denied,
    Unavailable,
    TimedOut,
}

/// Whether live samples may replace the current fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LockState {
    Unlocked,
    Locked,
}

/// Point-in-time view of the watcher for presentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSnapshot {
    /// Most recent valid fix, or the locked fix while locked.
    pub fix: Option<GeoFix>,
    pub status: AcquisitionStatus,
    /// Last acquisition failure, cleared by the next valid sample.
    pub error: Option<Error>,
    pub lock_state: LockState,
    /// True while live updates are running and unlocked.
    pub is_locating: bool,
}

impl LocationSnapshot {
    fn idle() -> Self {
        Self {
            fix: None,
            status: AcquisitionStatus::Idle,
            error: None,
            lock_state: LockState::Unlocked,
            is_locating: false,
        }
    }

    /// Accuracy class of the current fix, if any.
    pub fn accuracy_class(&self) -> Option<AccuracyClass> {
        self.fix.as_ref().map(GeoFix::accuracy_class)
    }
}

struct ActiveSubscription {
    id: SubscriptionId,
    task: JoinHandle<()>,
}

/// Location watcher driving one platform subscription at a time.
///
/// `start` and the sampling task must run inside a Tokio runtime. Dropping the
/// watcher cancels its subscription.
pub struct LocationWatcher {
    source: Arc<dyn LocationSource>,
    clock: Arc<dyn Clock>,
    config: LocationWatcherConfig,
    state: Arc<watch::Sender<LocationSnapshot>>,
    generation: Arc<AtomicU64>,
    active: Mutex<Option<ActiveSubscription>>,
}

impl LocationWatcher {
    pub fn new(
        source: Arc<dyn LocationSource>,
        clock: Arc<dyn Clock>,
        config: LocationWatcherConfig,
    ) -> Self {
        let (state, _) = watch::channel(LocationSnapshot::idle());
        Self {
            source,
            clock,
            config,
            state: Arc::new(state),
            generation: Arc::new(AtomicU64::new(0)),
            active: Mutex::new(None),
        }
    }

    /// Begin or resume live updates.
    ///
    /// Always clears the capture lock. Calling it while already running
    /// keeps the existing subscription.
    pub fn start(&self) {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if active.is_some() {
            self.state.send_modify(|snapshot| {
                snapshot.lock_state = LockState::Unlocked;
                snapshot.is_locating = true;
            });
            return;
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let Ok(runtime) = Handle::try_current() else {
            warn!("location watch requested outside an async runtime");
            self.publish_start_failure(
                AcquisitionStatus::Unavailable,
                Error::location_unavailable("location updates need an async runtime"),
            );
            return;
        };

        let options = WatchOptions {
            high_accuracy: self.config.high_accuracy,
            ..WatchOptions::precise(self.config.fix_timeout)
        };
        let (sink, events) = mpsc::unbounded_channel();
        self.state.send_modify(|snapshot| {
            snapshot.status = AcquisitionStatus::Acquiring;
            snapshot.error = None;
            snapshot.lock_state = LockState::Unlocked;
            snapshot.is_locating = true;
        });

        match self.source.subscribe(&options, sink) {
            Ok(id) => {
                let sampler = Sampler {
                    state: Arc::clone(&self.state),
                    generation: Arc::clone(&self.generation),
                    expected_generation: generation,
                    clock: Arc::clone(&self.clock),
                };
                let task = runtime.spawn(sampler.run(events, self.config.fix_timeout));
                info!(subscription = %id, "location watch started");
                *active = Some(ActiveSubscription { id, task });
            }
            Err(err) => {
                warn!(error = %err, "location subscription refused");
                let (status, error) = map_subscription_error(&err);
                self.publish_start_failure(status, error);
            }
        }
    }

    /// End live updates and return to `Idle`. The last fix stays exposed.
    pub fn stop(&self) {
        let previous = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(subscription) = previous {
            self.release(subscription);
        }
        self.state.send_modify(|snapshot| {
            snapshot.status = AcquisitionStatus::Idle;
            snapshot.error = None;
            snapshot.lock_state = LockState::Unlocked;
            snapshot.is_locating = false;
        });
    }

    /// Freeze the current fix and return it.
    ///
    /// Returns `None` when no fix has been acquired; the capture proceeds
    /// without coordinates in that case.
    pub fn lock(&self) -> Option<GeoFix> {
        let mut locked = None;
        self.state.send_modify(|snapshot| {
            snapshot.lock_state = LockState::Locked;
            snapshot.is_locating = false;
            locked = snapshot.fix;
        });
        debug!(has_fix = locked.is_some(), "location locked");
        locked
    }

    /// Let live samples replace the fix again.
    pub fn unlock(&self) {
        let running = self.is_running();
        self.state.send_modify(|snapshot| {
            snapshot.lock_state = LockState::Unlocked;
            snapshot.is_locating = running;
        });
    }

    /// Current fix, honouring the lock.
    pub fn current_fix(&self) -> Option<GeoFix> {
        self.state.borrow().fix
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> LocationSnapshot {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<LocationSnapshot> {
        self.state.subscribe()
    }

    /// Whether a platform subscription is active.
    pub fn is_running(&self) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn publish_start_failure(&self, status: AcquisitionStatus, error: Error) {
        self.state.send_modify(|snapshot| {
            snapshot.status = status;
            snapshot.error = Some(error);
            snapshot.is_locating = false;
        });
    }

    fn release(&self, subscription: ActiveSubscription) {
        self.source.unsubscribe(subscription.id);
        subscription.task.abort();
        info!(subscription = %subscription.id, "location watch stopped");
    }
}

impl Drop for LocationWatcher {
    fn drop(&mut self) {
        let previous = self
            .active
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(subscription) = previous {
            self.release(subscription);
        }
    }
}

/// Background consumer for one subscription generation.
struct Sampler {
    state: Arc<watch::Sender<LocationSnapshot>>,
    generation: Arc<AtomicU64>,
    expected_generation: u64,
    clock: Arc<dyn Clock>,
}

impl Sampler {
    async fn run(self, mut events: mpsc::UnboundedReceiver<PositionEvent>, fix_timeout: Duration) {
        loop {
            match tokio::time::timeout(fix_timeout, events.recv()).await {
                Ok(Some(Ok(sample))) => self.apply_sample(sample),
                Ok(Some(Err(failure))) => self.apply_failure(&failure),
                Ok(None) => {
                    debug!("location source closed its channel");
                    break;
                }
                Err(_elapsed) => self.apply_failure(&PositionFailure::new(
                    PositionErrorKind::Timeout,
                    format!("no position within {}ms", fix_timeout.as_millis()),
                )),
            }
        }
    }

    fn is_current(&self) -> bool {
        self.generation.load(Ordering::SeqCst) == self.expected_generation
    }

    fn apply_sample(&self, sample: PositionSample) {
        let captured_at = sample
            .timestamp_epoch_ms
            .unwrap_or_else(|| self.clock.utc().timestamp_millis());
        let fix = match GeoFix::new(
            sample.latitude,
            sample.longitude,
            sample.accuracy_meters,
            captured_at,
        ) {
            Ok(fix) => fix,
            Err(err) => {
                warn!(error = %err, "discarding invalid position sample");
                return;
            }
        };

        self.state.send_if_modified(|snapshot| {
            if !self.is_current() || snapshot.lock_state == LockState::Locked {
                return false;
            }
            snapshot.fix = Some(fix);
            snapshot.status = AcquisitionStatus::Granted;
            snapshot.error = None;
            true
        });
    }

    fn apply_failure(&self, failure: &PositionFailure) {
        let (status, error) = map_position_failure(failure);
        self.state.send_if_modified(|snapshot| {
            if !self.is_current() {
                return false;
            }
            let changed = snapshot.status != status || snapshot.error.as_ref() != Some(&error);
            snapshot.status = status;
            snapshot.error = Some(error);
            changed
        });
    }
}

fn map_position_failure(failure: &PositionFailure) -> (AcquisitionStatus, Error) {
    let detail = failure.message.trim();
    let describe = |summary: &str| {
        if detail.is_empty() {
            summary.to_owned()
        } else {
            format!("{summary}: {detail}")
        }
    };
    match failure.kind {
        PositionErrorKind::PermissionDenied => (
            AcquisitionStatus::Denied,
            Error::location_denied(describe("location permission denied")),
        ),
        PositionErrorKind::PositionUnavailable => (
            AcquisitionStatus::Unavailable,
            Error::location_unavailable(describe("location unavailable")),
        ),
        PositionErrorKind::Timeout => (
            AcquisitionStatus::TimedOut,
            Error::location_timeout(describe("location request timed out")),
        ),
    }
}

fn map_subscription_error(error: &LocationSourceError) -> (AcquisitionStatus, Error) {
    match error {
        LocationSourceError::Unsupported { .. } => (
            AcquisitionStatus::Denied,
            Error::location_denied(error.to_string()),
        ),
        LocationSourceError::Subscription { .. } => (
            AcquisitionStatus::Unavailable,
            Error::location_unavailable(error.to_string()),
        ),
    }
}

#[cfg(test)]
#[path = "location_watcher_tests.rs"]
mod tests;
