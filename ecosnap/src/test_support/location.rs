//! Scripted location source that tests drive sample by sample.

use std::collections::BTreeMap;
use std::sync::Mutex;

use tokio::sync::mpsc::UnboundedSender;

use crate::domain::ports::{
    LocationSource, LocationSourceError, PositionErrorKind, PositionEvent, PositionFailure,
    PositionSample, SubscriptionId, WatchOptions,
};

#[derive(Default)]
struct ScriptState {
    next_id: u64,
    sinks: BTreeMap<u64, UnboundedSender<PositionEvent>>,
    subscribe_calls: usize,
    unsubscribed: Vec<SubscriptionId>,
    last_options: Option<WatchOptions>,
    refusal: Option<LocationSourceError>,
}

/// Location source whose events are pushed by the test.
#[derive(Default)]
pub struct ScriptedLocationSource(Mutex<ScriptState>);

impl ScriptedLocationSource {
    /// Source that refuses every subscription with `error`.
    pub fn refusing(error: LocationSourceError) -> Self {
        let source = Self::default();
        source.lock_state().refusal = Some(error);
        source
    }

    /// Deliver a fix to every live subscriber; returns how many received it.
    pub fn emit_fix(
        &self,
        latitude: f64,
        longitude: f64,
        accuracy_meters: f64,
        timestamp_epoch_ms: Option<i64>,
    ) -> usize {
        self.emit(Ok(PositionSample {
            latitude,
            longitude,
            accuracy_meters,
            timestamp_epoch_ms,
        }))
    }

    /// Deliver a platform failure to every live subscriber.
    pub fn emit_failure(&self, kind: PositionErrorKind) -> usize {
        self.emit(Err(PositionFailure::new(kind, "")))
    }

    pub fn active_subscriptions(&self) -> usize {
        self.lock_state()
            .sinks
            .values()
            .filter(|sink| !sink.is_closed())
            .count()
    }

    pub fn subscribe_calls(&self) -> usize {
        self.lock_state().subscribe_calls
    }

    pub fn unsubscribed(&self) -> Vec<SubscriptionId> {
        self.lock_state().unsubscribed.clone()
    }

    pub fn last_options(&self) -> Option<WatchOptions> {
        self.lock_state().last_options
    }

    fn emit(&self, event: PositionEvent) -> usize {
        let state = self.lock_state();
        state
            .sinks
            .values()
            .filter(|sink| sink.send(event.clone()).is_ok())
            .count()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, ScriptState> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("location script mutex"),
        }
    }
}

impl LocationSource for ScriptedLocationSource {
    fn subscribe(
        &self,
        options: &WatchOptions,
        sink: UnboundedSender<PositionEvent>,
    ) -> Result<SubscriptionId, LocationSourceError> {
        let mut state = self.lock_state();
        state.subscribe_calls += 1;
        state.last_options = Some(*options);
        if let Some(error) = state.refusal.clone() {
            return Err(error);
        }
        state.next_id += 1;
        let id = state.next_id;
        state.sinks.insert(id, sink);
        Ok(SubscriptionId::new(id))
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        let mut state = self.lock_state();
        state.sinks.remove(&id.get());
        state.unsubscribed.push(id);
    }
}
