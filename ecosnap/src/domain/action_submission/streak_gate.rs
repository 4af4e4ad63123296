//! Per-user serialisation of streak read-modify-write cycles.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::{Error, UserId};

/// Hands out one async gate per user; entries vanish once nobody holds or
/// waits on them.
#[derive(Debug, Default)]
pub(super) struct StreakGates {
    gates: Mutex<HashMap<UserId, Weak<AsyncMutex<()>>>>,
}

impl StreakGates {
    /// Wait until no other submission for `user_id` is inside its streak
    /// update, then hold the gate until the guard drops.
    pub(super) async fn acquire(&self, user_id: &UserId) -> Result<OwnedMutexGuard<()>, Error> {
        let gate = {
            let mut gates = self
                .gates
                .lock()
                .map_err(|_| Error::internal("streak gate registry poisoned"))?;
            gates.retain(|_, gate| gate.strong_count() > 0);
            match gates.get(user_id).and_then(Weak::upgrade) {
                Some(gate) => gate,
                None => {
                    let gate = Arc::new(AsyncMutex::new(()));
                    gates.insert(user_id.clone(), Arc::downgrade(&gate));
                    gate
                }
            }
        };
        Ok(gate.lock_owned().await)
    }

    #[cfg(test)]
    pub(super) fn tracked_users(&self) -> usize {
        match self.gates.lock() {
            Ok(gates) => gates.values().filter(|gate| gate.strong_count() > 0).count(),
            Err(_) => panic!("streak gate registry"),
        }
    }
}
