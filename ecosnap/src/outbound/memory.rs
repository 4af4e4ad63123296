//! In-memory storage for dry runs and tests.
//!
//! Mirrors the ownership rules enforced by the hosted store: callers may only
//! write objects under their own folder and rows carrying their own id, and
//! an existing object is never overwritten.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::ports::{
    EcoActionRepository, EcoActionRepositoryError, ImageStorage, ImageStorageError,
};
use crate::domain::{ActionRecord, Session, StreakRecord, UserId};

/// One uploaded object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub path: String,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[derive(Debug, Default)]
struct StoreState {
    images: BTreeMap<String, StoredImage>,
    actions: Vec<ActionRecord>,
    streaks: HashMap<UserId, StreakRecord>,
}

/// Process-local image storage and eco action repository.
#[derive(Debug, Default)]
pub struct InMemoryEcoActionStore {
    state: Mutex<StoreState>,
}

impl InMemoryEcoActionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an existing streak, replacing any previous one for that user.
    pub fn seed_streak(&self, record: StreakRecord) {
        self.lock_lenient()
            .streaks
            .insert(record.user_id.clone(), record);
    }

    /// Uploaded objects ordered by path.
    pub fn images(&self) -> Vec<StoredImage> {
        self.lock_lenient().images.values().cloned().collect()
    }

    /// Action records in insertion order.
    pub fn actions(&self) -> Vec<ActionRecord> {
        self.lock_lenient().actions.clone()
    }

    pub fn streak(&self, user_id: &UserId) -> Option<StreakRecord> {
        self.lock_lenient().streaks.get(user_id).cloned()
    }

    /// Lock for test helpers, recovering state after a panic elsewhere.
    fn lock_lenient(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock for port calls; a poisoned store surfaces as a transport error.
    fn lock_checked(&self) -> Result<MutexGuard<'_, StoreState>, String> {
        self.state
            .lock()
            .map_err(|_| "in-memory store poisoned".to_owned())
    }
}

fn ensure_row_owner(auth: &Session, owner: &UserId) -> Result<(), EcoActionRepositoryError> {
    if auth.user_id() == owner {
        Ok(())
    } else {
        Err(EcoActionRepositoryError::unauthorized(format!(
            "{} may not write rows for {owner}",
            auth.user_id()
        )))
    }
}

#[async_trait]
impl ImageStorage for InMemoryEcoActionStore {
    async fn upload(
        &self,
        auth: &Session,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<(), ImageStorageError> {
        let owner: &str = auth.user_id().as_ref();
        if path.split('/').next() != Some(owner) {
            return Err(ImageStorageError::unauthorized(format!(
                "{} may not write to {path}",
                auth.user_id()
            )));
        }
        let mut state = self.lock_checked().map_err(ImageStorageError::transport)?;
        if state.images.contains_key(path) {
            return Err(ImageStorageError::rejected(format!("{path} already exists")));
        }
        state.images.insert(
            path.to_owned(),
            StoredImage {
                path: path.to_owned(),
                bytes: bytes.to_vec(),
                content_type: content_type.to_owned(),
            },
        );
        Ok(())
    }
}

#[async_trait]
impl EcoActionRepository for InMemoryEcoActionStore {
    async fn insert_action(
        &self,
        auth: &Session,
        record: &ActionRecord,
    ) -> Result<(), EcoActionRepositoryError> {
        ensure_row_owner(auth, &record.user_id)?;
        let mut state = self.lock_checked().map_err(EcoActionRepositoryError::transport)?;
        state.actions.push(record.clone());
        Ok(())
    }

    async fn find_streak(
        &self,
        _auth: &Session,
        user_id: &UserId,
    ) -> Result<Option<StreakRecord>, EcoActionRepositoryError> {
        let state = self.lock_checked().map_err(EcoActionRepositoryError::transport)?;
        Ok(state.streaks.get(user_id).cloned())
    }

    async fn upsert_streak(
        &self,
        auth: &Session,
        record: &StreakRecord,
    ) -> Result<(), EcoActionRepositoryError> {
        ensure_row_owner(auth, &record.user_id)?;
        let mut state = self.lock_checked().map_err(EcoActionRepositoryError::transport)?;
        state.streaks.insert(record.user_id.clone(), record.clone());
        Ok(())
    }
}
