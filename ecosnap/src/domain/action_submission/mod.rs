//! Capture-to-commit pipeline.
//!
//! Submission runs strictly in order: authenticate, upload the image, append
//! the action record, then read, compute, and write the streak. The first
//! failure aborts the remaining steps. Nothing already committed is rolled
//! back, so an image may be orphaned when a later step fails.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde::Serialize;
use serde_json::json;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use super::ports::{
    ActionSubmissionRequest, ActionSubmissionResponse, ActionSubmissionService,
    EcoActionRepository, EcoActionRepositoryError, ImageStorage, ImageStorageError,
    SessionProvider,
};
use super::{ActionRecord, Error, Session, StreakRecord, compute_next_streak};

mod streak_gate;

use streak_gate::StreakGates;

/// Pipeline step reported in error details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStage {
    Authenticate,
    Upload,
    InsertRecord,
    FetchStreak,
    UpdateStreak,
}

impl SubmissionStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Authenticate => "authenticate",
            Self::Upload => "upload",
            Self::InsertRecord => "insert_record",
            Self::FetchStreak => "fetch_streak",
            Self::UpdateStreak => "update_streak",
        }
    }
}

/// Port bundle required by the pipeline.
pub struct ActionSubmissionPorts {
    pub session_provider: Arc<dyn SessionProvider>,
    pub image_storage: Arc<dyn ImageStorage>,
    pub repository: Arc<dyn EcoActionRepository>,
}

impl ActionSubmissionPorts {
    pub fn new(
        session_provider: Arc<dyn SessionProvider>,
        image_storage: Arc<dyn ImageStorage>,
        repository: Arc<dyn EcoActionRepository>,
    ) -> Self {
        Self {
            session_provider,
            image_storage,
            repository,
        }
    }
}

/// Concrete [`ActionSubmissionService`].
///
/// Streak steps for one user are serialised across concurrent submissions
/// so two actions on the same day cannot both read the old streak.
pub struct ActionSubmissionPipeline {
    session_provider: Arc<dyn SessionProvider>,
    image_storage: Arc<dyn ImageStorage>,
    repository: Arc<dyn EcoActionRepository>,
    clock: Arc<dyn Clock>,
    streak_gates: StreakGates,
}

impl ActionSubmissionPipeline {
    pub fn new(ports: ActionSubmissionPorts, clock: Arc<dyn Clock>) -> Self {
        Self {
            session_provider: ports.session_provider,
            image_storage: ports.image_storage,
            repository: ports.repository,
            clock,
            streak_gates: StreakGates::default(),
        }
    }

    async fn authenticate(&self) -> Result<Session, Error> {
        let session = self
            .session_provider
            .current_session()
            .await
            .map_err(|err| {
                Error::unauthenticated(format!("session lookup failed: {err}"))
                    .with_details(stage_details(SubmissionStage::Authenticate))
            })?
            .ok_or_else(|| {
                Error::unauthenticated("not signed in")
                    .with_details(stage_details(SubmissionStage::Authenticate))
            })?;
        if !session.is_active_at(self.clock.utc()) {
            return Err(Error::unauthenticated("session expired")
                .with_details(stage_details(SubmissionStage::Authenticate)));
        }
        Ok(session)
    }

    async fn run(&self, request: ActionSubmissionRequest) -> Result<ActionSubmissionResponse, Error> {
        let session = self.authenticate().await?;
        let user_id = session.user_id().clone();
        let ActionSubmissionRequest { image, fix } = request;

        let storage_path = image.storage_path(&user_id);
        self.image_storage
            .upload(&session, &storage_path, image.bytes(), image.content_type())
            .await
            .map_err(|err| map_upload_error(&err, &storage_path))?;
        debug!(%user_id, %storage_path, bytes = image.bytes().len(), "image uploaded");

        let action_date = self.clock.utc().date_naive();
        let record = ActionRecord::new(user_id.clone(), storage_path.clone(), fix.as_ref(), action_date);
        self.repository
            .insert_action(&session, &record)
            .await
            .map_err(|err| {
                map_repository_error(&err, SubmissionStage::InsertRecord, &record)
            })?;
        debug!(%storage_path, %action_date, has_fix = fix.is_some(), "action recorded");

        let _gate = self.streak_gates.acquire(&user_id).await?;
        let existing = self
            .repository
            .find_streak(&session, &user_id)
            .await
            .map_err(|err| map_repository_error(&err, SubmissionStage::FetchStreak, &record))?;
        let (current, last_action_date) = existing
            .map_or((0, None), |streak| (streak.current_streak, streak.last_action_date));
        // Read the day under the gate so a writer that waited across midnight
        // never moves the stored date backwards.
        let now = self.clock.utc();
        let streak_day = now.date_naive();
        let next = compute_next_streak(current, last_action_date, streak_day);
        let stored_day = last_action_date.map_or(streak_day, |last| last.max(streak_day));

        let updated = StreakRecord {
            user_id,
            current_streak: next,
            last_action_date: Some(stored_day),
            updated_at: now,
        };
        self.repository
            .upsert_streak(&session, &updated)
            .await
            .map_err(|err| map_repository_error(&err, SubmissionStage::UpdateStreak, &record))?;

        Ok(ActionSubmissionResponse {
            streak: next,
            storage_path,
            action_date,
        })
    }
}

#[async_trait]
impl ActionSubmissionService for ActionSubmissionPipeline {
    async fn submit(
        &self,
        request: ActionSubmissionRequest,
    ) -> Result<ActionSubmissionResponse, Error> {
        let span = info_span!("submit_action", submission_id = %Uuid::new_v4());
        async {
            match self.run(request).await {
                Ok(response) => {
                    info!(
                        streak = response.streak,
                        storage_path = %response.storage_path,
                        "action submitted"
                    );
                    Ok(response)
                }
                Err(err) => {
                    warn!(code = ?err.code(), error = %err, "action submission failed");
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }
}

fn stage_details(stage: SubmissionStage) -> serde_json::Value {
    json!({ "stage": stage.as_str() })
}

fn map_upload_error(error: &ImageStorageError, storage_path: &str) -> Error {
    Error::upload_failed(error.to_string()).with_details(json!({
        "stage": SubmissionStage::Upload.as_str(),
        "storagePath": storage_path,
    }))
}

fn map_repository_error(
    error: &EcoActionRepositoryError,
    stage: SubmissionStage,
    record: &ActionRecord,
) -> Error {
    let cause = error.to_string();
    let error = match stage {
        SubmissionStage::InsertRecord => Error::record_insert_failed(cause),
        SubmissionStage::FetchStreak => Error::streak_fetch_failed(cause),
        SubmissionStage::UpdateStreak => Error::streak_update_failed(cause),
        SubmissionStage::Authenticate | SubmissionStage::Upload => Error::internal(cause),
    };
    error.with_details(json!({
        "stage": stage.as_str(),
        "storagePath": record.storage_path,
        "actionDate": record.action_date,
    }))
}
