//! Driving port for committing a captured action.
//!
//! Presentation code hands over the captured image and the locked fix; the
//! service resolves the caller from the session provider, stores the image,
//! appends the action record, and advances the streak.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{Error, GeoFix, ImagePayload};

/// Captured action handed to the submission service.
#[derive(Debug, Clone)]
pub struct ActionSubmissionRequest {
    pub image: ImagePayload,
    /// Fix locked at capture; `None` when no fix was available.
    pub fix: Option<GeoFix>,
}

impl ActionSubmissionRequest {
    pub fn new(image: ImagePayload, fix: Option<GeoFix>) -> Self {
        Self { image, fix }
    }
}

/// Outcome of a committed submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionSubmissionResponse {
    /// Streak after this submission.
    pub streak: u32,
    /// Where the image was stored.
    pub storage_path: String,
    /// UTC date the action counts towards.
    pub action_date: NaiveDate,
}

/// Driving port for the capture-to-commit pipeline.
///
/// Steps run strictly in order and the first failure aborts the rest. Work
/// already committed by earlier steps is not rolled back.
#[async_trait]
pub trait ActionSubmissionService: Send + Sync {
    async fn submit(
        &self,
        request: ActionSubmissionRequest,
    ) -> Result<ActionSubmissionResponse, Error>;
}

/// Fixture implementation that accepts every submission as a first action.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureActionSubmissionService;

#[async_trait]
impl ActionSubmissionService for FixtureActionSubmissionService {
    async fn submit(
        &self,
        request: ActionSubmissionRequest,
    ) -> Result<ActionSubmissionResponse, Error> {
        let action_date = chrono::DateTime::from_timestamp_millis(
            request.image.captured_at_epoch_ms(),
        )
        .map(|at| at.date_naive())
        .unwrap_or_default();
        Ok(ActionSubmissionResponse {
            streak: 1,
            storage_path: format!("fixture/{}", request.image.captured_at_epoch_ms()),
            action_date,
        })
    }
}
