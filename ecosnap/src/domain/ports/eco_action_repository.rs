//! Driven port for action records and streak persistence.

use async_trait::async_trait;

use crate::domain::{ActionRecord, Session, StreakRecord, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by eco action repository adapters.
    pub enum EcoActionRepositoryError {
        /// Network transport or connection failed.
        Transport { message: String } =>
            "eco action repository transport failed: {message}",
        /// The request exceeded its timeout.
        Timeout { message: String } =>
            "eco action repository timed out: {message}",
        /// The store rejected the caller's credentials.
        Unauthorized { message: String } =>
            "eco action repository rejected credentials: {message}",
        /// The store refused the query or mutation.
        Rejected { message: String } =>
            "eco action repository rejected request: {message}",
        /// A stored row could not be decoded.
        Decode { message: String } =>
            "eco action repository returned malformed data: {message}",
    }
}

/// Port for appending action records and reading/writing streaks.
///
/// Action records are append-only. Streak records are keyed by user and
/// written only by the submission pipeline.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EcoActionRepository: Send + Sync {
    /// Append one action record.
    async fn insert_action(
        &self,
        auth: &Session,
        record: &ActionRecord,
    ) -> Result<(), EcoActionRepositoryError>;

    /// Read the streak for `user_id`, if one exists.
    async fn find_streak(
        &self,
        auth: &Session,
        user_id: &UserId,
    ) -> Result<Option<StreakRecord>, EcoActionRepositoryError>;

    /// Insert or replace the streak keyed by `record.user_id`.
    async fn upsert_streak(
        &self,
        auth: &Session,
        record: &StreakRecord,
    ) -> Result<(), EcoActionRepositoryError>;
}

/// Fixture implementation with no stored history.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureEcoActionRepository;

#[async_trait]
impl EcoActionRepository for FixtureEcoActionRepository {
    async fn insert_action(
        &self,
        _auth: &Session,
        _record: &ActionRecord,
    ) -> Result<(), EcoActionRepositoryError> {
        Ok(())
    }

    async fn find_streak(
        &self,
        _auth: &Session,
        _user_id: &UserId,
    ) -> Result<Option<StreakRecord>, EcoActionRepositoryError> {
        Ok(None)
    }

    async fn upsert_streak(
        &self,
        _auth: &Session,
        _record: &StreakRecord,
    ) -> Result<(), EcoActionRepositoryError> {
        Ok(())
    }
}
