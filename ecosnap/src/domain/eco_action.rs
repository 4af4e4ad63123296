//! Submitted eco action record.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{GeoFix, UserId};

/// Append-only log entry for one submitted action.
///
/// Coordinates are both present or both absent; an action captured without a
/// fix is still recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRecord {
    /// Submitting user.
    pub user_id: UserId,
    /// Storage path of the uploaded image.
    pub storage_path: String,
    /// Latitude of the locked fix, if any.
    pub latitude: Option<f64>,
    /// Longitude of the locked fix, if any.
    pub longitude: Option<f64>,
    /// UTC calendar date of the submission.
    pub action_date: NaiveDate,
}

impl ActionRecord {
    /// Build a record for an uploaded image, copying coordinates from `fix`.
    pub fn new(
        user_id: UserId,
        storage_path: impl Into<String>,
        fix: Option<&GeoFix>,
        action_date: NaiveDate,
    ) -> Self {
        Self {
            user_id,
            storage_path: storage_path.into(),
            latitude: fix.map(GeoFix::latitude),
            longitude: fix.map(GeoFix::longitude),
            action_date,
        }
    }
}
