//! Row shapes exchanged with PostgREST.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ActionRecord, StreakRecord, UserId};

#[derive(Debug, Serialize)]
pub(super) struct EcoActionRowDto<'a> {
    pub(super) user_id: &'a str,
    pub(super) image_url: &'a str,
    pub(super) latitude: Option<f64>,
    pub(super) longitude: Option<f64>,
    pub(super) action_date: NaiveDate,
}

impl<'a> From<&'a ActionRecord> for EcoActionRowDto<'a> {
    fn from(record: &'a ActionRecord) -> Self {
        Self {
            user_id: record.user_id.as_ref(),
            image_url: record.storage_path.as_str(),
            latitude: record.latitude,
            longitude: record.longitude,
            action_date: record.action_date,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct StreakRowDto {
    #[serde(default)]
    pub(super) current_streak: Option<i64>,
    #[serde(default)]
    pub(super) last_action_date: Option<NaiveDate>,
    #[serde(default)]
    pub(super) updated_at: Option<DateTime<Utc>>,
}

impl StreakRowDto {
    pub(super) fn into_domain(self, user_id: &UserId) -> Result<StreakRecord, String> {
        let raw = self.current_streak.unwrap_or(0);
        let current_streak = u32::try_from(raw)
            .map_err(|_| format!("streak for {user_id} is out of range: {raw}"))?;
        Ok(StreakRecord {
            user_id: user_id.clone(),
            current_streak,
            last_action_date: self.last_action_date,
            updated_at: self.updated_at.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Serialize)]
pub(super) struct StreakUpsertDto<'a> {
    pub(super) user_id: &'a str,
    pub(super) current_streak: u32,
    pub(super) last_action_date: Option<NaiveDate>,
    pub(super) updated_at: DateTime<Utc>,
}

impl<'a> From<&'a StreakRecord> for StreakUpsertDto<'a> {
    fn from(record: &'a StreakRecord) -> Self {
        Self {
            user_id: record.user_id.as_ref(),
            current_streak: record.current_streak,
            last_action_date: record.last_action_date,
            updated_at: record.updated_at,
        }
    }
}
