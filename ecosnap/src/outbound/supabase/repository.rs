//! PostgREST adapter for action records and streaks.

use async_trait::async_trait;
use reqwest::Method;
use tracing::debug;

use super::client::SupabaseClient;
use super::dto::{EcoActionRowDto, StreakRowDto, StreakUpsertDto};
use crate::domain::ports::{EcoActionRepository, EcoActionRepositoryError};
use crate::domain::{ActionRecord, Session, StreakRecord, UserId};

const ACTIONS_TABLE: &str = "eco_actions";
const STREAKS_TABLE: &str = "streaks";
const STREAK_COLUMNS: &str = "current_streak,last_action_date,updated_at";

/// Repository backed by the `eco_actions` and `streaks` tables.
#[derive(Debug, Clone)]
pub struct SupabaseEcoActionRepository {
    client: SupabaseClient,
}

impl SupabaseEcoActionRepository {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EcoActionRepository for SupabaseEcoActionRepository {
    async fn insert_action(
        &self,
        auth: &Session,
        record: &ActionRecord,
    ) -> Result<(), EcoActionRepositoryError> {
        let url = self.client.endpoint(["rest", "v1", ACTIONS_TABLE])?;
        let request = self
            .client
            .request(Method::POST, url, auth)
            .header("Prefer", "return=minimal")
            .json(&EcoActionRowDto::from(record));
        self.client.execute(request).await?;
        debug!(storage_path = %record.storage_path, "action row inserted");
        Ok(())
    }

    async fn find_streak(
        &self,
        auth: &Session,
        user_id: &UserId,
    ) -> Result<Option<StreakRecord>, EcoActionRepositoryError> {
        let mut url = self.client.endpoint(["rest", "v1", STREAKS_TABLE])?;
        url.query_pairs_mut()
            .append_pair("select", STREAK_COLUMNS)
            .append_pair("user_id", &format!("eq.{user_id}"));
        let body = self
            .client
            .execute(self.client.request(Method::GET, url, auth))
            .await?;
        decode_single_streak(&body, user_id)
    }

    async fn upsert_streak(
        &self,
        auth: &Session,
        record: &StreakRecord,
    ) -> Result<(), EcoActionRepositoryError> {
        let mut url = self.client.endpoint(["rest", "v1", STREAKS_TABLE])?;
        url.query_pairs_mut().append_pair("on_conflict", "user_id");
        let request = self
            .client
            .request(Method::POST, url, auth)
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&StreakUpsertDto::from(record));
        self.client.execute(request).await?;
        debug!(streak = record.current_streak, "streak row upserted");
        Ok(())
    }
}

/// Zero rows mean no streak yet; more than one is a schema violation.
fn decode_single_streak(
    body: &[u8],
    user_id: &UserId,
) -> Result<Option<StreakRecord>, EcoActionRepositoryError> {
    let rows: Vec<StreakRowDto> = serde_json::from_slice(body).map_err(|error| {
        EcoActionRepositoryError::decode(format!("invalid streak payload: {error}"))
    })?;
    let mut rows = rows.into_iter();
    let Some(row) = rows.next() else {
        return Ok(None);
    };
    if rows.next().is_some() {
        return Err(EcoActionRepositoryError::decode(format!(
            "multiple streak rows for {user_id}"
        )));
    }
    row.into_domain(user_id)
        .map(Some)
        .map_err(EcoActionRepositoryError::decode)
}

#[cfg(test)]
mod tests {
    //! Regression coverage for PostgREST payload handling.

    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use rstest::{fixture, rstest};
    use serde_json::json;

    #[fixture]
    fn user() -> UserId {
        UserId::new("user-1").expect("valid user id")
    }

    #[rstest]
    fn empty_result_means_no_streak(user: UserId) {
        assert_eq!(decode_single_streak(b"[]", &user).expect("decodes"), None);
    }

    #[rstest]
    fn single_row_decodes_into_record(user: UserId) {
        let body = br#"[{"current_streak":4,"last_action_date":"2026-03-13","updated_at":"2026-03-13T18:00:00+00:00"}]"#;
        let record = decode_single_streak(body, &user)
            .expect("decodes")
            .expect("row present");
        assert_eq!(record.current_streak, 4);
        assert_eq!(record.last_action_date, NaiveDate::from_ymd_opt(2026, 3, 13));
        assert_eq!(
            record.updated_at,
            Utc.with_ymd_and_hms(2026, 3, 13, 18, 0, 0)
                .single()
                .expect("valid time")
        );
    }

    #[rstest]
    fn null_columns_fall_back_to_defaults(user: UserId) {
        let body = br#"[{"current_streak":null,"last_action_date":null}]"#;
        let record = decode_single_streak(body, &user)
            .expect("decodes")
            .expect("row present");
        assert_eq!(record.current_streak, 0);
        assert!(record.last_action_date.is_none());
    }

    #[rstest]
    #[case::negative(br#"[{"current_streak":-1}]"#.as_slice())]
    #[case::duplicate(br#"[{"current_streak":1},{"current_streak":2}]"#.as_slice())]
    #[case::malformed(b"{".as_slice())]
    fn bad_payloads_are_decode_errors(user: UserId, #[case] body: &[u8]) {
        let err = decode_single_streak(body, &user).expect_err("must fail");
        assert!(matches!(err, EcoActionRepositoryError::Decode { .. }));
    }

    #[rstest]
    fn action_row_uses_storage_path_as_image_url(user: UserId) {
        let record = ActionRecord {
            user_id: user,
            storage_path: "user-1/1700.jpg".to_owned(),
            latitude: None,
            longitude: None,
            action_date: NaiveDate::from_ymd_opt(2026, 3, 14).expect("valid date"),
        };
        let value = serde_json::to_value(EcoActionRowDto::from(&record)).expect("serialise");
        assert_eq!(
            value,
            json!({
                "user_id": "user-1",
                "image_url": "user-1/1700.jpg",
                "latitude": null,
                "longitude": null,
                "action_date": "2026-03-14",
            })
        );
    }
}
