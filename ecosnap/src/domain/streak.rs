//! Calendar-day streak model and calculator.
//!
//! A streak counts consecutive UTC calendar days containing at least one
//! submitted action. [`compute_next_streak`] is pure; persistence lives behind
//! the `EcoActionRepository` port.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::UserId;

/// Persisted streak state for one user.
///
/// Exactly one record exists per user once they have submitted an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakRecord {
    /// Owner of the streak; unique key.
    pub user_id: UserId,
    /// Consecutive-day count.
    pub current_streak: u32,
    /// UTC calendar date of the most recent action, if any.
    pub last_action_date: Option<NaiveDate>,
    /// Last time the record was written.
    pub updated_at: DateTime<Utc>,
}

/// Compute the next streak value.
///
/// - No previous date: the streak starts at one (or keeps a larger stored
///   value when history is missing).
/// - Same day, or `today` before the last action: unchanged, floored at one.
/// - Consecutive day: incremented.
/// - Any larger gap: reset to one.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use ecosnap::domain::compute_next_streak;
///
/// let monday = NaiveDate::from_ymd_opt(2026, 3, 2).expect("valid date");
/// let tuesday = NaiveDate::from_ymd_opt(2026, 3, 3).expect("valid date");
/// assert_eq!(compute_next_streak(5, Some(monday), tuesday), 6);
/// assert_eq!(compute_next_streak(0, None, tuesday), 1);
/// ```
pub fn compute_next_streak(
    current_streak: u32,
    last_action_date: Option<NaiveDate>,
    today: NaiveDate,
) -> u32 {
    let Some(last) = last_action_date else {
        return current_streak.max(1);
    };

    match (today - last).num_days() {
        diff if diff <= 0 => current_streak.max(1),
        1 => current_streak.saturating_add(1),
        _ => 1,
    }
}
