//! Authenticated session supplied by the session provider.

use std::fmt;

use chrono::{DateTime, Utc};

use super::UserId;

/// Validation errors returned by [`Session::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionValidationError {
    EmptyAccessToken,
}

impl fmt::Display for SessionValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyAccessToken => write!(f, "access token must not be empty"),
        }
    }
}

impl std::error::Error for SessionValidationError {}

/// Identity plus bearer token and expiry.
///
/// The pipeline only reads sessions; it never refreshes or mutates them.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    user_id: UserId,
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl Session {
    /// Build a session, rejecting blank tokens.
    pub fn new(
        user_id: UserId,
        access_token: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Result<Self, SessionValidationError> {
        let access_token = access_token.into();
        if access_token.trim().is_empty() {
            return Err(SessionValidationError::EmptyAccessToken);
        }
        Ok(Self {
            user_id,
            access_token,
            expires_at,
        })
    }

    /// Identity the session belongs to.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Bearer token presented to storage collaborators.
    pub fn access_token(&self) -> &str {
        self.access_token.as_str()
    }

    /// Instant after which the session is no longer valid.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Whether the session is still valid at `now`.
    ///
    /// A session expiring exactly at `now` is treated as expired.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};
    use rstest::{fixture, rstest};

    #[fixture]
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0)
            .single()
            .expect("valid fixed time")
    }

    fn session_expiring(at: DateTime<Utc>) -> Session {
        Session::new(UserId::new("u1").expect("valid id"), "token-u1", at).expect("valid session")
    }

    #[rstest]
    fn active_before_expiry(now: DateTime<Utc>) {
        let session = session_expiring(now + TimeDelta::minutes(5));
        assert!(session.is_active_at(now));
    }

    #[rstest]
    #[case::at_expiry(TimeDelta::zero())]
    #[case::after_expiry(TimeDelta::seconds(-1))]
    fn inactive_at_or_after_expiry(now: DateTime<Utc>, #[case] offset: TimeDelta) {
        let session = session_expiring(now + offset);
        assert!(!session.is_active_at(now));
    }

    #[rstest]
    fn rejects_blank_tokens(now: DateTime<Utc>) {
        let result = Session::new(UserId::random(), "  ", now);
        assert_eq!(result, Err(SessionValidationError::EmptyAccessToken));
    }

    #[rstest]
    fn debug_output_redacts_token(now: DateTime<Utc>) {
        let rendered = format!("{:?}", session_expiring(now));
        assert!(!rendered.contains("token-u1"));
        assert!(rendered.contains("<redacted>"));
    }
}
