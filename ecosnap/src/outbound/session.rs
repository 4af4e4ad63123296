//! Session provider holding one fixed session.

use async_trait::async_trait;

use crate::domain::Session;
use crate::domain::ports::{SessionProvider, SessionProviderError};

/// Returns the session it was built with; `None` models a signed-out user.
#[derive(Debug, Clone, Default)]
pub struct StaticSessionProvider {
    session: Option<Session>,
}

impl StaticSessionProvider {
    pub fn signed_in(session: Session) -> Self {
        Self {
            session: Some(session),
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionProvider for StaticSessionProvider {
    async fn current_session(&self) -> Result<Option<Session>, SessionProviderError> {
        Ok(self.session.clone())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, Utc};
    use rstest::rstest;

    use super::*;
    use crate::domain::UserId;

    #[rstest]
    #[tokio::test]
    async fn signed_in_provider_returns_its_session() {
        let session = Session::new(
            UserId::new("u1").expect("valid id"),
            "token",
            Utc::now() + TimeDelta::hours(1),
        )
        .expect("valid session");
        let provider = StaticSessionProvider::signed_in(session.clone());

        let current = provider.current_session().await.expect("lookup succeeds");
        assert_eq!(current, Some(session));
    }

    #[rstest]
    #[tokio::test]
    async fn signed_out_provider_returns_none() {
        let current = StaticSessionProvider::signed_out()
            .current_session()
            .await
            .expect("lookup succeeds");
        assert!(current.is_none());
    }
}
