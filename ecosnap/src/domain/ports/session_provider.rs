//! Driven port supplying the current authenticated session.

use async_trait::async_trait;

use crate::domain::Session;

use super::define_port_error;

define_port_error! {
    /// Errors raised by session provider adapters.
    pub enum SessionProviderError {
        /// The backing session store could not be read.
        Unavailable { message: String } =>
            "session provider unavailable: {message}",
    }
}

/// Port exposing the caller's current session.
///
/// The core only reads sessions; refreshing or persisting them belongs to the
/// adapter.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Return the current session, or `None` when nobody is signed in.
    async fn current_session(&self) -> Result<Option<Session>, SessionProviderError>;
}

/// Fixture implementation with nobody signed in.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureSessionProvider;

#[async_trait]
impl SessionProvider for FixtureSessionProvider {
    async fn current_session(&self) -> Result<Option<Session>, SessionProviderError> {
        Ok(None)
    }
}
