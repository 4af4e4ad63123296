//! Driven port for durable image storage.

use async_trait::async_trait;

use crate::domain::Session;

use super::define_port_error;

define_port_error! {
    /// Errors raised by image storage adapters.
    pub enum ImageStorageError {
        /// Network transport failed before a response arrived.
        Transport { message: String } =>
            "image storage transport failed: {message}",
        /// The upload exceeded its timeout.
        Timeout { message: String } =>
            "image storage timed out: {message}",
        /// Storage rejected the caller's credentials.
        Unauthorized { message: String } =>
            "image storage rejected credentials: {message}",
        /// Storage refused the object (duplicate path, size, policy).
        Rejected { message: String } =>
            "image storage rejected upload: {message}",
    }
}

/// Port for writing captured images to durable storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageStorage: Send + Sync {
    /// Upload `bytes` to `path` with the declared `content_type`.
    ///
    /// `auth` carries the caller's bearer token for adapters that enforce
    /// per-user access policies.
    async fn upload(
        &self,
        auth: &Session,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<(), ImageStorageError>;
}

/// Fixture implementation that accepts and discards every upload.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureImageStorage;

#[async_trait]
impl ImageStorage for FixtureImageStorage {
    async fn upload(
        &self,
        _auth: &Session,
        _path: &str,
        _bytes: &[u8],
        _content_type: &str,
    ) -> Result<(), ImageStorageError> {
        Ok(())
    }
}
