//! Storage doubles for submission tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::domain::Session;
use crate::domain::ports::{ImageStorage, ImageStorageError};

/// Image storage that rejects every upload with a fixed error.
#[derive(Debug)]
pub struct FailingImageStorage {
    error: ImageStorageError,
    attempts: AtomicUsize,
}

impl FailingImageStorage {
    pub fn new(error: ImageStorageError) -> Self {
        Self {
            error,
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageStorage for FailingImageStorage {
    async fn upload(
        &self,
        _auth: &Session,
        _path: &str,
        _bytes: &[u8],
        _content_type: &str,
    ) -> Result<(), ImageStorageError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }
}
