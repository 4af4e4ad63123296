//! Supabase storage adapter for captured images.

use async_trait::async_trait;
use reqwest::{Method, header};
use tracing::debug;

use super::client::{HttpFailure, SupabaseClient};
use crate::domain::Session;
use crate::domain::ports::{ImageStorage, ImageStorageError};

const CACHE_CONTROL: &str = "max-age=3600";

/// Uploads images into one storage bucket without overwriting.
#[derive(Debug, Clone)]
pub struct SupabaseImageStorage {
    client: SupabaseClient,
    bucket: String,
}

impl SupabaseImageStorage {
    pub fn new(client: SupabaseClient, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl ImageStorage for SupabaseImageStorage {
    async fn upload(
        &self,
        auth: &Session,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<(), ImageStorageError> {
        let url = self
            .client
            .endpoint(object_segments(&self.bucket, path)?)?;
        let request = self
            .client
            .request(Method::POST, url, auth)
            .header(header::CONTENT_TYPE, content_type)
            .header(header::CACHE_CONTROL, CACHE_CONTROL)
            .header("x-upsert", "false")
            .body(bytes.to_vec());
        self.client.execute(request).await?;
        debug!(bucket = %self.bucket, %path, "object stored");
        Ok(())
    }
}

fn object_segments<'a>(bucket: &'a str, path: &'a str) -> Result<Vec<&'a str>, HttpFailure> {
    let mut segments = vec!["storage", "v1", "object", bucket];
    let mut any = false;
    for part in path.split('/') {
        if part.is_empty() || part == "." || part == ".." {
            return Err(HttpFailure::Rejected(format!(
                "storage path {path:?} has an empty or relative segment"
            )));
        }
        segments.push(part);
        any = true;
    }
    if !any {
        return Err(HttpFailure::Rejected("storage path is empty".to_owned()));
    }
    Ok(segments)
}
