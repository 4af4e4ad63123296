//! Shared reqwest plumbing for Supabase endpoints.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, StatusCode, Url, header};

use crate::domain::Session;
use crate::domain::ports::{EcoActionRepositoryError, ImageStorageError};

/// Connection settings for one Supabase project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://abc.supabase.co`.
    pub url: Url,
    /// Public anon key sent as the `apikey` header.
    pub anon_key: String,
    /// Storage bucket receiving captured images.
    pub bucket: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// Authenticated HTTP client bound to one project.
#[derive(Debug, Clone)]
pub struct SupabaseClient {
    client: Client,
    base: Url,
    anon_key: String,
}

impl SupabaseClient {
    /// Build a client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config: &SupabaseConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base: config.url.clone(),
            anon_key: config.anon_key.clone(),
        })
    }

    /// Append `segments` to the project URL, percent-encoding each one.
    pub(super) fn endpoint<'a>(
        &self,
        segments: impl IntoIterator<Item = &'a str>,
    ) -> Result<Url, HttpFailure> {
        build_endpoint(&self.base, segments)
    }

    /// Start a request carrying the project key and the caller's token.
    pub(super) fn request(&self, method: Method, url: Url, auth: &Session) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", self.anon_key.as_str())
            .bearer_auth(auth.access_token())
    }

    /// Send `request` and return the body of a successful response.
    pub(super) async fn execute(&self, request: RequestBuilder) -> Result<Vec<u8>, HttpFailure> {
        let response = request
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        Ok(body.to_vec())
    }
}

/// Transport-level failure shared by both adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum HttpFailure {
    Transport(String),
    Timeout(String),
    Unauthorized(String),
    Rejected(String),
}

impl From<HttpFailure> for ImageStorageError {
    fn from(failure: HttpFailure) -> Self {
        match failure {
            HttpFailure::Transport(message) => Self::transport(message),
            HttpFailure::Timeout(message) => Self::timeout(message),
            HttpFailure::Unauthorized(message) => Self::unauthorized(message),
            HttpFailure::Rejected(message) => Self::rejected(message),
        }
    }
}

impl From<HttpFailure> for EcoActionRepositoryError {
    fn from(failure: HttpFailure) -> Self {
        match failure {
            HttpFailure::Transport(message) => Self::transport(message),
            HttpFailure::Timeout(message) => Self::timeout(message),
            HttpFailure::Unauthorized(message) => Self::unauthorized(message),
            HttpFailure::Rejected(message) => Self::rejected(message),
        }
    }
}

fn build_endpoint<'a>(
    base: &Url,
    segments: impl IntoIterator<Item = &'a str>,
) -> Result<Url, HttpFailure> {
    let mut url = base.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|()| HttpFailure::Rejected(format!("{base} cannot carry a path")))?;
        path.pop_if_empty();
        path.extend(segments);
    }
    Ok(url)
}

fn map_transport_error(error: reqwest::Error) -> HttpFailure {
    if error.is_timeout() {
        HttpFailure::Timeout(error.to_string())
    } else {
        HttpFailure::Transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> HttpFailure {
    let body_preview = body_preview(body);
    let message = if body_preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), body_preview)
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => HttpFailure::Unauthorized(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => HttpFailure::Timeout(message),
        _ if status.is_client_error() => HttpFailure::Rejected(message),
        _ => HttpFailure::Transport(message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
