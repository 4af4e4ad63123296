//! Runtime settings loaded via OrthoConfig.
//!
//! Every field is optional so a dry run needs no configuration at all;
//! accessors apply the defaults. Supabase values are validated only when a
//! caller asks for [`EcoSnapSettings::supabase_target`].

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::domain::{CaptureControllerConfig, LocationWatcherConfig};
use crate::outbound::jpeg::DEFAULT_JPEG_QUALITY;
use crate::outbound::supabase::SupabaseConfig;

const DEFAULT_IMAGE_BUCKET: &str = "eco-action-images";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LOCATION_TIMEOUT_SECS: u64 = 10;
const DEFAULT_FRAME_READY_TIMEOUT_MS: u64 = 5_000;

/// Invalid or incomplete settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("missing required setting {name}")]
    Missing { name: &'static str },
    #[error("supabase url is not a valid url: {url}: {message}")]
    InvalidUrl { url: String, message: String },
    #[error("supabase url must use https: {url}")]
    InsecureUrl { url: String },
}

/// Settings shared by the capture and submission components.
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "ECOSNAP")]
pub struct EcoSnapSettings {
    /// Supabase project URL.
    pub supabase_url: Option<String>,
    /// Public anon key for the Supabase project.
    pub supabase_anon_key: Option<String>,
    /// Storage bucket receiving captured images.
    pub image_bucket: Option<String>,
    /// Per-request timeout for Supabase calls.
    pub request_timeout_secs: Option<u64>,
    /// Longest wait for a single location fix.
    pub location_timeout_secs: Option<u64>,
    /// Longest wait for the first decodable camera frame.
    pub frame_ready_timeout_ms: Option<u64>,
    /// JPEG quality on the 1..=100 scale.
    pub jpeg_quality: Option<u8>,
}

impl EcoSnapSettings {
    pub fn image_bucket(&self) -> &str {
        self.image_bucket.as_deref().unwrap_or(DEFAULT_IMAGE_BUCKET)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    pub fn location_timeout(&self) -> Duration {
        Duration::from_secs(
            self.location_timeout_secs
                .unwrap_or(DEFAULT_LOCATION_TIMEOUT_SECS),
        )
    }

    pub fn frame_ready_timeout(&self) -> Duration {
        Duration::from_millis(
            self.frame_ready_timeout_ms
                .unwrap_or(DEFAULT_FRAME_READY_TIMEOUT_MS),
        )
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality.unwrap_or(DEFAULT_JPEG_QUALITY)
    }

    pub fn location_watcher_config(&self) -> LocationWatcherConfig {
        LocationWatcherConfig {
            fix_timeout: self.location_timeout(),
            ..LocationWatcherConfig::default()
        }
    }

    pub fn capture_controller_config(&self) -> CaptureControllerConfig {
        CaptureControllerConfig {
            frame_ready_timeout: self.frame_ready_timeout(),
            ..CaptureControllerConfig::default()
        }
    }

    /// Validated Supabase connection settings.
    ///
    /// # Errors
    ///
    /// Fails when the URL or anon key is missing or blank, when the URL does
    /// not parse, or when it does not use `https`.
    pub fn supabase_target(&self) -> Result<SupabaseConfig, SettingsError> {
        let raw_url = required(self.supabase_url.as_deref(), "supabase_url")?;
        let anon_key = required(self.supabase_anon_key.as_deref(), "supabase_anon_key")?;
        let url = Url::parse(raw_url).map_err(|err| SettingsError::InvalidUrl {
            url: raw_url.to_owned(),
            message: err.to_string(),
        })?;
        if url.scheme() != "https" {
            return Err(SettingsError::InsecureUrl {
                url: raw_url.to_owned(),
            });
        }
        Ok(SupabaseConfig {
            url,
            anon_key: anon_key.to_owned(),
            bucket: self.image_bucket().to_owned(),
            timeout: self.request_timeout(),
        })
    }
}

fn required<'a>(value: Option<&'a str>, name: &'static str) -> Result<&'a str, SettingsError> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(SettingsError::Missing { name })
}
