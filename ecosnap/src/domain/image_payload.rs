//! Captured image payload.

use std::fmt;
use std::sync::Arc;

use super::UserId;

/// Content type assumed when a capture does not declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";
/// Extension assumed when a capture does not declare a usable one.
pub const DEFAULT_EXTENSION: &str = "jpg";
/// File name given to frames captured from the video device.
pub const CAPTURED_FILE_NAME: &str = "photo.jpg";

const EXTENSION_MAX: usize = 8;

/// Validation errors returned by [`ImagePayload::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImagePayloadValidationError {
    EmptyImage,
}

impl fmt::Display for ImagePayloadValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyImage => write!(f, "image payload must not be empty"),
        }
    }
}

impl std::error::Error for ImagePayloadValidationError {}

/// Encoded image bytes with their declared content type and extension.
///
/// ## Invariants
/// - The byte buffer is non-empty and never mutated after creation.
/// - `extension` is a short lowercase ASCII alphanumeric token.
#[derive(Clone, PartialEq, Eq)]
pub struct ImagePayload {
    bytes: Arc<[u8]>,
    content_type: String,
    extension: String,
    captured_at_epoch_ms: i64,
}

impl ImagePayload {
    /// Build a payload, substituting defaults for a blank content type or an
    /// unusable extension.
    pub fn new(
        bytes: impl Into<Arc<[u8]>>,
        content_type: &str,
        extension: &str,
        captured_at_epoch_ms: i64,
    ) -> Result<Self, ImagePayloadValidationError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(ImagePayloadValidationError::EmptyImage);
        }
        Ok(Self {
            bytes,
            content_type: normalise_content_type(content_type),
            extension: normalise_extension(extension),
            captured_at_epoch_ms,
        })
    }

    /// Build a payload deriving the extension from a file name.
    ///
    /// # Examples
    /// ```
    /// use ecosnap::domain::ImagePayload;
    ///
    /// let payload = ImagePayload::from_file_name(vec![1_u8, 2, 3], "Beach.PNG", "", 42)?;
    /// assert_eq!(payload.extension(), "png");
    /// assert_eq!(payload.content_type(), "image/jpeg");
    /// # Ok::<(), ecosnap::domain::ImagePayloadValidationError>(())
    /// ```
    pub fn from_file_name(
        bytes: impl Into<Arc<[u8]>>,
        file_name: &str,
        content_type: &str,
        captured_at_epoch_ms: i64,
    ) -> Result<Self, ImagePayloadValidationError> {
        let extension = file_name
            .rsplit_once('.')
            .map_or("", |(_, extension)| extension);
        Self::new(bytes, content_type, extension, captured_at_epoch_ms)
    }

    /// Encoded image bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Declared MIME type.
    pub fn content_type(&self) -> &str {
        self.content_type.as_str()
    }

    /// File extension used in the storage path.
    pub fn extension(&self) -> &str {
        self.extension.as_str()
    }

    /// Capture instant in epoch milliseconds.
    pub fn captured_at_epoch_ms(&self) -> i64 {
        self.captured_at_epoch_ms
    }

    /// Storage path `{userId}/{captureEpochMs}.{ext}` for this payload.
    pub fn storage_path(&self, user_id: &UserId) -> String {
        format!(
            "{user_id}/{millis}.{ext}",
            millis = self.captured_at_epoch_ms,
            ext = self.extension
        )
    }
}

impl fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImagePayload")
            .field("len", &self.bytes.len())
            .field("content_type", &self.content_type)
            .field("extension", &self.extension)
            .field("captured_at_epoch_ms", &self.captured_at_epoch_ms)
            .finish()
    }
}

fn normalise_content_type(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        DEFAULT_CONTENT_TYPE.to_owned()
    } else {
        trimmed.to_owned()
    }
}

fn normalise_extension(raw: &str) -> String {
    let candidate = raw.trim().trim_start_matches('.').to_ascii_lowercase();
    let usable = !candidate.is_empty()
        && candidate.len() <= EXTENSION_MAX
        && candidate.chars().all(|c| c.is_ascii_alphanumeric());
    if usable {
        candidate
    } else {
        DEFAULT_EXTENSION.to_owned()
    }
}
