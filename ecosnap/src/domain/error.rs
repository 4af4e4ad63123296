//! Domain-level error types.
//!
//! These errors are transport agnostic. Callers (presentation shells, the
//! submit binary) map them to whatever surface they expose. The [`ErrorCode`]
//! identifies the failing stage so a caller can decide what to retry.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stable machine-readable error code describing the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Input is malformed or fails validation.
    InvalidRequest,
    /// No identity is available, or the session has expired.
    Unauthenticated,
    /// Every device configuration in the fallback list failed to open.
    DeviceUnavailable,
    /// The video stream has not produced a decodable frame, or capture was
    /// requested outside the `Ready` state.
    FrameNotReady,
    /// Frame encoding produced no output.
    EncodeFailed,
    /// The image upload to durable storage failed.
    UploadFailed,
    /// The action record insert failed after a successful upload.
    RecordInsertFailed,
    /// Reading the caller's streak record failed.
    StreakFetchFailed,
    /// Writing the caller's streak record failed.
    StreakUpdateFailed,
    /// The platform denied location permission.
    LocationDenied,
    /// The platform could not determine a position.
    LocationUnavailable,
    /// A location attempt exceeded its bounded wait.
    LocationTimeout,
    /// An unexpected error occurred inside the domain.
    InternalError,
}

/// Validation errors emitted by the constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorValidationError {
    EmptyMessage,
}

impl std::fmt::Display for ErrorValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyMessage => write!(f, "error message must not be empty"),
        }
    }
}

impl std::error::Error for ErrorValidationError {}

/// Domain error payload.
///
/// ## Invariants
/// - `message` must be non-empty once trimmed of whitespace.
///
/// # Examples
/// ```
/// use ecosnap::domain::{Error, ErrorCode};
///
/// let err = Error::upload_failed("bucket offline");
/// assert_eq!(err.code(), ErrorCode::UploadFailed);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(try_from = "ErrorDto", into = "ErrorDto")]
pub struct Error {
    code: ErrorCode,
    message: String,
    details: Option<Value>,
}

impl Error {
    /// Create a new error, panicking if validation fails.
    ///
    /// # Panics
    ///
    /// Panics when `message` is blank. Use [`Error::try_new`] for untrusted
    /// input.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        match Self::try_new(code, message) {
            Ok(value) => value,
            Err(err) => panic!("error messages must satisfy validation: {err}"),
        }
    }

    /// Fallible constructor that validates the message content.
    pub fn try_new(
        code: ErrorCode,
        message: impl Into<String>,
    ) -> Result<Self, ErrorValidationError> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(ErrorValidationError::EmptyMessage);
        }
        Ok(Self {
            code,
            message,
            details: None,
        })
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message, including the underlying cause when one exists.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Supplementary error details.
    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Attach structured details to the error.
    ///
    /// # Examples
    /// ```
    /// use ecosnap::domain::Error;
    /// use serde_json::json;
    ///
    /// let err = Error::record_insert_failed("duplicate key")
    ///     .with_details(json!({ "storagePath": "u1/1700000000000.jpg" }));
    /// assert!(err.details().is_some());
    /// ```
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Whether the failure came from the location subsystem.
    ///
    /// Location failures never abort a capture; callers use this to decide
    /// whether an error is advisory.
    pub fn is_location_error(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::LocationDenied | ErrorCode::LocationUnavailable | ErrorCode::LocationTimeout
        )
    }

    /// Convenience constructor for [`ErrorCode::InvalidRequest`].
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// Convenience constructor for [`ErrorCode::Unauthenticated`].
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthenticated, message)
    }

    /// Convenience constructor for [`ErrorCode::DeviceUnavailable`].
    pub fn device_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DeviceUnavailable, message)
    }

    /// Convenience constructor for [`ErrorCode::FrameNotReady`].
    pub fn frame_not_ready(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::FrameNotReady, message)
    }

    /// Convenience constructor for [`ErrorCode::EncodeFailed`].
    pub fn encode_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::EncodeFailed, message)
    }

    /// Convenience constructor for [`ErrorCode::UploadFailed`].
    pub fn upload_failed(cause: impl Into<String>) -> Self {
        Self::new(ErrorCode::UploadFailed, cause)
    }

    /// Convenience constructor for [`ErrorCode::RecordInsertFailed`].
    pub fn record_insert_failed(cause: impl Into<String>) -> Self {
        Self::new(ErrorCode::RecordInsertFailed, cause)
    }

    /// Convenience constructor for [`ErrorCode::StreakFetchFailed`].
    pub fn streak_fetch_failed(cause: impl Into<String>) -> Self {
        Self::new(ErrorCode::StreakFetchFailed, cause)
    }

    /// Convenience constructor for [`ErrorCode::StreakUpdateFailed`].
    pub fn streak_update_failed(cause: impl Into<String>) -> Self {
        Self::new(ErrorCode::StreakUpdateFailed, cause)
    }

    /// Convenience constructor for [`ErrorCode::LocationDenied`].
    pub fn location_denied(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::LocationDenied, message)
    }

    /// Convenience constructor for [`ErrorCode::LocationUnavailable`].
    pub fn location_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::LocationUnavailable, message)
    }

    /// Convenience constructor for [`ErrorCode::LocationTimeout`].
    pub fn location_timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::LocationTimeout, message)
    }

    /// Convenience constructor for [`ErrorCode::InternalError`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDto {
    code: ErrorCode,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl From<Error> for ErrorDto {
    fn from(value: Error) -> Self {
        Self {
            code: value.code,
            message: value.message,
            details: value.details,
        }
    }
}

impl TryFrom<ErrorDto> for Error {
    type Error = ErrorValidationError;

    fn try_from(value: ErrorDto) -> Result<Self, Self::Error> {
        let ErrorDto {
            code,
            message,
            details,
        } = value;

        let mut error = Error::try_new(code, message)?;
        error.details = details;
        Ok(error)
    }
}
