//! User identity primitives.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum accepted length of a user identifier.
pub const USER_ID_MAX: usize = 128;

/// Validation errors returned by [`UserId::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyId,
    IdTooLong { max: usize },
    InvalidIdCharacters,
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "user id must not be empty"),
            Self::IdTooLong { max } => write!(f, "user id must be at most {max} characters"),
            Self::InvalidIdCharacters => write!(
                f,
                "user id may not contain whitespace, path separators, or control characters",
            ),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Stable user identifier issued by the session provider.
///
/// The identifier becomes the first segment of every storage path, so it is
/// restricted to a single path-safe segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Validate and construct a [`UserId`] from borrowed input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        Self::from_owned(id.as_ref().to_owned())
    }

    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    fn from_owned(id: String) -> Result<Self, UserValidationError> {
        if id.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if id.chars().count() > USER_ID_MAX {
            return Err(UserValidationError::IdTooLong { max: USER_ID_MAX });
        }
        let has_invalid = id
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || c == '/' || c == '\\');
        if has_invalid || id == "." || id == ".." {
            return Err(UserValidationError::InvalidIdCharacters);
        }
        Ok(Self(id))
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

#[cfg(test)]
mod tests {
    //! Tests for user identifier validation.

    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::uuid("3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    #[case::legacy("user-001")]
    fn accepts_path_safe_identifiers(#[case] raw: &str) {
        let id = UserId::new(raw).expect("identifier is valid");
        assert_eq!(id.as_ref(), raw);
    }

    #[rstest]
    #[case::empty("", UserValidationError::EmptyId)]
    #[case::slash("a/b", UserValidationError::InvalidIdCharacters)]
    #[case::backslash("a\\b", UserValidationError::InvalidIdCharacters)]
    #[case::space(" user", UserValidationError::InvalidIdCharacters)]
    #[case::parent("..", UserValidationError::InvalidIdCharacters)]
    fn rejects_unsafe_identifiers(#[case] raw: &str, #[case] expected: UserValidationError) {
        assert_eq!(UserId::new(raw), Err(expected));
    }

    #[rstest]
    fn rejects_overlong_identifiers() {
        let raw = "a".repeat(USER_ID_MAX + 1);
        assert_eq!(
            UserId::new(raw),
            Err(UserValidationError::IdTooLong { max: USER_ID_MAX })
        );
    }

    #[rstest]
    fn serde_round_trip_validates() {
        let parsed: Result<UserId, _> = serde_json::from_str("\"a/b\"");
        assert!(parsed.is_err());
    }
}
