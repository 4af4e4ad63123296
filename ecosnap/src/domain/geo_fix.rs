//! Geographic fix value type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Accuracy radius (metres) below which a fix is classed as high accuracy.
pub const HIGH_ACCURACY_METERS: f64 = 20.0;
/// Accuracy radius (metres) below which a fix is classed as medium accuracy.
pub const MEDIUM_ACCURACY_METERS: f64 = 50.0;

/// Validation errors returned by [`GeoFix::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoFixValidationError {
    NonFiniteValue,
    LatitudeOutOfRange,
    LongitudeOutOfRange,
    NegativeAccuracy,
}

impl fmt::Display for GeoFixValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFiniteValue => write!(f, "fix values must be finite"),
            Self::LatitudeOutOfRange => write!(f, "latitude must be within [-90, 90]"),
            Self::LongitudeOutOfRange => write!(f, "longitude must be within [-180, 180]"),
            Self::NegativeAccuracy => write!(f, "accuracy must not be negative"),
        }
    }
}

impl std::error::Error for GeoFixValidationError {}

/// Best-effort accuracy bucket for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccuracyClass {
    /// Radius under 20 m.
    High,
    /// Radius under 50 m.
    Medium,
    /// Anything else.
    Low,
}

impl AccuracyClass {
    /// Classify an accuracy radius in metres.
    ///
    /// # Examples
    /// ```
    /// use ecosnap::domain::AccuracyClass;
    ///
    /// assert_eq!(AccuracyClass::from_meters(15.0), AccuracyClass::High);
    /// assert_eq!(AccuracyClass::from_meters(20.0), AccuracyClass::Medium);
    /// assert_eq!(AccuracyClass::from_meters(120.0), AccuracyClass::Low);
    /// ```
    pub fn from_meters(accuracy_meters: f64) -> Self {
        if accuracy_meters < HIGH_ACCURACY_METERS {
            Self::High
        } else if accuracy_meters < MEDIUM_ACCURACY_METERS {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// A single coordinate reading with accuracy and timestamp.
///
/// ## Invariants
/// - All values are finite.
/// - Latitude lies in `[-90, 90]` and longitude in `[-180, 180]` (WGS84).
/// - Accuracy is non-negative.
///
/// The type is `Copy`; handing a fix to another component always copies it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoFix {
    latitude: f64,
    longitude: f64,
    accuracy_meters: f64,
    captured_at_epoch_ms: i64,
}

impl GeoFix {
    /// Validate and build a fix.
    ///
    /// # Examples
    /// ```
    /// use ecosnap::domain::GeoFix;
    ///
    /// let fix = GeoFix::new(37.78, -122.41, 15.0, 1_700_000_000_000)?;
    /// assert_eq!(fix.latitude(), 37.78);
    /// # Ok::<(), ecosnap::domain::GeoFixValidationError>(())
    /// ```
    pub fn new(
        latitude: f64,
        longitude: f64,
        accuracy_meters: f64,
        captured_at_epoch_ms: i64,
    ) -> Result<Self, GeoFixValidationError> {
        if !(latitude.is_finite() && longitude.is_finite() && accuracy_meters.is_finite()) {
            return Err(GeoFixValidationError::NonFiniteValue);
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoFixValidationError::LatitudeOutOfRange);
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoFixValidationError::LongitudeOutOfRange);
        }
        if accuracy_meters < 0.0 {
            return Err(GeoFixValidationError::NegativeAccuracy);
        }
        Ok(Self {
            latitude,
            longitude,
            accuracy_meters,
            captured_at_epoch_ms,
        })
    }

    /// Latitude in degrees.
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees.
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Accuracy radius in metres.
    pub fn accuracy_meters(&self) -> f64 {
        self.accuracy_meters
    }

    /// Instant the platform produced the reading, in epoch milliseconds.
    pub fn captured_at_epoch_ms(&self) -> i64 {
        self.captured_at_epoch_ms
    }

    /// Accuracy bucket for presentation.
    pub fn accuracy_class(&self) -> AccuracyClass {
        AccuracyClass::from_meters(self.accuracy_meters)
    }
}
