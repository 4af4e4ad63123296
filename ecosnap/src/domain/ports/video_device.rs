//! Driven port for the platform camera.
//!
//! Opening a device yields a [`VideoStream`] that the capture controller owns
//! exclusively until it calls [`VideoStream::close`].

use std::fmt;

use async_trait::async_trait;

use super::define_port_error;

/// Camera direction requested from the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacingMode {
    /// Rear camera.
    Environment,
    /// Front camera.
    User,
}

/// One camera configuration to try when opening the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfiguration {
    pub facing: Option<FacingMode>,
    pub ideal_width: Option<u32>,
    pub ideal_height: Option<u32>,
}

impl DeviceConfiguration {
    /// Accept whatever camera the platform offers.
    pub fn any() -> Self {
        Self {
            facing: None,
            ideal_width: None,
            ideal_height: None,
        }
    }

    /// Request a camera facing `facing` at any resolution.
    pub fn facing(facing: FacingMode) -> Self {
        Self {
            facing: Some(facing),
            ..Self::any()
        }
    }

    /// Set the preferred resolution.
    #[must_use]
    pub fn with_ideal_resolution(mut self, width: u32, height: u32) -> Self {
        self.ideal_width = Some(width);
        self.ideal_height = Some(height);
        self
    }

    /// Ordered fallback list from most to least preferred.
    ///
    /// Rear camera at 1920x1080, rear camera at any resolution, front camera,
    /// then any camera.
    pub fn fallback_chain() -> Vec<Self> {
        vec![
            Self::facing(FacingMode::Environment).with_ideal_resolution(1920, 1080),
            Self::facing(FacingMode::Environment),
            Self::facing(FacingMode::User),
            Self::any(),
        ]
    }
}

/// Decoded dimensions of the live stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameDimensions {
    pub width: u32,
    pub height: u32,
}

impl FrameDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether the stream has decoded at least one frame.
    pub fn is_decodable(self) -> bool {
        self.width > 0 && self.height > 0
    }
}

impl fmt::Display for FrameDimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Validation errors returned by [`RawFrame::new`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RawFrameValidationError {
    #[error("frame dimensions must be non-zero, got {dimensions}")]
    EmptyDimensions { dimensions: FrameDimensions },
    #[error("frame of {dimensions} needs {expected} RGB bytes, got {actual}")]
    LengthMismatch {
        dimensions: FrameDimensions,
        expected: usize,
        actual: usize,
    },
}

/// One still frame as packed 8-bit RGB.
#[derive(Clone, PartialEq, Eq)]
pub struct RawFrame {
    dimensions: FrameDimensions,
    pixels: Vec<u8>,
}

impl RawFrame {
    const BYTES_PER_PIXEL: usize = 3;

    /// Validate that `pixels` covers exactly `dimensions` in RGB8.
    pub fn new(
        dimensions: FrameDimensions,
        pixels: Vec<u8>,
    ) -> Result<Self, RawFrameValidationError> {
        if !dimensions.is_decodable() {
            return Err(RawFrameValidationError::EmptyDimensions { dimensions });
        }
        let expected = usize::try_from(dimensions.width)
            .ok()
            .zip(usize::try_from(dimensions.height).ok())
            .and_then(|(w, h)| w.checked_mul(h))
            .and_then(|area| area.checked_mul(Self::BYTES_PER_PIXEL))
            .unwrap_or(usize::MAX);
        if pixels.len() != expected {
            return Err(RawFrameValidationError::LengthMismatch {
                dimensions,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self { dimensions, pixels })
    }

    pub fn dimensions(&self) -> FrameDimensions {
        self.dimensions
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

impl fmt::Debug for RawFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawFrame")
            .field("dimensions", &self.dimensions)
            .field("pixels", &format_args!("{} bytes", self.pixels.len()))
            .finish()
    }
}

define_port_error! {
    /// Errors raised by video device adapters.
    pub enum VideoDeviceError {
        /// The user or platform denied camera access.
        PermissionDenied { message: String } =>
            "camera permission denied: {message}",
        /// No camera matches the requested configuration.
        NotFound { message: String } =>
            "no matching camera: {message}",
        /// The camera is held by another process.
        Busy { message: String } =>
            "camera busy: {message}",
        /// The stream failed after it was opened.
        Stream { message: String } =>
            "camera stream failed: {message}",
    }
}

/// Live camera stream owned by the capture controller.
pub trait VideoStream: Send + Sync {
    /// Current decoded dimensions; zero until the first frame decodes.
    fn frame_dimensions(&self) -> FrameDimensions;

    /// Whether the stream is still delivering frames.
    fn is_active(&self) -> bool;

    /// Grab the current frame.
    fn snapshot(&self) -> Result<RawFrame, VideoDeviceError>;

    /// Release the device. Calling it more than once is harmless.
    fn close(&mut self);
}

/// Port for opening the platform camera.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoDevice: Send + Sync {
    /// Open a stream for `configuration`.
    ///
    /// A failed attempt must not leave a partially acquired device behind.
    async fn open(
        &self,
        configuration: &DeviceConfiguration,
    ) -> Result<Box<dyn VideoStream>, VideoDeviceError>;
}

/// Fixture implementation for hosts without a camera.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureVideoDevice;

#[async_trait]
impl VideoDevice for FixtureVideoDevice {
    async fn open(
        &self,
        _configuration: &DeviceConfiguration,
    ) -> Result<Box<dyn VideoStream>, VideoDeviceError> {
        Err(VideoDeviceError::not_found("fixture device has no camera"))
    }
}
