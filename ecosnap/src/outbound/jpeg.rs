//! JPEG frame encoder backed by the `image` crate.

use image::ExtendedColorType;
use image::codecs::jpeg::JpegEncoder;

use crate::domain::DEFAULT_CONTENT_TYPE;
use crate::domain::ports::{FrameEncoder, FrameEncoderError, RawFrame};

/// Default JPEG quality on the 1..=100 scale.
pub const DEFAULT_JPEG_QUALITY: u8 = 70;

/// Encodes RGB frames as baseline JPEG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegFrameEncoder {
    quality: u8,
}

impl JpegFrameEncoder {
    /// Build an encoder, clamping `quality` into 1..=100.
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }
}

impl Default for JpegFrameEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}

impl FrameEncoder for JpegFrameEncoder {
    fn encode(&self, frame: &RawFrame) -> Result<Vec<u8>, FrameEncoderError> {
        let dimensions = frame.dimensions();
        let mut buffer = Vec::new();
        JpegEncoder::new_with_quality(&mut buffer, self.quality)
            .encode(
                frame.pixels(),
                dimensions.width,
                dimensions.height,
                ExtendedColorType::Rgb8,
            )
            .map_err(|err| FrameEncoderError::encode(err.to_string()))?;
        Ok(buffer)
    }

    fn content_type(&self) -> &'static str {
        DEFAULT_CONTENT_TYPE
    }
}
