//! Driven port for encoding still frames.

use super::define_port_error;
use super::video_device::RawFrame;

define_port_error! {
    /// Errors raised by frame encoders.
    pub enum FrameEncoderError {
        /// The codec failed to produce output.
        Encode { message: String } =>
            "frame encoding failed: {message}",
    }
}

/// Port for compressing a raw frame into an uploadable image.
///
/// Encoding is CPU bound and synchronous; callers move it off the async
/// executor.
#[cfg_attr(test, mockall::automock)]
pub trait FrameEncoder: Send + Sync {
    /// Encode `frame`. An empty buffer counts as a failure.
    fn encode(&self, frame: &RawFrame) -> Result<Vec<u8>, FrameEncoderError>;

    /// MIME type of the encoded output.
    fn content_type(&self) -> &'static str;
}
