//! Camera lifecycle and photo capture.
//!
//! The controller opens the camera through an ordered list of device
//! configurations, waits for the first decodable frame, and pairs every
//! captured frame with the location fix locked at the instant of capture.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use mockable::Clock;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::domain::ports::{
    DeviceConfiguration, FrameDimensions, FrameEncoder, RawFrame, VideoDevice, VideoDeviceError,
    VideoStream,
};
use crate::domain::{CAPTURED_FILE_NAME, Error, GeoFix, ImagePayload, LocationWatcher};

/// Controller tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureControllerConfig {
    /// Configurations tried in order until one opens.
    pub device_fallbacks: Vec<DeviceConfiguration>,
    /// Longest wait for the first decodable frame after opening.
    pub frame_ready_timeout: Duration,
    /// Delay between readiness polls.
    pub frame_poll_interval: Duration,
}

impl Default for CaptureControllerConfig {
    fn default() -> Self {
        Self {
            device_fallbacks: DeviceConfiguration::fallback_chain(),
            frame_ready_timeout: Duration::from_secs(5),
            frame_poll_interval: Duration::from_millis(50),
        }
    }
}

/// Controller lifecycle.
///
/// `Failed` is not terminal; [`CaptureController::initialize`] may be called
/// again to retry.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureState {
    Uninitialized,
    RequestingDevice,
    Ready,
    Capturing,
    Failed(Error),
}

impl CaptureState {
    fn label(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::RequestingDevice => "requesting_device",
            Self::Ready => "ready",
            Self::Capturing => "capturing",
            Self::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Photo paired with the fix locked when it was taken.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedAction {
    pub image: ImagePayload,
    pub fix: Option<GeoFix>,
}

/// Ports the controller drives.
pub struct CaptureControllerPorts {
    pub device: Arc<dyn VideoDevice>,
    pub encoder: Arc<dyn FrameEncoder>,
    pub watcher: Arc<LocationWatcher>,
}

impl CaptureControllerPorts {
    pub fn new(
        device: Arc<dyn VideoDevice>,
        encoder: Arc<dyn FrameEncoder>,
        watcher: Arc<LocationWatcher>,
    ) -> Self {
        Self {
            device,
            encoder,
            watcher,
        }
    }
}

/// Owner of the camera stream for one capture screen.
///
/// The stream is released on [`CaptureController::dispose`] and on drop,
/// whatever the current state.
pub struct CaptureController {
    device: Arc<dyn VideoDevice>,
    encoder: Arc<dyn FrameEncoder>,
    watcher: Arc<LocationWatcher>,
    clock: Arc<dyn Clock>,
    config: CaptureControllerConfig,
    state: CaptureState,
    stream: Option<Box<dyn VideoStream>>,
}

impl CaptureController {
    pub fn new(
        ports: CaptureControllerPorts,
        clock: Arc<dyn Clock>,
        config: CaptureControllerConfig,
    ) -> Self {
        Self {
            device: ports.device,
            encoder: ports.encoder,
            watcher: ports.watcher,
            clock,
            config,
            state: CaptureState::Uninitialized,
            stream: None,
        }
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    /// Location watcher paired with this controller.
    pub fn watcher(&self) -> &LocationWatcher {
        &self.watcher
    }

    /// Open the camera and start location updates.
    ///
    /// Valid from `Uninitialized` and `Failed`; a ready controller returns
    /// immediately. Each configuration is tried in order. The controller is
    /// `Ready` only once the stream has delivered a frame with non-zero
    /// dimensions.
    pub async fn initialize(&mut self) -> Result<(), Error> {
        if self.state == CaptureState::Ready {
            return Ok(());
        }
        self.release_stream();
        self.state = CaptureState::RequestingDevice;
        self.watcher.start();

        match self.open_stream().await {
            Ok((stream, dimensions)) => {
                info!(%dimensions, "camera ready");
                self.stream = Some(stream);
                self.state = CaptureState::Ready;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "camera initialisation failed");
                self.state = CaptureState::Failed(err.clone());
                Err(err)
            }
        }
    }

    /// Take a photo and pair it with the fix locked at this instant.
    ///
    /// Outside `Ready` this fails with `FrameNotReady` and touches nothing.
    /// A failed read or encode unlocks the watcher again and leaves the
    /// controller `Ready`; a stream that died mid-capture moves it to
    /// `Failed`.
    pub async fn capture(&mut self) -> Result<CapturedAction, Error> {
        if self.state != CaptureState::Ready {
            return Err(Error::frame_not_ready(format!(
                "capture requested while {}",
                self.state
            )));
        }
        let Some(stream) = self.stream.as_ref() else {
            return Err(Error::frame_not_ready("no open camera stream"));
        };
        if !stream.frame_dimensions().is_decodable() {
            return Err(Error::frame_not_ready("camera has no decodable frame"));
        }

        let captured_at = self.clock.utc().timestamp_millis();
        let fix = self.watcher.lock();

        let frame = match stream.snapshot() {
            Ok(frame) => frame,
            Err(err) => return Err(self.abandon_read(&err)),
        };

        self.state = CaptureState::Capturing;
        let encoded = self.encode(frame).await;
        self.state = CaptureState::Ready;

        let image = encoded.and_then(|bytes| {
            ImagePayload::from_file_name(
                bytes,
                CAPTURED_FILE_NAME,
                self.encoder.content_type(),
                captured_at,
            )
            .map_err(|err| Error::encode_failed(err.to_string()))
        });
        match image {
            Ok(image) => {
                debug!(bytes = image.bytes().len(), has_fix = fix.is_some(), "photo captured");
                Ok(CapturedAction { image, fix })
            }
            Err(err) => {
                warn!(error = %err, "photo encoding failed");
                self.watcher.unlock();
                Err(err)
            }
        }
    }

    /// Resume live location updates after a capture.
    pub fn resume_location(&self) {
        self.watcher.start();
    }

    /// Release the camera and stop location updates.
    pub fn dispose(&mut self) {
        self.release_stream();
        self.watcher.stop();
        self.state = CaptureState::Uninitialized;
    }

    async fn open_stream(&self) -> Result<(Box<dyn VideoStream>, FrameDimensions), Error> {
        let mut last_failure: Option<String> = None;
        for (attempt, configuration) in self.config.device_fallbacks.iter().enumerate() {
            let mut stream = match self.device.open(configuration).await {
                Ok(stream) => stream,
                Err(err) => {
                    debug!(attempt, ?configuration, error = %err, "camera configuration rejected");
                    last_failure = Some(err.to_string());
                    continue;
                }
            };
            // A stream that never yields a frame counts as a failed attempt.
            match self.await_first_frame(stream.as_mut()).await {
                Ok(dimensions) => {
                    debug!(attempt, ?configuration, "camera configuration accepted");
                    return Ok((stream, dimensions));
                }
                Err(err) => {
                    debug!(
                        attempt,
                        ?configuration,
                        error = %err,
                        "camera configuration produced no frame"
                    );
                    last_failure = Some(err.to_string());
                }
            }
        }
        Err(match last_failure {
            Some(reason) => Error::device_unavailable(reason),
            None => Error::device_unavailable("no camera configurations to try"),
        })
    }

    async fn await_first_frame(
        &self,
        stream: &mut dyn VideoStream,
    ) -> Result<FrameDimensions, Error> {
        let poll_interval = self.config.frame_poll_interval;
        let polled = timeout(
            self.config.frame_ready_timeout,
            poll_until_decodable(&*stream, poll_interval),
        )
        .await;
        match polled {
            Ok(Ok(dimensions)) => Ok(dimensions),
            Ok(Err(err)) => {
                stream.close();
                Err(err)
            }
            Err(_elapsed) => {
                stream.close();
                Err(Error::frame_not_ready(format!(
                    "camera produced no decodable frame within {}ms",
                    self.config.frame_ready_timeout.as_millis()
                )))
            }
        }
    }

    async fn encode(&self, frame: RawFrame) -> Result<Vec<u8>, Error> {
        let encoder = Arc::clone(&self.encoder);
        let bytes = tokio::task::spawn_blocking(move || encoder.encode(&frame))
            .await
            .map_err(|err| Error::encode_failed(format!("encoder task failed: {err}")))?
            .map_err(|err| Error::encode_failed(err.to_string()))?;
        if bytes.is_empty() {
            return Err(Error::encode_failed("encoder produced no output"));
        }
        Ok(bytes)
    }

    fn abandon_read(&mut self, err: &VideoDeviceError) -> Error {
        self.watcher.unlock();
        let stream_alive = self.stream.as_ref().is_some_and(|stream| stream.is_active());
        if stream_alive {
            warn!(error = %err, "camera frame read failed");
            return Error::frame_not_ready(format!("could not read camera frame: {err}"));
        }
        warn!(error = %err, "camera stream ended during capture");
        self.release_stream();
        let failure = Error::device_unavailable(format!("camera stream ended: {err}"));
        self.state = CaptureState::Failed(failure.clone());
        failure
    }

    fn release_stream(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.close();
            debug!("camera released");
        }
    }
}

impl Drop for CaptureController {
    fn drop(&mut self) {
        self.release_stream();
        self.watcher.stop();
    }
}

async fn poll_until_decodable(
    stream: &dyn VideoStream,
    poll_interval: Duration,
) -> Result<FrameDimensions, Error> {
    loop {
        if !stream.is_active() {
            return Err(Error::device_unavailable(
                "camera stream ended before the first frame",
            ));
        }
        let dimensions = stream.frame_dimensions();
        if dimensions.is_decodable() {
            return Ok(dimensions);
        }
        tokio::time::sleep(poll_interval).await;
    }
}

#[cfg(test)]
#[path = "capture_controller_tests.rs"]
mod tests;
