//! Fake camera and encoders for capture tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::ports::{
    DeviceConfiguration, FrameDimensions, FrameEncoder, FrameEncoderError, RawFrame, VideoDevice,
    VideoDeviceError, VideoStream,
};

/// Shared view of one fake stream, kept by the test after the controller
/// takes ownership of the stream itself.
#[derive(Debug)]
pub struct FakeStreamHandle {
    dimensions: FrameDimensions,
    polls_until_ready: AtomicUsize,
    closed: AtomicBool,
    close_calls: AtomicUsize,
    snapshots: AtomicUsize,
    fail_snapshots: AtomicBool,
    ended: AtomicBool,
}

impl FakeStreamHandle {
    /// Stream that reports `width`x`height` from the first poll.
    pub fn ready(width: u32, height: u32) -> Arc<Self> {
        Self::ready_after(0, width, height)
    }

    /// Stream that reports zero dimensions for `polls` polls first.
    pub fn ready_after(polls: usize, width: u32, height: u32) -> Arc<Self> {
        Arc::new(Self {
            dimensions: FrameDimensions::new(width, height),
            polls_until_ready: AtomicUsize::new(polls),
            closed: AtomicBool::new(false),
            close_calls: AtomicUsize::new(0),
            snapshots: AtomicUsize::new(0),
            fail_snapshots: AtomicBool::new(false),
            ended: AtomicBool::new(false),
        })
    }

    /// Stream that never decodes a frame.
    pub fn never_ready() -> Arc<Self> {
        Self::ready_after(usize::MAX, 0, 0)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    pub fn snapshots(&self) -> usize {
        self.snapshots.load(Ordering::SeqCst)
    }

    pub fn fail_snapshots(&self) {
        self.fail_snapshots.store(true, Ordering::SeqCst);
    }

    /// Simulate the platform ending the stream.
    pub fn end(&self) {
        self.ended.store(true, Ordering::SeqCst);
    }

    fn poll_dimensions(&self) -> FrameDimensions {
        let remaining = self.polls_until_ready.load(Ordering::SeqCst);
        if remaining > 0 {
            if remaining != usize::MAX {
                self.polls_until_ready.store(remaining - 1, Ordering::SeqCst);
            }
            return FrameDimensions::default();
        }
        self.dimensions
    }
}

struct FakeStream(Arc<FakeStreamHandle>);

impl VideoStream for FakeStream {
    fn frame_dimensions(&self) -> FrameDimensions {
        if self.0.is_closed() {
            return FrameDimensions::default();
        }
        self.0.poll_dimensions()
    }

    fn is_active(&self) -> bool {
        !self.0.is_closed() && !self.0.ended.load(Ordering::SeqCst)
    }

    fn snapshot(&self) -> Result<RawFrame, VideoDeviceError> {
        self.0.snapshots.fetch_add(1, Ordering::SeqCst);
        if !self.is_active() {
            return Err(VideoDeviceError::stream("stream closed"));
        }
        if self.0.fail_snapshots.load(Ordering::SeqCst) {
            return Err(VideoDeviceError::stream("snapshot failed"));
        }
        let dimensions = self.0.dimensions;
        let len = (dimensions.width as usize) * (dimensions.height as usize) * 3;
        let pixels = (0..len).map(|i| (i % 251) as u8).collect();
        RawFrame::new(dimensions, pixels).map_err(|err| VideoDeviceError::stream(err.to_string()))
    }

    fn close(&mut self) {
        self.0.close_calls.fetch_add(1, Ordering::SeqCst);
        self.0.closed.store(true, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct DeviceScript {
    outcomes: VecDeque<Result<Arc<FakeStreamHandle>, VideoDeviceError>>,
    attempts: Vec<DeviceConfiguration>,
    opened: Vec<Arc<FakeStreamHandle>>,
}

/// Camera that answers open attempts from a queue. An exhausted queue
/// answers `NotFound`.
#[derive(Default)]
pub struct FakeVideoDevice(Mutex<DeviceScript>);

impl FakeVideoDevice {
    pub fn with_outcomes(
        outcomes: impl IntoIterator<Item = Result<Arc<FakeStreamHandle>, VideoDeviceError>>,
    ) -> Self {
        let device = Self::default();
        device.lock_script().outcomes.extend(outcomes);
        device
    }

    /// Queue another open outcome.
    pub fn push_outcome(&self, outcome: Result<Arc<FakeStreamHandle>, VideoDeviceError>) {
        self.lock_script().outcomes.push_back(outcome);
    }

    /// Configurations passed to `open`, in order.
    pub fn attempts(&self) -> Vec<DeviceConfiguration> {
        self.lock_script().attempts.clone()
    }

    /// Handles for every stream handed out, in order.
    pub fn opened(&self) -> Vec<Arc<FakeStreamHandle>> {
        self.lock_script().opened.clone()
    }

    fn lock_script(&self) -> std::sync::MutexGuard<'_, DeviceScript> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("device script mutex"),
        }
    }
}

#[async_trait]
impl VideoDevice for FakeVideoDevice {
    async fn open(
        &self,
        configuration: &DeviceConfiguration,
    ) -> Result<Box<dyn VideoStream>, VideoDeviceError> {
        let mut script = self.lock_script();
        script.attempts.push(configuration.clone());
        let outcome = script
            .outcomes
            .pop_front()
            .unwrap_or_else(|| Err(VideoDeviceError::not_found("no scripted camera")));
        let handle = outcome?;
        script.opened.push(Arc::clone(&handle));
        Ok(Box::new(FakeStream(handle)))
    }
}

/// Encoder returning fixed bytes; empty bytes model a codec with no output.
#[derive(Debug, Clone)]
pub struct StaticFrameEncoder {
    output: Vec<u8>,
    calls: Arc<AtomicUsize>,
}

impl StaticFrameEncoder {
    pub fn new(output: impl Into<Vec<u8>>) -> Self {
        Self {
            output: output.into(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FrameEncoder for StaticFrameEncoder {
    fn encode(&self, _frame: &RawFrame) -> Result<Vec<u8>, FrameEncoderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.output.clone())
    }

    fn content_type(&self) -> &'static str {
        "image/jpeg"
    }
}

/// Encoder that always fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingFrameEncoder;

impl FrameEncoder for FailingFrameEncoder {
    fn encode(&self, _frame: &RawFrame) -> Result<Vec<u8>, FrameEncoderError> {
        Err(FrameEncoderError::encode("codec unavailable"))
    }

    fn content_type(&self) -> &'static str {
        "image/jpeg"
    }
}
