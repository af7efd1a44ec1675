//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for all hardware and network traits,
//! enabling development and testing on desktop without the camera board.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockFrameProvider`] | [`FrameProvider`] | Fixed frame or no frame, counts acquire/release |
//! | [`MockTrigger`] | [`TriggerInput`] | Queued samples and a held level |
//! | [`MockIndicator`] | [`StatusIndicator`] | Records LED transitions |
//! | [`MockDelay`] | [`Delay`] | Records delays without sleeping |
//! | [`MockClock`] | [`Clock`] | Monotonic time that advances per read |
//! | [`MockTime`] | [`TimeSource`] | Settable wall-clock time |
//! | [`MockDisplay`] | [`StatusDisplay`] | Records frames and messages |
//! | [`MockConnectivity`] | [`Connectivity`] | Reachable or not |
//! | [`MockSocket`] | [`SocketTransport`] | Queued events, captured sends |
//! | [`MockUploader`] | [`UploadTransport`] | Canned status or no response |
//!
//! # Example
//!
//! ```rust
//! use snapcam::{
//!     CapturePipeline, ConnectionState, PipelineConfig, PipelineOutcome, StatusRenderer,
//! };
//! use snapcam::hal::*;
//!
//! let mut pipeline = CapturePipeline::new(
//!     MockFrameProvider::failing(),
//!     MockUploader::responding(200),
//!     MockIndicator::new(),
//!     MockDelay::new(),
//!     PipelineConfig::new("http://server/api/upload"),
//! );
//! let mut renderer = StatusRenderer::new(MockDisplay::new(), MockTime::unset(), 1000);
//! let mut state = ConnectionState::new();
//!
//! assert_eq!(pipeline.run(&mut state, &mut renderer), PipelineOutcome::CaptureFailed);
//! assert!(pipeline.uploader().requests.is_empty());
//! ```
//!
//! [`FrameProvider`]: crate::traits::FrameProvider
//! [`TriggerInput`]: crate::traits::TriggerInput
//! [`StatusIndicator`]: crate::traits::StatusIndicator
//! [`Delay`]: crate::traits::Delay
//! [`Clock`]: crate::traits::Clock
//! [`TimeSource`]: crate::traits::TimeSource
//! [`StatusDisplay`]: crate::traits::StatusDisplay
//! [`Connectivity`]: crate::traits::Connectivity
//! [`SocketTransport`]: crate::traits::SocketTransport
//! [`UploadTransport`]: crate::traits::UploadTransport

extern crate alloc;
use alloc::collections::VecDeque;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::Cell;

use crate::status::StatusLines;
use crate::traits::{
    ChannelEvent, Clock, ClockTime, Connectivity, Delay, Endpoint, FrameProvider,
    SocketTransport, StatusDisplay, StatusIndicator, TimeSource, TriggerInput, UploadTransport,
};

// ============================================================================
// Hardware Mocks
// ============================================================================

/// Frame handed out by [`MockFrameProvider`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MockFrame(Vec<u8>);

impl AsRef<[u8]> for MockFrame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Mock image sensor.
///
/// Hands out a copy of a fixed image, or nothing when failing. Counts
/// acquisitions and releases so tests can check the release discipline.
///
/// # Example
///
/// ```rust
/// use snapcam::hal::MockFrameProvider;
/// use snapcam::traits::{FrameGuard, FrameProvider};
///
/// let mut camera = MockFrameProvider::with_frame(vec![0xFF, 0xD8]);
/// let frame = camera.acquire().unwrap();
/// {
///     let guard = FrameGuard::new(&mut camera, frame);
///     assert_eq!(guard.bytes(), &[0xFF, 0xD8]);
/// }
/// assert_eq!(camera.released, 1);
/// assert_eq!(camera.outstanding(), 0);
/// ```
#[derive(Debug, Default)]
pub struct MockFrameProvider {
    /// Image returned by `acquire`; `None` makes every acquire fail.
    pub image: Option<Vec<u8>>,
    /// Number of `acquire` calls.
    pub acquire_calls: u32,
    /// Number of frames handed out.
    pub acquired: u32,
    /// Number of frames returned.
    pub released: u32,
}

impl MockFrameProvider {
    /// Creates a sensor that always delivers `image`.
    pub fn with_frame(image: Vec<u8>) -> Self {
        Self {
            image: Some(image),
            ..Self::default()
        }
    }

    /// Creates a sensor that never delivers a frame.
    pub fn failing() -> Self {
        Self::default()
    }

    /// Frames acquired but not yet released.
    pub fn outstanding(&self) -> u32 {
        self.acquired - self.released
    }
}

impl FrameProvider for MockFrameProvider {
    type Frame = MockFrame;

    fn acquire(&mut self) -> Option<MockFrame> {
        self.acquire_calls += 1;
        let frame = MockFrame(self.image.clone()?);
        self.acquired += 1;
        Some(frame)
    }

    fn release(&mut self, _frame: MockFrame) {
        self.released += 1;
    }
}

/// Mock capture button.
///
/// Queued samples are returned first, oldest first; after that every
/// sample reads the held level.
///
/// # Example
///
/// ```rust
/// use snapcam::hal::MockTrigger;
/// use snapcam::traits::TriggerInput;
///
/// let mut button = MockTrigger::new();
/// button.queue_press();
/// assert!(button.is_active());
/// assert!(!button.is_active());
///
/// button.set_active(true);
/// assert!(button.is_active());
/// assert!(button.is_active());
/// ```
#[derive(Debug, Default)]
pub struct MockTrigger {
    samples: VecDeque<bool>,
    held: bool,
    /// Number of samples taken.
    pub reads: u32,
}

impl MockTrigger {
    /// Creates a released button.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a single sample.
    pub fn queue(&mut self, active: bool) {
        self.samples.push_back(active);
    }

    /// Queues one active sample.
    pub fn queue_press(&mut self) {
        self.queue(true);
    }

    /// Sets the level read once the queue is empty.
    pub fn set_active(&mut self, active: bool) {
        self.held = active;
    }
}

impl TriggerInput for MockTrigger {
    fn is_active(&mut self) -> bool {
        self.reads += 1;
        self.samples.pop_front().unwrap_or(self.held)
    }
}

/// Mock status LED.
///
/// Records every on/off write in order.
#[derive(Debug, Default)]
pub struct MockIndicator {
    /// Every level written, oldest first.
    pub transitions: Vec<bool>,
    /// Current level.
    pub on: bool,
    /// Makes every write fail.
    pub fail: bool,
}

impl MockIndicator {
    /// Creates an LED that is off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times the LED was switched on.
    pub fn pulse_count(&self) -> usize {
        self.transitions.iter().filter(|&&on| on).count()
    }
}

impl StatusIndicator for MockIndicator {
    type Error = ();

    fn set_on(&mut self, on: bool) -> Result<(), ()> {
        if self.fail {
            return Err(());
        }
        self.on = on;
        self.transitions.push(on);
        Ok(())
    }
}

/// Mock blocking delay.
///
/// Records requested delays and returns immediately.
#[derive(Debug, Default)]
pub struct MockDelay {
    /// Every requested delay, oldest first.
    pub calls: Vec<u32>,
}

impl MockDelay {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of all requested delays.
    pub fn total_ms(&self) -> u64 {
        self.calls.iter().map(|&ms| ms as u64).sum()
    }
}

impl Delay for MockDelay {
    fn delay_ms(&mut self, ms: u32) {
        self.calls.push(ms);
    }
}

/// Mock monotonic clock.
///
/// Every read returns the current time and then moves it forward by
/// `step_ms`, so a loop that reads the clock once per iteration sees
/// time pass the way it does on hardware. A step of zero freezes time.
///
/// # Example
///
/// ```rust
/// use snapcam::hal::MockClock;
/// use snapcam::traits::Clock;
///
/// let clock = MockClock::ticking(10);
/// assert_eq!(clock.now_ms(), 0);
/// assert_eq!(clock.now_ms(), 10);
///
/// clock.jump(5_000);
/// assert_eq!(clock.now_ms(), 5_020);
/// ```
#[derive(Debug, Default)]
pub struct MockClock {
    now_ms: Cell<u64>,
    step_ms: u64,
}

impl MockClock {
    /// A frozen clock at 0 ms.
    pub fn new() -> Self {
        Self::default()
    }

    /// A clock at 0 ms that advances `step_ms` per read.
    pub fn ticking(step_ms: u64) -> Self {
        Self {
            now_ms: Cell::new(0),
            step_ms,
        }
    }

    /// Moves time forward without a read.
    pub fn jump(&self, ms: u64) {
        self.now_ms.set(self.now_ms.get() + ms);
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        let now = self.now_ms.get();
        self.now_ms.set(now + self.step_ms);
        now
    }
}

/// Mock wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockTime {
    /// Time returned by `local_time`.
    pub time: Option<ClockTime>,
}

impl MockTime {
    /// A clock that was never set.
    pub fn unset() -> Self {
        Self { time: None }
    }

    /// A clock stopped at `time`.
    pub fn at(time: ClockTime) -> Self {
        Self { time: Some(time) }
    }
}

impl TimeSource for MockTime {
    fn local_time(&self) -> Option<ClockTime> {
        self.time
    }
}

/// Mock display.
///
/// Records every frame drawn and the last message shown.
#[derive(Debug, Default)]
pub struct MockDisplay {
    /// Set by a successful `init`.
    pub initialized: bool,
    /// Makes `init` fail.
    pub fail_init: bool,
    /// Makes `draw_lines` fail.
    pub fail_draw: bool,
    /// Number of `clear` calls.
    pub clears: u32,
    /// Last message shown, as `(line1, line2)`.
    pub last_message: Option<(String, Option<String>)>,
    /// Every frame drawn, oldest first.
    pub frames: Vec<StatusLines>,
}

impl MockDisplay {
    /// Creates a display that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent frame.
    pub fn last_frame(&self) -> Option<&StatusLines> {
        self.frames.last()
    }

    /// Activity lines of every frame, oldest first.
    pub fn activity_history(&self) -> Vec<&str> {
        self.frames.iter().map(|f| f.activity.as_str()).collect()
    }
}

impl StatusDisplay for MockDisplay {
    type Error = ();

    fn init(&mut self) -> Result<(), ()> {
        if self.fail_init {
            return Err(());
        }
        self.initialized = true;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), ()> {
        self.clears += 1;
        Ok(())
    }

    fn draw_lines(&mut self, lines: &StatusLines) -> Result<(), ()> {
        if self.fail_draw {
            return Err(());
        }
        self.frames.push(lines.clone());
        Ok(())
    }

    fn show_message(&mut self, line1: &str, line2: Option<&str>) -> Result<(), ()> {
        self.last_message = Some((line1.to_string(), line2.map(|s| s.to_string())));
        Ok(())
    }
}

// ============================================================================
// Network Mocks
// ============================================================================

/// Mock WiFi station.
#[derive(Debug, Default)]
pub struct MockConnectivity {
    /// Whether `join` succeeds.
    pub reachable: bool,
    /// Current link state.
    pub connected: bool,
    /// Timeout passed to each `join` call.
    pub join_timeouts: Vec<u32>,
}

impl MockConnectivity {
    /// A network that accepts the join.
    pub fn reachable() -> Self {
        Self {
            reachable: true,
            ..Self::default()
        }
    }

    /// A network whose join always times out.
    pub fn unreachable() -> Self {
        Self::default()
    }
}

impl Connectivity for MockConnectivity {
    type Error = &'static str;

    fn join(&mut self, timeout_ms: u32) -> Result<(), &'static str> {
        self.join_timeouts.push(timeout_ms);
        self.connected = self.reachable;
        if self.reachable {
            Ok(())
        } else {
            Err("join timed out")
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

/// Mock realtime socket.
///
/// Events queued with [`queue_event`](Self::queue_event) come out of
/// `try_event` in order. Sent frames are captured in [`sent`](Self::sent).
///
/// # Example
///
/// ```rust
/// use snapcam::hal::MockSocket;
/// use snapcam::traits::{ChannelEvent, Endpoint, SocketTransport};
///
/// let mut socket = MockSocket::new();
/// socket.open(&Endpoint::new("host", 5000, "/ws")).unwrap();
/// socket.queue_message("2");
///
/// assert_eq!(socket.try_event(), Some(ChannelEvent::Message(b"2".to_vec())));
/// assert_eq!(socket.try_event(), None);
///
/// socket.send_text("3").unwrap();
/// assert_eq!(socket.sent, ["3"]);
/// ```
#[derive(Debug, Default)]
pub struct MockSocket {
    events: VecDeque<ChannelEvent>,
    /// Endpoint of every successful `open`, oldest first.
    pub opened: Vec<Endpoint>,
    /// Frames sent, oldest first.
    pub sent: Vec<String>,
    /// Number of `close` calls.
    pub closes: u32,
    /// Makes `open` fail.
    pub fail_open: bool,
    /// Makes `send_text` fail.
    pub fail_send: bool,
}

impl MockSocket {
    /// Creates an idle socket.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an event for `try_event`.
    pub fn queue_event(&mut self, event: ChannelEvent) {
        self.events.push_back(event);
    }

    /// Queues an inbound text frame.
    pub fn queue_message(&mut self, text: &str) {
        self.queue_event(ChannelEvent::Message(text.as_bytes().to_vec()));
    }

    /// Number of events not yet taken.
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }
}

impl SocketTransport for MockSocket {
    type Error = &'static str;

    fn open(&mut self, endpoint: &Endpoint) -> Result<(), &'static str> {
        if self.fail_open {
            return Err("connection refused");
        }
        self.opened.push(endpoint.clone());
        Ok(())
    }

    fn send_text(&mut self, text: &str) -> Result<(), &'static str> {
        if self.fail_send {
            return Err("send failed");
        }
        self.sent.push(text.to_string());
        Ok(())
    }

    fn try_event(&mut self) -> Option<ChannelEvent> {
        self.events.pop_front()
    }

    fn close(&mut self) {
        self.closes += 1;
    }
}

/// Mock upload transport.
#[derive(Debug, Default)]
pub struct MockUploader {
    /// Status returned by `post`; `None` means no response.
    pub response: Option<u16>,
    /// Every request as `(url, body)`, oldest first.
    pub requests: Vec<(String, Vec<u8>)>,
}

impl MockUploader {
    /// A server that answers with `status`.
    pub fn responding(status: u16) -> Self {
        Self {
            response: Some(status),
            requests: Vec::new(),
        }
    }

    /// A server that never answers.
    pub fn failing() -> Self {
        Self::default()
    }
}

impl UploadTransport for MockUploader {
    type Error = &'static str;

    fn post(&mut self, url: &str, body: &[u8]) -> Result<u16, &'static str> {
        self.requests.push((url.to_string(), body.to_vec()));
        self.response.ok_or("no response")
    }
}
