//! Main poll loop that ties everything together.
//!
//! This module provides [`CaptureController`], which owns the realtime
//! channel, the trigger, the status renderer, the capture pipeline, and the
//! shared [`ConnectionState`].
//!
//! # Overview
//!
//! Each [`tick`](CaptureController::tick) is one loop iteration:
//!
//! 1. Service the realtime channel (the dispatcher may update state and
//!    raise the deferred capture request)
//! 2. Render if the cadence has elapsed
//! 3. If the trigger is active: `Button Pressed`, run the pipeline, hold
//!    for the debounce delay
//! 4. Otherwise, if a remote request is pending: clear it,
//!    `Remote Command`, run the pipeline
//!
//! A trigger press wins over a pending remote request in the same tick; the
//! request stays pending for the next one.
//!
//! # Example
//!
//! ```rust
//! use snapcam::{CaptureController, CapturePipeline, PipelineConfig, RealtimeChannel,
//!               StatusRenderer, TickOutcome, PipelineOutcome, Activity};
//! use snapcam::hal::*;
//! use snapcam::traits::Endpoint;
//!
//! let pipeline = CapturePipeline::new(
//!     MockFrameProvider::with_frame(vec![0xFF, 0xD8]),
//!     MockUploader::responding(200),
//!     MockIndicator::new(),
//!     MockDelay::new(),
//!     PipelineConfig::new("http://server/api/upload"),
//! );
//! let mut controller = CaptureController::new(
//!     RealtimeChannel::new(MockSocket::new(), 5000),
//!     MockTrigger::new(),
//!     StatusRenderer::new(MockDisplay::new(), MockTime::unset(), 1000),
//!     pipeline,
//! );
//! controller.connect_channel(&Endpoint::new("server", 5000, "/ws"));
//!
//! assert_eq!(controller.tick(0), TickOutcome::Idle);
//!
//! // Server sends a capture command; the same tick services it
//! controller.channel_mut().transport_mut().queue_message("42[\"take_photo\",{}]");
//! assert_eq!(
//!     controller.tick(10),
//!     TickOutcome::Remote(PipelineOutcome::Uploaded { status: 200 })
//! );
//! assert!(!controller.pending().is_pending());
//! assert_eq!(controller.status().activity(), Activity::Ready);
//! ```

use core::fmt::Debug;

use log::{info, warn};

use crate::channel::RealtimeChannel;
use crate::commands::DeferredAction;
use crate::dispatcher::CommandDispatcher;
use crate::error::FailureKind;
use crate::pipeline::{CapturePipeline, PipelineOutcome};
use crate::protocol::CommandMatching;
use crate::status::{Activity, ConnectionState, RenderStatus, StatusRenderer};
use crate::traits::{
    Connectivity, Delay, Endpoint, FrameProvider, SocketTransport, StatusDisplay,
    StatusIndicator, TimeSource, TriggerInput, UploadTransport,
};

/// What one loop iteration did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// No capture ran.
    Idle,
    /// The trigger started a capture.
    Local(PipelineOutcome),
    /// A remote request started a capture.
    Remote(PipelineOutcome),
}

impl TickOutcome {
    /// The pipeline result, if a capture ran.
    pub fn pipeline(&self) -> Option<PipelineOutcome> {
        match self {
            TickOutcome::Idle => None,
            TickOutcome::Local(o) | TickOutcome::Remote(o) => Some(*o),
        }
    }
}

/// The firmware's main loop.
///
/// # Type Parameters
///
/// - `S`: realtime socket ([`SocketTransport`])
/// - `G`: capture button ([`TriggerInput`])
/// - `Disp`, `T`: display and wall clock behind the [`StatusRenderer`]
/// - `F`, `U`, `I`, `D`: camera, uploader, LED and delay behind the
///   [`CapturePipeline`]
///
/// Not thread-safe; everything runs on the caller's thread.
pub struct CaptureController<S, G, Disp, T, F, U, I, D>
where
    S: SocketTransport,
    G: TriggerInput,
    Disp: StatusDisplay,
    T: TimeSource,
    F: FrameProvider,
    U: UploadTransport,
    I: StatusIndicator,
    D: Delay,
{
    channel: RealtimeChannel<S>,
    trigger: G,
    renderer: StatusRenderer<Disp, T>,
    pipeline: CapturePipeline<F, U, I, D>,
    status: ConnectionState,
    pending: DeferredAction,
    matching: CommandMatching,
    debounce_ms: u32,
}

impl<S, G, Disp, T, F, U, I, D> CaptureController<S, G, Disp, T, F, U, I, D>
where
    S: SocketTransport,
    G: TriggerInput,
    Disp: StatusDisplay,
    T: TimeSource,
    F: FrameProvider,
    U: UploadTransport,
    I: StatusIndicator,
    D: Delay,
{
    /// Creates a controller in the boot state.
    ///
    /// Substring command matching and a 1000 ms debounce hold by default.
    pub fn new(
        channel: RealtimeChannel<S>,
        trigger: G,
        renderer: StatusRenderer<Disp, T>,
        pipeline: CapturePipeline<F, U, I, D>,
    ) -> Self {
        Self {
            channel,
            trigger,
            renderer,
            pipeline,
            status: ConnectionState::new(),
            pending: DeferredAction::new(),
            matching: CommandMatching::default(),
            debounce_ms: 1000,
        }
    }

    /// Sets how capture commands are recognized.
    pub fn with_matching(mut self, matching: CommandMatching) -> Self {
        self.matching = matching;
        self
    }

    /// Sets the hold after a trigger-started capture.
    pub fn with_debounce_ms(mut self, ms: u32) -> Self {
        self.debounce_ms = ms;
        self
    }

    // ========================================================================
    // Main loop
    // ========================================================================

    /// Runs one loop iteration at monotonic time `now_ms`.
    ///
    /// Blocks only while a capture runs (and for the debounce hold after a
    /// trigger press).
    pub fn tick(&mut self, now_ms: u64) -> TickOutcome {
        let mut dispatcher =
            CommandDispatcher::new(&mut self.status, &mut self.pending, self.matching);
        self.channel.poll(now_ms, &mut dispatcher);

        self.renderer.render_if_due(now_ms, &self.status);

        if self.trigger.is_active() {
            info!("[Main] Button pressed");
            self.status.set_activity(Activity::ButtonPressed);
            self.renderer.render_now(&self.status);
            let outcome = self.pipeline.run(&mut self.status, &mut self.renderer);
            self.pipeline.delay_mut().delay_ms(self.debounce_ms);
            return TickOutcome::Local(outcome);
        }

        if self.pending.take() {
            info!("[Main] Servicing remote capture");
            self.status.set_activity(Activity::RemoteCommand);
            self.renderer.render_now(&self.status);
            let outcome = self.pipeline.run(&mut self.status, &mut self.renderer);
            return TickOutcome::Remote(outcome);
        }

        TickOutcome::Idle
    }

    // ========================================================================
    // Boot phases
    // ========================================================================

    /// Initializes the display and shows the boot splash.
    ///
    /// # Errors
    ///
    /// The display's init error. The caller must not continue.
    pub fn init_display(&mut self) -> Result<(), Disp::Error> {
        self.renderer.init()
    }

    /// Records the camera init result.
    ///
    /// A failed camera is not fatal; captures will fail at acquisition.
    pub fn report_camera_init<E: Debug>(&mut self, result: Result<(), E>) -> bool {
        let ok = match result {
            Ok(()) => {
                info!("[Camera] Init OK");
                self.status.set_activity(Activity::CameraOk);
                true
            }
            Err(e) => {
                let kind = FailureKind::CameraInitFailure;
                warn!("[Camera] {}: {:?}", kind, e);
                self.status
                    .set_activity(kind.activity().unwrap_or(Activity::CameraInitFailed));
                false
            }
        };
        self.renderer.render_now(&self.status);
        ok
    }

    /// Joins the network, blocking for at most `timeout_ms`.
    ///
    /// Returns whether the join succeeded. The result is rendered on the
    /// next cadence tick.
    pub fn join_network<C: Connectivity>(&mut self, net: &mut C, timeout_ms: u32) -> bool {
        self.status.set_activity(Activity::ConnectingWifi);
        self.renderer.render_now(&self.status);

        match net.join(timeout_ms) {
            Ok(()) => {
                info!("[WiFi] Connected");
                self.status.set_network(true);
                self.status.set_activity(Activity::WifiConnected);
                true
            }
            Err(e) => {
                let kind = FailureKind::NetworkJoinTimeout;
                warn!("[WiFi] {}: {:?}", kind, e);
                self.status.set_network(false);
                self.status
                    .set_activity(kind.activity().unwrap_or(Activity::WifiFailed));
                false
            }
        }
    }

    /// Starts wall-clock synchronisation with `start`, then holds for
    /// `hold_ms`.
    ///
    /// `Time Synced!` is shown only if `start` succeeds; a failure is
    /// logged and the time line keeps showing `Time not set`.
    pub fn sync_time<E, Start>(&mut self, start: Start, hold_ms: u32) -> bool
    where
        E: Debug,
        Start: FnOnce() -> Result<(), E>,
    {
        self.status.set_activity(Activity::SyncingTime);
        self.renderer.render_now(&self.status);

        let ok = match start() {
            Ok(()) => {
                self.status.set_activity(Activity::TimeSynced);
                self.renderer.render_now(&self.status);
                true
            }
            Err(e) => {
                warn!("[Time] SNTP start failed: {:?}", e);
                false
            }
        };
        self.pipeline.delay_mut().delay_ms(hold_ms);
        ok
    }

    /// Starts connecting the realtime channel. Non-blocking.
    pub fn connect_channel(&mut self, endpoint: &Endpoint) {
        self.status.set_activity(Activity::ConnectingServer);
        self.renderer.render_now(&self.status);
        self.channel
            .connect(&endpoint.host, endpoint.port, &endpoint.path);
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Shared connection state.
    pub fn status(&self) -> &ConnectionState {
        &self.status
    }

    /// Deferred capture request.
    pub fn pending(&self) -> &DeferredAction {
        &self.pending
    }

    /// Command matching mode.
    pub fn matching(&self) -> CommandMatching {
        self.matching
    }

    /// The realtime channel.
    pub fn channel(&self) -> &RealtimeChannel<S> {
        &self.channel
    }

    /// Mutable access to the realtime channel.
    pub fn channel_mut(&mut self) -> &mut RealtimeChannel<S> {
        &mut self.channel
    }

    /// The trigger input.
    pub fn trigger(&self) -> &G {
        &self.trigger
    }

    /// Mutable access to the trigger input.
    pub fn trigger_mut(&mut self) -> &mut G {
        &mut self.trigger
    }

    /// The status renderer.
    pub fn renderer(&self) -> &StatusRenderer<Disp, T> {
        &self.renderer
    }

    /// Mutable access to the status renderer.
    pub fn renderer_mut(&mut self) -> &mut StatusRenderer<Disp, T> {
        &mut self.renderer
    }

    /// The capture pipeline.
    pub fn pipeline(&self) -> &CapturePipeline<F, U, I, D> {
        &self.pipeline
    }

    /// Mutable access to the capture pipeline.
    pub fn pipeline_mut(&mut self) -> &mut CapturePipeline<F, U, I, D> {
        &mut self.pipeline
    }
}
