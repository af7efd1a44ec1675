//! # snapcam
//!
//! Firmware core for a network camera that takes a picture when its button
//! is pressed or when the server asks for one, uploads it, and shows its
//! connection status on a small OLED.
//!
//! ## Features
//!
//! - **Realtime channel**: minimal Socket.IO client with heartbeat replies,
//!   namespace handshake and fixed-interval reconnect
//! - **Remote commands**: `take_photo` events raise a single-slot deferred request
//! - **Capture pipeline**: one frame, one upload, guaranteed frame release
//! - **Status projection**: four-line status display on a fixed cadence
//! - **Hardware abstraction**: every device behind a trait, mocks for desktop tests
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - Hardware and network abstractions
//! - `protocol` - Frame vocabulary and inbound frame classification
//! - `channel` - Realtime channel client over a socket transport
//! - `dispatcher` - Channel event handler that updates the shared state
//! - `pipeline` - Capture and upload
//! - `controller` - Main loop that ties everything together
//! - `hal` - Concrete implementations (mock for testing, esp32 for hardware)
//!
//! ## Example
//!
//! ```rust
//! use snapcam::{
//!     CaptureController, CapturePipeline, RealtimeChannel, StatusRenderer, TickOutcome,
//!     Activity, config::Config, hal::*,
//! };
//!
//! let config = Config::default();
//! let pipeline = CapturePipeline::new(
//!     MockFrameProvider::with_frame(vec![0xFF, 0xD8, 0xFF]),
//!     MockUploader::responding(200),
//!     MockIndicator::new(),
//!     MockDelay::new(),
//!     config.pipeline(),
//! );
//! let mut controller = CaptureController::new(
//!     RealtimeChannel::new(MockSocket::new(), config.server.reconnect_interval_ms),
//!     MockTrigger::new(),
//!     StatusRenderer::new(
//!         MockDisplay::new(),
//!         MockTime::unset(),
//!         config.timing.render_interval_ms,
//!     ),
//!     pipeline,
//! );
//!
//! controller.connect_channel(&config.server.endpoint());
//! controller.trigger_mut().queue_press();
//!
//! // Update in your main loop
//! let outcome = controller.tick(0);
//! assert!(matches!(outcome, TickOutcome::Local(o) if o.is_success()));
//! assert_eq!(controller.status().activity(), Activity::Ready);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Realtime channel client with reconnect scheduling.
pub mod channel;
/// Remote commands and the deferred action slot.
pub mod commands;
/// Main poll loop and boot phases.
pub mod controller;
/// Channel event handler.
pub mod dispatcher;
/// Failure taxonomy.
pub mod error;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Capture and upload.
pub mod pipeline;
/// Realtime channel frame vocabulary.
pub mod protocol;
/// Connection state and the status display.
pub mod status;
/// Core traits for hardware and network abstraction.
pub mod traits;

/// Shared configuration system for desktop and ESP32.
pub mod config;

// Re-exports for convenience
pub use channel::{ChannelHandler, LinkState, RealtimeChannel};
pub use commands::{DeferredAction, RemoteCommand};
pub use config::Config;
pub use controller::{CaptureController, TickOutcome};
pub use dispatcher::CommandDispatcher;
pub use error::FailureKind;
pub use pipeline::{CapturePipeline, PipelineConfig, PipelineOutcome};
pub use protocol::{CommandMatching, InboundFrame};
pub use status::{
    render_lines, Activity, ConnectionState, RenderStatus, StatusLines, StatusRenderer,
};
pub use traits::{
    // Network
    ChannelEvent,
    // Hardware
    Clock,
    ClockTime,
    Connectivity,
    Delay,
    Endpoint,
    FrameGuard,
    FrameProvider,
    PulsePattern,
    SocketTransport,
    // Display
    StatusDisplay,
    StatusIndicator,
    TimeSource,
    TriggerInput,
    UploadTransport,
};
