//! Network abstraction traits: WiFi join, the realtime socket, and the
//! image upload transport.
//!
//! # Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`Connectivity`] | Station join with a bounded timeout |
//! | [`SocketTransport`] | Non-blocking text-frame socket under the realtime channel |
//! | [`UploadTransport`] | One blocking POST of the image bytes |
//!
//! The socket transport is deliberately dumb: it opens, sends, and queues
//! lifecycle/message events. Handshake, heartbeat, and reconnect policy
//! live in [`RealtimeChannel`](crate::channel::RealtimeChannel).

extern crate alloc;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Debug;

// ============================================================================
// Connectivity
// ============================================================================

/// Network reachability provider (WiFi station on the board).
pub trait Connectivity {
    /// Error type for join failures, including timeout.
    type Error: Debug;

    /// Joins the network, blocking for at most `timeout_ms`.
    fn join(&mut self, timeout_ms: u32) -> Result<(), Self::Error>;

    /// Returns true while the station has an address.
    fn is_connected(&self) -> bool;
}

// ============================================================================
// Realtime Socket
// ============================================================================

/// Remote endpoint of the realtime channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    /// Hostname or IP address.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Request path, including any query string.
    pub path: String,
}

impl Endpoint {
    /// Creates an endpoint.
    pub fn new(host: impl Into<String>, port: u16, path: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            path: path.into(),
        }
    }

    /// WebSocket URI for this endpoint.
    ///
    /// # Examples
    ///
    /// ```
    /// use snapcam::traits::Endpoint;
    ///
    /// let ep = Endpoint::new("192.168.137.1", 5000, "/socket.io/?EIO=4&transport=websocket");
    /// assert_eq!(ep.ws_uri(), "ws://192.168.137.1:5000/socket.io/?EIO=4&transport=websocket");
    /// ```
    pub fn ws_uri(&self) -> String {
        format!("ws://{}:{}{}", self.host, self.port, self.path)
    }
}

/// Lifecycle and message events surfaced by a [`SocketTransport`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChannelEvent {
    /// The connection was established.
    Opened,
    /// The connection was closed by either side.
    Closed,
    /// The transport reported an error.
    Error(String),
    /// A text frame arrived.
    Message(Vec<u8>),
}

/// Non-blocking text-frame socket.
///
/// # Implementation Notes
///
/// - `open` only initiates; completion is reported as [`ChannelEvent::Opened`]
/// - `try_event` must never block
/// - Implementations must not reconnect on their own
pub trait SocketTransport {
    /// Error type for socket operations.
    type Error: Debug;

    /// Starts connecting to `endpoint`, replacing any previous connection.
    fn open(&mut self, endpoint: &Endpoint) -> Result<(), Self::Error>;

    /// Sends one text frame.
    fn send_text(&mut self, text: &str) -> Result<(), Self::Error>;

    /// Returns the next queued event, if any.
    fn try_event(&mut self) -> Option<ChannelEvent>;

    /// Tears down the current connection, if any.
    fn close(&mut self);
}

// ============================================================================
// Upload
// ============================================================================

/// Blocking request/response primitive used for the image upload.
pub trait UploadTransport {
    /// Error type for transport failures (no response received).
    type Error: Debug;

    /// POSTs `body` to `url` and returns the response status code.
    ///
    /// Blocks for the whole round trip. Sends no headers beyond what the
    /// transport needs to frame the body.
    fn post(&mut self, url: &str, body: &[u8]) -> Result<u16, Self::Error>;
}
