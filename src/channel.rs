//! Realtime channel client.
//!
//! [`RealtimeChannel`] sits on top of a [`SocketTransport`] and adds the
//! parts of the session the transport does not know about:
//!
//! - sends the namespace join probe when the socket opens
//! - hands every event to a [`ChannelHandler`] and sends its reply
//! - after a close or error, reopens the socket on a fixed interval,
//!   forever, without ever blocking the caller
//!
//! All work happens inside [`poll`](RealtimeChannel::poll), on the caller's
//! thread. Handlers run synchronously inside `poll`.
//!
//! # Example
//!
//! ```rust
//! use snapcam::channel::RealtimeChannel;
//! use snapcam::hal::MockSocket;
//! use snapcam::traits::ChannelEvent;
//!
//! let mut channel = RealtimeChannel::new(MockSocket::new(), 5000);
//! channel.connect("192.168.137.1", 5000, "/socket.io/?EIO=4&transport=websocket");
//!
//! channel.transport_mut().queue_event(ChannelEvent::Opened);
//! channel.transport_mut().queue_message("2");
//!
//! let mut seen = Vec::new();
//! channel.poll(0, &mut |event: &ChannelEvent| {
//!     seen.push(event.clone());
//!     match event {
//!         ChannelEvent::Message(m) if m.as_slice() == b"2" => Some("3"),
//!         _ => None,
//!     }
//! });
//!
//! assert_eq!(seen.len(), 2);
//! assert_eq!(channel.transport().sent, ["40", "3"]);
//! ```

extern crate alloc;
use alloc::string::String;

use log::{debug, info, warn};

use crate::protocol::PROBE;
use crate::traits::{ChannelEvent, Endpoint, SocketTransport};

/// Upper bound on events handled per [`poll`](RealtimeChannel::poll) call,
/// so a chatty server cannot starve the rest of the main loop.
pub const MAX_EVENTS_PER_POLL: usize = 8;

/// Receives channel events.
///
/// The returned frame, if any, is sent back on the channel immediately.
pub trait ChannelHandler {
    /// Handles one event; returns a text frame to send in reply.
    fn on_event(&mut self, event: &ChannelEvent) -> Option<&'static str>;
}

impl<F> ChannelHandler for F
where
    F: FnMut(&ChannelEvent) -> Option<&'static str>,
{
    fn on_event(&mut self, event: &ChannelEvent) -> Option<&'static str> {
        self(event)
    }
}

/// Link state of the channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkState {
    /// `connect` has not been called.
    Idle,
    /// Open requested, waiting for the transport to report it.
    Connecting,
    /// Socket open.
    Open,
    /// Waiting to reopen. `retry_at_ms` is filled in on the next poll
    /// when the failure happened outside of `poll`.
    Backoff {
        /// Monotonic time of the next reopen attempt.
        retry_at_ms: Option<u64>,
    },
}

/// Persistent realtime channel with fixed-interval reconnect.
pub struct RealtimeChannel<T: SocketTransport> {
    transport: T,
    endpoint: Option<Endpoint>,
    state: LinkState,
    reconnect_interval_ms: u64,
    reconnects: u32,
}

impl<T: SocketTransport> RealtimeChannel<T> {
    /// Creates an idle channel.
    pub fn new(transport: T, reconnect_interval_ms: u32) -> Self {
        Self {
            transport,
            endpoint: None,
            state: LinkState::Idle,
            reconnect_interval_ms: reconnect_interval_ms as u64,
            reconnects: 0,
        }
    }

    /// Starts connecting to `host:port` at `path`.
    ///
    /// Non-blocking. If the transport refuses to start, the first reopen
    /// is scheduled one interval after the next [`poll`](Self::poll).
    pub fn connect(&mut self, host: &str, port: u16, path: &str) {
        let endpoint = Endpoint::new(String::from(host), port, String::from(path));
        info!("[WS] Connecting to {}", endpoint.ws_uri());
        self.state = match self.transport.open(&endpoint) {
            Ok(()) => LinkState::Connecting,
            Err(e) => {
                warn!("[WS] Open failed: {:?}", e);
                LinkState::Backoff { retry_at_ms: None }
            }
        };
        self.endpoint = Some(endpoint);
    }

    /// Services the channel once.
    ///
    /// Reopens the socket if a reconnect is due, then takes up to
    /// [`MAX_EVENTS_PER_POLL`] queued events and hands them to `handler`,
    /// sending any reply it returns. Messages are only handed over while
    /// the link is [`Open`](LinkState::Open); others are dropped. Returns
    /// the number of events taken.
    pub fn poll<H: ChannelHandler + ?Sized>(&mut self, now_ms: u64, handler: &mut H) -> usize {
        if let LinkState::Backoff { retry_at_ms } = self.state {
            match retry_at_ms {
                None => {
                    self.state = LinkState::Backoff {
                        retry_at_ms: Some(now_ms + self.reconnect_interval_ms),
                    }
                }
                Some(at) if now_ms >= at => self.reopen(now_ms),
                Some(_) => {}
            }
        }

        let mut delivered = 0;
        while delivered < MAX_EVENTS_PER_POLL {
            let Some(event) = self.transport.try_event() else {
                break;
            };
            delivered += 1;
            self.track(&event, now_ms);
            if matches!(event, ChannelEvent::Message(_)) && self.state != LinkState::Open {
                debug!("[WS] Dropping frame received while {:?}", self.state);
                continue;
            }
            if let Some(reply) = handler.on_event(&event) {
                self.send(reply);
            }
        }
        delivered
    }

    /// Sends a text frame if the socket is open.
    ///
    /// Returns false if the frame was not sent.
    pub fn send(&mut self, text: &str) -> bool {
        if self.state != LinkState::Open {
            debug!("[WS] Dropping frame {:?}: link {:?}", text, self.state);
            return false;
        }
        match self.transport.send_text(text) {
            Ok(()) => true,
            Err(e) => {
                warn!("[WS] Send failed: {:?}", e);
                false
            }
        }
    }

    /// Current link state.
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Returns true while the socket is open.
    ///
    /// An open socket is not yet a ready session; the namespace join is
    /// tracked in [`ConnectionState::channel`](crate::ConnectionState::channel).
    pub fn is_open(&self) -> bool {
        self.state == LinkState::Open
    }

    /// Endpoint passed to [`connect`](Self::connect).
    pub fn endpoint(&self) -> Option<&Endpoint> {
        self.endpoint.as_ref()
    }

    /// Number of reopen attempts since creation.
    pub fn reconnects(&self) -> u32 {
        self.reconnects
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutable access to the underlying transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    fn track(&mut self, event: &ChannelEvent, now_ms: u64) {
        match event {
            ChannelEvent::Opened => {
                info!("[WS] Open, sending namespace probe");
                self.state = LinkState::Open;
                self.send(PROBE);
            }
            ChannelEvent::Closed | ChannelEvent::Error(_) => {
                // Error and close often arrive back to back; keep the first schedule.
                if !matches!(self.state, LinkState::Backoff { .. }) {
                    info!(
                        "[WS] Link lost ({:?}), retrying in {} ms",
                        event, self.reconnect_interval_ms
                    );
                    self.state = LinkState::Backoff {
                        retry_at_ms: Some(now_ms + self.reconnect_interval_ms),
                    };
                }
            }
            ChannelEvent::Message(_) => {}
        }
    }

    fn reopen(&mut self, now_ms: u64) {
        let Some(endpoint) = self.endpoint.as_ref() else {
            self.state = LinkState::Idle;
            return;
        };
        self.reconnects = self.reconnects.wrapping_add(1);
        info!("[WS] Reconnect attempt {}", self.reconnects);
        self.transport.close();
        self.state = match self.transport.open(endpoint) {
            Ok(()) => LinkState::Connecting,
            Err(e) => {
                warn!("[WS] Reopen failed: {:?}", e);
                LinkState::Backoff {
                    retry_at_ms: Some(now_ms + self.reconnect_interval_ms),
                }
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::MockSocket;
    use alloc::vec::Vec;

    fn ignore(_: &ChannelEvent) -> Option<&'static str> {
        None
    }

    fn open_channel() -> RealtimeChannel<MockSocket> {
        let mut channel = RealtimeChannel::new(MockSocket::new(), 5000);
        channel.connect("host", 5000, "/ws");
        channel.transport_mut().queue_event(ChannelEvent::Opened);
        channel.poll(0, &mut ignore);
        channel
    }

    #[test]
    fn connect_opens_transport() {
        let mut channel = RealtimeChannel::new(MockSocket::new(), 5000);
        assert_eq!(channel.state(), LinkState::Idle);
        channel.connect("host", 5000, "/ws");

        assert_eq!(channel.state(), LinkState::Connecting);
        assert_eq!(channel.transport().opened, [Endpoint::new("host", 5000, "/ws")]);
        assert_eq!(channel.endpoint().unwrap().port, 5000);
    }

    #[test]
    fn probe_sent_on_open() {
        let channel = open_channel();
        assert!(channel.is_open());
        assert_eq!(channel.transport().sent, ["40"]);
    }

    #[test]
    fn reply_sent_after_handler() {
        let mut channel = open_channel();
        channel.transport_mut().queue_message("2");
        channel.poll(10, &mut |_: &ChannelEvent| Some("3"));
        assert_eq!(channel.transport().sent, ["40", "3"]);
    }

    #[test]
    fn no_send_while_not_open() {
        let mut channel = RealtimeChannel::new(MockSocket::new(), 5000);
        channel.connect("host", 5000, "/ws");
        assert!(!channel.send("3"));
        assert!(channel.transport().sent.is_empty());
    }

    #[test]
    fn send_failure_reported() {
        let mut channel = open_channel();
        channel.transport_mut().fail_send = true;
        assert!(!channel.send("3"));
    }

    #[test]
    fn close_schedules_reconnect_after_interval() {
        let mut channel = open_channel();
        channel.transport_mut().queue_event(ChannelEvent::Closed);
        channel.poll(1000, &mut ignore);
        assert_eq!(
            channel.state(),
            LinkState::Backoff {
                retry_at_ms: Some(6000)
            }
        );

        channel.poll(5999, &mut ignore);
        assert_eq!(channel.transport().opened.len(), 1);

        channel.poll(6000, &mut ignore);
        assert_eq!(channel.transport().opened.len(), 2);
        assert_eq!(channel.state(), LinkState::Connecting);
        assert_eq!(channel.reconnects(), 1);
        assert_eq!(channel.transport().closes, 1);
    }

    #[test]
    fn error_then_close_keeps_first_schedule() {
        let mut channel = open_channel();
        channel
            .transport_mut()
            .queue_event(ChannelEvent::Error("reset".into()));
        channel.poll(100, &mut ignore);
        channel.transport_mut().queue_event(ChannelEvent::Closed);
        channel.poll(2000, &mut ignore);

        assert_eq!(
            channel.state(),
            LinkState::Backoff {
                retry_at_ms: Some(5100)
            }
        );
    }

    #[test]
    fn failed_connect_retries_one_interval_after_first_poll() {
        let mut socket = MockSocket::new();
        socket.fail_open = true;
        let mut channel = RealtimeChannel::new(socket, 5000);
        channel.connect("host", 5000, "/ws");
        assert_eq!(channel.state(), LinkState::Backoff { retry_at_ms: None });

        channel.poll(300, &mut ignore);
        assert_eq!(
            channel.state(),
            LinkState::Backoff {
                retry_at_ms: Some(5300)
            }
        );

        // Still failing: reschedule
        channel.poll(5300, &mut ignore);
        assert_eq!(
            channel.state(),
            LinkState::Backoff {
                retry_at_ms: Some(10300)
            }
        );

        channel.transport_mut().fail_open = false;
        channel.poll(10300, &mut ignore);
        assert_eq!(channel.state(), LinkState::Connecting);
        assert_eq!(channel.reconnects(), 2);
    }

    #[test]
    fn handler_sees_lifecycle_events() {
        let mut channel = open_channel();
        channel
            .transport_mut()
            .queue_event(ChannelEvent::Error("boom".into()));
        channel.transport_mut().queue_event(ChannelEvent::Closed);

        let mut seen = Vec::new();
        channel.poll(0, &mut |e: &ChannelEvent| {
            seen.push(e.clone());
            None
        });
        assert_eq!(
            seen,
            [ChannelEvent::Error("boom".into()), ChannelEvent::Closed]
        );
    }

    #[test]
    fn poll_is_bounded() {
        let mut channel = open_channel();
        for _ in 0..(MAX_EVENTS_PER_POLL + 3) {
            channel.transport_mut().queue_message("2");
        }
        assert_eq!(channel.poll(0, &mut ignore), MAX_EVENTS_PER_POLL);
        assert_eq!(channel.poll(0, &mut ignore), 3);
        assert_eq!(channel.poll(0, &mut ignore), 0);
    }

    #[test]
    fn messages_outside_open_link_not_handled() {
        let mut channel = RealtimeChannel::new(MockSocket::new(), 5000);
        channel.connect("host", 5000, "/ws");
        channel.transport_mut().queue_message("40");

        let mut handled = 0;
        let taken = channel.poll(0, &mut |_: &ChannelEvent| {
            handled += 1;
            None
        });
        assert_eq!(taken, 1);
        assert_eq!(handled, 0);

        let mut channel = open_channel();
        channel.transport_mut().queue_event(ChannelEvent::Closed);
        channel.transport_mut().queue_message("40");
        let mut seen = Vec::new();
        channel.poll(10, &mut |e: &ChannelEvent| {
            seen.push(e.clone());
            None
        });
        assert_eq!(seen, [ChannelEvent::Closed]);
    }

    #[test]
    fn reply_to_close_is_dropped() {
        let mut channel = open_channel();
        channel.transport_mut().queue_event(ChannelEvent::Closed);
        channel.poll(0, &mut |_: &ChannelEvent| Some("3"));
        assert_eq!(channel.transport().sent, ["40"]);
    }
}
