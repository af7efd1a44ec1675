//! Realtime channel and dispatcher working together over a mock socket

use snapcam::{
    hal::MockSocket, Activity, ChannelEvent, CommandDispatcher, CommandMatching, ConnectionState,
    DeferredAction, LinkState, RealtimeChannel,
};

const PATH: &str = "/socket.io/?EIO=4&transport=websocket";

struct Session {
    channel: RealtimeChannel<MockSocket>,
    status: ConnectionState,
    pending: DeferredAction,
}

impl Session {
    fn new() -> Self {
        let mut channel = RealtimeChannel::new(MockSocket::new(), 5000);
        channel.connect("192.168.137.1", 5000, PATH);
        Self {
            channel,
            status: ConnectionState::new(),
            pending: DeferredAction::new(),
        }
    }

    fn poll(&mut self, now_ms: u64) -> usize {
        let mut dispatcher =
            CommandDispatcher::new(&mut self.status, &mut self.pending, CommandMatching::Substring);
        self.channel.poll(now_ms, &mut dispatcher)
    }

    fn inbound(&mut self, text: &str) {
        self.channel.transport_mut().queue_message(text);
    }

    fn event(&mut self, event: ChannelEvent) {
        self.channel.transport_mut().queue_event(event);
    }

    fn sent(&self) -> &[String] {
        &self.channel.transport().sent
    }

    /// Opens the socket and completes the namespace join.
    fn handshake(&mut self, now_ms: u64) {
        self.event(ChannelEvent::Opened);
        self.inbound("40{\"sid\":\"abc\"}");
        self.poll(now_ms);
    }
}

// ============================================================================
// Handshake
// ============================================================================

#[test]
fn full_handshake_sequence() {
    let mut s = Session::new();
    s.event(ChannelEvent::Opened);
    s.poll(0);
    assert_eq!(s.sent(), ["40"]);
    assert!(!s.status.channel());

    s.inbound("40{\"sid\":\"abc\"}");
    s.poll(10);
    assert_eq!(s.sent(), ["40", "42[\"hardware_hello\",{}]"]);
    assert!(s.status.channel());
    assert_eq!(s.status.activity(), Activity::Ready);
}

#[test]
fn every_ack_says_hello_once() {
    let mut s = Session::new();
    s.handshake(0);
    s.event(ChannelEvent::Closed);
    s.poll(100);
    assert!(!s.status.channel());

    // Reconnect and join again
    s.poll(5100);
    s.handshake(5200);

    let hellos = s
        .sent()
        .iter()
        .filter(|f| f.as_str() == "42[\"hardware_hello\",{}]")
        .count();
    assert_eq!(hellos, 2);
    assert!(s.status.channel());
}

#[test]
fn channel_only_up_after_ack() {
    let mut s = Session::new();
    s.event(ChannelEvent::Opened);
    s.inbound("2");
    s.inbound("42[\"chat\",\"hi\"]");
    s.poll(0);
    assert!(s.channel.is_open());
    assert!(!s.status.channel());
}

#[test]
fn ack_before_open_does_not_mark_channel() {
    let mut s = Session::new();
    s.inbound("40{\"sid\":\"abc\"}");
    s.poll(0);

    assert_eq!(s.channel.state(), LinkState::Connecting);
    assert!(!s.status.channel());
    assert!(s.sent().is_empty());
}

#[test]
fn ack_after_close_does_not_revive_channel() {
    let mut s = Session::new();
    s.handshake(0);

    s.event(ChannelEvent::Closed);
    s.inbound("40");
    s.poll(10);

    assert!(matches!(s.channel.state(), LinkState::Backoff { .. }));
    assert!(!s.status.channel());
    assert_eq!(s.status.activity(), Activity::ServerOffline);
    assert_eq!(s.sent(), ["40", "42[\"hardware_hello\",{}]"]);
}

// ============================================================================
// Heartbeat
// ============================================================================

#[test]
fn heartbeats_answered_without_state_change() {
    let mut s = Session::new();
    s.handshake(0);
    let before = s.status.clone();

    for frame in ["2", "2", "2probe"] {
        s.inbound(frame);
    }
    s.poll(25_000);

    assert_eq!(&s.sent()[2..], ["3", "3", "3"]);
    assert_eq!(s.status, before);
}

#[test]
fn heartbeat_before_open_is_not_answered() {
    let mut s = Session::new();
    s.inbound("2");
    s.poll(0);
    assert!(s.sent().is_empty());
}

// ============================================================================
// Commands
// ============================================================================

#[test]
fn take_photo_raises_pending() {
    let mut s = Session::new();
    s.handshake(0);
    s.inbound("42[\"take_photo\",{\"from\":\"web\"}]");
    s.poll(10);
    assert!(s.pending.is_pending());
    assert_eq!(s.status.activity(), Activity::Ready);
}

#[test]
fn take_photo_matches_loosely() {
    let mut s = Session::new();
    s.handshake(0);
    s.inbound("not even socket.io take_photo");
    s.poll(10);
    assert!(s.pending.is_pending());
}

#[test]
fn repeated_commands_coalesce() {
    let mut s = Session::new();
    s.handshake(0);
    s.inbound("42[\"take_photo\"]");
    s.inbound("42[\"take_photo\"]");
    s.inbound("42[\"take_photo\"]");
    s.poll(10);

    assert!(s.pending.take());
    assert!(!s.pending.take());
}

#[test]
fn strict_matching_needs_event_name() {
    let mut s = Session::new();
    s.handshake(0);
    s.inbound("42[\"chat\",\"take_photo\"]");
    {
        let mut dispatcher =
            CommandDispatcher::new(&mut s.status, &mut s.pending, CommandMatching::EventName);
        s.channel.poll(10, &mut dispatcher);
    }
    assert!(!s.pending.is_pending());

    s.inbound("42[\"take_photo\",{}]");
    {
        let mut dispatcher =
            CommandDispatcher::new(&mut s.status, &mut s.pending, CommandMatching::EventName);
        s.channel.poll(20, &mut dispatcher);
    }
    assert!(s.pending.is_pending());
}

// ============================================================================
// Disconnect and reconnect
// ============================================================================

#[test]
fn close_reports_offline_and_reconnects_after_interval() {
    let mut s = Session::new();
    s.handshake(0);

    s.event(ChannelEvent::Closed);
    s.poll(1_000);
    assert!(!s.status.channel());
    assert_eq!(s.status.activity(), Activity::ServerOffline);
    assert_eq!(
        s.channel.state(),
        LinkState::Backoff {
            retry_at_ms: Some(6_000)
        }
    );

    // Loop keeps spinning without reopening early
    for t in (1_000..6_000).step_by(250) {
        s.poll(t);
    }
    assert_eq!(s.channel.transport().opened.len(), 1);

    s.poll(6_000);
    assert_eq!(s.channel.transport().opened.len(), 2);
    assert_eq!(s.channel.state(), LinkState::Connecting);
}

#[test]
fn error_reports_socket_error() {
    let mut s = Session::new();
    s.handshake(0);
    s.event(ChannelEvent::Error("ECONNRESET".into()));
    s.poll(10);
    assert!(!s.status.channel());
    assert_eq!(s.status.activity(), Activity::SocketError);
}

#[test]
fn refused_server_retried_forever() {
    let mut s = Session::new();
    s.channel.transport_mut().fail_open = true;

    s.event(ChannelEvent::Closed);
    s.poll(0);
    for i in 1..=5u64 {
        s.poll(i * 5_000);
    }
    assert_eq!(s.channel.reconnects(), 5);
    assert!(s.channel.transport().opened.len() == 1);
}
