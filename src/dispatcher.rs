//! Realtime channel event dispatch.
//!
//! [`CommandDispatcher`] is the [`ChannelHandler`] the firmware installs on
//! its [`RealtimeChannel`](crate::channel::RealtimeChannel). It borrows the
//! shared [`ConnectionState`] and [`DeferredAction`] for the duration of one
//! poll and:
//!
//! - answers heartbeats
//! - completes the handshake on the namespace acknowledgment
//! - turns capture commands into a deferred request
//! - reports channel loss on the status line
//!
//! It never runs a capture itself; that happens on the main loop.

use log::{debug, info, warn};

use crate::channel::ChannelHandler;
use crate::commands::{DeferredAction, RemoteCommand};
use crate::error::FailureKind;
use crate::protocol::{classify, CommandMatching, InboundFrame, HARDWARE_HELLO, PONG};
use crate::status::{Activity, ConnectionState};
use crate::traits::ChannelEvent;

/// Channel handler that updates the shared state.
pub struct CommandDispatcher<'a> {
    status: &'a mut ConnectionState,
    pending: &'a mut DeferredAction,
    matching: CommandMatching,
}

impl<'a> CommandDispatcher<'a> {
    /// Borrows the state for one poll.
    pub fn new(
        status: &'a mut ConnectionState,
        pending: &'a mut DeferredAction,
        matching: CommandMatching,
    ) -> Self {
        Self {
            status,
            pending,
            matching,
        }
    }

    fn channel_lost(&mut self, kind: FailureKind) {
        let activity = kind.activity().unwrap_or(Activity::ServerOffline);
        self.status.mark_channel_down(activity);
    }

    fn on_message(&mut self, frame: &[u8]) -> Option<&'static str> {
        match classify(frame, self.matching) {
            InboundFrame::Heartbeat => Some(PONG),
            InboundFrame::NamespaceAck => {
                info!("[WS] Namespace joined");
                self.status.mark_handshake_complete();
                Some(HARDWARE_HELLO)
            }
            InboundFrame::Command(RemoteCommand::TakePhoto) => {
                if self.pending.request() {
                    info!("[CMD] take_photo received");
                } else {
                    info!("[CMD] take_photo coalesced into pending request");
                }
                None
            }
            InboundFrame::Ignored => {
                debug!("[WS] Ignored frame ({} bytes)", frame.len());
                None
            }
        }
    }
}

impl ChannelHandler for CommandDispatcher<'_> {
    fn on_event(&mut self, event: &ChannelEvent) -> Option<&'static str> {
        match event {
            ChannelEvent::Opened => None,
            ChannelEvent::Closed => {
                warn!("[WS] {}", FailureKind::ChannelDisconnected);
                self.channel_lost(FailureKind::ChannelDisconnected);
                None
            }
            ChannelEvent::Error(detail) => {
                warn!("[WS] {}: {}", FailureKind::ChannelError, detail);
                self.channel_lost(FailureKind::ChannelError);
                None
            }
            ChannelEvent::Message(frame) => self.on_message(frame),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn msg(text: &str) -> ChannelEvent {
        ChannelEvent::Message(text.as_bytes().to_vec())
    }

    fn dispatch(
        events: &[ChannelEvent],
        status: &mut ConnectionState,
        pending: &mut DeferredAction,
    ) -> Vec<Option<&'static str>> {
        let mut dispatcher = CommandDispatcher::new(status, pending, CommandMatching::Substring);
        events.iter().map(|e| dispatcher.on_event(e)).collect()
    }

    #[test]
    fn heartbeat_gets_pong_only() {
        let mut status = ConnectionState::new();
        let mut pending = DeferredAction::new();
        let replies = dispatch(&[msg("2")], &mut status, &mut pending);
        assert_eq!(replies, [Some("3")]);
        assert_eq!(status, ConnectionState::new());
        assert!(!pending.is_pending());
    }

    #[test]
    fn ack_completes_handshake_and_says_hello() {
        let mut status = ConnectionState::new();
        let mut pending = DeferredAction::new();
        let replies = dispatch(&[msg("40{\"sid\":\"a\"}")], &mut status, &mut pending);
        assert_eq!(replies, [Some("42[\"hardware_hello\",{}]")]);
        assert!(status.channel());
        assert_eq!(status.activity(), Activity::Ready);
    }

    #[test]
    fn command_sets_pending_without_reply() {
        let mut status = ConnectionState::new();
        let mut pending = DeferredAction::new();
        let replies = dispatch(
            &[msg("42[\"take_photo\",{}]"), msg("42[\"take_photo\",{}]")],
            &mut status,
            &mut pending,
        );
        assert_eq!(replies, [None, None]);
        assert!(pending.take());
        assert!(!pending.take());
        assert_eq!(status.activity(), Activity::Booting);
    }

    #[test]
    fn close_and_error_take_channel_down() {
        let mut status = ConnectionState::new();
        let mut pending = DeferredAction::new();
        dispatch(&[msg("40")], &mut status, &mut pending);

        dispatch(&[ChannelEvent::Closed], &mut status, &mut pending);
        assert!(!status.channel());
        assert_eq!(status.activity(), Activity::ServerOffline);

        dispatch(&[msg("40")], &mut status, &mut pending);
        dispatch(&[ChannelEvent::Error("x".into())], &mut status, &mut pending);
        assert!(!status.channel());
        assert_eq!(status.activity(), Activity::SocketError);
    }

    #[test]
    fn open_does_not_touch_state() {
        let mut status = ConnectionState::new();
        let mut pending = DeferredAction::new();
        let replies = dispatch(&[ChannelEvent::Opened], &mut status, &mut pending);
        assert_eq!(replies, [None]);
        assert!(!status.channel());
    }

    #[test]
    fn strict_matching_ignores_payload_mentions() {
        let mut status = ConnectionState::new();
        let mut pending = DeferredAction::new();
        let mut dispatcher =
            CommandDispatcher::new(&mut status, &mut pending, CommandMatching::EventName);
        dispatcher.on_event(&msg("42[\"chat\",\"take_photo\"]"));
        assert!(!pending.is_pending());
    }
}
