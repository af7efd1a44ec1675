//! Realtime channel frame vocabulary.
//!
//! The server speaks Engine.IO v4 / Socket.IO over a WebSocket. The device
//! implements only the slice it needs:
//!
//! | Frame | Direction | Meaning |
//! |-------|-----------|---------|
//! | `40` | out | Namespace join probe, sent on open |
//! | `2` | in | Heartbeat ping |
//! | `3` | out | Heartbeat pong |
//! | `40...` | in | Namespace join acknowledgment |
//! | `42["hardware_hello",{}]` | out | Device announcement after the ack |
//! | `...take_photo...` | in | Remote capture command |
//!
//! [`classify`] applies these rules in a fixed order; the first match wins.

use crate::commands::RemoteCommand;

/// Namespace join probe, sent when the socket opens.
pub const PROBE: &str = "40";

/// Heartbeat reply.
pub const PONG: &str = "3";

/// Announcement sent once the namespace join is acknowledged.
pub const HARDWARE_HELLO: &str = "42[\"hardware_hello\",{}]";

/// Event name of the remote capture command.
pub const TAKE_PHOTO_EVENT: &str = "take_photo";

/// Prefix of an event message frame.
pub const EVENT_PREFIX: &str = "42";

/// How inbound frames are recognized as capture commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CommandMatching {
    /// Any frame containing `take_photo` anywhere triggers a capture.
    #[default]
    Substring,
    /// Only an event frame whose event name is exactly `take_photo`.
    EventName,
}

/// Classification of one inbound frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InboundFrame {
    /// Heartbeat ping; answer with [`PONG`].
    Heartbeat,
    /// Namespace join acknowledged; the handshake is complete.
    NamespaceAck,
    /// A recognized remote command.
    Command(RemoteCommand),
    /// Anything else.
    Ignored,
}

/// Classifies an inbound frame.
///
/// Rules, first match wins:
///
/// 1. first byte `2` → [`InboundFrame::Heartbeat`]
/// 2. first bytes `4`,`0` → [`InboundFrame::NamespaceAck`]
/// 3. capture command per `matching` → [`InboundFrame::Command`]
/// 4. otherwise [`InboundFrame::Ignored`]
///
/// # Examples
///
/// ```
/// use snapcam::protocol::{classify, CommandMatching, InboundFrame};
/// use snapcam::RemoteCommand;
///
/// let m = CommandMatching::Substring;
/// assert_eq!(classify(b"2", m), InboundFrame::Heartbeat);
/// assert_eq!(classify(b"40{\"sid\":\"abc\"}", m), InboundFrame::NamespaceAck);
/// assert_eq!(
///     classify(b"42[\"take_photo\",{}]", m),
///     InboundFrame::Command(RemoteCommand::TakePhoto)
/// );
/// assert_eq!(classify(b"42[\"chat\",\"hi\"]", m), InboundFrame::Ignored);
/// ```
pub fn classify(frame: &[u8], matching: CommandMatching) -> InboundFrame {
    match frame {
        [] => InboundFrame::Ignored,
        [b'2', ..] => InboundFrame::Heartbeat,
        [b'4', b'0', ..] => InboundFrame::NamespaceAck,
        _ if is_take_photo(frame, matching) => InboundFrame::Command(RemoteCommand::TakePhoto),
        _ => InboundFrame::Ignored,
    }
}

fn is_take_photo(frame: &[u8], matching: CommandMatching) -> bool {
    match matching {
        CommandMatching::Substring => contains(frame, TAKE_PHOTO_EVENT.as_bytes()),
        CommandMatching::EventName => event_name(frame) == Some(TAKE_PHOTO_EVENT),
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Extracts the event name from a Socket.IO event frame.
///
/// Accepts `42["name",...]`, with an optional namespace (`42/ns,[...]`)
/// and an optional numeric ack id (`4217[...]`). Returns `None` for any
/// other shape, including names containing escape sequences.
///
/// # Examples
///
/// ```
/// use snapcam::protocol::event_name;
///
/// assert_eq!(event_name(b"42[\"take_photo\",{}]"), Some("take_photo"));
/// assert_eq!(event_name(b"42/cam,5[\"take_photo\"]"), Some("take_photo"));
/// assert_eq!(event_name(b"42[\"note\",\"take_photo\"]"), Some("note"));
/// assert_eq!(event_name(b"2"), None);
/// ```
pub fn event_name(frame: &[u8]) -> Option<&str> {
    let text = core::str::from_utf8(frame).ok()?;
    let mut rest = text.strip_prefix(EVENT_PREFIX)?;

    // Optional namespace, terminated by a comma
    if rest.starts_with('/') {
        let comma = rest.find(',')?;
        rest = &rest[comma + 1..];
    }

    // Optional ack id
    rest = rest.trim_start_matches(|c: char| c.is_ascii_digit());

    let rest = rest.strip_prefix('[')?.trim_start();
    let rest = rest.strip_prefix('"')?;
    let end = rest.find('"')?;
    let name = &rest[..end];
    if name.contains('\\') {
        return None;
    }
    Some(name)
}
