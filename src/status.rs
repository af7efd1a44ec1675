//! Status projection: shared connection/activity state and its rendering.
//!
//! [`ConnectionState`] is the single blackboard written by the WiFi join,
//! the realtime channel dispatcher, the capture pipeline, and the main
//! loop. It is owned by the [`CaptureController`](crate::CaptureController)
//! and lent out by reference; there is no global state.
//!
//! Rendering is split in two:
//!
//! - [`render_lines`] is a pure function from state and time to four text lines
//! - [`StatusRenderer`] pushes those lines to a [`StatusDisplay`] on a fixed
//!   cadence, or immediately when a component changes the activity
//!
//! # Example
//!
//! ```rust
//! use snapcam::{Activity, ConnectionState, render_lines};
//! use snapcam::traits::ClockTime;
//!
//! let mut state = ConnectionState::new();
//! state.set_network(true);
//! state.mark_handshake_complete();
//!
//! let time = ClockTime { hour: 9, minute: 30, second: 0 };
//! let lines = render_lines(&state, Some(time));
//! assert_eq!(lines.time.as_str(), "Time: 09:30:00");
//! assert_eq!(lines.network.as_str(), "Wi-Fi: Connected");
//! assert_eq!(lines.channel.as_str(), "Server: Connected");
//! assert_eq!(lines.activity.as_str(), "Status: Ready");
//! ```

use core::fmt::Write;

use heapless::String as HString;
use log::warn;

use crate::traits::{ClockTime, StatusDisplay, TimeSource};

/// Maximum characters kept per status line. Longer than a panel row;
/// displays wrap with [`wrap_line`].
pub const LINE_CAPACITY: usize = 32;

/// Columns of the 6x10 font across a 128 px panel.
pub const PANEL_COLUMNS: usize = 21;

/// One rendered status line.
pub type StatusLine = HString<LINE_CAPACITY>;

// ============================================================================
// Activity
// ============================================================================

/// What the device is doing, as shown on the status line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Activity {
    /// Power-on, before any subsystem reported.
    #[default]
    Booting,
    /// WiFi join in progress.
    ConnectingWifi,
    /// WiFi joined.
    WifiConnected,
    /// WiFi join timed out.
    WifiFailed,
    /// SNTP configuration in progress.
    SyncingTime,
    /// SNTP configured.
    TimeSynced,
    /// Realtime channel connect initiated.
    ConnectingServer,
    /// Camera sensor initialized.
    CameraOk,
    /// Camera sensor failed to initialize.
    CameraInitFailed,
    /// Idle and able to capture.
    Ready,
    /// Realtime channel closed.
    ServerOffline,
    /// Realtime channel reported an error.
    SocketError,
    /// Local trigger observed.
    ButtonPressed,
    /// Remote capture command being serviced.
    RemoteCommand,
    /// Acquiring a frame.
    TakingPhoto,
    /// Frame acquisition failed.
    PhotoFailed,
    /// Upload request in flight.
    Uploading,
    /// Upload answered with a status code.
    UploadOk,
    /// Upload got no response.
    UploadFail,
}

impl Activity {
    /// Human-readable phrase shown after `Status: `.
    ///
    /// # Examples
    ///
    /// ```
    /// use snapcam::Activity;
    ///
    /// assert_eq!(Activity::TakingPhoto.phrase(), "Taking Photo...");
    /// assert_eq!(Activity::CameraInitFailed.phrase(), "Cam Init Fail");
    /// ```
    pub const fn phrase(&self) -> &'static str {
        match self {
            Activity::Booting => "Booting...",
            Activity::ConnectingWifi => "Connecting WiFi...",
            Activity::WifiConnected => "WiFi Connected",
            Activity::WifiFailed => "WiFi Failed",
            Activity::SyncingTime => "Syncing Time...",
            Activity::TimeSynced => "Time Synced!",
            Activity::ConnectingServer => "Connecting Server",
            Activity::CameraOk => "Camera OK",
            Activity::CameraInitFailed => "Cam Init Fail",
            Activity::Ready => "Ready",
            Activity::ServerOffline => "Server Offline",
            Activity::SocketError => "Socket Error",
            Activity::ButtonPressed => "Button Pressed",
            Activity::RemoteCommand => "Remote Command",
            Activity::TakingPhoto => "Taking Photo...",
            Activity::PhotoFailed => "Photo Failed",
            Activity::Uploading => "Uploading...",
            Activity::UploadOk => "Upload OK",
            Activity::UploadFail => "Upload Fail",
        }
    }
}

impl core::fmt::Display for Activity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.phrase())
    }
}

// ============================================================================
// Connection State
// ============================================================================

/// Shared network/channel/activity state.
///
/// `channel` can only become true through [`mark_handshake_complete`],
/// and every channel loss goes through [`mark_channel_down`].
///
/// [`mark_handshake_complete`]: Self::mark_handshake_complete
/// [`mark_channel_down`]: Self::mark_channel_down
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConnectionState {
    network: bool,
    channel: bool,
    activity: Activity,
}

impl ConnectionState {
    /// Boot state: everything offline, activity `Booting`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the network is joined.
    #[inline]
    pub fn network(&self) -> bool {
        self.network
    }

    /// Whether the realtime channel completed its handshake.
    #[inline]
    pub fn channel(&self) -> bool {
        self.channel
    }

    /// Current activity.
    #[inline]
    pub fn activity(&self) -> Activity {
        self.activity
    }

    /// Records the network join result.
    pub fn set_network(&mut self, connected: bool) {
        self.network = connected;
    }

    /// Sets the activity phrase.
    pub fn set_activity(&mut self, activity: Activity) {
        self.activity = activity;
    }

    /// Namespace acknowledgment received: channel up, device ready.
    pub fn mark_handshake_complete(&mut self) {
        self.channel = true;
        self.activity = Activity::Ready;
    }

    /// Channel closed or errored: channel down with the given phrase.
    pub fn mark_channel_down(&mut self, activity: Activity) {
        self.channel = false;
        self.activity = activity;
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// The four display lines: time, network, channel, activity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatusLines {
    /// `Time: HH:MM:SS` or `Time: Time not set`.
    pub time: StatusLine,
    /// `Wi-Fi: Connected|Offline`.
    pub network: StatusLine,
    /// `Server: Connected|Offline`.
    pub channel: StatusLine,
    /// `Status: <phrase>`.
    pub activity: StatusLine,
}

impl StatusLines {
    /// Lines in top-to-bottom order.
    pub fn as_array(&self) -> [&str; 4] {
        [
            self.time.as_str(),
            self.network.as_str(),
            self.channel.as_str(),
            self.activity.as_str(),
        ]
    }
}

fn online_str(up: bool) -> &'static str {
    if up {
        "Connected"
    } else {
        "Offline"
    }
}

fn line(args: core::fmt::Arguments<'_>) -> StatusLine {
    let mut s = StatusLine::new();
    // Overlong lines are truncated by capacity; nothing on screen fits more.
    let _ = s.write_fmt(args);
    s
}

/// Renders the state into four text lines.
///
/// Pure: the same state and time always produce the same lines.
pub fn render_lines(state: &ConnectionState, time: Option<ClockTime>) -> StatusLines {
    let time = match time {
        Some(t) => line(format_args!("Time: {}", t)),
        None => line(format_args!("Time: Time not set")),
    };
    StatusLines {
        time,
        network: line(format_args!("Wi-Fi: {}", online_str(state.network))),
        channel: line(format_args!("Server: {}", online_str(state.channel))),
        activity: line(format_args!("Status: {}", state.activity.phrase())),
    }
}

/// Splits `line` into panel rows of at most `columns` characters, the way
/// text running off the right edge continues on the next row.
///
/// # Examples
///
/// ```
/// use snapcam::status::{wrap_line, PANEL_COLUMNS};
///
/// let rows: Vec<&str> = wrap_line("Status: Connecting WiFi...", PANEL_COLUMNS).collect();
/// assert_eq!(rows, ["Status: Connecting Wi", "Fi..."]);
/// ```
pub fn wrap_line(line: &str, columns: usize) -> impl Iterator<Item = &str> + '_ {
    let columns = columns.max(1);
    let mut rest = line;
    core::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let end = rest
            .char_indices()
            .nth(columns)
            .map_or(rest.len(), |(i, _)| i);
        let (row, tail) = rest.split_at(end);
        rest = tail;
        Some(row)
    })
}

/// Something that can show the current state immediately.
///
/// Implemented by [`StatusRenderer`]; the capture pipeline takes any
/// implementor so it can refresh the screen at each phase.
pub trait RenderStatus {
    /// Renders `state` now.
    fn render_now(&mut self, state: &ConnectionState);
}

/// Drives a [`StatusDisplay`] from the connection state.
///
/// Renders on a fixed cadence via [`render_if_due`](Self::render_if_due),
/// and on demand via [`RenderStatus::render_now`]. Write failures after
/// initialization are logged and dropped.
pub struct StatusRenderer<D: StatusDisplay, T: TimeSource> {
    display: D,
    time: T,
    interval_ms: u64,
    last_render_ms: u64,
    render_count: u32,
}

impl<D: StatusDisplay, T: TimeSource> StatusRenderer<D, T> {
    /// Boot splash shown right after display init.
    pub const SPLASH: &'static str = "System Booting...";

    /// Creates a renderer with the given cadence.
    pub fn new(display: D, time: T, interval_ms: u32) -> Self {
        Self {
            display,
            time,
            interval_ms: interval_ms as u64,
            last_render_ms: 0,
            render_count: 0,
        }
    }

    /// Initializes the display and shows the boot splash.
    ///
    /// # Errors
    ///
    /// Returns the display's init error. Callers treat this as fatal.
    pub fn init(&mut self) -> Result<(), D::Error> {
        self.display.init()?;
        self.display.show_message(Self::SPLASH, None)
    }

    /// Renders if more than the cadence interval has passed since the last
    /// cadence render. Returns true if it rendered.
    pub fn render_if_due(&mut self, now_ms: u64, state: &ConnectionState) -> bool {
        if now_ms.saturating_sub(self.last_render_ms) > self.interval_ms {
            self.last_render_ms = now_ms;
            self.render_now(state);
            true
        } else {
            false
        }
    }

    /// Number of renders issued so far.
    pub fn render_count(&self) -> u32 {
        self.render_count
    }

    /// The underlying display.
    pub fn display(&self) -> &D {
        &self.display
    }

    /// Mutable access to the underlying display.
    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    /// The time source.
    pub fn time_source(&self) -> &T {
        &self.time
    }

    /// Mutable access to the time source.
    pub fn time_source_mut(&mut self) -> &mut T {
        &mut self.time
    }
}

impl<D: StatusDisplay, T: TimeSource> RenderStatus for StatusRenderer<D, T> {
    fn render_now(&mut self, state: &ConnectionState) {
        let lines = render_lines(state, self.time.local_time());
        self.render_count = self.render_count.wrapping_add(1);
        if let Err(e) = self.display.draw_lines(&lines) {
            warn!("[Display] draw failed: {:?}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{MockDisplay, MockTime};
    use alloc::vec::Vec;

    #[test]
    fn default_state_is_offline_booting() {
        let state = ConnectionState::new();
        assert!(!state.network());
        assert!(!state.channel());
        assert_eq!(state.activity(), Activity::Booting);
    }

    #[test]
    fn handshake_sets_ready() {
        let mut state = ConnectionState::new();
        state.set_activity(Activity::ConnectingServer);
        state.mark_handshake_complete();
        assert!(state.channel());
        assert_eq!(state.activity(), Activity::Ready);
    }

    #[test]
    fn channel_down_clears_channel() {
        let mut state = ConnectionState::new();
        state.mark_handshake_complete();
        state.mark_channel_down(Activity::SocketError);
        assert!(!state.channel());
        assert_eq!(state.activity(), Activity::SocketError);
    }

    #[test]
    fn render_without_time() {
        let state = ConnectionState::new();
        let lines = render_lines(&state, None);
        assert_eq!(
            lines.as_array(),
            [
                "Time: Time not set",
                "Wi-Fi: Offline",
                "Server: Offline",
                "Status: Booting..."
            ]
        );
    }

    #[test]
    fn render_is_pure() {
        let mut state = ConnectionState::new();
        state.set_network(true);
        state.set_activity(Activity::Uploading);
        let t = Some(ClockTime {
            hour: 23,
            minute: 59,
            second: 59,
        });
        assert_eq!(render_lines(&state, t), render_lines(&state, t));
    }

    #[test]
    fn short_line_is_one_row() {
        let rows: Vec<&str> = wrap_line("Status: Ready", PANEL_COLUMNS).collect();
        assert_eq!(rows, ["Status: Ready"]);
        assert_eq!(wrap_line("", PANEL_COLUMNS).count(), 0);
    }

    #[test]
    fn long_phrases_wrap_at_panel_width() {
        let mut state = ConnectionState::new();
        state.set_network(true);
        state.mark_handshake_complete();
        state.set_activity(Activity::ConnectingWifi);
        let lines = render_lines(&state, None);

        let rows: Vec<&str> = lines
            .as_array()
            .into_iter()
            .flat_map(|l| wrap_line(l, PANEL_COLUMNS))
            .collect();
        assert_eq!(
            rows,
            [
                "Time: Time not set",
                "Wi-Fi: Connected",
                "Server: Connected",
                "Status: Connecting Wi",
                "Fi...",
            ]
        );
        assert!(rows.iter().all(|r| r.chars().count() <= PANEL_COLUMNS));
    }

    #[test]
    fn every_phrase_fits_a_line() {
        let all = [
            Activity::Booting,
            Activity::ConnectingWifi,
            Activity::WifiConnected,
            Activity::WifiFailed,
            Activity::SyncingTime,
            Activity::TimeSynced,
            Activity::ConnectingServer,
            Activity::CameraOk,
            Activity::CameraInitFailed,
            Activity::Ready,
            Activity::ServerOffline,
            Activity::SocketError,
            Activity::ButtonPressed,
            Activity::RemoteCommand,
            Activity::TakingPhoto,
            Activity::PhotoFailed,
            Activity::Uploading,
            Activity::UploadOk,
            Activity::UploadFail,
        ];
        for activity in all {
            let mut state = ConnectionState::new();
            state.set_activity(activity);
            let lines = render_lines(&state, None);
            assert!(lines.activity.as_str().ends_with(activity.phrase()));
        }
    }

    #[test]
    fn renderer_init_shows_splash() {
        let mut renderer = StatusRenderer::new(MockDisplay::new(), MockTime::unset(), 1000);
        renderer.init().unwrap();
        assert!(renderer.display().initialized);
        let (line1, line2) = renderer.display().last_message.clone().unwrap();
        assert_eq!(line1, "System Booting...");
        assert!(line2.is_none());
    }

    #[test]
    fn renderer_cadence() {
        let mut renderer = StatusRenderer::new(MockDisplay::new(), MockTime::unset(), 1000);
        let state = ConnectionState::new();

        assert!(!renderer.render_if_due(500, &state));
        assert!(!renderer.render_if_due(1000, &state));
        assert!(renderer.render_if_due(1001, &state));
        assert!(!renderer.render_if_due(1500, &state));
        assert!(renderer.render_if_due(2002, &state));
        assert_eq!(renderer.display().frames.len(), 2);
    }

    #[test]
    fn renderer_uses_time_source() {
        let time = MockTime::at(ClockTime {
            hour: 12,
            minute: 0,
            second: 1,
        });
        let mut renderer = StatusRenderer::new(MockDisplay::new(), time, 1000);
        renderer.render_now(&ConnectionState::new());
        let frame = renderer.display().last_frame().unwrap();
        assert_eq!(frame.time.as_str(), "Time: 12:00:01");
        assert_eq!(renderer.render_count(), 1);
    }

    #[test]
    fn renderer_survives_draw_failure() {
        let mut display = MockDisplay::new();
        display.fail_draw = true;
        let mut renderer = StatusRenderer::new(display, MockTime::unset(), 1000);
        renderer.render_now(&ConnectionState::new());
        assert_eq!(renderer.render_count(), 1);
        assert!(renderer.display().frames.is_empty());
    }
}
