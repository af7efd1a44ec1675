//! Build-time configuration for the camera firmware.
//!
//! Uses `heapless::String` for `no_std` compatibility while remaining
//! ergonomic to use on desktop with `std`. `Config::default()` carries the
//! deployed values; the binary overrides credentials from the build
//! environment.
//!
//! # Example
//!
//! ```rust
//! use snapcam::config::{Config, ServerConfig, WifiConfig};
//!
//! // Use defaults
//! let config = Config::default();
//! assert_eq!(config.server.upload_url(), "http://192.168.137.1:5000/api/upload");
//!
//! // Or customize
//! let config = Config::default()
//!     .with_wifi(WifiConfig::default().with_ssid("studio").with_password("secret"))
//!     .with_server(ServerConfig::default().with_host("10.0.0.2").with_port(8080));
//! assert_eq!(config.server.endpoint().ws_uri(),
//!            "ws://10.0.0.2:8080/socket.io/?EIO=4&transport=websocket");
//! ```

extern crate alloc;
use alloc::format;
use alloc::string::String;

use heapless::String as HString;

use crate::pipeline::PipelineConfig;
use crate::protocol::CommandMatching;
use crate::traits::{Endpoint, PulsePattern};

/// Maximum length for short config strings (hostnames, SSIDs)
pub const MAX_SHORT_STRING: usize = 64;

/// Maximum length for longer config strings (request paths)
pub const MAX_LONG_STRING: usize = 128;

/// Type alias for short config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

/// Type alias for longer config strings
pub type LongString = HString<MAX_LONG_STRING>;

// ============================================================================
// Helper for creating heapless strings
// ============================================================================

fn truncated<const N: usize>(s: &str) -> HString<N> {
    let mut hs = HString::new();
    let take = s.len().min(N);
    // Cut on a char boundary
    let valid_end = s
        .char_indices()
        .take_while(|(i, c)| i + c.len_utf8() <= take)
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    let _ = hs.push_str(&s[..valid_end]);
    hs
}

/// Create a ShortString from a &str, truncating if too long
pub fn short_string(s: &str) -> ShortString {
    truncated(s)
}

/// Create a LongString from a &str, truncating if too long
pub fn long_string(s: &str) -> LongString {
    truncated(s)
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete firmware configuration
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// WiFi station configuration
    pub wifi: WifiConfig,
    /// Realtime channel and upload server
    pub server: ServerConfig,
    /// SNTP and local time zone
    pub time: TimeConfig,
    /// Main loop timings
    pub timing: TimingConfig,
    /// Status LED patterns
    pub indicator: IndicatorConfig,
}

impl Config {
    /// Set WiFi configuration
    pub fn with_wifi(mut self, wifi: WifiConfig) -> Self {
        self.wifi = wifi;
        self
    }

    /// Set server configuration
    pub fn with_server(mut self, server: ServerConfig) -> Self {
        self.server = server;
        self
    }

    /// Set time configuration
    pub fn with_time(mut self, time: TimeConfig) -> Self {
        self.time = time;
        self
    }

    /// Set loop timings
    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    /// Set indicator patterns
    pub fn with_indicator(mut self, indicator: IndicatorConfig) -> Self {
        self.indicator = indicator;
        self
    }

    /// Capture pipeline parameters derived from this configuration.
    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            upload_url: self.server.upload_url(),
            settle_ms: self.timing.settle_ms,
            action_pulse: self.indicator.action,
            failure_pulse: self.indicator.failure,
        }
    }
}

// ============================================================================
// WiFi Config
// ============================================================================

/// WiFi station configuration
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WifiConfig {
    /// WiFi network SSID
    pub ssid: ShortString,
    /// WiFi password (empty = open network)
    pub password: ShortString,
    /// Join timeout in milliseconds
    pub connect_timeout_ms: u32,
    /// Interval between link checks while joining
    pub poll_interval_ms: u32,
}

impl Default for WifiConfig {
    fn default() -> Self {
        Self {
            ssid: ShortString::new(),
            password: ShortString::new(),
            connect_timeout_ms: 15_000,
            poll_interval_ms: 500,
        }
    }
}

impl WifiConfig {
    /// Set the SSID
    pub fn with_ssid(mut self, ssid: &str) -> Self {
        self.ssid = short_string(ssid);
        self
    }

    /// Set the password
    pub fn with_password(mut self, password: &str) -> Self {
        self.password = short_string(password);
        self
    }

    /// Set the join timeout
    pub fn with_connect_timeout_ms(mut self, ms: u32) -> Self {
        self.connect_timeout_ms = ms;
        self
    }

    /// Set the link check interval
    pub fn with_poll_interval_ms(mut self, ms: u32) -> Self {
        self.poll_interval_ms = ms.max(1);
        self
    }

    /// Whether an SSID has been set
    pub fn is_configured(&self) -> bool {
        !self.ssid.is_empty()
    }
}

// ============================================================================
// Server Config
// ============================================================================

/// Server endpoints
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServerConfig {
    /// Server hostname or IP
    pub host: ShortString,
    /// Server port, shared by the socket and the upload endpoint
    pub port: u16,
    /// Realtime channel request path
    pub socket_path: LongString,
    /// Upload request path
    pub upload_path: LongString,
    /// Delay before reopening a dropped channel
    pub reconnect_interval_ms: u32,
    /// How capture commands are recognized
    pub matching: CommandMatching,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: short_string("192.168.137.1"),
            port: 5000,
            socket_path: long_string("/socket.io/?EIO=4&transport=websocket"),
            upload_path: long_string("/api/upload"),
            reconnect_interval_ms: 5000,
            matching: CommandMatching::Substring,
        }
    }
}

impl ServerConfig {
    /// Set the server host
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = short_string(host);
        self
    }

    /// Set the server port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the realtime channel path
    pub fn with_socket_path(mut self, path: &str) -> Self {
        self.socket_path = long_string(path);
        self
    }

    /// Set the upload path
    pub fn with_upload_path(mut self, path: &str) -> Self {
        self.upload_path = long_string(path);
        self
    }

    /// Set the reconnect interval
    pub fn with_reconnect_interval_ms(mut self, ms: u32) -> Self {
        self.reconnect_interval_ms = ms;
        self
    }

    /// Set the command matching mode
    pub fn with_matching(mut self, matching: CommandMatching) -> Self {
        self.matching = matching;
        self
    }

    /// Upload URL, `http://host:port/upload_path`
    pub fn upload_url(&self) -> String {
        format!("http://{}:{}{}", self.host, self.port, self.upload_path)
    }

    /// Realtime channel endpoint
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.host.as_str(), self.port, self.socket_path.as_str())
    }
}

// ============================================================================
// Time Config
// ============================================================================

/// SNTP and time zone
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeConfig {
    /// NTP server
    pub ntp_server: ShortString,
    /// Offset from UTC in seconds
    pub gmt_offset_secs: i32,
    /// Extra daylight saving offset in seconds
    pub dst_offset_secs: i32,
    /// Hold after starting time sync, before continuing boot
    pub sync_hold_ms: u32,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            ntp_server: short_string("pool.ntp.org"),
            gmt_offset_secs: 8 * 3600,
            dst_offset_secs: 0,
            sync_hold_ms: 1000,
        }
    }
}

impl TimeConfig {
    /// Set the NTP server
    pub fn with_ntp_server(mut self, server: &str) -> Self {
        self.ntp_server = short_string(server);
        self
    }

    /// Set the UTC and DST offsets
    pub fn with_offsets(mut self, gmt_secs: i32, dst_secs: i32) -> Self {
        self.gmt_offset_secs = gmt_secs;
        self.dst_offset_secs = dst_secs;
        self
    }

    /// Total local offset from UTC
    pub fn local_offset_secs(&self) -> i32 {
        self.gmt_offset_secs + self.dst_offset_secs
    }
}

// ============================================================================
// Timing Config
// ============================================================================

/// Main loop timings
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimingConfig {
    /// Status render cadence
    pub render_interval_ms: u32,
    /// Hold after a finished capture before returning to Ready
    pub settle_ms: u32,
    /// Hold after a button-triggered capture
    pub debounce_ms: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            render_interval_ms: 1000,
            settle_ms: 2000,
            debounce_ms: 1000,
        }
    }
}

impl TimingConfig {
    /// Set the render cadence
    pub fn with_render_interval_ms(mut self, ms: u32) -> Self {
        self.render_interval_ms = ms;
        self
    }

    /// Set the settle hold
    pub fn with_settle_ms(mut self, ms: u32) -> Self {
        self.settle_ms = ms;
        self
    }

    /// Set the button debounce hold
    pub fn with_debounce_ms(mut self, ms: u32) -> Self {
        self.debounce_ms = ms;
        self
    }
}

// ============================================================================
// Indicator Config
// ============================================================================

/// Status LED blink patterns
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndicatorConfig {
    /// Played when a capture starts
    pub action: PulsePattern,
    /// Played when a capture fails
    pub failure: PulsePattern,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            action: PulsePattern::new(1, 50),
            failure: PulsePattern::new(3, 300),
        }
    }
}

impl IndicatorConfig {
    /// Set the action pattern
    pub fn with_action(mut self, pattern: PulsePattern) -> Self {
        self.action = pattern;
        self
    }

    /// Set the failure pattern
    pub fn with_failure(mut self, pattern: PulsePattern) -> Self {
        self.failure = pattern;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.server.host.as_str(), "192.168.137.1");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.reconnect_interval_ms, 5000);
        assert_eq!(config.server.matching, CommandMatching::Substring);
        assert_eq!(config.wifi.connect_timeout_ms, 15_000);
        assert_eq!(config.time.ntp_server.as_str(), "pool.ntp.org");
        assert_eq!(config.time.local_offset_secs(), 28_800);
        assert_eq!(config.timing, TimingConfig::default());
    }

    #[test]
    fn server_urls() {
        let server = ServerConfig::default();
        assert_eq!(server.upload_url(), "http://192.168.137.1:5000/api/upload");
        assert_eq!(
            server.endpoint(),
            Endpoint::new("192.168.137.1", 5000, "/socket.io/?EIO=4&transport=websocket")
        );
    }

    #[test]
    fn short_string_truncation() {
        let long = "a".repeat(100);
        assert_eq!(short_string(&long).len(), MAX_SHORT_STRING);
        assert_eq!(long_string(&long).len(), 100);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        // 63 ASCII bytes + a 2-byte char would overflow 64
        let mut s = "a".repeat(63);
        s.push('é');
        let hs = short_string(&s);
        assert_eq!(hs.len(), 63);
    }

    #[test]
    fn builder_pattern() {
        let config = Config::default()
            .with_server(
                ServerConfig::default()
                    .with_host("cam.local")
                    .with_port(80)
                    .with_upload_path("/upload")
                    .with_matching(CommandMatching::EventName),
            )
            .with_timing(TimingConfig::default().with_debounce_ms(250))
            .with_time(TimeConfig::default().with_offsets(0, 3600));

        assert_eq!(config.server.upload_url(), "http://cam.local:80/upload");
        assert_eq!(config.server.matching, CommandMatching::EventName);
        assert_eq!(config.timing.debounce_ms, 250);
        assert_eq!(config.time.local_offset_secs(), 3600);
    }

    #[test]
    fn wifi_config_is_configured() {
        assert!(!WifiConfig::default().is_configured());
        assert!(WifiConfig::default().with_ssid("MyNetwork").is_configured());
        assert!(!WifiConfig::default().with_ssid("").is_configured());
    }

    #[test]
    fn wifi_poll_interval_never_zero() {
        assert_eq!(WifiConfig::default().with_poll_interval_ms(0).poll_interval_ms, 1);
    }

    #[test]
    fn pipeline_config_from_sections() {
        let config = Config::default()
            .with_timing(TimingConfig::default().with_settle_ms(10))
            .with_indicator(IndicatorConfig::default().with_action(PulsePattern::new(2, 5)));
        let p = config.pipeline();
        assert_eq!(p.upload_url, "http://192.168.137.1:5000/api/upload");
        assert_eq!(p.settle_ms, 10);
        assert_eq!(p.action_pulse, PulsePattern::new(2, 5));
        assert_eq!(p.failure_pulse, PulsePattern::new(3, 300));
    }
}
