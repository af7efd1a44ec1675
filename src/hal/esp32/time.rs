//! Wall-clock time: SNTP client and local time of day.

use crate::config::TimeConfig;
use crate::traits::{ClockTime, TimeSource};
use esp_idf_svc::sntp::{EspSntp, SntpConf, SyncStatus};
use log::info;
use std::time::{SystemTime, UNIX_EPOCH};

/// Running SNTP client. Time keeps syncing for as long as this is alive.
pub struct Esp32Sntp {
    sntp: EspSntp<'static>,
}

impl Esp32Sntp {
    /// Starts syncing against the configured server.
    ///
    /// Returns immediately; the first sync completes in the background.
    pub fn start(config: &TimeConfig) -> anyhow::Result<Self> {
        let mut conf = SntpConf::default();
        conf.servers[0] = config.ntp_server.as_str();
        let sntp = EspSntp::new(&conf)?;
        info!("[Time] SNTP started against {}", config.ntp_server);
        Ok(Self { sntp })
    }

    /// Whether the first sync has completed.
    pub fn is_synced(&self) -> bool {
        self.sntp.get_sync_status() == SyncStatus::Completed
    }
}

/// Local time of day from the system clock.
///
/// Reports no time until the clock has been set.
#[derive(Clone, Copy, Debug)]
pub struct Esp32TimeSource {
    offset_secs: i32,
}

impl Esp32TimeSource {
    /// Creates a source for the configured time zone.
    pub fn new(config: &TimeConfig) -> Self {
        Self {
            offset_secs: config.local_offset_secs(),
        }
    }
}

impl TimeSource for Esp32TimeSource {
    fn local_time(&self) -> Option<ClockTime> {
        let secs = SystemTime::now().duration_since(UNIX_EPOCH).ok()?.as_secs();
        ClockTime::from_unix(secs as i64, self.offset_secs)
    }
}
