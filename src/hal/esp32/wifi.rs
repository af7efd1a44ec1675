//! WiFi station for the ESP32-CAM.
//!
//! The driver is brought up at construction; [`Connectivity::join`] then
//! connects and polls the link until it has an address or the timeout
//! expires.
//!
//! # Example
//!
//! ```ignore
//! use snapcam::hal::esp32::Esp32Wifi;
//! use snapcam::config::WifiConfig;
//! use snapcam::traits::Connectivity;
//!
//! let config = WifiConfig::default()
//!     .with_ssid("MyNetwork")
//!     .with_password("secret123");
//!
//! let mut wifi = Esp32Wifi::new(modem, sysloop, nvs, &config)?;
//! wifi.join(config.connect_timeout_ms)?;
//! ```

use crate::config::WifiConfig;
use crate::traits::Connectivity;
use anyhow::anyhow;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};
use log::{info, warn};
use std::net::Ipv4Addr;

/// WiFi station for ESP32.
pub struct Esp32Wifi<'a> {
    wifi: BlockingWifi<EspWifi<'a>>,
    poll_interval_ms: u32,
}

impl<'a> Esp32Wifi<'a> {
    /// Creates the driver and applies the station configuration.
    ///
    /// Does not connect; call [`Connectivity::join`].
    ///
    /// # Errors
    ///
    /// Returns an error if driver initialization or configuration fails.
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
        config: &WifiConfig,
    ) -> anyhow::Result<Self> {
        let esp_wifi = EspWifi::new(modem, sysloop.clone(), nvs)?;
        let mut wifi = BlockingWifi::wrap(esp_wifi, sysloop)?;

        // Create heapless strings for esp-idf
        let mut ssid: heapless::String<32> = heapless::String::new();
        let _ = ssid.push_str(config.ssid.as_str());

        let mut password: heapless::String<64> = heapless::String::new();
        let _ = password.push_str(config.password.as_str());

        let auth_method = if password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };

        wifi.set_configuration(&Configuration::Client(ClientConfiguration {
            ssid,
            password,
            auth_method,
            ..Default::default()
        }))?;

        info!("[WiFi] Starting...");
        wifi.start()?;

        Ok(Self {
            wifi,
            poll_interval_ms: config.poll_interval_ms.max(1),
        })
    }

    /// Get the current IP address, if connected.
    pub fn ip_addr(&self) -> Option<Ipv4Addr> {
        self.wifi
            .wifi()
            .sta_netif()
            .get_ip_info()
            .ok()
            .map(|info| info.ip)
    }
}

impl Connectivity for Esp32Wifi<'_> {
    type Error = anyhow::Error;

    fn join(&mut self, timeout_ms: u32) -> anyhow::Result<()> {
        info!("[WiFi] Connecting...");
        // Non-blocking connect on the inner driver; the link is polled below
        self.wifi.wifi_mut().connect()?;

        let mut waited = 0;
        while !self.wifi.wifi().is_up()? {
            if waited >= timeout_ms {
                warn!("[WiFi] No link after {} ms", waited);
                if let Err(e) = self.wifi.wifi_mut().disconnect() {
                    warn!("[WiFi] Disconnect after timeout failed: {:?}", e);
                }
                return Err(anyhow!("WiFi join timed out after {} ms", timeout_ms));
            }
            FreeRtos::delay_ms(self.poll_interval_ms);
            waited += self.poll_interval_ms;
        }

        if let Some(ip) = self.ip_addr() {
            info!("[WiFi] Connected! IP: {}", ip);
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }
}
