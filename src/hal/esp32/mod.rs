//! AI-Thinker ESP32-CAM hardware abstraction layer.
//!
//! This module provides hardware implementations for the ESP32-CAM board
//! with an OV2640 sensor, a capture button and an SSD1306 status display.
//!
//! # Hardware Configuration
//!
//! - **MCU**: ESP32 (Xtensa dual core 240MHz, 4MB Flash, 4MB PSRAM on most boards)
//! - **Sensor**: OV2640 on the camera connector
//! - **Button**: momentary switch to GND on GPIO13 (internal pull-up)
//! - **Indicator**: onboard flash LED on GPIO4
//! - **Display**: SSD1306 128x64 OLED (I2C) on GPIO15/14
//!
//! # Pin Assignments
//!
//! See the [`pins`] module for GPIO assignments.

mod clock;
mod gpio;

pub use clock::{Esp32Clock, Esp32Delay};
pub use gpio::{ButtonTrigger, LedIndicator};

#[cfg(feature = "camera")]
mod camera;
#[cfg(feature = "camera")]
pub use camera::{CameraFrame, CameraSettings, Esp32Camera};

#[cfg(feature = "display")]
mod display;
#[cfg(feature = "display")]
pub use display::{DisplayError, Esp32Display};

#[cfg(feature = "wifi")]
mod time;
#[cfg(feature = "wifi")]
pub use time::{Esp32Sntp, Esp32TimeSource};

#[cfg(feature = "wifi")]
mod wifi;
#[cfg(feature = "wifi")]
pub use wifi::Esp32Wifi;

#[cfg(feature = "esp32-upload")]
mod upload;
#[cfg(feature = "esp32-upload")]
pub use upload::Esp32Uploader;

#[cfg(feature = "esp32-socket")]
mod socket;
#[cfg(feature = "esp32-socket")]
pub use socket::Esp32Socket;

/// Pin assignments for the AI-Thinker ESP32-CAM.
///
/// The camera pins are fixed by the board; the button, LED and I2C bus use
/// the few GPIOs the camera and SD slot leave free.
pub mod pins {
    // =========================================================================
    // User I/O
    // =========================================================================

    /// Capture button (active low, internal pull-up)
    pub const TRIGGER: i32 = 13;

    /// Status LED (the onboard flash LED)
    pub const STATUS_LED: i32 = 4;

    // =========================================================================
    // I2C Display (SSD1306)
    // =========================================================================

    /// I2C data line
    pub const I2C_SDA: i32 = 15;

    /// I2C clock line
    pub const I2C_SCL: i32 = 14;

    /// Default I2C address for SSD1306 OLED
    pub const OLED_I2C_ADDR: u8 = 0x3C;

    // =========================================================================
    // Camera (OV2640)
    // =========================================================================

    /// Sensor power down
    pub const CAM_PWDN: i32 = 32;
    /// Sensor reset (not connected)
    pub const CAM_RESET: i32 = -1;
    /// Sensor master clock
    pub const CAM_XCLK: i32 = 0;
    /// SCCB data
    pub const CAM_SIOD: i32 = 26;
    /// SCCB clock
    pub const CAM_SIOC: i32 = 27;
    /// Data lines D7..D0
    pub const CAM_DATA: [i32; 8] = [35, 34, 39, 36, 21, 19, 18, 5];
    /// Vertical sync
    pub const CAM_VSYNC: i32 = 25;
    /// Horizontal reference
    pub const CAM_HREF: i32 = 23;
    /// Pixel clock
    pub const CAM_PCLK: i32 = 22;
    /// Master clock frequency
    pub const CAM_XCLK_HZ: i32 = 20_000_000;
}
