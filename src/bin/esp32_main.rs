//! ESP32-CAM capture-and-upload firmware.
//!
//! This is the main entry point for the camera board. After bring-up it
//! runs the main loop forever:
//! - Services the realtime channel (heartbeats, handshake, remote commands)
//! - Refreshes the OLED status once per second
//! - Takes and uploads a picture on a button press or a `take_photo` event
//!
//! # Boot Order
//!
//! 1. Display (fatal on failure), boot splash
//! 2. Button and status LED (LED off)
//! 3. Camera (non-fatal on failure)
//! 4. WiFi join, bounded by the join timeout
//! 5. SNTP, only if WiFi joined
//! 6. Realtime channel connect
//!
//! # Build
//!
//! ```bash
//! WIFI_SSID=studio WIFI_PASSWORD=secret SERVER_HOST=192.168.137.1 \
//!     cargo build --release --features firmware --bin esp32_main
//! ```

use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{PinDriver, Pull};
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::prelude::*;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::log::EspLogger;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{error, info, warn};
use snapcam::config::{Config, ServerConfig, WifiConfig};
use snapcam::hal::esp32::{
    ButtonTrigger, CameraSettings, Esp32Camera, Esp32Clock, Esp32Delay, Esp32Display, Esp32Sntp,
    Esp32Socket, Esp32TimeSource, Esp32Uploader, Esp32Wifi, LedIndicator,
};
use snapcam::traits::Clock;
use snapcam::{CaptureController, CapturePipeline, RealtimeChannel, StatusRenderer};

/// Pause between loop iterations, so the idle task can feed the watchdog.
const LOOP_INTERVAL_MS: u32 = 10;

fn main() -> anyhow::Result<()> {
    // Initialize ESP-IDF
    esp_idf_hal::sys::link_patches();
    EspLogger::initialize_default();

    info!("snapcam {} starting", env!("CARGO_PKG_VERSION"));

    // =========================================================================
    // Configuration
    // =========================================================================
    let config = Config::default()
        .with_wifi(
            WifiConfig::default()
                .with_ssid(option_env!("WIFI_SSID").unwrap_or(""))
                .with_password(option_env!("WIFI_PASSWORD").unwrap_or("")),
        )
        .with_server(
            ServerConfig::default()
                .with_host(option_env!("SERVER_HOST").unwrap_or("192.168.137.1")),
        );

    let peripherals = Peripherals::take()?;

    // =========================================================================
    // Display (SSD1306 on GPIO15/14) - required
    // =========================================================================
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio15, // SDA
        peripherals.pins.gpio14, // SCL
        &I2cConfig::new().baudrate(400.kHz().into()),
    )?;
    let mut renderer = StatusRenderer::new(
        Esp32Display::new(i2c),
        Esp32TimeSource::new(&config.time),
        config.timing.render_interval_ms,
    );
    if let Err(e) = renderer.init() {
        error!("[Display] SSD1306 init failed: {:?}; halting", e);
        loop {
            FreeRtos::delay_ms(1000);
        }
    }

    // =========================================================================
    // Button (GPIO13, active low) and status LED (GPIO4)
    // =========================================================================
    let mut button_pin = PinDriver::input(peripherals.pins.gpio13)?;
    button_pin.set_pull(Pull::Up)?;
    let trigger = ButtonTrigger::new(button_pin);
    let led = LedIndicator::new(PinDriver::output(peripherals.pins.gpio4)?)?;

    // =========================================================================
    // Camera
    // =========================================================================
    let (camera, camera_result) = match Esp32Camera::init(CameraSettings::detect()) {
        Ok(camera) => (camera, Ok(())),
        Err(e) => (Esp32Camera::unavailable(), Err(e)),
    };

    let pipeline = CapturePipeline::new(
        camera,
        Esp32Uploader::default(),
        led,
        Esp32Delay::new(),
        config.pipeline(),
    );
    let channel = RealtimeChannel::new(Esp32Socket::default(), config.server.reconnect_interval_ms);
    let mut controller = CaptureController::new(channel, trigger, renderer, pipeline)
        .with_matching(config.server.matching)
        .with_debounce_ms(config.timing.debounce_ms);

    controller.report_camera_init(camera_result);

    // =========================================================================
    // WiFi and time
    // =========================================================================
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    if !config.wifi.is_configured() {
        warn!("[WiFi] No SSID configured; set WIFI_SSID at build time");
    }
    let mut wifi = Esp32Wifi::new(peripherals.modem, sysloop, Some(nvs), &config.wifi)?;
    let joined = controller.join_network(&mut wifi, config.wifi.connect_timeout_ms);

    // Syncs for as long as this lives
    let mut sntp: Option<Esp32Sntp> = None;
    if joined {
        controller.sync_time(
            || {
                sntp = Some(Esp32Sntp::start(&config.time)?);
                Ok::<(), anyhow::Error>(())
            },
            config.time.sync_hold_ms,
        );
    }
    if let Some(sntp) = &sntp {
        if !sntp.is_synced() {
            info!("[Time] First sync still pending; clock shows once it lands");
        }
    }

    // =========================================================================
    // Realtime channel
    // =========================================================================
    controller.connect_channel(&config.server.endpoint());

    // =========================================================================
    // Main loop
    // =========================================================================
    let clock = Esp32Clock::new();
    info!("[Main] Entering main loop");
    loop {
        controller.tick(clock.now_ms());
        FreeRtos::delay_ms(LOOP_INTERVAL_MS);
    }
}
