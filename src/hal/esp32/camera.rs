//! OV2640 frame provider over the esp32-camera driver.
//!
//! The driver owns a small pool of JPEG frame buffers. A [`CameraFrame`]
//! borrows one of them until it is handed back through
//! [`FrameProvider::release`].
//!
//! # Memory Profiles
//!
//! | PSRAM | Frame size | JPEG quality | Buffers | Grab mode |
//! |-------|------------|--------------|---------|-----------|
//! | yes | UXGA 1600x1200 | 10 | 2 | latest |
//! | no | SVGA 800x600 | 12 | 1 | when empty |

use esp_idf_sys::camera::{
    camera_config_t, camera_fb_location_t_CAMERA_FB_IN_DRAM,
    camera_fb_location_t_CAMERA_FB_IN_PSRAM, camera_fb_t, camera_grab_mode_t_CAMERA_GRAB_LATEST,
    camera_grab_mode_t_CAMERA_GRAB_WHEN_EMPTY, esp_camera_fb_get, esp_camera_fb_return,
    esp_camera_init, esp_camera_sensor_get, framesize_t, framesize_t_FRAMESIZE_SVGA,
    framesize_t_FRAMESIZE_UXGA, ledc_channel_t_LEDC_CHANNEL_0, ledc_timer_t_LEDC_TIMER_0,
    pixformat_t_PIXFORMAT_JPEG, ESP_OK,
};
use log::{info, warn};

use super::pins;
use crate::traits::FrameProvider;

/// Frame buffer settings that depend on available memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CameraSettings {
    /// Sensor output resolution.
    pub frame_size: framesize_t,
    /// JPEG quality, 0-63, lower is better.
    pub jpeg_quality: i32,
    /// Number of frame buffers.
    pub fb_count: usize,
    /// Whether frame buffers live in PSRAM.
    pub in_psram: bool,
    /// Whether to always return the newest frame.
    pub grab_latest: bool,
}

impl CameraSettings {
    /// Picks the profile for the detected memory.
    pub fn for_memory(has_psram: bool) -> Self {
        if has_psram {
            Self {
                frame_size: framesize_t_FRAMESIZE_UXGA,
                jpeg_quality: 10,
                fb_count: 2,
                in_psram: true,
                grab_latest: true,
            }
        } else {
            Self {
                frame_size: framesize_t_FRAMESIZE_SVGA,
                jpeg_quality: 12,
                fb_count: 1,
                in_psram: false,
                grab_latest: false,
            }
        }
    }

    /// Detects PSRAM and picks the matching profile.
    pub fn detect() -> Self {
        let spiram = unsafe {
            esp_idf_sys::heap_caps_get_total_size(esp_idf_sys::MALLOC_CAP_SPIRAM)
        };
        if spiram == 0 {
            warn!("[Camera] No PSRAM, using SVGA single-buffer profile");
        } else {
            info!("[Camera] PSRAM found ({} bytes), using UXGA profile", spiram);
        }
        Self::for_memory(spiram > 0)
    }

    fn driver_config(&self) -> camera_config_t {
        let mut config = camera_config_t::default();
        let [d7, d6, d5, d4, d3, d2, d1, d0] = pins::CAM_DATA;

        config.pin_pwdn = pins::CAM_PWDN;
        config.pin_reset = pins::CAM_RESET;
        config.pin_xclk = pins::CAM_XCLK;
        config.pin_d7 = d7;
        config.pin_d6 = d6;
        config.pin_d5 = d5;
        config.pin_d4 = d4;
        config.pin_d3 = d3;
        config.pin_d2 = d2;
        config.pin_d1 = d1;
        config.pin_d0 = d0;
        config.pin_vsync = pins::CAM_VSYNC;
        config.pin_href = pins::CAM_HREF;
        config.pin_pclk = pins::CAM_PCLK;

        config.xclk_freq_hz = pins::CAM_XCLK_HZ;
        config.ledc_timer = ledc_timer_t_LEDC_TIMER_0;
        config.ledc_channel = ledc_channel_t_LEDC_CHANNEL_0;
        config.pixel_format = pixformat_t_PIXFORMAT_JPEG;
        config.frame_size = self.frame_size;
        config.jpeg_quality = self.jpeg_quality;
        config.fb_count = self.fb_count;
        config.fb_location = if self.in_psram {
            camera_fb_location_t_CAMERA_FB_IN_PSRAM
        } else {
            camera_fb_location_t_CAMERA_FB_IN_DRAM
        };
        config.grab_mode = if self.grab_latest {
            camera_grab_mode_t_CAMERA_GRAB_LATEST
        } else {
            camera_grab_mode_t_CAMERA_GRAB_WHEN_EMPTY
        };

        // SCCB pins sit in bindgen unions
        unsafe {
            config.__bindgen_anon_1.pin_sccb_sda = pins::CAM_SIOD;
            config.__bindgen_anon_2.pin_sccb_scl = pins::CAM_SIOC;
        }
        config
    }
}

/// A frame buffer borrowed from the driver.
pub struct CameraFrame {
    fb: *mut camera_fb_t,
}

impl AsRef<[u8]> for CameraFrame {
    fn as_ref(&self) -> &[u8] {
        // fb is non-null and stays valid until esp_camera_fb_return
        unsafe {
            let buf = core::ptr::addr_of!((*self.fb).buf).read_unaligned();
            let len = core::ptr::addr_of!((*self.fb).len).read_unaligned();
            core::slice::from_raw_parts(buf, len)
        }
    }
}

/// The on-board camera.
///
/// Construct with [`init`](Self::init); if that fails, use
/// [`unavailable`](Self::unavailable) so the rest of the firmware keeps
/// running and every capture reports a missing frame.
pub struct Esp32Camera {
    ready: bool,
}

impl Esp32Camera {
    /// Initializes the sensor with `settings` and applies the image tweaks
    /// (vertical flip, brightness +1, saturation -2).
    ///
    /// # Errors
    ///
    /// Returns the driver's error code if the sensor does not respond.
    pub fn init(settings: CameraSettings) -> anyhow::Result<Self> {
        let config = settings.driver_config();
        let err = unsafe { esp_camera_init(&config) };
        if err != ESP_OK as i32 {
            anyhow::bail!("esp_camera_init failed: 0x{:x}", err);
        }

        let sensor = unsafe { esp_camera_sensor_get() };
        if sensor.is_null() {
            warn!("[Camera] No sensor handle, skipping image tweaks");
        } else {
            unsafe {
                if let Some(set_vflip) = (*sensor).set_vflip {
                    set_vflip(sensor, 1);
                }
                if let Some(set_brightness) = (*sensor).set_brightness {
                    set_brightness(sensor, 1);
                }
                if let Some(set_saturation) = (*sensor).set_saturation {
                    set_saturation(sensor, -2);
                }
            }
        }

        info!("[Camera] Initialized");
        Ok(Self { ready: true })
    }

    /// A camera that never delivers frames.
    pub fn unavailable() -> Self {
        Self { ready: false }
    }
}

impl FrameProvider for Esp32Camera {
    type Frame = CameraFrame;

    fn acquire(&mut self) -> Option<CameraFrame> {
        if !self.ready {
            return None;
        }
        let fb = unsafe { esp_camera_fb_get() };
        if fb.is_null() {
            None
        } else {
            Some(CameraFrame { fb })
        }
    }

    fn release(&mut self, frame: CameraFrame) {
        unsafe { esp_camera_fb_return(frame.fb) };
    }
}
