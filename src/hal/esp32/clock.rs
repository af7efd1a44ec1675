//! Monotonic time and blocking delay on ESP-IDF.

use crate::traits::{Clock, Delay};
use esp_idf_hal::delay::FreeRtos;

/// Milliseconds since boot from the ESP-IDF high-resolution timer.
///
/// Drives the render cadence and reconnect schedule in the main loop:
///
/// ```ignore
/// use snapcam::hal::esp32::Esp32Clock;
/// use snapcam::traits::Clock;
///
/// let clock = Esp32Clock::new();
/// loop {
///     controller.tick(clock.now_ms());
/// }
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct Esp32Clock;

impl Esp32Clock {
    /// Creates the clock. Stateless; the timer runs from boot.
    #[inline]
    pub const fn new() -> Self {
        Esp32Clock
    }
}

impl Clock for Esp32Clock {
    #[inline]
    fn now_ms(&self) -> u64 {
        // esp_timer counts microseconds and never goes negative
        let us = unsafe { esp_idf_hal::sys::esp_timer_get_time() };
        us.max(0) as u64 / 1000
    }
}

/// Blocking delay that yields to the FreeRTOS scheduler.
#[derive(Clone, Copy, Debug, Default)]
pub struct Esp32Delay;

impl Esp32Delay {
    /// Creates a delay.
    pub const fn new() -> Self {
        Esp32Delay
    }
}

impl Delay for Esp32Delay {
    fn delay_ms(&mut self, ms: u32) {
        FreeRtos::delay_ms(ms);
    }
}
