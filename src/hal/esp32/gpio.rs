//! Capture button and status LED on plain GPIOs.
//!
//! Both are generic over the embedded-hal 1.0 pin traits, so any
//! `esp_idf_hal::gpio::PinDriver` in the right mode works.

use embedded_hal::digital::{InputPin, OutputPin};
use log::warn;

use crate::traits::{StatusIndicator, TriggerInput};

/// Active-low push button.
///
/// Reads active while the pin is pulled to GND. A read error counts as
/// released.
///
/// # Example
///
/// ```ignore
/// use esp_idf_hal::gpio::{PinDriver, Pull};
/// use snapcam::hal::esp32::ButtonTrigger;
///
/// let mut pin = PinDriver::input(peripherals.pins.gpio13)?;
/// pin.set_pull(Pull::Up)?;
/// let button = ButtonTrigger::new(pin);
/// ```
pub struct ButtonTrigger<P: InputPin> {
    pin: P,
}

impl<P: InputPin> ButtonTrigger<P> {
    /// Wraps a pulled-up input pin.
    pub fn new(pin: P) -> Self {
        Self { pin }
    }
}

impl<P: InputPin> TriggerInput for ButtonTrigger<P> {
    fn is_active(&mut self) -> bool {
        match self.pin.is_low() {
            Ok(low) => low,
            Err(e) => {
                warn!("[Button] read failed: {:?}", e);
                false
            }
        }
    }
}

/// Single LED, active high.
pub struct LedIndicator<P: OutputPin> {
    pin: P,
}

impl<P: OutputPin> LedIndicator<P> {
    /// Wraps an output pin and switches the LED off.
    pub fn new(mut pin: P) -> Result<Self, P::Error> {
        pin.set_low()?;
        Ok(Self { pin })
    }
}

impl<P: OutputPin> StatusIndicator for LedIndicator<P> {
    type Error = P::Error;

    fn set_on(&mut self, on: bool) -> Result<(), P::Error> {
        if on {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        }
    }
}
