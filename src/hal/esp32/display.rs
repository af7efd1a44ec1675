//! Status display on a 128x64 SSD1306 over I2C.
//!
//! Shows the four status lines in the 6x10 font, 10 pixel rows. Lines
//! wider than the panel continue on the next row.
//!
//! # Wiring
//!
//! - SDA → GPIO15
//! - SCL → GPIO14
//! - VCC → 3.3V
//! - GND → GND

use crate::status::{wrap_line, StatusLines, PANEL_COLUMNS};
use crate::traits::StatusDisplay;
use embedded_graphics::{
    mono_font::{ascii::FONT_6X10, MonoTextStyle},
    pixelcolor::BinaryColor,
    prelude::*,
    text::{Baseline, Text},
};
use esp_idf_hal::i2c::I2cDriver;
use ssd1306::{mode::BufferedGraphicsMode, prelude::*, I2CDisplayInterface, Ssd1306};

type Panel<'d> = Ssd1306<
    I2CInterface<I2cDriver<'d>>,
    DisplaySize128x64,
    BufferedGraphicsMode<DisplaySize128x64>,
>;

/// Row height of one status line.
const LINE_HEIGHT: i32 = 10;

/// Text rows that fit on the 64 px panel.
const PANEL_ROWS: usize = 6;

/// The status OLED.
///
/// # Layout
///
/// ```text
/// ┌────────────────────────────┐
/// │Time: 14:03:27              │  y = 0
/// │Wi-Fi: Connected            │  y = 10
/// │Server: Connected           │  y = 20
/// │Status: Ready               │  y = 30
/// │                            │
/// └────────────────────────────┘
/// ```
pub struct Esp32Display<'d> {
    display: Panel<'d>,
}

impl<'d> Esp32Display<'d> {
    /// Wraps the panel at address 0x3C.
    ///
    /// Nothing is sent to the panel until [`StatusDisplay::init`].
    pub fn new(i2c: I2cDriver<'d>) -> Self {
        let interface = I2CDisplayInterface::new(i2c);
        let display = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
            .into_buffered_graphics_mode();

        Self { display }
    }

    fn draw_rows<'a>(
        &mut self,
        lines: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), DisplayError> {
        self.display.clear(BinaryColor::Off)?;
        let style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
        let rows = lines
            .into_iter()
            .flat_map(|line| wrap_line(line, PANEL_COLUMNS))
            .take(PANEL_ROWS);
        for (i, row) in rows.enumerate() {
            let y = i as i32 * LINE_HEIGHT;
            Text::with_baseline(row, Point::new(0, y), style, Baseline::Top)
                .draw(&mut self.display)?;
        }
        self.display.flush()?;
        Ok(())
    }
}

impl StatusDisplay for Esp32Display<'_> {
    type Error = DisplayError;

    fn init(&mut self) -> Result<(), Self::Error> {
        self.display.init()?;
        self.clear()
    }

    fn clear(&mut self) -> Result<(), Self::Error> {
        self.display.clear(BinaryColor::Off)?;
        self.display.flush()?;
        Ok(())
    }

    fn draw_lines(&mut self, lines: &StatusLines) -> Result<(), Self::Error> {
        self.draw_rows(lines.as_array())
    }

    fn show_message(&mut self, line1: &str, line2: Option<&str>) -> Result<(), Self::Error> {
        self.draw_rows(core::iter::once(line1).chain(line2))
    }
}

/// Panel write failure, wrapping the interface error.
#[derive(Debug)]
pub struct DisplayError(pub display_interface::DisplayError);

impl From<display_interface::DisplayError> for DisplayError {
    fn from(e: display_interface::DisplayError) -> Self {
        DisplayError(e)
    }
}
