//! Display abstraction for the status projection.
//!
//! This module defines the [`StatusDisplay`] trait for drawing the four
//! status lines to a text-capable display (OLED, LCD, or a test double).

use core::fmt::Debug;

use crate::status::StatusLines;

/// A text display that shows the status lines.
///
/// # Example
///
/// A display that only remembers the activity line:
///
/// ```
/// use snapcam::traits::StatusDisplay;
/// use snapcam::{render_lines, ConnectionState, StatusLines};
///
/// #[derive(Default)]
/// struct LastActivity(String);
///
/// impl StatusDisplay for LastActivity {
///     type Error = core::convert::Infallible;
///
///     fn init(&mut self) -> Result<(), Self::Error> { Ok(()) }
///     fn clear(&mut self) -> Result<(), Self::Error> {
///         self.0.clear();
///         Ok(())
///     }
///     fn draw_lines(&mut self, lines: &StatusLines) -> Result<(), Self::Error> {
///         self.0 = lines.activity.to_string();
///         Ok(())
///     }
///     fn show_message(&mut self, line1: &str, _: Option<&str>) -> Result<(), Self::Error> {
///         self.0 = line1.to_string();
///         Ok(())
///     }
/// }
///
/// let mut d = LastActivity::default();
/// d.draw_lines(&render_lines(&ConnectionState::new(), None)).unwrap();
/// assert_eq!(d.0, "Status: Booting...");
/// ```
pub trait StatusDisplay {
    /// Error type for display operations.
    type Error: Debug;

    /// Brings the panel up. Called once at boot; failure halts the firmware.
    fn init(&mut self) -> Result<(), Self::Error>;

    /// Blanks the panel.
    fn clear(&mut self) -> Result<(), Self::Error>;

    /// Replaces the screen contents with the given lines.
    fn draw_lines(&mut self, lines: &StatusLines) -> Result<(), Self::Error>;

    /// Replaces the screen with one or two free-form lines, such as the
    /// boot splash.
    fn show_message(&mut self, line1: &str, line2: Option<&str>) -> Result<(), Self::Error>;
}
