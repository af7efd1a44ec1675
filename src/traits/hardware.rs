//! Hardware abstraction traits for the camera, trigger button, indicator LED,
//! and time sources.
//!
//! This module defines the hardware interfaces that allow snapcam to run
//! its control logic on desktop (with mocks) and on the ESP32-CAM board.
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`FrameProvider`] | One encoded image per request from the sensor |
//! | [`TriggerInput`] | Local capture button |
//! | [`StatusIndicator`] | Single status LED used for pulse patterns |
//! | [`Clock`] | Monotonic milliseconds for loop cadence |
//! | [`Delay`] | Blocking delay used for settle/debounce holds |
//! | [`TimeSource`] | Wall-clock time for the display |
//!
//! # Example
//!
//! ```rust
//! use snapcam::traits::{FrameProvider, StatusIndicator, PulsePattern};
//! use snapcam::hal::{MockFrameProvider, MockIndicator, MockDelay};
//!
//! let mut camera = MockFrameProvider::with_frame(vec![0xFF, 0xD8, 0xFF]);
//! let frame = camera.acquire().unwrap();
//! assert_eq!(frame.as_ref(), &[0xFF, 0xD8, 0xFF]);
//! camera.release(frame);
//!
//! let mut led = MockIndicator::new();
//! let mut delay = MockDelay::new();
//! led.pulse(PulsePattern::new(3, 300), &mut delay).unwrap();
//! assert_eq!(led.pulse_count(), 3);
//! ```

use core::fmt::Debug;

/// Source of encoded still images (the image sensor).
///
/// A frame is owned by the provider's buffer pool: it is acquired, read by
/// the caller, and handed back with [`release`](Self::release). Callers
/// normally wrap an acquired frame in a [`FrameGuard`] so the release cannot
/// be skipped on an early return.
pub trait FrameProvider {
    /// The frame handle. Its bytes are the encoded image.
    type Frame: AsRef<[u8]>;

    /// Captures one frame.
    ///
    /// Returns `None` if the sensor could not deliver a frame (including
    /// when the sensor never initialized).
    fn acquire(&mut self) -> Option<Self::Frame>;

    /// Returns a frame's buffer to the provider.
    fn release(&mut self, frame: Self::Frame);
}

/// Scoped ownership of an acquired frame.
///
/// Releases the frame back to its provider exactly once, when dropped.
pub struct FrameGuard<'a, P: FrameProvider> {
    provider: &'a mut P,
    frame: Option<P::Frame>,
}

impl<'a, P: FrameProvider> FrameGuard<'a, P> {
    /// Takes ownership of `frame`, which must have come from `provider`.
    pub fn new(provider: &'a mut P, frame: P::Frame) -> Self {
        Self {
            provider,
            frame: Some(frame),
        }
    }

    /// Encoded image bytes.
    pub fn bytes(&self) -> &[u8] {
        self.frame.as_ref().map(AsRef::as_ref).unwrap_or(&[])
    }

    /// Length of the encoded image in bytes.
    pub fn len(&self) -> usize {
        self.bytes().len()
    }

    /// Returns true if the frame carries no data.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<P: FrameProvider> Drop for FrameGuard<'_, P> {
    fn drop(&mut self) {
        if let Some(frame) = self.frame.take() {
            self.provider.release(frame);
        }
    }
}

/// Local trigger input (the capture button).
///
/// Implementations hide the electrical polarity: the button on the board
/// is active-low, but `is_active` returns true while it is pressed.
/// There is no edge detection or debounce filtering here; the main loop
/// holds a fixed delay after servicing a press instead.
pub trait TriggerInput {
    /// Samples the input once.
    fn is_active(&mut self) -> bool;
}

/// Blink pattern for the status indicator.
///
/// Each pulse holds the LED on for `duration_ms`, then off. Consecutive
/// pulses are separated by another `duration_ms` gap; there is no gap
/// after the last pulse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PulsePattern {
    /// Number of pulses.
    pub count: u8,
    /// On time, and gap between pulses, in milliseconds.
    pub duration_ms: u32,
}

impl PulsePattern {
    /// Creates a pattern of `count` pulses of `duration_ms` each.
    pub const fn new(count: u8, duration_ms: u32) -> Self {
        Self { count, duration_ms }
    }

    /// Total wall time the pattern takes to play.
    pub const fn total_ms(&self) -> u32 {
        if self.count == 0 {
            0
        } else {
            self.duration_ms * (2 * self.count as u32 - 1)
        }
    }
}

/// Single status LED.
pub trait StatusIndicator {
    /// Error type for indicator operations.
    type Error: Debug;

    /// Turns the LED on or off.
    fn set_on(&mut self, on: bool) -> Result<(), Self::Error>;

    /// Plays a blink pattern, blocking for its full duration.
    fn pulse<D: Delay>(&mut self, pattern: PulsePattern, delay: &mut D) -> Result<(), Self::Error> {
        for i in 0..pattern.count {
            self.set_on(true)?;
            delay.delay_ms(pattern.duration_ms);
            self.set_on(false)?;
            if i + 1 < pattern.count {
                delay.delay_ms(pattern.duration_ms);
            }
        }
        Ok(())
    }
}

/// Time source trait for `no_std` compatibility.
///
/// Provides monotonic time in milliseconds for the render cadence and the
/// channel reconnect schedule.
///
/// # Example
///
/// ```rust
/// use snapcam::traits::Clock;
/// use snapcam::hal::MockClock;
///
/// let clock = MockClock::new();
/// clock.jump(100);
/// assert_eq!(clock.now_ms(), 100);
/// ```
pub trait Clock {
    /// Returns current time in milliseconds since an arbitrary epoch.
    ///
    /// Must be monotonically increasing.
    fn now_ms(&self) -> u64;
}

/// Blocking delay.
///
/// Stalls the single control thread; used only for the pipeline's settle
/// hold, the post-trigger debounce, and indicator pulses.
pub trait Delay {
    /// Blocks for the specified number of milliseconds.
    fn delay_ms(&mut self, ms: u32);
}

/// Local wall-clock time of day.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockTime {
    /// Hour, 0-23.
    pub hour: u8,
    /// Minute, 0-59.
    pub minute: u8,
    /// Second, 0-59.
    pub second: u8,
}

impl ClockTime {
    /// Unix timestamps before this (2016-01-01) mean the clock was never set.
    pub const MIN_VALID_UNIX: i64 = 1_451_606_400;

    /// Converts a Unix timestamp into local time of day.
    ///
    /// Returns `None` if the timestamp predates [`MIN_VALID_UNIX`](Self::MIN_VALID_UNIX),
    /// which is what an unsynchronised RTC reports after boot.
    ///
    /// # Examples
    ///
    /// ```
    /// use snapcam::traits::ClockTime;
    ///
    /// // 2024-01-01T00:00:00Z shown at GMT+8
    /// let t = ClockTime::from_unix(1_704_067_200, 8 * 3600).unwrap();
    /// assert_eq!((t.hour, t.minute, t.second), (8, 0, 0));
    ///
    /// assert!(ClockTime::from_unix(12, 0).is_none());
    /// ```
    pub fn from_unix(unix_secs: i64, offset_secs: i32) -> Option<Self> {
        if unix_secs < Self::MIN_VALID_UNIX {
            return None;
        }
        let local = unix_secs + offset_secs as i64;
        let of_day = local.rem_euclid(86_400);
        Some(Self {
            hour: (of_day / 3600) as u8,
            minute: (of_day % 3600 / 60) as u8,
            second: (of_day % 60) as u8,
        })
    }
}

impl core::fmt::Display for ClockTime {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)
    }
}

/// Wall-clock source for the time line on the display.
pub trait TimeSource {
    /// Current local time, or `None` if the clock has not been set.
    fn local_time(&self) -> Option<ClockTime>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    struct CountingProvider {
        released: Vec<u8>,
    }

    impl FrameProvider for CountingProvider {
        type Frame = [u8; 1];

        fn acquire(&mut self) -> Option<[u8; 1]> {
            Some([7])
        }

        fn release(&mut self, frame: [u8; 1]) {
            self.released.push(frame[0]);
        }
    }

    #[test]
    fn frame_guard_releases_on_drop() {
        let mut provider = CountingProvider {
            released: Vec::new(),
        };
        let frame = provider.acquire().unwrap();
        {
            let guard = FrameGuard::new(&mut provider, frame);
            assert_eq!(guard.bytes(), &[7]);
            assert_eq!(guard.len(), 1);
        }
        assert_eq!(provider.released, [7]);
    }

    struct RecordingLed {
        states: Vec<bool>,
    }

    impl StatusIndicator for RecordingLed {
        type Error = ();

        fn set_on(&mut self, on: bool) -> Result<(), ()> {
            self.states.push(on);
            Ok(())
        }
    }

    struct RecordingDelay(Vec<u32>);

    impl Delay for RecordingDelay {
        fn delay_ms(&mut self, ms: u32) {
            self.0.push(ms);
        }
    }

    #[test]
    fn pulse_has_no_trailing_gap() {
        let mut led = RecordingLed { states: Vec::new() };
        let mut delay = RecordingDelay(Vec::new());
        led.pulse(PulsePattern::new(3, 300), &mut delay).unwrap();

        assert_eq!(led.states, [true, false, true, false, true, false]);
        assert_eq!(delay.0, [300, 300, 300, 300, 300]);
        assert_eq!(PulsePattern::new(3, 300).total_ms(), 1500);
    }

    #[test]
    fn single_pulse() {
        let mut led = RecordingLed { states: Vec::new() };
        let mut delay = RecordingDelay(Vec::new());
        led.pulse(PulsePattern::new(1, 50), &mut delay).unwrap();

        assert_eq!(led.states, [true, false]);
        assert_eq!(delay.0, [50]);
    }

    #[test]
    fn empty_pattern_is_noop() {
        let mut led = RecordingLed { states: Vec::new() };
        let mut delay = RecordingDelay(Vec::new());
        led.pulse(PulsePattern::new(0, 50), &mut delay).unwrap();
        assert!(led.states.is_empty());
        assert_eq!(PulsePattern::new(0, 50).total_ms(), 0);
    }

    #[test]
    fn clock_time_wraps_day_with_offset() {
        // 2024-01-01T20:30:15Z at GMT+8 is 04:30:15 next day
        let t = ClockTime::from_unix(1_704_067_200 + 20 * 3600 + 30 * 60 + 15, 8 * 3600).unwrap();
        assert_eq!((t.hour, t.minute, t.second), (4, 30, 15));
    }

    #[test]
    fn clock_time_negative_offset() {
        let t = ClockTime::from_unix(1_704_067_200, -5 * 3600).unwrap();
        assert_eq!((t.hour, t.minute, t.second), (19, 0, 0));
    }

    #[test]
    fn clock_time_display_zero_pads() {
        let t = ClockTime {
            hour: 7,
            minute: 5,
            second: 9,
        };
        assert_eq!(alloc::format!("{}", t), "07:05:09");
    }

    #[test]
    fn clock_time_unset_before_2016() {
        assert!(ClockTime::from_unix(0, 8 * 3600).is_none());
        assert!(ClockTime::from_unix(ClockTime::MIN_VALID_UNIX - 1, 0).is_none());
        assert!(ClockTime::from_unix(ClockTime::MIN_VALID_UNIX, 0).is_some());
    }
}
