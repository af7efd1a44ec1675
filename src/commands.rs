//! Remote commands and the deferred action slot.
//!
//! Commands arrive on the realtime channel's event path but are executed
//! on the main loop path. [`DeferredAction`] is the single-slot handoff
//! between the two: the dispatcher raises it, the main loop takes it.
//!
//! # Coalescing
//!
//! The slot holds at most one request. A second capture command that
//! arrives before the main loop services the first is absorbed into the
//! pending one; it is not counted or queued.
//!
//! ```rust
//! use snapcam::DeferredAction;
//!
//! let mut pending = DeferredAction::new();
//! assert!(pending.request());   // newly pending
//! assert!(!pending.request());  // coalesced
//!
//! assert!(pending.take());
//! assert!(!pending.take());     // nothing left
//! ```

/// A command the server can send to the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RemoteCommand {
    /// Capture one image and upload it.
    TakePhoto,
}

/// Single-slot deferred capture request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeferredAction {
    pending: bool,
}

impl DeferredAction {
    /// Creates an empty slot.
    pub const fn new() -> Self {
        Self { pending: false }
    }

    /// Raises the flag.
    ///
    /// Returns false if a request was already pending (the new one is
    /// coalesced into it).
    pub fn request(&mut self) -> bool {
        let was_pending = self.pending;
        self.pending = true;
        !was_pending
    }

    /// Returns true if a request is waiting.
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Clears the flag, returning whether it was set.
    pub fn take(&mut self) -> bool {
        core::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let pending = DeferredAction::new();
        assert!(!pending.is_pending());
        assert_eq!(pending, DeferredAction::default());
    }

    #[test]
    fn request_then_take() {
        let mut pending = DeferredAction::new();
        assert!(pending.request());
        assert!(pending.is_pending());
        assert!(pending.take());
        assert!(!pending.is_pending());
    }

    #[test]
    fn repeated_requests_coalesce() {
        let mut pending = DeferredAction::new();
        assert!(pending.request());
        assert!(!pending.request());
        assert!(!pending.request());
        assert!(pending.take());
        assert!(!pending.take());
    }

    #[test]
    fn take_on_empty_is_false() {
        let mut pending = DeferredAction::new();
        assert!(!pending.take());
    }
}
