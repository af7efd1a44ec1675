//! Failure taxonomy.
//!
//! Failures never cross component boundaries as error values. Each
//! component maps its failure to a [`FailureKind`], shows the matching
//! [`Activity`] phrase, and drops the detail after logging it. The only
//! fatal kind is [`FailureKind::DisplayInitFailure`].

use crate::status::Activity;

/// Every failure the firmware distinguishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FailureKind {
    /// WiFi did not come up within the join timeout.
    NetworkJoinTimeout,
    /// Realtime channel closed.
    ChannelDisconnected,
    /// Realtime channel reported an error.
    ChannelError,
    /// The camera returned no frame.
    FrameAcquisitionFailure,
    /// The upload got no response.
    UploadFailure,
    /// The display could not be initialized. Halts the firmware.
    DisplayInitFailure,
    /// The camera sensor failed to initialize. Captures will fail later.
    CameraInitFailure,
}

impl FailureKind {
    /// Returns true if the firmware cannot continue.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, FailureKind::DisplayInitFailure)
    }

    /// Activity phrase reported for this failure.
    ///
    /// `None` for the display failure: there is nowhere to show it.
    ///
    /// # Examples
    ///
    /// ```
    /// use snapcam::{Activity, FailureKind};
    ///
    /// assert_eq!(FailureKind::ChannelError.activity(), Some(Activity::SocketError));
    /// assert_eq!(FailureKind::DisplayInitFailure.activity(), None);
    /// ```
    pub const fn activity(&self) -> Option<Activity> {
        match self {
            FailureKind::NetworkJoinTimeout => Some(Activity::WifiFailed),
            FailureKind::ChannelDisconnected => Some(Activity::ServerOffline),
            FailureKind::ChannelError => Some(Activity::SocketError),
            FailureKind::FrameAcquisitionFailure => Some(Activity::PhotoFailed),
            FailureKind::UploadFailure => Some(Activity::UploadFail),
            FailureKind::DisplayInitFailure => None,
            FailureKind::CameraInitFailure => Some(Activity::CameraInitFailed),
        }
    }

    /// Returns true if this failure is signalled with the failure pulse
    /// pattern on the indicator.
    ///
    /// Only a missing frame blinks; every other failure is shown on the
    /// display alone.
    pub const fn pulses_indicator(&self) -> bool {
        matches!(self, FailureKind::FrameAcquisitionFailure)
    }
}

impl core::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            FailureKind::NetworkJoinTimeout => "network join timed out",
            FailureKind::ChannelDisconnected => "realtime channel disconnected",
            FailureKind::ChannelError => "realtime channel error",
            FailureKind::FrameAcquisitionFailure => "frame acquisition failed",
            FailureKind::UploadFailure => "upload failed",
            FailureKind::DisplayInitFailure => "display init failed",
            FailureKind::CameraInitFailure => "camera init failed",
        };
        f.write_str(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_display_is_fatal() {
        let all = [
            FailureKind::NetworkJoinTimeout,
            FailureKind::ChannelDisconnected,
            FailureKind::ChannelError,
            FailureKind::FrameAcquisitionFailure,
            FailureKind::UploadFailure,
            FailureKind::DisplayInitFailure,
            FailureKind::CameraInitFailure,
        ];
        for kind in all {
            assert_eq!(kind.is_fatal(), kind == FailureKind::DisplayInitFailure);
            assert_eq!(kind.activity().is_none(), kind.is_fatal());
        }
    }

    #[test]
    fn only_missing_frame_blinks() {
        assert!(FailureKind::FrameAcquisitionFailure.pulses_indicator());
        assert!(!FailureKind::UploadFailure.pulses_indicator());
        assert!(!FailureKind::ChannelError.pulses_indicator());
    }

    #[test]
    fn display_messages() {
        assert_eq!(
            alloc::format!("{}", FailureKind::UploadFailure),
            "upload failed"
        );
        assert_eq!(
            alloc::format!("{}", FailureKind::CameraInitFailure),
            "camera init failed"
        );
    }
}
