//! Capture-upload pipeline.
//!
//! One run takes one picture and makes one upload attempt:
//!
//! ```text
//! TakingPhoto ─► acquire ─┬─ none ─► PhotoFailed (3 blinks)
//!                         └─ frame ─► Uploading ─► POST ─┬─ status > 0 ─► UploadOK ─┐
//!                                                        └─ no response ─► UploadFail ┤
//!                                        release frame, render, settle ─► Ready ◄────┘
//! ```
//!
//! The run blocks the calling thread from start to finish, including the
//! network round trip and the settle hold. The caller guarantees only one
//! run is in flight.

extern crate alloc;
use alloc::string::String;

use log::{info, warn};

use crate::error::FailureKind;
use crate::status::{Activity, ConnectionState, RenderStatus};
use crate::traits::{
    Delay, FrameGuard, FrameProvider, PulsePattern, StatusIndicator, UploadTransport,
};

/// Result of one pipeline run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// The sensor delivered no frame; nothing was uploaded.
    CaptureFailed,
    /// The server answered the upload.
    Uploaded {
        /// HTTP status code of the response.
        status: u16,
    },
    /// The upload got no response.
    UploadFailed,
}

impl PipelineOutcome {
    /// Returns true if the image reached the server.
    pub fn is_success(&self) -> bool {
        matches!(self, PipelineOutcome::Uploaded { .. })
    }

    /// Failure class, if the run failed.
    pub fn failure(&self) -> Option<FailureKind> {
        match self {
            PipelineOutcome::CaptureFailed => Some(FailureKind::FrameAcquisitionFailure),
            PipelineOutcome::Uploaded { .. } => None,
            PipelineOutcome::UploadFailed => Some(FailureKind::UploadFailure),
        }
    }
}

/// Pipeline parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Full upload URL.
    pub upload_url: String,
    /// Hold after the final render, before returning to `Ready`.
    pub settle_ms: u32,
    /// Blink played when a capture starts.
    pub action_pulse: PulsePattern,
    /// Blink played when the sensor delivers no frame.
    pub failure_pulse: PulsePattern,
}

impl PipelineConfig {
    /// Creates a configuration with the default timings for `upload_url`.
    pub fn new(upload_url: impl Into<String>) -> Self {
        Self {
            upload_url: upload_url.into(),
            settle_ms: 2000,
            action_pulse: PulsePattern::new(1, 50),
            failure_pulse: PulsePattern::new(3, 300),
        }
    }
}

/// The capture-upload state machine over its four collaborators.
pub struct CapturePipeline<F, U, I, D>
where
    F: FrameProvider,
    U: UploadTransport,
    I: StatusIndicator,
    D: Delay,
{
    camera: F,
    uploader: U,
    indicator: I,
    delay: D,
    config: PipelineConfig,
    runs: u32,
}

impl<F, U, I, D> CapturePipeline<F, U, I, D>
where
    F: FrameProvider,
    U: UploadTransport,
    I: StatusIndicator,
    D: Delay,
{
    /// Creates a pipeline.
    pub fn new(camera: F, uploader: U, indicator: I, delay: D, config: PipelineConfig) -> Self {
        Self {
            camera,
            uploader,
            indicator,
            delay,
            config,
            runs: 0,
        }
    }

    /// Runs one capture and upload to completion.
    ///
    /// Writes each phase into `state` and renders it through `renderer`.
    /// An acquired frame is always released before this returns.
    pub fn run<R: RenderStatus + ?Sized>(
        &mut self,
        state: &mut ConnectionState,
        renderer: &mut R,
    ) -> PipelineOutcome {
        self.runs = self.runs.wrapping_add(1);

        state.set_activity(Activity::TakingPhoto);
        renderer.render_now(state);
        Self::pulse(&mut self.indicator, &mut self.delay, self.config.action_pulse);

        let Some(frame) = self.camera.acquire() else {
            let kind = FailureKind::FrameAcquisitionFailure;
            warn!("[Pipeline] {}", kind);
            state.set_activity(Activity::PhotoFailed);
            renderer.render_now(state);
            if kind.pulses_indicator() {
                Self::pulse(&mut self.indicator, &mut self.delay, self.config.failure_pulse);
            }
            return PipelineOutcome::CaptureFailed;
        };
        let frame = FrameGuard::new(&mut self.camera, frame);

        state.set_activity(Activity::Uploading);
        renderer.render_now(state);
        info!(
            "[Pipeline] Uploading {} bytes to {}",
            frame.len(),
            self.config.upload_url
        );

        let outcome = match self.uploader.post(&self.config.upload_url, frame.bytes()) {
            Ok(status) if status > 0 => {
                info!("[Pipeline] Upload OK, HTTP {}", status);
                PipelineOutcome::Uploaded { status }
            }
            Ok(status) => {
                warn!("[Pipeline] {}: status {}", FailureKind::UploadFailure, status);
                PipelineOutcome::UploadFailed
            }
            Err(e) => {
                warn!("[Pipeline] {}: {:?}", FailureKind::UploadFailure, e);
                PipelineOutcome::UploadFailed
            }
        };
        drop(frame);

        state.set_activity(match outcome {
            PipelineOutcome::Uploaded { .. } => Activity::UploadOk,
            _ => Activity::UploadFail,
        });
        renderer.render_now(state);
        self.delay.delay_ms(self.config.settle_ms);
        state.set_activity(Activity::Ready);
        outcome
    }

    fn pulse(indicator: &mut I, delay: &mut D, pattern: PulsePattern) {
        if let Err(e) = indicator.pulse(pattern, delay) {
            warn!("[Pipeline] indicator failed: {:?}", e);
        }
    }

    /// Number of runs started.
    pub fn runs(&self) -> u32 {
        self.runs
    }

    /// Pipeline parameters.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The frame provider.
    pub fn camera(&self) -> &F {
        &self.camera
    }

    /// Mutable access to the frame provider.
    pub fn camera_mut(&mut self) -> &mut F {
        &mut self.camera
    }

    /// The upload transport.
    pub fn uploader(&self) -> &U {
        &self.uploader
    }

    /// Mutable access to the upload transport.
    pub fn uploader_mut(&mut self) -> &mut U {
        &mut self.uploader
    }

    /// The status indicator.
    pub fn indicator(&self) -> &I {
        &self.indicator
    }

    /// Mutable access to the status indicator.
    pub fn indicator_mut(&mut self) -> &mut I {
        &mut self.indicator
    }

    /// The blocking delay.
    pub fn delay(&self) -> &D {
        &self.delay
    }

    /// Mutable access to the blocking delay, shared with the main loop's
    /// debounce hold.
    pub fn delay_mut(&mut self) -> &mut D {
        &mut self.delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{MockDelay, MockFrameProvider, MockIndicator, MockUploader};
    use alloc::vec;
    use alloc::vec::Vec;

    type TestPipeline = CapturePipeline<MockFrameProvider, MockUploader, MockIndicator, MockDelay>;

    struct Recorder(Vec<Activity>);

    impl RenderStatus for Recorder {
        fn render_now(&mut self, state: &ConnectionState) {
            self.0.push(state.activity());
        }
    }

    fn pipeline(camera: MockFrameProvider, uploader: MockUploader) -> TestPipeline {
        CapturePipeline::new(
            camera,
            uploader,
            MockIndicator::new(),
            MockDelay::new(),
            PipelineConfig::new("http://host:5000/api/upload"),
        )
    }

    #[test]
    fn success_path() {
        let mut p = pipeline(
            MockFrameProvider::with_frame(vec![1, 2, 3]),
            MockUploader::responding(200),
        );
        let mut state = ConnectionState::new();
        let mut renders = Recorder(Vec::new());

        let outcome = p.run(&mut state, &mut renders);

        assert_eq!(outcome, PipelineOutcome::Uploaded { status: 200 });
        assert_eq!(
            renders.0,
            [Activity::TakingPhoto, Activity::Uploading, Activity::UploadOk]
        );
        assert_eq!(state.activity(), Activity::Ready);
        assert_eq!(p.camera().released, 1);
        assert_eq!(
            p.uploader().requests,
            [(String::from("http://host:5000/api/upload"), vec![1, 2, 3])]
        );
        assert_eq!(p.indicator().pulse_count(), 1);
        assert_eq!(p.delay().total_ms(), 50 + 2000);
    }

    #[test]
    fn capture_failure_skips_upload_and_release() {
        let mut p = pipeline(MockFrameProvider::failing(), MockUploader::responding(200));
        let mut state = ConnectionState::new();
        let mut renders = Recorder(Vec::new());

        let outcome = p.run(&mut state, &mut renders);

        assert_eq!(outcome, PipelineOutcome::CaptureFailed);
        assert_eq!(state.activity(), Activity::PhotoFailed);
        assert_eq!(renders.0, [Activity::TakingPhoto, Activity::PhotoFailed]);
        assert!(p.uploader().requests.is_empty());
        assert_eq!(p.camera().released, 0);
        assert_eq!(p.indicator().pulse_count(), 4);
        // One 50 ms blink, then 3x300 on with 2x300 gaps
        assert_eq!(p.delay().total_ms(), 50 + 5 * 300);
    }

    #[test]
    fn no_response_still_releases() {
        let mut p = pipeline(MockFrameProvider::with_frame(vec![9]), MockUploader::failing());
        let mut state = ConnectionState::new();
        let mut renders = Recorder(Vec::new());

        let outcome = p.run(&mut state, &mut renders);

        assert_eq!(outcome, PipelineOutcome::UploadFailed);
        assert_eq!(outcome.failure(), Some(FailureKind::UploadFailure));
        assert_eq!(renders.0.last(), Some(&Activity::UploadFail));
        assert_eq!(state.activity(), Activity::Ready);
        assert_eq!(p.camera().released, 1);
        assert_eq!(p.indicator().pulse_count(), 1);
    }

    #[test]
    fn any_positive_status_is_success() {
        let mut p = pipeline(
            MockFrameProvider::with_frame(vec![0]),
            MockUploader::responding(500),
        );
        let outcome = p.run(&mut ConnectionState::new(), &mut Recorder(Vec::new()));
        assert!(outcome.is_success());
    }

    #[test]
    fn zero_status_is_failure() {
        let mut p = pipeline(
            MockFrameProvider::with_frame(vec![0]),
            MockUploader::responding(0),
        );
        let outcome = p.run(&mut ConnectionState::new(), &mut Recorder(Vec::new()));
        assert_eq!(outcome, PipelineOutcome::UploadFailed);
        assert_eq!(p.camera().released, 1);
    }

    #[test]
    fn runs_are_counted() {
        let mut p = pipeline(MockFrameProvider::failing(), MockUploader::failing());
        let mut state = ConnectionState::new();
        p.run(&mut state, &mut Recorder(Vec::new()));
        p.run(&mut state, &mut Recorder(Vec::new()));
        assert_eq!(p.runs(), 2);
    }
}
