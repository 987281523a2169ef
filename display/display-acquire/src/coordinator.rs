//! The acquisition state machine.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use head_types::Pacer;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::capture::{CaptureBackend, CaptureMode, CaptureSession};
use crate::driver::DisplayDriver;
use crate::error::{AcquireError, Result};
use crate::modes::{DisplayModes, find_display_with_width, force_resolution};
use crate::retry::BoundedRetry;

/// Acquisition progress.
///
/// Moves forward only. [`CaptureStarted`](Self::CaptureStarted) and
/// [`Failed`](Self::Failed) are terminal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AcquisitionState {
    /// Nothing attempted yet.
    #[default]
    Uninitialized,
    /// Toggling the virtual display driver.
    DriverEnabling,
    /// Forcing the target resolution.
    ResolutionPending,
    /// A display reported the target resolution.
    ResolutionConfirmed,
    /// Probing adapters and outputs for a capture source.
    OutputScanning,
    /// A capture stream is running.
    CaptureStarted,
    /// Acquisition gave up.
    Failed(String),
}

impl AcquisitionState {
    /// Whether no further transition can happen.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::CaptureStarted | Self::Failed(_))
    }
}

/// Acquisition tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcquisitionParams {
    /// Virtual display width in pixels.
    pub target_width: u32,

    /// Virtual display height in pixels.
    pub target_height: u32,

    /// Wait after disabling the driver (unload).
    pub disable_settle: Duration,

    /// Wait after enabling the driver (reload).
    pub enable_settle: Duration,

    /// Budget for forcing the resolution.
    pub resolution_retry: BoundedRetry,

    /// Wait before probing outputs.
    pub stabilize_wait: Duration,

    /// Budget for the full output scan.
    pub scan_retry: BoundedRetry,

    /// Adapters probed per scan.
    pub max_adapters: usize,

    /// Outputs probed per adapter.
    pub max_outputs: usize,

    /// Narrowest output accepted as the capture source.
    pub min_capture_width: u32,

    /// Capture frame rate.
    pub capture_fps: u32,
}

impl Default for AcquisitionParams {
    fn default() -> Self {
        Self {
            target_width: 6000,
            target_height: 1080,
            disable_settle: Duration::from_secs(2),
            enable_settle: Duration::from_secs(3),
            resolution_retry: BoundedRetry::new(10, Duration::from_secs(1)),
            stabilize_wait: Duration::from_secs(5),
            scan_retry: BoundedRetry::new(1, Duration::from_secs(1)),
            max_adapters: 4,
            max_outputs: 6,
            min_capture_width: 5900,
            capture_fps: 144,
        }
    }
}

impl AcquisitionParams {
    /// Set the target resolution.
    ///
    /// Keeps the capture threshold the same distance below the width.
    #[must_use]
    pub const fn target(mut self, width: u32, height: u32) -> Self {
        let slack = self.target_width.saturating_sub(self.min_capture_width);
        self.target_width = width;
        self.target_height = height;
        self.min_capture_width = width.saturating_sub(slack);
        self
    }

    /// Set the capture width threshold.
    #[must_use]
    pub const fn min_capture_width(mut self, width: u32) -> Self {
        self.min_capture_width = width;
        self
    }

    /// Set the driver settle delays.
    #[must_use]
    pub const fn settle(mut self, disable: Duration, enable: Duration) -> Self {
        self.disable_settle = disable;
        self.enable_settle = enable;
        self
    }

    /// Set the stabilization wait.
    #[must_use]
    pub const fn stabilize_wait(mut self, wait: Duration) -> Self {
        self.stabilize_wait = wait;
        self
    }

    /// Set the resolution retry budget.
    #[must_use]
    pub const fn resolution_retry(mut self, retry: BoundedRetry) -> Self {
        self.resolution_retry = retry;
        self
    }

    /// Set the output scan retry budget.
    #[must_use]
    pub const fn scan_retry(mut self, retry: BoundedRetry) -> Self {
        self.scan_retry = retry;
        self
    }

    /// Set the probe bounds.
    #[must_use]
    pub const fn probe_bounds(mut self, adapters: usize, outputs: usize) -> Self {
        self.max_adapters = adapters;
        self.max_outputs = outputs;
        self
    }

    /// Set the capture frame rate.
    #[must_use]
    pub const fn capture_fps(mut self, fps: u32) -> Self {
        self.capture_fps = fps;
        self
    }

    /// Checks the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`AcquireError::InvalidConfig`] for a zero target size,
    /// a capture threshold of zero or above the target width, zero probe
    /// bounds, a zero scan budget or a zero frame rate.
    pub fn validate(&self) -> Result<()> {
        if self.target_width == 0 || self.target_height == 0 {
            return Err(AcquireError::invalid_config("target resolution must be non-zero"));
        }
        if self.min_capture_width == 0 || self.min_capture_width > self.target_width {
            return Err(AcquireError::invalid_config(format!(
                "capture width threshold {} must be in 1..={}",
                self.min_capture_width, self.target_width
            )));
        }
        if self.max_adapters == 0 || self.max_outputs == 0 {
            return Err(AcquireError::invalid_config("probe bounds must be non-zero"));
        }
        if self.scan_retry.max_attempts == 0 {
            return Err(AcquireError::invalid_config("output scan needs at least one attempt"));
        }
        if self.capture_fps == 0 {
            return Err(AcquireError::invalid_config("capture frame rate must be non-zero"));
        }
        Ok(())
    }
}

/// Brings up the virtual display and starts capturing it.
///
/// Runs once. Driver and resolution problems are logged and skipped;
/// only the output scan can fail the run. Call
/// [`teardown`](Self::teardown) on every exit path.
///
/// # Example
///
/// ```ignore
/// let mut acquire = AcquisitionCoordinator::new(params, driver, displays, capture)?;
/// let session = acquire.run(&mut RealtimePacer::new())?;
/// // ... render ...
/// acquire.teardown(Some(session));
/// ```
pub struct AcquisitionCoordinator<D, M, C> {
    params: AcquisitionParams,
    driver: D,
    displays: M,
    capture: C,
    state: AcquisitionState,
    history: Vec<AcquisitionState>,
    cancel: Option<Arc<AtomicBool>>,
}

impl<D, M, C> AcquisitionCoordinator<D, M, C>
where
    D: DisplayDriver,
    M: DisplayModes,
    C: CaptureBackend,
{
    /// Creates an uninitialized coordinator.
    ///
    /// # Errors
    ///
    /// Returns [`AcquireError::InvalidConfig`] if `params` are invalid.
    pub fn new(params: AcquisitionParams, driver: D, displays: M, capture: C) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            driver,
            displays,
            capture,
            state: AcquisitionState::Uninitialized,
            history: vec![AcquisitionState::Uninitialized],
            cancel: None,
        })
    }

    /// Checks `flag` between steps and aborts once it is set.
    #[must_use]
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &AcquisitionState {
        &self.state
    }

    /// Every state entered, in order.
    #[must_use]
    pub fn history(&self) -> &[AcquisitionState] {
        &self.history
    }

    /// Parameters in use.
    #[must_use]
    pub const fn params(&self) -> &AcquisitionParams {
        &self.params
    }

    /// Display-settings collaborator.
    #[must_use]
    pub const fn displays(&self) -> &M {
        &self.displays
    }

    /// Capture collaborator.
    #[must_use]
    pub const fn capture(&self) -> &C {
        &self.capture
    }

    /// Runs every step and returns the started capture.
    ///
    /// # Errors
    ///
    /// - [`AcquireError::NoCaptureOutput`] if no output meets the width threshold
    /// - [`AcquireError::Cancelled`] if the cancel flag was raised
    /// - [`AcquireError::InvalidState`] if the coordinator already ran
    pub fn run<P: Pacer + ?Sized>(&mut self, pacer: &mut P) -> Result<CaptureSession> {
        if self.state != AcquisitionState::Uninitialized {
            return Err(AcquireError::invalid_state(format!(
                "acquisition already ran (state {:?})",
                self.state
            )));
        }

        self.enable_driver(pacer)?;
        self.confirm_resolution(pacer)?;

        self.checkpoint()?;
        debug!(wait = ?self.params.stabilize_wait, "waiting for displays to settle");
        pacer.pause(self.params.stabilize_wait);
        self.check_registration();

        self.scan_outputs(pacer)
    }

    /// Stops capture and disables the virtual display.
    ///
    /// Errors are logged and swallowed so shutdown always completes.
    pub fn teardown(&mut self, session: Option<CaptureSession>) {
        if let Some(session) = session {
            if let Err(e) = session.shutdown() {
                warn!(error = %e, "capture shutdown failed");
            }
        }
        if self.state == AcquisitionState::Uninitialized {
            return;
        }
        info!("disabling virtual display");
        if let Err(e) = self.driver.disable() {
            warn!(error = %e, "virtual display disable failed");
        }
    }

    fn enable_driver<P: Pacer + ?Sized>(&mut self, pacer: &mut P) -> Result<()> {
        self.enter(AcquisitionState::DriverEnabling);
        self.checkpoint()?;
        info!(
            width = self.params.target_width,
            height = self.params.target_height,
            "setting up virtual display"
        );

        if let Err(e) = self.driver.disable() {
            warn!(error = %e, "virtual display disable failed, continuing");
        }
        pacer.pause(self.params.disable_settle);

        if let Err(e) = self.driver.enable() {
            warn!(error = %e, "virtual display enable failed, continuing");
        }
        pacer.pause(self.params.enable_settle);
        Ok(())
    }

    fn confirm_resolution<P: Pacer + ?Sized>(&mut self, pacer: &mut P) -> Result<()> {
        self.enter(AcquisitionState::ResolutionPending);
        self.checkpoint()?;

        let (width, height) = (self.params.target_width, self.params.target_height);
        let retry = self.params.resolution_retry;
        let displays = &mut self.displays;
        match retry.run(pacer, |_| force_resolution(displays, width, height)) {
            Ok(device) => {
                info!(%device, width, height, "resolution confirmed");
                self.enter(AcquisitionState::ResolutionConfirmed);
            }
            Err(exhausted) => {
                let reason = exhausted
                    .last_error
                    .map_or_else(|| "not attempted".to_owned(), |e| e.to_string());
                warn!(
                    attempts = exhausted.attempts,
                    error = %reason,
                    "could not force resolution, continuing"
                );
            }
        }
        Ok(())
    }

    fn check_registration(&self) {
        let width = self.params.target_width;
        if let Some(device) = find_display_with_width(&self.displays, width) {
            info!(%device, width, "virtual display registered");
        } else {
            warn!(width, "no display currently reports the target width");
        }
    }

    fn scan_outputs<P: Pacer + ?Sized>(&mut self, pacer: &mut P) -> Result<CaptureSession> {
        self.enter(AcquisitionState::OutputScanning);

        let retry = self.params.scan_retry;
        let not_cancelled = |e: &AcquireError| !matches!(e, AcquireError::Cancelled);
        let outcome = retry.run_while(pacer, not_cancelled, |attempt| {
            if attempt > 1 {
                info!(attempt, "rescanning capture outputs");
            }
            self.scan_once()
        });

        match outcome {
            Ok(session) => {
                self.enter(AcquisitionState::CaptureStarted);
                Ok(session)
            }
            Err(exhausted) => {
                let err = exhausted
                    .last_error
                    .unwrap_or_else(|| AcquireError::no_capture_output(self.params.min_capture_width, 0, 0));
                self.fail(&err);
                Err(err)
            }
        }
    }

    /// One pass over every adapter/output pair.
    fn scan_once(&mut self) -> Result<CaptureSession> {
        let min_width = self.params.min_capture_width;
        let mut adapters_probed = 0;
        let mut outputs_probed = 0;

        for adapter in 0..self.params.max_adapters {
            self.checkpoint()?;
            if !self.capture.adapter_available(adapter) {
                debug!(adapter, "adapter not present");
                continue;
            }
            adapters_probed += 1;

            for index in 0..self.params.max_outputs {
                let mut output = match self.capture.open(adapter, index) {
                    Ok(output) => output,
                    Err(e) => {
                        debug!(adapter, output = index, error = %e, "output not available");
                        continue;
                    }
                };
                outputs_probed += 1;

                let (width, height) = (output.width(), output.height());
                debug!(adapter, output = index, width, height, "probed output");

                if width >= min_width {
                    match output.start(self.params.capture_fps, CaptureMode::Immediate) {
                        Ok(()) => {
                            return Ok(CaptureSession::new(
                                output,
                                adapter,
                                index,
                                self.params.capture_fps,
                            ));
                        }
                        Err(e) => warn!(adapter, output = index, error = %e, "capture failed to start"),
                    }
                }
                output.release();
            }
        }

        Err(AcquireError::no_capture_output(
            min_width,
            adapters_probed,
            outputs_probed,
        ))
    }

    fn checkpoint(&mut self) -> Result<()> {
        if self
            .cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
        {
            let err = AcquireError::Cancelled;
            self.fail(&err);
            return Err(err);
        }
        Ok(())
    }

    fn enter(&mut self, state: AcquisitionState) {
        debug!(from = ?self.state, to = ?state, "acquisition state");
        self.history.push(state.clone());
        self.state = state;
    }

    fn fail(&mut self, err: &AcquireError) {
        if self.state.is_terminal() {
            return;
        }
        warn!(error = %err, "acquisition failed");
        self.enter(AcquisitionState::Failed(err.to_string()));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_params_are_valid() {
        let p = AcquisitionParams::default();
        assert!(p.validate().is_ok());
        assert_eq!(p.min_capture_width, 5900);
        assert_eq!(p.resolution_retry.max_attempts, 10);
    }

    #[test]
    fn target_keeps_threshold_slack() {
        let p = AcquisitionParams::default().target(3840, 1080);
        assert_eq!(p.min_capture_width, 3740);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn invalid_params_rejected() {
        let base = AcquisitionParams::default();
        assert!(base.min_capture_width(6001).validate().is_err());
        assert!(base.min_capture_width(0).validate().is_err());
        assert!(base.probe_bounds(0, 6).validate().is_err());
        assert!(base.capture_fps(0).validate().is_err());
        assert!(
            base.scan_retry(BoundedRetry::new(0, Duration::ZERO))
                .validate()
                .is_err()
        );
    }

    #[test]
    fn terminal_states() {
        assert!(AcquisitionState::CaptureStarted.is_terminal());
        assert!(AcquisitionState::Failed("x".into()).is_terminal());
        assert!(!AcquisitionState::OutputScanning.is_terminal());
        assert_eq!(AcquisitionState::default(), AcquisitionState::Uninitialized);
    }
}
