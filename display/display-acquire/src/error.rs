//! Error types for display acquisition.

use thiserror::Error;

/// Errors that can occur while acquiring the virtual display.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AcquireError {
    /// The driver tool could not be run or exited unsuccessfully.
    #[error("display driver error: {0}")]
    Driver(String),

    /// No display device offers the requested mode.
    #[error("no display offers a {width}x{height} mode")]
    ModeNotFound {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
    },

    /// Applying a display mode failed.
    #[error("failed to set mode on {device}: {reason}")]
    ModeSet {
        /// Display device name.
        device: String,
        /// Failure reported by the display API.
        reason: String,
    },

    /// A capture output could not be opened, started or stopped.
    #[error("capture error: {0}")]
    Capture(String),

    /// The output scan found nothing wide enough.
    ///
    /// Not retried; the operator has to restart.
    #[error(
        "no capture output at least {min_width}px wide ({outputs_probed} outputs on {adapters_probed} adapters probed)"
    )]
    NoCaptureOutput {
        /// Width threshold that outputs had to meet.
        min_width: u32,
        /// Adapters that were present.
        adapters_probed: usize,
        /// Outputs that opened successfully.
        outputs_probed: usize,
    },

    /// Acquisition was cancelled by the operator.
    #[error("acquisition cancelled")]
    Cancelled,

    /// The coordinator was used out of order.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl AcquireError {
    /// Creates a driver error.
    #[must_use]
    pub fn driver(reason: impl Into<String>) -> Self {
        Self::Driver(reason.into())
    }

    /// Creates a mode-set error.
    #[must_use]
    pub fn mode_set(device: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ModeSet {
            device: device.into(),
            reason: reason.into(),
        }
    }

    /// Creates a capture error.
    #[must_use]
    pub fn capture(reason: impl Into<String>) -> Self {
        Self::Capture(reason.into())
    }

    /// Creates a no-capture-output error.
    #[must_use]
    pub const fn no_capture_output(
        min_width: u32,
        adapters_probed: usize,
        outputs_probed: usize,
    ) -> Self {
        Self::NoCaptureOutput {
            min_width,
            adapters_probed,
            outputs_probed,
        }
    }

    /// Creates an invalid state error.
    #[must_use]
    pub fn invalid_state(reason: impl Into<String>) -> Self {
        Self::InvalidState(reason.into())
    }

    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }
}

/// Result type for acquisition operations.
pub type Result<T> = std::result::Result<T, AcquireError>;
