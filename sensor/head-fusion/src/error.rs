//! Error types for the head-fusion crate.

use thiserror::Error;

/// Errors that can occur in the tracking pipeline.
#[derive(Debug, Error)]
pub enum FusionError {
    /// Calibration collected no usable samples.
    ///
    /// Startup must abort; there is no baseline to subtract.
    #[error("calibration failed: no valid samples in {polls} polls")]
    Calibration {
        /// Number of polls made during the calibration window.
        polls: usize,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl FusionError {
    /// Creates a calibration error.
    #[must_use]
    pub const fn calibration(polls: usize) -> Self {
        Self::Calibration { polls }
    }

    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }
}

/// Result type for tracking operations.
pub type Result<T> = std::result::Result<T, FusionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_calibration() {
        let err = FusionError::calibration(300);
        assert!(err.to_string().contains("calibration failed"));
        assert!(err.to_string().contains("300"));
    }

    #[test]
    fn error_invalid_config() {
        let err = FusionError::invalid_config("smoothing must be in (0, 1]");
        assert!(err.to_string().contains("invalid configuration"));
        assert!(err.to_string().contains("smoothing"));
    }
}
