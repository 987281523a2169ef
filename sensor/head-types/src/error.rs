//! Error types for sensor reports.

use thiserror::Error;

/// Errors that can occur when reading orientation reports.
#[derive(Debug, Error)]
pub enum SensorError {
    /// Report is too short to contain a quaternion.
    ///
    /// Callers treat this as "no new data" and skip the frame.
    #[error("short report: expected at least {expected} bytes, got {actual}")]
    ShortReport {
        /// Minimum report length.
        expected: usize,
        /// Actual report length.
        actual: usize,
    },

    /// No device matched the requested vendor/product pair.
    #[error("sensor not found: vendor {vendor:#06x}, product {product:#06x}")]
    NotFound {
        /// USB vendor identifier.
        vendor: u16,
        /// USB product identifier.
        product: u16,
    },

    /// The device reported an I/O failure.
    #[error("device error: {0}")]
    Device(String),
}

impl SensorError {
    /// Creates a short report error.
    #[must_use]
    pub const fn short_report(expected: usize, actual: usize) -> Self {
        Self::ShortReport { expected, actual }
    }

    /// Creates a device-not-found error.
    #[must_use]
    pub const fn not_found(vendor: u16, product: u16) -> Self {
        Self::NotFound { vendor, product }
    }

    /// Creates a device error.
    #[must_use]
    pub fn device(reason: impl Into<String>) -> Self {
        Self::Device(reason.into())
    }
}

/// Result type for sensor operations.
pub type Result<T> = std::result::Result<T, SensorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_short_report() {
        let err = SensorError::short_report(20, 7);
        let msg = format!("{err}");
        assert!(msg.contains("short report"));
        assert!(msg.contains("20"));
        assert!(msg.contains('7'));
    }

    #[test]
    fn error_not_found_shows_hex_ids() {
        let err = SensorError::not_found(0x4817, 0x4242);
        let msg = format!("{err}");
        assert!(msg.contains("0x4817"));
        assert!(msg.contains("0x4242"));
    }

    #[test]
    fn error_device() {
        let err = SensorError::device("pipe closed");
        assert!(err.to_string().contains("pipe closed"));
    }
}
