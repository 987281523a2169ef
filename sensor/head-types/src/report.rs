//! Fixed-layout sensor report decoding.
//!
//! Layout of an orientation report:
//!
//! | Bytes  | Content                         |
//! |--------|---------------------------------|
//! | 0..4   | Report header (ignored)         |
//! | 4..8   | `w`, big-endian `i32`           |
//! | 8..12  | `x`, big-endian `i32`           |
//! | 12..16 | `y`, big-endian `i32`           |
//! | 16..20 | `z`, big-endian `i32`           |
//! | 20..   | Vendor data (ignored)           |
//!
//! There is no checksum and the header is not validated. A corrupt report
//! decodes to an arbitrary (possibly degenerate) quaternion.

use crate::error::{Result, SensorError};
use crate::quaternion::Quaternion;

/// Size of a single read from the sensor's report interface.
pub const REPORT_SIZE: usize = 64;

/// Shortest report that still carries a quaternion.
pub const MIN_REPORT_LEN: usize = 20;

const HEADER_LEN: usize = 4;

/// Decodes the orientation quaternion from a raw report.
///
/// # Errors
///
/// Returns [`SensorError::ShortReport`] if `report` is shorter than
/// [`MIN_REPORT_LEN`]. The frame should be skipped, not treated as fatal.
///
/// # Example
///
/// ```
/// use head_types::{decode_report, SensorError};
///
/// let mut report = [0u8; 20];
/// report[4..8].copy_from_slice(&1000i32.to_be_bytes());
/// report[16..20].copy_from_slice(&(-5i32).to_be_bytes());
/// let q = decode_report(&report).unwrap();
/// assert!((q.w - 1000.0).abs() < 1e-12);
/// assert!((q.z + 5.0).abs() < 1e-12);
///
/// assert!(matches!(
///     decode_report(&report[..19]),
///     Err(SensorError::ShortReport { .. })
/// ));
/// ```
pub fn decode_report(report: &[u8]) -> Result<Quaternion> {
    if report.len() < MIN_REPORT_LEN {
        return Err(SensorError::short_report(MIN_REPORT_LEN, report.len()));
    }

    let mut raw = [0i32; 4];
    for (i, chunk) in report[HEADER_LEN..MIN_REPORT_LEN].chunks_exact(4).enumerate() {
        raw[i] = i32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    Ok(Quaternion::from_raw(raw))
}

/// Encodes raw `[w, x, y, z]` sensor units into a full-size report.
///
/// The header and trailing vendor bytes are zero.
#[must_use]
pub fn encode_report(raw: [i32; 4]) -> [u8; REPORT_SIZE] {
    let mut report = [0u8; REPORT_SIZE];
    for (i, value) in raw.iter().enumerate() {
        let start = HEADER_LEN + i * 4;
        report[start..start + 4].copy_from_slice(&value.to_be_bytes());
    }
    report
}
