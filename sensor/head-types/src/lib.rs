//! Hardware-agnostic orientation types for head-mounted sensors.
//!
//! This crate holds the data that flows out of the headset before any
//! tracking logic touches it:
//!
//! - [`Quaternion`] - Raw orientation as reported by the sensor firmware
//! - [`EulerAngles`] - Pitch/yaw/roll in degrees
//! - [`decode_report`] - Parses a fixed-layout HID report into a [`Quaternion`]
//! - [`Pacer`] - Time source used by every polling loop
//!
//! # Layer 0 Crate
//!
//! No device, window or OS dependencies. It can be used by:
//! - HID drivers
//! - Simulated headsets
//! - Offline replays in tests
//!
//! # Example
//!
//! ```
//! use head_types::{decode_report, encode_report, Quaternion};
//!
//! let report = encode_report([1_073_741_824, 0, 0, 0]);
//! let q = decode_report(&report).unwrap();
//! assert!((q.w - 1_073_741_824.0).abs() < 1e-9);
//! assert!(q.normalized().is_some());
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod error;
mod euler;
mod quaternion;
mod report;
mod time;

pub use error::{Result, SensorError};
pub use euler::{EulerAngles, wrap_degrees};
pub use quaternion::Quaternion;
pub use report::{MIN_REPORT_LEN, REPORT_SIZE, decode_report, encode_report};
pub use time::{ManualPacer, Pacer, RealtimePacer};
