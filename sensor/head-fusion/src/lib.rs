//! Head-tracking pipeline for headglass.
//!
//! Turns decoded orientation reports into actuation-ready signals:
//!
//! # Orientation
//!
//! - [`to_euler`] - Quaternion to pitch/yaw/roll with a gimbal-lock guard
//! - [`calibrate`] - Averages a burst of readings into a [`Baseline`]
//! - [`Baseline::apply`] - Baseline subtraction with shortest-path wrap
//!
//! # Smoothing
//!
//! - [`CursorMapper`] - Calibrated angles to an eased, clamped screen position
//! - [`OrientationSmoother`] - Slerp toward the latest reading, exposed as a view transform
//!
//! # Gestures
//!
//! - [`GestureDetector`] - Hysteresis detector turning head tilt into click events
//!
//! # Sources
//!
//! - [`ReportSource`] - Non-blocking report reads
//! - [`drain_latest`] - Latest-wins draining of queued reports
//!
//! # Example
//!
//! ```
//! use head_fusion::{GestureDetector, GestureEvent, GestureParams};
//!
//! let mut gestures = GestureDetector::new(GestureParams::default()).unwrap();
//! assert_eq!(gestures.update(0.0), None);
//! assert_eq!(gestures.update(25.0), Some(GestureEvent::Primary));
//! assert_eq!(gestures.update(25.0), None);
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod calibrate;
mod convert;
mod cursor;
mod error;
mod gesture;
mod source;
mod view;

pub use calibrate::{Baseline, CalibrationParams, calibrate};
pub use convert::to_euler;
pub use cursor::{CursorMapper, CursorParams, CursorPosition, ScreenSize};
pub use error::{FusionError, Result};
pub use gesture::{Direction, GestureDetector, GestureEvent, GestureParams, GestureState};
pub use source::{MAX_DRAIN, ReportSource, drain_latest};
pub use view::{OrientationParams, OrientationSmoother, ViewAxes};

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{
        Baseline, CalibrationParams, CursorMapper, CursorParams, CursorPosition, FusionError,
        GestureDetector, GestureEvent, GestureParams, OrientationParams, OrientationSmoother,
        ReportSource, ScreenSize, ViewAxes, calibrate, drain_latest, to_euler,
    };
}
