//! Virtual display acquisition for the headglass viewer.
//!
//! Before the viewer can render, three external resources have to line up,
//! and each can fail transiently:
//!
//! 1. A virtual display is toggled off and on through an external driver tool
//! 2. The display is forced to the target resolution
//! 3. Every adapter/output pair is probed for a capturable output of that size
//!
//! [`AcquisitionCoordinator`] runs these steps once, in order, with a
//! per-step retry budget, and hands back a started [`CaptureSession`].
//!
//! # Collaborators
//!
//! The platform APIs sit behind traits so the coordinator can run against
//! real drivers or test doubles:
//!
//! - [`DisplayDriver`] - enable/disable the virtual display ([`DriverTool`] runs an executable)
//! - [`DisplayModes`] - enumerate devices and modes, apply a mode
//! - [`CaptureBackend`] / [`CaptureOutput`] - open and start a capture stream
//!
//! # Failure policy
//!
//! | Step | On failure |
//! |------|------------|
//! | Driver toggle | warn, continue |
//! | Resolution | warn after retries, continue |
//! | Output scan | [`AcquisitionState::Failed`], returned to the caller |
//!
//! All waits go through a [`head_types::Pacer`].

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod capture;
mod coordinator;
mod driver;
mod error;
mod modes;
mod retry;

pub use capture::{CaptureBackend, CaptureMode, CaptureOutput, CaptureSession, Frame};
pub use coordinator::{AcquisitionCoordinator, AcquisitionParams, AcquisitionState};
pub use driver::{DisplayDriver, DriverTool};
pub use error::{AcquireError, Result};
pub use modes::{DisplayMode, DisplayModes, find_display_with_width, force_resolution};
pub use retry::{BoundedRetry, RetryExhausted};
