//! Stabilized view orientation for the curved-screen viewer.

use glam::{DMat4, DQuat};
use head_types::Quaternion;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FusionError, Result};

/// Axis conventions between the sensor and view space.
///
/// The sensor's x axis is mirrored relative to view space, so the x
/// component is negated unless `invert_pitch` is set. The y and z
/// components are negated when `invert_yaw` / `invert_roll` are set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewAxes {
    /// Cancel the pitch mirror.
    pub invert_pitch: bool,
    /// Mirror yaw.
    pub invert_yaw: bool,
    /// Mirror roll.
    pub invert_roll: bool,
}

impl Default for ViewAxes {
    fn default() -> Self {
        Self {
            invert_pitch: false,
            invert_yaw: false,
            invert_roll: true,
        }
    }
}

impl ViewAxes {
    /// Maps a unit sensor quaternion into view space.
    #[must_use]
    pub fn remap(&self, unit: &Quaternion) -> DQuat {
        let x = if self.invert_pitch { unit.x } else { -unit.x };
        let y = if self.invert_yaw { -unit.y } else { unit.y };
        let z = if self.invert_roll { -unit.z } else { unit.z };
        DQuat::from_xyzw(x, y, z, unit.w)
    }
}

/// Orientation smoothing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientationParams {
    /// Slerp factor per update, in (0, 1].
    pub interpolation: f64,

    /// Sensor-to-view axis conventions.
    pub axes: ViewAxes,
}

impl Default for OrientationParams {
    fn default() -> Self {
        Self {
            interpolation: 0.15,
            axes: ViewAxes::default(),
        }
    }
}

impl OrientationParams {
    /// Set the slerp factor.
    #[must_use]
    pub const fn interpolation(mut self, factor: f64) -> Self {
        self.interpolation = factor;
        self
    }

    /// Set the axis conventions.
    #[must_use]
    pub const fn axes(mut self, axes: ViewAxes) -> Self {
        self.axes = axes;
        self
    }

    /// Checks the slerp factor.
    ///
    /// # Errors
    ///
    /// Returns [`FusionError::InvalidConfig`] if `interpolation` is
    /// outside (0, 1].
    pub fn validate(&self) -> Result<()> {
        if self.interpolation > 0.0 && self.interpolation <= 1.0 {
            Ok(())
        } else {
            Err(FusionError::invalid_config(format!(
                "orientation interpolation must be in (0, 1], got {}",
                self.interpolation
            )))
        }
    }
}

/// Slerps toward the latest reading and exposes the result as a view
/// rotation relative to a reference orientation.
///
/// The first reading after construction (or after
/// [`request_reset`](Self::request_reset)) becomes the reference, so the
/// view starts looking straight ahead.
///
/// # Example
///
/// ```
/// use head_fusion::{OrientationParams, OrientationSmoother};
/// use head_types::Quaternion;
///
/// let mut view = OrientationSmoother::new(OrientationParams::default().interpolation(1.0)).unwrap();
/// assert!(view.update(&Quaternion::new(0.9, 0.1, 0.3, 0.2)));
/// // The first reading is the reference: no relative rotation yet.
/// assert!(view.view_rotation().angle_between(glam::DQuat::IDENTITY) < 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct OrientationSmoother {
    params: OrientationParams,
    reference: DQuat,
    current: DQuat,
    needs_reference: bool,
}

impl OrientationSmoother {
    /// Creates a smoother at identity, waiting for its first reading.
    ///
    /// # Errors
    ///
    /// Returns [`FusionError::InvalidConfig`] if `params` are invalid.
    pub fn new(params: OrientationParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            reference: DQuat::IDENTITY,
            current: DQuat::IDENTITY,
            needs_reference: true,
        })
    }

    /// Feeds one raw reading. Returns `false` for a degenerate reading,
    /// which leaves the state untouched.
    pub fn update(&mut self, raw: &Quaternion) -> bool {
        let Some(unit) = raw.normalized() else {
            debug!("ignoring degenerate orientation");
            return false;
        };
        let target = self.params.axes.remap(&unit);
        if self.needs_reference {
            self.reference = target;
            self.needs_reference = false;
        }
        self.current = self
            .current
            .slerp(target, self.params.interpolation)
            .normalize();
        true
    }

    /// Uses the next reading as the new reference.
    pub fn request_reset(&mut self) {
        self.needs_reference = true;
    }

    /// Makes the current smoothed orientation the reference.
    pub fn reset_view(&mut self) {
        self.reference = self.current;
        self.needs_reference = false;
    }

    /// Smoothed orientation in view space.
    #[must_use]
    pub const fn current(&self) -> DQuat {
        self.current
    }

    /// Reference orientation in view space.
    #[must_use]
    pub const fn reference(&self) -> DQuat {
        self.reference
    }

    /// Camera rotation: the inverse of the head's rotation since the reference.
    #[must_use]
    pub fn view_rotation(&self) -> DQuat {
        (self.reference.inverse() * self.current).inverse()
    }

    /// [`view_rotation`](Self::view_rotation) as a 4x4 view matrix.
    #[must_use]
    pub fn view_matrix(&self) -> DMat4 {
        DMat4::from_quat(self.view_rotation())
    }
}
