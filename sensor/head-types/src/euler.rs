//! Euler angle representation.

use std::ops::Sub;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Pitch, yaw and roll in degrees.
///
/// Derived from a [`Quaternion`](crate::Quaternion) every frame and never
/// stored as the source of truth.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EulerAngles {
    /// Nod up/down, degrees.
    pub pitch: f64,
    /// Turn left/right, degrees.
    pub yaw: f64,
    /// Head tilt toward a shoulder, degrees.
    pub roll: f64,
}

impl EulerAngles {
    /// All-zero angles.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Creates angles from components in degrees.
    #[must_use]
    pub const fn new(pitch: f64, yaw: f64, roll: f64) -> Self {
        Self { pitch, yaw, roll }
    }

    /// Applies [`wrap_degrees`] to every axis.
    #[must_use]
    pub fn wrapped(self) -> Self {
        Self::new(
            wrap_degrees(self.pitch),
            wrap_degrees(self.yaw),
            wrap_degrees(self.roll),
        )
    }

    /// Returns true if every component is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.pitch.is_finite() && self.yaw.is_finite() && self.roll.is_finite()
    }
}

impl Sub for EulerAngles {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.pitch - rhs.pitch, self.yaw - rhs.yaw, self.roll - rhs.roll)
    }
}

/// Brings an angle difference onto the shortest path.
///
/// A single correction pass: values above 180° lose 360°, values below
/// -180° gain 360°. Inputs are differences of two angles in (-180, 180],
/// so one pass is enough.
///
/// # Example
///
/// ```
/// use head_types::wrap_degrees;
///
/// assert!((wrap_degrees(190.0) + 170.0).abs() < 1e-12);
/// assert!((wrap_degrees(-190.0) - 170.0).abs() < 1e-12);
/// assert!((wrap_degrees(45.0) - 45.0).abs() < 1e-12);
/// ```
#[must_use]
pub fn wrap_degrees(diff: f64) -> f64 {
    if diff > 180.0 {
        diff - 360.0
    } else if diff < -180.0 {
        diff + 360.0
    } else {
        diff
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn wrap_positive_overflow() {
        assert_relative_eq!(wrap_degrees(190.0), -170.0);
    }

    #[test]
    fn wrap_negative_overflow() {
        assert_relative_eq!(wrap_degrees(-190.0), 170.0);
    }

    #[test]
    fn wrap_keeps_boundary() {
        assert_relative_eq!(wrap_degrees(180.0), 180.0);
        assert_relative_eq!(wrap_degrees(-180.0), -180.0);
    }

    #[test]
    fn sub_then_wrap() {
        let a = EulerAngles::new(170.0, -175.0, 10.0);
        let b = EulerAngles::new(-20.0, 15.0, 5.0);
        let d = (a - b).wrapped();
        assert_relative_eq!(d.pitch, -170.0);
        assert_relative_eq!(d.yaw, 170.0);
        assert_relative_eq!(d.roll, 5.0);
    }

    #[test]
    fn finite_check() {
        assert!(EulerAngles::ZERO.is_finite());
        assert!(!EulerAngles::new(f64::NAN, 0.0, 0.0).is_finite());
    }
}
