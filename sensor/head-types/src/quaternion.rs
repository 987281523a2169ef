//! Raw orientation quaternion.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Orientation quaternion as delivered by the sensor firmware.
///
/// Components are kept in whatever units the firmware uses (typically
/// fixed-point integers cast to `f64`). Call [`Quaternion::normalized`]
/// before treating it as a rotation.
///
/// # Example
///
/// ```
/// use head_types::Quaternion;
///
/// let q = Quaternion::new(2.0, 0.0, 0.0, 0.0);
/// let unit = q.normalized().unwrap();
/// assert!((unit.w - 1.0).abs() < 1e-12);
///
/// assert!(Quaternion::new(0.0, 0.0, 0.0, 0.0).normalized().is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Quaternion {
    /// Scalar part.
    pub w: f64,
    /// First vector component.
    pub x: f64,
    /// Second vector component.
    pub y: f64,
    /// Third vector component.
    pub z: f64,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quaternion {
    /// The identity rotation.
    pub const IDENTITY: Self = Self::new(1.0, 0.0, 0.0, 0.0);

    /// Creates a quaternion from its components.
    #[must_use]
    pub const fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    /// Creates a quaternion from raw integer sensor units.
    #[must_use]
    pub fn from_raw(raw: [i32; 4]) -> Self {
        Self::new(
            f64::from(raw[0]),
            f64::from(raw[1]),
            f64::from(raw[2]),
            f64::from(raw[3]),
        )
    }

    /// Euclidean norm of the four components.
    #[must_use]
    pub fn norm(&self) -> f64 {
        (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Returns the unit quaternion, or `None` for a degenerate reading.
    ///
    /// A reading is degenerate when its norm is zero or not finite.
    #[must_use]
    pub fn normalized(&self) -> Option<Self> {
        let n = self.norm();
        if n == 0.0 || !n.is_finite() {
            return None;
        }
        Some(Self::new(self.w / n, self.x / n, self.y / n, self.z / n))
    }

    /// Returns the components as `[w, x, y, z]`.
    #[must_use]
    pub const fn to_array(&self) -> [f64; 4] {
        [self.w, self.x, self.y, self.z]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn from_raw_casts_each_component() {
        let q = Quaternion::from_raw([1, -2, 3, i32::MIN]);
        assert_eq!(q.to_array(), [1.0, -2.0, 3.0, f64::from(i32::MIN)]);
    }

    #[test]
    fn normalized_has_unit_norm() {
        let q = Quaternion::new(3.0, 4.0, 0.0, 12.0).normalized().unwrap();
        assert_relative_eq!(q.norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(q.w, 3.0 / 13.0, epsilon = 1e-12);
    }

    #[test]
    fn zero_norm_is_degenerate() {
        assert!(Quaternion::new(0.0, 0.0, 0.0, 0.0).normalized().is_none());
    }

    #[test]
    fn non_finite_is_degenerate() {
        assert!(Quaternion::new(f64::NAN, 0.0, 0.0, 0.0).normalized().is_none());
        assert!(
            Quaternion::new(f64::INFINITY, 1.0, 0.0, 0.0)
                .normalized()
                .is_none()
        );
    }

    #[test]
    fn default_is_identity() {
        assert_eq!(Quaternion::default(), Quaternion::IDENTITY);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_named_components() {
        let json = serde_json::to_string(&Quaternion::IDENTITY).unwrap();
        assert!(json.contains("\"w\":1.0"));
    }
}
