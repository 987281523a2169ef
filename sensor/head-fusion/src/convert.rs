//! Quaternion to Euler angle conversion.

use head_types::{EulerAngles, Quaternion};

/// Converts a raw sensor quaternion into pitch/yaw/roll degrees.
///
/// The input is normalized first. A zero-norm (or non-finite) reading
/// yields `(0, 0, 0)` instead of dividing by zero.
///
/// - `pitch` and `yaw` come from two-argument arctangents over the
///   rotation-matrix terms, in (-180, 180].
/// - `roll` comes from an arcsine and saturates to ±90° at the
///   gimbal-lock boundary, in [-90, 90].
///
/// # Example
///
/// ```
/// use head_fusion::to_euler;
/// use head_types::Quaternion;
///
/// let half = std::f64::consts::FRAC_PI_4; // 90° about z
/// let q = Quaternion::new(half.cos(), 0.0, 0.0, half.sin());
/// let angles = to_euler(&q);
/// assert!((angles.yaw - 90.0).abs() < 1e-9);
/// assert!(angles.pitch.abs() < 1e-9);
/// ```
#[must_use]
pub fn to_euler(q: &Quaternion) -> EulerAngles {
    let Some(Quaternion { w, x, y, z }) = q.normalized() else {
        return EulerAngles::ZERO;
    };

    let pitch = (2.0 * (w * x + y * z))
        .atan2(1.0 - 2.0 * (x * x + y * y))
        .to_degrees();
    let yaw = (2.0 * (w * z + x * y))
        .atan2(1.0 - 2.0 * (y * y + z * z))
        .to_degrees();

    let sin_roll = 2.0 * (w * y - z * x);
    let roll = if sin_roll.abs() >= 1.0 {
        90.0_f64.copysign(sin_roll)
    } else {
        sin_roll.asin().to_degrees()
    };

    EulerAngles::new(half_open(pitch), half_open(yaw), roll)
}

// atan2 can return exactly -180; fold it onto +180.
fn half_open(deg: f64) -> f64 {
    if deg <= -180.0 { deg + 360.0 } else { deg }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_4};

    fn axis_angle(axis: [f64; 3], deg: f64) -> Quaternion {
        let half = deg.to_radians() / 2.0;
        let s = half.sin();
        Quaternion::new(half.cos(), axis[0] * s, axis[1] * s, axis[2] * s)
    }

    #[test]
    fn identity_is_zero() {
        let a = to_euler(&Quaternion::IDENTITY);
        assert_eq!(a, EulerAngles::ZERO);
    }

    #[test]
    fn zero_norm_is_zero() {
        let a = to_euler(&Quaternion::new(0.0, 0.0, 0.0, 0.0));
        assert_eq!(a, EulerAngles::ZERO);
    }

    #[test]
    fn nan_input_is_zero() {
        let a = to_euler(&Quaternion::new(f64::NAN, 1.0, 0.0, 0.0));
        assert_eq!(a, EulerAngles::ZERO);
    }

    #[test]
    fn rotation_about_x_is_pitch() {
        let a = to_euler(&axis_angle([1.0, 0.0, 0.0], 30.0));
        assert_relative_eq!(a.pitch, 30.0, epsilon = 1e-9);
        assert_relative_eq!(a.yaw, 0.0, epsilon = 1e-9);
        assert_relative_eq!(a.roll, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn rotation_about_y_is_roll() {
        let a = to_euler(&axis_angle([0.0, 1.0, 0.0], -40.0));
        assert_relative_eq!(a.roll, -40.0, epsilon = 1e-9);
        assert_relative_eq!(a.pitch, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn unnormalized_input_matches_normalized() {
        let unit = axis_angle([0.0, 0.0, 1.0], 55.0);
        let scaled = Quaternion::new(unit.w * 1e9, unit.x * 1e9, unit.y * 1e9, unit.z * 1e9);
        let a = to_euler(&unit);
        let b = to_euler(&scaled);
        assert_relative_eq!(a.yaw, b.yaw, epsilon = 1e-9);
        assert_relative_eq!(b.yaw, 55.0, epsilon = 1e-9);
    }

    #[test]
    fn gimbal_lock_saturates() {
        // 90° about y puts 2(wy - zx) at exactly 1.
        let q = Quaternion::new(FRAC_1_SQRT_2, 0.0, FRAC_1_SQRT_2, 0.0);
        let a = to_euler(&q);
        assert_relative_eq!(a.roll, 90.0, epsilon = 1e-6);
        assert!(a.is_finite());

        let q = Quaternion::new(FRAC_1_SQRT_2, 0.0, -FRAC_1_SQRT_2, 0.0);
        assert_relative_eq!(to_euler(&q).roll, -90.0, epsilon = 1e-6);
    }

    #[test]
    fn past_gimbal_lock_stays_clamped() {
        // Rounding can push the arcsine argument slightly above 1.
        let c = FRAC_1_SQRT_2 + 1e-8;
        let q = Quaternion::new(c, 0.0, c, 0.0);
        let a = to_euler(&q);
        assert!(a.roll <= 90.0 && a.roll >= -90.0);
        assert!(a.is_finite());
    }

    #[test]
    fn half_turn_yaw_is_positive_180() {
        let a = to_euler(&Quaternion::new(0.0, 0.0, 0.0, 1.0));
        assert_relative_eq!(a.yaw, 180.0, epsilon = 1e-9);
    }

    #[test]
    fn angles_stay_in_range_over_a_grid() {
        let steps = 12;
        for i in 0..steps {
            for j in 0..steps {
                for k in 0..steps {
                    let a = f64::from(i) * FRAC_PI_4 - 3.0;
                    let b = f64::from(j) * 0.61 - 2.0;
                    let c = f64::from(k) * 0.37 + 0.1;
                    let q = Quaternion::new(a.cos(), a.sin() * b.cos(), b.sin(), c.sin() * a.cos());
                    let e = to_euler(&q);
                    assert!(e.is_finite(), "{q:?} -> {e:?}");
                    assert!(e.pitch > -180.0 && e.pitch <= 180.0, "{e:?}");
                    assert!(e.yaw > -180.0 && e.yaw <= 180.0, "{e:?}");
                    assert!(e.roll >= -90.0 && e.roll <= 90.0, "{e:?}");
                }
            }
        }
    }
}
