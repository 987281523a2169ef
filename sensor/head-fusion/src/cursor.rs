//! Head angles to cursor position.

use head_types::EulerAngles;
use serde::{Deserialize, Serialize};

use crate::error::{FusionError, Result};

/// Screen dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl ScreenSize {
    /// Creates a screen size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Center of the screen.
    #[must_use]
    pub fn center(&self) -> CursorPosition {
        CursorPosition::new(f64::from(self.width) / 2.0, f64::from(self.height) / 2.0)
    }

    /// Clamps a position to `[0, dim - 1]` on each axis.
    #[must_use]
    pub fn clamp(&self, p: CursorPosition) -> CursorPosition {
        let max_x = f64::from(self.width.saturating_sub(1));
        let max_y = f64::from(self.height.saturating_sub(1));
        CursorPosition::new(p.x.clamp(0.0, max_x), p.y.clamp(0.0, max_y))
    }
}

/// A continuous cursor position in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CursorPosition {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
}

impl CursorPosition {
    /// Creates a position.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Cursor mapping parameters.
///
/// # Example
///
/// ```
/// use head_fusion::CursorParams;
///
/// let params = CursorParams::default().smoothing(1.0);
/// assert!(params.validate().is_ok());
/// assert!(CursorParams::default().smoothing(0.0).validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CursorParams {
    /// Yaw (degrees) that moves the cursor from center to the screen edge.
    pub range_x_deg: f64,

    /// Pitch (degrees) that moves the cursor from center to the screen edge.
    pub range_y_deg: f64,

    /// Fraction of the remaining distance covered per update, in (0, 1].
    /// Higher is snappier, lower is smoother.
    pub smoothing: f64,

    /// Flip the horizontal axis.
    pub invert_x: bool,

    /// Flip the vertical axis.
    pub invert_y: bool,
}

impl Default for CursorParams {
    fn default() -> Self {
        Self {
            range_x_deg: 25.0,
            range_y_deg: 15.0,
            smoothing: 0.2,
            invert_x: true,
            invert_y: false,
        }
    }
}

impl CursorParams {
    /// Set the smoothing factor.
    #[must_use]
    pub const fn smoothing(mut self, smoothing: f64) -> Self {
        self.smoothing = smoothing;
        self
    }

    /// Set the angular ranges.
    #[must_use]
    pub const fn ranges(mut self, x_deg: f64, y_deg: f64) -> Self {
        self.range_x_deg = x_deg;
        self.range_y_deg = y_deg;
        self
    }

    /// Set the axis inversion flags.
    #[must_use]
    pub const fn invert(mut self, x: bool, y: bool) -> Self {
        self.invert_x = x;
        self.invert_y = y;
        self
    }

    /// Checks the smoothing factor and ranges.
    ///
    /// # Errors
    ///
    /// Returns [`FusionError::InvalidConfig`] if `smoothing` is outside
    /// (0, 1] or a range is not strictly positive.
    pub fn validate(&self) -> Result<()> {
        if !(self.smoothing > 0.0 && self.smoothing <= 1.0) {
            return Err(FusionError::invalid_config(format!(
                "cursor smoothing must be in (0, 1], got {}",
                self.smoothing
            )));
        }
        if !(self.range_x_deg > 0.0 && self.range_y_deg > 0.0) {
            return Err(FusionError::invalid_config(
                "cursor angular ranges must be positive",
            ));
        }
        Ok(())
    }
}

/// Eases the cursor toward the position the head is pointing at.
///
/// Yaw drives x and pitch drives y. Each update computes a clamped target
/// and moves `smoothing` of the remaining distance toward it, so the
/// output never jumps and never leaves the screen.
///
/// # Example
///
/// ```
/// use head_fusion::{CursorMapper, CursorParams, ScreenSize};
/// use head_types::EulerAngles;
///
/// let screen = ScreenSize::new(1920, 1080);
/// let params = CursorParams::default().smoothing(1.0).invert(false, false);
/// let mut cursor = CursorMapper::new(params, screen, screen.center()).unwrap();
///
/// // Half the yaw range moves a quarter screen to the right.
/// let p = cursor.update(&EulerAngles::new(0.0, 12.5, 0.0));
/// assert!((p.x - 1440.0).abs() < 1e-9);
/// assert!((p.y - 540.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct CursorMapper {
    params: CursorParams,
    screen: ScreenSize,
    current: CursorPosition,
}

impl CursorMapper {
    /// Creates a mapper starting at `start` (usually the pointer's
    /// current position). The start is clamped to the screen.
    ///
    /// # Errors
    ///
    /// Returns [`FusionError::InvalidConfig`] if `params` are invalid or
    /// the screen is empty.
    pub fn new(params: CursorParams, screen: ScreenSize, start: CursorPosition) -> Result<Self> {
        params.validate()?;
        if screen.width == 0 || screen.height == 0 {
            return Err(FusionError::invalid_config("screen size must be non-zero"));
        }
        Ok(Self {
            params,
            screen,
            current: screen.clamp(start),
        })
    }

    /// Current smoothed position.
    #[must_use]
    pub const fn position(&self) -> CursorPosition {
        self.current
    }

    /// Screen the mapper clamps to.
    #[must_use]
    pub const fn screen(&self) -> ScreenSize {
        self.screen
    }

    /// Clamped target for a calibrated reading, without smoothing.
    #[must_use]
    pub fn target(&self, delta: &EulerAngles) -> CursorPosition {
        let yaw = if self.params.invert_x { -delta.yaw } else { delta.yaw };
        let pitch = if self.params.invert_y { -delta.pitch } else { delta.pitch };

        let center = self.screen.center();
        let x = center.x + (yaw / self.params.range_x_deg) * (f64::from(self.screen.width) / 2.0);
        let y = center.y + (pitch / self.params.range_y_deg) * (f64::from(self.screen.height) / 2.0);
        self.screen.clamp(CursorPosition::new(x, y))
    }

    /// Moves toward the target for `delta` and returns the new position.
    ///
    /// Non-finite input leaves the cursor where it is.
    pub fn update(&mut self, delta: &EulerAngles) -> CursorPosition {
        if !delta.is_finite() {
            return self.current;
        }
        let target = self.target(delta);
        let s = self.params.smoothing;
        self.current.x += (target.x - self.current.x) * s;
        self.current.y += (target.y - self.current.y) * s;
        self.current
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn screen() -> ScreenSize {
        ScreenSize::new(1920, 1080)
    }

    fn mapper(smoothing: f64) -> CursorMapper {
        let params = CursorParams::default().smoothing(smoothing);
        CursorMapper::new(params, screen(), screen().center()).unwrap()
    }

    #[test]
    fn full_smoothing_hits_target_in_one_update() {
        let mut m = mapper(1.0);
        let delta = EulerAngles::new(-7.5, 5.0, 0.0);
        let target = m.target(&delta);
        let p = m.update(&delta);
        assert_eq!(p, target);
    }

    #[test]
    fn tiny_smoothing_barely_moves() {
        let mut m = mapper(1e-6);
        let start = m.position();
        let p = m.update(&EulerAngles::new(15.0, 25.0, 0.0));
        assert!((p.x - start.x).abs() < 1e-2);
        assert!((p.y - start.y).abs() < 1e-2);
    }

    #[test]
    fn converges_exponentially() {
        let mut m = mapper(0.5);
        let delta = EulerAngles::new(0.0, -12.5, 0.0);
        let target = m.target(&delta);
        let start = m.position();
        let p = m.update(&delta);
        assert_relative_eq!(p.x, start.x + (target.x - start.x) * 0.5);
        let p = m.update(&delta);
        assert_relative_eq!(p.x, start.x + (target.x - start.x) * 0.75);
    }

    #[test]
    fn invert_x_flips_yaw_direction() {
        let m = mapper(1.0);
        // invert_x is on by default: turning right moves the cursor left.
        assert!(m.target(&EulerAngles::new(0.0, 10.0, 0.0)).x < 960.0);

        let params = CursorParams::default().invert(false, true);
        let m = CursorMapper::new(params, screen(), screen().center()).unwrap();
        assert!(m.target(&EulerAngles::new(0.0, 10.0, 0.0)).x > 960.0);
        assert!(m.target(&EulerAngles::new(10.0, 0.0, 0.0)).y < 540.0);
    }

    #[test]
    fn never_leaves_screen() {
        for smoothing in [1.0, 0.7, 0.2, 0.01] {
            let mut m = mapper(smoothing);
            for &(p, y) in &[(500.0, -500.0), (-1e9, 1e9), (180.0, 180.0), (-180.0, -180.0)] {
                for _ in 0..50 {
                    let pos = m.update(&EulerAngles::new(p, y, 0.0));
                    assert!(pos.x >= 0.0 && pos.x <= 1919.0, "{pos:?}");
                    assert!(pos.y >= 0.0 && pos.y <= 1079.0, "{pos:?}");
                }
            }
        }
    }

    #[test]
    fn start_outside_screen_is_clamped() {
        let m = CursorMapper::new(
            CursorParams::default(),
            screen(),
            CursorPosition::new(-40.0, 5000.0),
        )
        .unwrap();
        assert_eq!(m.position(), CursorPosition::new(0.0, 1079.0));
    }

    #[test]
    fn non_finite_input_is_ignored() {
        let mut m = mapper(1.0);
        let before = m.position();
        assert_eq!(m.update(&EulerAngles::new(f64::NAN, 0.0, 0.0)), before);
    }

    #[test]
    fn invalid_params_rejected() {
        let s = screen();
        let c = s.center();
        assert!(CursorMapper::new(CursorParams::default().smoothing(1.5), s, c).is_err());
        assert!(CursorMapper::new(CursorParams::default().smoothing(f64::NAN), s, c).is_err());
        assert!(CursorMapper::new(CursorParams::default().ranges(0.0, 15.0), s, c).is_err());
        assert!(CursorMapper::new(CursorParams::default(), ScreenSize::new(0, 10), c).is_err());
    }
}
