//! Head-tilt click gestures.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{FusionError, Result};

/// Tilt direction of an active gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Tilt past `+fire_threshold`.
    Positive,
    /// Tilt past `-fire_threshold`.
    Negative,
}

/// Detector state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GestureState {
    /// Head inside the dead band, or never fired.
    #[default]
    Idle,
    /// Fired and waiting for the head to return to the dead band.
    Active(Direction),
}

/// Discrete action emitted on an `Idle -> Active` transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GestureEvent {
    /// Positive tilt (left click).
    Primary,
    /// Negative tilt (right click).
    Secondary,
}

/// Gesture thresholds in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GestureParams {
    /// Tilt that fires an event.
    pub fire_threshold: f64,

    /// Width of the dead band below `fire_threshold`.
    pub release_margin: f64,
}

impl Default for GestureParams {
    fn default() -> Self {
        Self {
            fire_threshold: 20.0,
            release_margin: 5.0,
        }
    }
}

impl GestureParams {
    /// Set the fire threshold.
    #[must_use]
    pub const fn fire_threshold(mut self, degrees: f64) -> Self {
        self.fire_threshold = degrees;
        self
    }

    /// Set the release margin.
    #[must_use]
    pub const fn release_margin(mut self, degrees: f64) -> Self {
        self.release_margin = degrees;
        self
    }

    /// Tilt below which an active gesture is released.
    #[must_use]
    pub fn release_threshold(&self) -> f64 {
        self.fire_threshold - self.release_margin
    }

    /// Checks the thresholds.
    ///
    /// # Errors
    ///
    /// Returns [`FusionError::InvalidConfig`] unless
    /// `0 < release_threshold < fire_threshold`. A zero release threshold
    /// would leave no dead band, so an active gesture could never release.
    pub fn validate(&self) -> Result<()> {
        let release = self.release_threshold();
        if self.release_margin > 0.0 && release > 0.0 && release < self.fire_threshold {
            Ok(())
        } else {
            Err(FusionError::invalid_config(format!(
                "gesture thresholds need 0 < release < fire, got fire {} margin {}",
                self.fire_threshold, self.release_margin
            )))
        }
    }
}

/// Hysteresis detector for tilt gestures.
///
/// Fires once when the tilt crosses `fire_threshold`, then stays latched
/// until the tilt drops inside the dead band (`|delta| < release_threshold`).
/// Flipping sign while latched does not fire.
#[derive(Debug, Clone)]
pub struct GestureDetector {
    params: GestureParams,
    state: GestureState,
}

impl GestureDetector {
    /// Creates an idle detector.
    ///
    /// # Errors
    ///
    /// Returns [`FusionError::InvalidConfig`] if `params` are invalid.
    pub fn new(params: GestureParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            state: GestureState::Idle,
        })
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> GestureState {
        self.state
    }

    /// Feeds one calibrated tilt reading.
    pub fn update(&mut self, delta: f64) -> Option<GestureEvent> {
        match self.state {
            GestureState::Idle => {
                let (direction, event) = if delta > self.params.fire_threshold {
                    (Direction::Positive, GestureEvent::Primary)
                } else if delta < -self.params.fire_threshold {
                    (Direction::Negative, GestureEvent::Secondary)
                } else {
                    return None;
                };
                self.state = GestureState::Active(direction);
                info!(?event, tilt = delta, "gesture fired");
                Some(event)
            }
            GestureState::Active(_) => {
                if delta.abs() < self.params.release_threshold() {
                    self.state = GestureState::Idle;
                }
                None
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn detector() -> GestureDetector {
        GestureDetector::new(GestureParams::default()).unwrap()
    }

    fn feed(d: &mut GestureDetector, deltas: &[f64]) -> Vec<GestureEvent> {
        deltas.iter().filter_map(|&x| d.update(x)).collect()
    }

    #[test]
    fn fires_once_while_held() {
        let mut d = detector();
        assert_eq!(feed(&mut d, &[0.0, 25.0, 25.0, 25.0]), vec![GestureEvent::Primary]);
        assert_eq!(d.state(), GestureState::Active(Direction::Positive));
    }

    #[test]
    fn sign_flip_without_dead_band_is_silent() {
        let mut d = detector();
        let events = feed(&mut d, &[0.0, 25.0, 25.0, 25.0, -25.0]);
        assert_eq!(events, vec![GestureEvent::Primary]);
        assert_eq!(d.state(), GestureState::Active(Direction::Positive));

        // Re-entering the dead band then crossing again fires.
        assert_eq!(feed(&mut d, &[0.0, -25.0]), vec![GestureEvent::Secondary]);
    }

    #[test]
    fn dead_band_allows_second_fire() {
        let mut d = detector();
        let events = feed(&mut d, &[0.0, 25.0, 10.0, 25.0]);
        assert_eq!(events, vec![GestureEvent::Primary, GestureEvent::Primary]);
    }

    #[test]
    fn hysteresis_band_keeps_latch() {
        let mut d = detector();
        // 17° is between release (15°) and fire (20°).
        let events = feed(&mut d, &[25.0, 17.0, 25.0, 19.9, 21.0]);
        assert_eq!(events, vec![GestureEvent::Primary]);
    }

    #[test]
    fn band_without_crossing_is_silent() {
        let mut d = detector();
        assert!(feed(&mut d, &[17.0, 19.0, -18.0, 20.0, -20.0]).is_empty());
        assert_eq!(d.state(), GestureState::Idle);
    }

    #[test]
    fn negative_tilt_is_secondary() {
        let mut d = detector();
        assert_eq!(d.update(-30.0), Some(GestureEvent::Secondary));
        assert_eq!(d.state(), GestureState::Active(Direction::Negative));
        assert_eq!(d.update(-14.0), None);
        assert_eq!(d.state(), GestureState::Idle);
    }

    #[test]
    fn release_threshold_is_fire_minus_margin() {
        let p = GestureParams::default();
        assert!((p.release_threshold() - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_thresholds_rejected() {
        assert!(GestureDetector::new(GestureParams::default().release_margin(0.0)).is_err());
        assert!(GestureDetector::new(GestureParams::default().release_margin(25.0)).is_err());
        assert!(GestureDetector::new(GestureParams::default().fire_threshold(f64::NAN)).is_err());
    }

    #[test]
    fn fire_equal_to_margin_is_rejected() {
        // Release would be 0°, so nothing could ever re-arm the detector.
        let latching = GestureParams::default().fire_threshold(5.0);
        assert!(latching.validate().is_err());
        assert!(GestureDetector::new(latching).is_err());
    }

    #[test]
    fn narrow_band_still_rearms() {
        let params = GestureParams::default().fire_threshold(5.0).release_margin(4.0);
        let mut d = GestureDetector::new(params).unwrap();
        let events = feed(&mut d, &[10.0, 0.0, 0.0, 10.0, 0.0, 10.0]);
        assert_eq!(events, vec![GestureEvent::Primary; 3]);
        assert_eq!(d.state(), GestureState::Active(Direction::Positive));
    }
}
