//! Startup calibration and baseline subtraction.

use std::time::Duration;

use head_types::{EulerAngles, Pacer, REPORT_SIZE, decode_report};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::convert::to_euler;
use crate::error::{FusionError, Result};
use crate::source::ReportSource;

/// Parameters for the calibration window.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use head_fusion::CalibrationParams;
///
/// let params = CalibrationParams::default()
///     .duration(Duration::from_secs(1))
///     .discard_count(0);
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationParams {
    /// How long to collect samples.
    pub duration: Duration,

    /// Reads thrown away before collecting (sensor warm-up).
    pub discard_count: usize,

    /// Sleep between polls.
    pub poll_interval: Duration,
}

impl Default for CalibrationParams {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(3),
            discard_count: 10,
            poll_interval: Duration::from_millis(10),
        }
    }
}

impl CalibrationParams {
    /// Set the collection window.
    #[must_use]
    pub const fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Set the number of warm-up reads to discard.
    #[must_use]
    pub const fn discard_count(mut self, count: usize) -> Self {
        self.discard_count = count;
        self
    }

    /// Set the poll interval.
    #[must_use]
    pub const fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Checks that the window can terminate.
    ///
    /// # Errors
    ///
    /// Returns [`FusionError::InvalidConfig`] if the poll interval is zero.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(FusionError::invalid_config(
                "calibration poll interval must be non-zero",
            ));
        }
        Ok(())
    }
}

/// Mean head orientation captured at startup (or on reset).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    /// Per-axis mean of the calibration samples.
    pub angles: EulerAngles,

    /// Number of samples averaged.
    pub samples: usize,
}

impl Baseline {
    /// Creates a baseline from known angles.
    #[must_use]
    pub const fn new(angles: EulerAngles, samples: usize) -> Self {
        Self { angles, samples }
    }

    /// Subtracts the baseline from a reading.
    ///
    /// Each axis gets one shortest-path wrap pass afterwards.
    ///
    /// # Example
    ///
    /// ```
    /// use head_fusion::Baseline;
    /// use head_types::EulerAngles;
    ///
    /// let baseline = Baseline::new(EulerAngles::new(-100.0, 0.0, 0.0), 1);
    /// let delta = baseline.apply(EulerAngles::new(90.0, 0.0, 0.0));
    /// assert!((delta.pitch + 170.0).abs() < 1e-9);
    /// ```
    #[must_use]
    pub fn apply(&self, angles: EulerAngles) -> EulerAngles {
        (angles - self.angles).wrapped()
    }
}

/// Averages orientation over the calibration window.
///
/// Discards `discard_count` reads, then polls `source` until
/// `params.duration` has elapsed on `pacer`, sleeping `poll_interval`
/// between polls. Reports that fail to decode are skipped.
///
/// # Errors
///
/// - [`FusionError::InvalidConfig`] if `params` fails validation
/// - [`FusionError::Calibration`] if no valid sample was collected
pub fn calibrate<S, P>(source: &mut S, params: &CalibrationParams, pacer: &mut P) -> Result<Baseline>
where
    S: ReportSource + ?Sized,
    P: Pacer + ?Sized,
{
    params.validate()?;

    let mut buf = [0u8; REPORT_SIZE];
    for _ in 0..params.discard_count {
        source.read_report(&mut buf);
    }

    let start = pacer.elapsed();
    let mut sum = [0.0_f64; 3];
    let mut samples = 0usize;
    let mut polls = 0usize;

    while pacer.elapsed().saturating_sub(start) < params.duration {
        polls += 1;
        let n = source.read_report(&mut buf).min(REPORT_SIZE);
        if n > 0 {
            match decode_report(&buf[..n]) {
                Ok(q) => {
                    let a = to_euler(&q);
                    sum[0] += a.pitch;
                    sum[1] += a.yaw;
                    sum[2] += a.roll;
                    samples += 1;
                }
                Err(e) => debug!(error = %e, "skipping calibration frame"),
            }
        }
        pacer.pause(params.poll_interval);
    }

    if samples == 0 {
        return Err(FusionError::calibration(polls));
    }

    #[allow(clippy::cast_precision_loss)]
    let n = samples as f64;
    let baseline = Baseline::new(EulerAngles::new(sum[0] / n, sum[1] / n, sum[2] / n), samples);
    info!(
        samples,
        polls,
        pitch = baseline.angles.pitch,
        yaw = baseline.angles.yaw,
        roll = baseline.angles.roll,
        "calibration complete"
    );
    Ok(baseline)
}
