//! Head mouse: calibrated head angles drive the pointer, tilts click.

use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use head_fusion::{CursorMapper, GestureDetector, ReportSource, calibrate, drain_latest, to_euler};
use head_types::{Pacer, REPORT_SIZE, decode_report};
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::sinks::PointerSink;

/// What a mouse session did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MouseStats {
    /// Loop iterations.
    pub ticks: u64,
    /// Reports that moved the pointer.
    pub updates: u64,
    /// Clicks issued.
    pub clicks: u64,
}

/// Calibrates, then runs the pointer loop until `stop` is raised.
///
/// # Errors
///
/// Returns an error if calibration collects no samples or the config is
/// rejected by a component.
pub fn run<S, K, P>(
    config: &AppConfig,
    source: &mut S,
    pointer: &mut K,
    pacer: &mut P,
    stop: &AtomicBool,
) -> Result<MouseStats>
where
    S: ReportSource + ?Sized,
    K: PointerSink + ?Sized,
    P: Pacer + ?Sized,
{
    info!("calibrating, hold your head still");
    let baseline = calibrate(source, &config.calibration, pacer).context("calibration failed")?;

    let mut cursor = CursorMapper::new(config.cursor, config.screen, pointer.position())?;
    let mut gestures = GestureDetector::new(config.gesture)?;
    info!("head mouse running: tilt right to left-click, tilt left to right-click");

    let mut stats = MouseStats::default();
    let mut buf = [0u8; REPORT_SIZE];

    while !stop.load(Ordering::SeqCst) {
        stats.ticks += 1;

        let n = drain_latest(source, &mut buf);
        if n > 0 {
            match decode_report(&buf[..n]) {
                Ok(q) => {
                    let delta = baseline.apply(to_euler(&q));
                    pointer.move_to(cursor.update(&delta));
                    stats.updates += 1;

                    if let Some(event) = gestures.update(delta.roll) {
                        pointer.click(event);
                        stats.clicks += 1;
                    }
                }
                Err(e) => debug!(error = %e, "dropping report"),
            }
        }

        pacer.pause(config.sensor.poll_interval);
    }

    Ok(stats)
}
