//! Stabilized viewer: head orientation drives the camera over the
//! captured virtual display.

use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use display_acquire::CaptureSession;
use head_fusion::{OrientationSmoother, ReportSource, drain_latest};
use head_types::{Pacer, REPORT_SIZE, decode_report};
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::sinks::{Compositor, ViewerEvent};

/// What a viewer session did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewerStats {
    /// Frames presented.
    pub presented: u64,
    /// Orientation updates applied.
    pub updates: u64,
    /// Captured frames handed to the compositor.
    pub captured: u64,
    /// View resets.
    pub resets: u64,
}

/// Where captured frames come from.
pub trait FrameSource {
    /// Most recent frame, if a new one arrived.
    fn latest_frame(&mut self) -> Option<display_acquire::Frame>;
}

impl FrameSource for CaptureSession {
    fn latest_frame(&mut self) -> Option<display_acquire::Frame> {
        Self::latest_frame(self)
    }
}

/// Runs the frame-capped render loop until `stop` is raised or the
/// compositor asks to quit.
///
/// # Errors
///
/// Returns an error if the orientation parameters are invalid.
pub fn run<S, F, C, P>(
    config: &AppConfig,
    source: &mut S,
    capture: &mut F,
    compositor: &mut C,
    pacer: &mut P,
    stop: &AtomicBool,
) -> Result<ViewerStats>
where
    S: ReportSource + ?Sized,
    F: FrameSource + ?Sized,
    C: Compositor + ?Sized,
    P: Pacer + ?Sized,
{
    let mut view = OrientationSmoother::new(config.orientation)?;
    let frame_time = config.frame_time();
    let mut stats = ViewerStats::default();
    let mut buf = [0u8; REPORT_SIZE];

    info!(fps = config.viewer_fps, "viewer running");

    while !stop.load(Ordering::SeqCst) {
        let tick = pacer.elapsed();

        let n = drain_latest(source, &mut buf);
        if n > 0 {
            match decode_report(&buf[..n]) {
                Ok(q) => {
                    if view.update(&q) {
                        stats.updates += 1;
                    }
                }
                Err(e) => debug!(error = %e, "dropping report"),
            }
        }

        let frame = capture.latest_frame();
        if frame.is_some() {
            stats.captured += 1;
        }

        let event = compositor.present(&view.view_matrix(), frame.as_ref());
        stats.presented += 1;
        match event {
            Some(ViewerEvent::ResetView) => {
                view.reset_view();
                stats.resets += 1;
                info!("view reset");
            }
            Some(ViewerEvent::Quit) => break,
            None => {}
        }

        let spent = pacer.elapsed().saturating_sub(tick);
        pacer.pause(frame_time.saturating_sub(spent));
    }

    Ok(stats)
}
