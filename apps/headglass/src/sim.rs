//! Simulated hardware for running without a headset or display driver.

use std::cell::RefCell;
use std::rc::Rc;

use display_acquire::{
    AcquireError, CaptureBackend, CaptureMode, CaptureOutput, DisplayDriver, DisplayMode,
    DisplayModes, Frame, Result,
};
use glam::{DQuat, EulerRot};
use head_fusion::ReportSource;
use head_types::{REPORT_SIZE, encode_report};
use tracing::debug;

/// Fixed-point scale of the synthetic quaternion components.
const RAW_SCALE: f64 = 1_073_741_824.0;

/// Synthetic headset swaying slowly on every axis.
///
/// Queues one report per drain, so every loop iteration sees fresh data.
/// The roll sweep crosses the default click threshold in both directions.
#[derive(Debug, Clone, Default)]
pub struct SimHeadset {
    step: u64,
    ready: bool,
}

impl SimHeadset {
    /// Simulated seconds per report.
    pub const STEP_SECONDS: f64 = 0.01;

    /// Creates a headset at rest.
    #[must_use]
    pub fn new() -> Self {
        Self {
            step: 0,
            ready: true,
        }
    }

    /// Pose at simulated time `t` as (pitch, yaw, roll) degrees.
    #[must_use]
    pub fn pose_at(t: f64) -> (f64, f64, f64) {
        (
            8.0 * (0.3 * t).sin(),
            20.0 * (0.5 * t).sin(),
            28.0 * (0.25 * t).sin(),
        )
    }

    fn next_report(&mut self) -> [u8; REPORT_SIZE] {
        #[allow(clippy::cast_precision_loss)]
        let t = self.step as f64 * Self::STEP_SECONDS;
        self.step += 1;

        let (pitch, yaw, roll) = Self::pose_at(t);
        let q = DQuat::from_euler(
            EulerRot::ZYX,
            yaw.to_radians(),
            roll.to_radians(),
            pitch.to_radians(),
        );
        #[allow(clippy::cast_possible_truncation)]
        let raw = |v: f64| (v * RAW_SCALE).round() as i32;
        encode_report([raw(q.w), raw(q.x), raw(q.y), raw(q.z)])
    }
}

impl ReportSource for SimHeadset {
    fn read_report(&mut self, buf: &mut [u8]) -> usize {
        if !self.ready {
            self.ready = true;
            return 0;
        }
        self.ready = false;
        let report = self.next_report();
        let n = buf.len().min(REPORT_SIZE);
        buf[..n].copy_from_slice(&report[..n]);
        n
    }
}

const PRIMARY: &str = r"\\.\DISPLAY1";
const VIRTUAL: &str = r"\\.\DISPLAY2";
const DESKTOP: DisplayMode = DisplayMode::new(1920, 1080, 60);

/// Presents fresh frames on one call in this many.
const FRAME_EVERY: u64 = 8;

#[derive(Debug)]
struct World {
    target: DisplayMode,
    virtual_enabled: bool,
    virtual_mode: DisplayMode,
}

/// Simulated display stack: one physical monitor on adapter 0, plus a
/// virtual display on adapter 1 while the driver is enabled.
///
/// Cloning shares the same simulated hardware, so one instance can serve
/// as driver, mode table and capture backend at once.
#[derive(Debug, Clone)]
pub struct SimDisplays {
    world: Rc<RefCell<World>>,
}

impl SimDisplays {
    /// Creates the stack. `target` is the mode the virtual display offers
    /// besides the desktop mode.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            world: Rc::new(RefCell::new(World {
                target: DisplayMode::new(width, height, 60),
                virtual_enabled: false,
                virtual_mode: DESKTOP,
            })),
        }
    }

    /// Starts with the virtual display already enabled, as when a real
    /// driver tool manages it.
    #[must_use]
    pub fn with_virtual_display(self) -> Self {
        self.world.borrow_mut().virtual_enabled = true;
        self
    }

    /// Whether the virtual display currently exists.
    #[cfg(test)]
    #[must_use]
    pub fn virtual_enabled(&self) -> bool {
        self.world.borrow().virtual_enabled
    }
}

impl DisplayDriver for SimDisplays {
    fn disable(&mut self) -> Result<()> {
        let mut world = self.world.borrow_mut();
        world.virtual_enabled = false;
        world.virtual_mode = DESKTOP;
        debug!("simulated virtual display removed");
        Ok(())
    }

    fn enable(&mut self) -> Result<()> {
        self.world.borrow_mut().virtual_enabled = true;
        debug!("simulated virtual display added");
        Ok(())
    }
}

impl DisplayModes for SimDisplays {
    fn devices(&self) -> Vec<String> {
        let mut devices = vec![PRIMARY.to_owned()];
        if self.world.borrow().virtual_enabled {
            devices.push(VIRTUAL.to_owned());
        }
        devices
    }

    fn modes(&self, device: &str) -> Vec<DisplayMode> {
        let world = self.world.borrow();
        match device {
            PRIMARY => vec![DESKTOP],
            VIRTUAL if world.virtual_enabled => vec![DESKTOP, world.target],
            _ => Vec::new(),
        }
    }

    fn current_mode(&self, device: &str) -> Option<DisplayMode> {
        let world = self.world.borrow();
        match device {
            PRIMARY => Some(DESKTOP),
            VIRTUAL if world.virtual_enabled => Some(world.virtual_mode),
            _ => None,
        }
    }

    fn apply_mode(&mut self, device: &str, mode: &DisplayMode) -> Result<()> {
        let mut world = self.world.borrow_mut();
        if device == VIRTUAL && world.virtual_enabled && (*mode == world.target || *mode == DESKTOP) {
            world.virtual_mode = *mode;
            Ok(())
        } else {
            Err(AcquireError::mode_set(device, "mode not supported"))
        }
    }
}

impl CaptureBackend for SimDisplays {
    fn adapter_available(&mut self, adapter: usize) -> bool {
        adapter == 0 || (adapter == 1 && self.world.borrow().virtual_enabled)
    }

    fn open(&mut self, adapter: usize, output: usize) -> Result<Box<dyn CaptureOutput>> {
        let world = self.world.borrow();
        let mode = match (adapter, output) {
            (0, 0) => DESKTOP,
            (1, 0) if world.virtual_enabled => world.virtual_mode,
            _ => {
                return Err(AcquireError::capture(format!(
                    "no output {output} on adapter {adapter}"
                )));
            }
        };
        Ok(Box::new(SimOutput {
            mode,
            streaming: false,
            polls: 0,
        }))
    }
}

struct SimOutput {
    mode: DisplayMode,
    streaming: bool,
    polls: u64,
}

impl CaptureOutput for SimOutput {
    fn width(&self) -> u32 {
        self.mode.width
    }

    fn height(&self) -> u32 {
        self.mode.height
    }

    fn start(&mut self, fps: u32, mode: CaptureMode) -> Result<()> {
        debug!(fps, ?mode, "simulated capture started");
        self.streaming = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.streaming = false;
        Ok(())
    }

    fn latest_frame(&mut self) -> Option<Frame> {
        if !self.streaming {
            return None;
        }
        self.polls += 1;
        if self.polls % FRAME_EVERY != 1 {
            return None;
        }
        let len = self.mode.width as usize * self.mode.height as usize * 3;
        Some(Frame::new(self.mode.width, self.mode.height, vec![0; len]))
    }

    fn release(self: Box<Self>) {
        debug!(width = self.mode.width, "simulated output released");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use display_acquire::{AcquisitionCoordinator, AcquisitionParams, force_resolution};
    use head_fusion::{drain_latest, to_euler};
    use head_types::{ManualPacer, decode_report};

    #[test]
    fn headset_reports_decode_to_its_pose() {
        let mut headset = SimHeadset::new();
        for _ in 0..50 {
            headset.next_report();
        }
        let mut buf = [0u8; REPORT_SIZE];
        assert_eq!(drain_latest(&mut headset, &mut buf), REPORT_SIZE);
        let angles = to_euler(&decode_report(&buf).unwrap());

        let (pitch, yaw, roll) = SimHeadset::pose_at(0.5);
        assert_relative_eq!(angles.pitch, pitch, epsilon = 1e-6);
        assert_relative_eq!(angles.yaw, yaw, epsilon = 1e-6);
        assert_relative_eq!(angles.roll, roll, epsilon = 1e-6);
    }

    #[test]
    fn headset_queues_one_report_per_drain() {
        let mut headset = SimHeadset::new();
        let mut buf = [0u8; REPORT_SIZE];
        assert_eq!(drain_latest(&mut headset, &mut buf), REPORT_SIZE);
        assert_eq!(drain_latest(&mut headset, &mut buf), REPORT_SIZE);
        assert_eq!(headset.step, 2);
    }

    #[test]
    fn virtual_display_follows_driver() {
        let mut sim = SimDisplays::new(6000, 1080);
        assert_eq!(sim.devices().len(), 1);
        assert!(force_resolution(&mut sim, 6000, 1080).is_err());

        sim.enable().unwrap();
        assert_eq!(force_resolution(&mut sim, 6000, 1080).unwrap(), VIRTUAL);
        assert_eq!(sim.current_mode(VIRTUAL).unwrap().width, 6000);

        sim.disable().unwrap();
        assert!(!sim.adapter_available(1));
    }

    #[test]
    fn acquisition_finds_the_virtual_output() {
        let sim = SimDisplays::new(6000, 1080);
        let mut acquire = AcquisitionCoordinator::new(
            AcquisitionParams::default(),
            sim.clone(),
            sim.clone(),
            sim.clone(),
        )
        .unwrap();
        let mut session = acquire.run(&mut ManualPacer::new()).unwrap();
        assert_eq!((session.adapter(), session.width()), (1, 6000));
        assert!(session.latest_frame().is_some());
        assert!(session.latest_frame().is_none());

        acquire.teardown(Some(session));
        assert!(!sim.virtual_enabled());
    }
}
