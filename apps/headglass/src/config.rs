//! Startup configuration.
//!
//! Built once from defaults plus command-line overrides, validated, then
//! passed by reference into every component.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use display_acquire::AcquisitionParams;
use head_fusion::{CalibrationParams, CursorParams, GestureParams, OrientationParams, ScreenSize};
use serde::{Deserialize, Serialize};

/// Which HID interface to open and how often to poll it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorConfig {
    /// USB vendor identifier.
    pub vendor_id: u16,
    /// USB product identifier.
    pub product_id: u16,
    /// Interface carrying orientation reports.
    pub interface: i32,
    /// Mouse loop sleep.
    pub poll_interval: Duration,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            vendor_id: 0x4817,
            product_id: 0x4242,
            interface: 0,
            poll_interval: Duration::from_millis(10),
        }
    }
}

/// Location of the virtual display driver tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Directory holding the tool. `None` simulates the driver.
    pub dir: Option<PathBuf>,
    /// Executable name inside `dir`.
    pub program: PathBuf,
    /// Toggle subcommand.
    pub toggle: String,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            dir: None,
            program: PathBuf::from("deviceinstaller64.exe"),
            toggle: display_acquire::DriverTool::DEFAULT_TOGGLE.to_owned(),
        }
    }
}

/// Everything the binary needs, fixed for the process lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Sensor device.
    pub sensor: SensorConfig,
    /// Screen the mouse cursor moves on.
    pub screen: ScreenSize,
    /// Startup calibration window.
    pub calibration: CalibrationParams,
    /// Cursor mapping.
    pub cursor: CursorParams,
    /// Tilt click thresholds.
    pub gesture: GestureParams,
    /// Viewer orientation smoothing.
    pub orientation: OrientationParams,
    /// Virtual display acquisition.
    pub acquisition: AcquisitionParams,
    /// Driver tool.
    pub driver: DriverConfig,
    /// Viewer frame cap.
    pub viewer_fps: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sensor: SensorConfig::default(),
            screen: ScreenSize::new(1920, 1080),
            calibration: CalibrationParams::default(),
            cursor: CursorParams::default(),
            gesture: GestureParams::default(),
            orientation: OrientationParams::default(),
            acquisition: AcquisitionParams::default(),
            driver: DriverConfig::default(),
            viewer_fps: 144,
        }
    }
}

impl AppConfig {
    /// Checks every section.
    ///
    /// # Errors
    ///
    /// Returns the first invalid section with context.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.sensor.poll_interval.is_zero(),
            "sensor poll interval must be non-zero"
        );
        ensure!(
            self.screen.width > 0 && self.screen.height > 0,
            "screen size must be non-zero"
        );
        ensure!(self.viewer_fps > 0, "viewer fps must be non-zero");
        self.calibration.validate().context("calibration")?;
        self.cursor.validate().context("cursor")?;
        self.gesture.validate().context("gesture")?;
        self.orientation.validate().context("orientation")?;
        self.acquisition.validate().context("acquisition")?;
        Ok(())
    }

    /// Time budget of one viewer frame.
    #[must_use]
    pub fn frame_time(&self) -> Duration {
        Duration::from_secs(1) / self.viewer_fps.max(1)
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serializing config")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn bad_section_is_named() {
        let mut config = AppConfig::default();
        config.cursor = config.cursor.smoothing(0.0);
        let err = config.validate().unwrap_err();
        assert!(format!("{err:#}").contains("cursor"));
    }

    #[test]
    fn zero_fps_rejected() {
        let config = AppConfig {
            viewer_fps: 0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn frame_time_matches_fps() {
        let config = AppConfig {
            viewer_fps: 100,
            ..AppConfig::default()
        };
        assert_eq!(config.frame_time(), Duration::from_millis(10));
    }

    #[test]
    fn json_round_trips() {
        let config = AppConfig::default();
        let json = config.to_json().unwrap();
        assert!(json.contains(&format!("\"vendor_id\": {}", 0x4817)));
        let back: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
