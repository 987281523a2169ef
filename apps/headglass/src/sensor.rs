//! Sensor handles.

use head_fusion::ReportSource;
use head_types::{Result, SensorError};
use hidapi::{HidApi, HidDevice};
use tracing::{debug, info, warn};

use crate::config::SensorConfig;
use crate::sim::SimHeadset;

/// The head-mounted IMU over HID, read without blocking.
pub struct HidSensor {
    device: HidDevice,
}

impl HidSensor {
    /// Opens the configured interface in non-blocking mode.
    ///
    /// When the interface is not listed, falls back to the first device
    /// with the configured vendor and product ids.
    ///
    /// # Errors
    ///
    /// - [`SensorError::NotFound`] if no matching device is attached
    /// - [`SensorError::Device`] if the HID layer fails
    pub fn open(config: &SensorConfig) -> Result<Self> {
        let api = HidApi::new().map_err(|e| SensorError::device(e.to_string()))?;

        let listed = api
            .device_list()
            .map(|d| (d.vendor_id(), d.product_id(), d.interface_number()));
        let device = match open_route(listed, config) {
            OpenRoute::Listed(index) => {
                let info = api
                    .device_list()
                    .nth(index)
                    .ok_or_else(|| SensorError::not_found(config.vendor_id, config.product_id))?;
                info!(
                    product = info.product_string().unwrap_or("unknown"),
                    interface = info.interface_number(),
                    "sensor found"
                );
                info.open_device(&api)
                    .map_err(|e| SensorError::device(e.to_string()))?
            }
            OpenRoute::ByIds => {
                debug!(
                    interface = config.interface,
                    "interface not listed, opening by vendor and product id"
                );
                let device = api.open(config.vendor_id, config.product_id).map_err(|e| {
                    debug!(error = %e, "open by id failed");
                    SensorError::not_found(config.vendor_id, config.product_id)
                })?;
                info!("sensor found by vendor and product id");
                device
            }
        };
        device
            .set_blocking_mode(false)
            .map_err(|e| SensorError::device(e.to_string()))?;

        Ok(Self { device })
    }
}

/// How to reach the configured sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpenRoute {
    /// Position of the matching interface in the device list.
    Listed(usize),
    /// No listed interface matched; open the first device with the ids.
    ByIds,
}

fn open_route<I>(listed: I, config: &SensorConfig) -> OpenRoute
where
    I: IntoIterator<Item = (u16, u16, i32)>,
{
    listed
        .into_iter()
        .position(|(vid, pid, interface)| {
            vid == config.vendor_id && pid == config.product_id && interface == config.interface
        })
        .map_or(OpenRoute::ByIds, OpenRoute::Listed)
}

impl ReportSource for HidSensor {
    fn read_report(&mut self, buf: &mut [u8]) -> usize {
        match self.device.read(buf) {
            Ok(n) => n,
            Err(e) => {
                warn!(error = %e, "sensor read failed");
                0
            }
        }
    }
}

impl Drop for HidSensor {
    fn drop(&mut self) {
        debug!("sensor closed");
    }
}

/// Whatever the loops read orientation from.
pub enum Sensor {
    /// Real hardware.
    Hid(HidSensor),
    /// Synthetic head motion.
    Sim(SimHeadset),
    /// No sensor; the loops run without input.
    Absent,
}

impl Sensor {
    /// Opens the simulated headset or the real device.
    ///
    /// # Errors
    ///
    /// Propagates [`HidSensor::open`] failures.
    pub fn open(simulate: bool, config: &SensorConfig) -> Result<Self> {
        if simulate {
            info!("using simulated headset");
            return Ok(Self::Sim(SimHeadset::new()));
        }
        HidSensor::open(config).map(Self::Hid)
    }

    /// Like [`open`](Self::open), but a missing sensor is not fatal.
    #[must_use]
    pub fn open_optional(simulate: bool, config: &SensorConfig) -> Self {
        Self::open(simulate, config).unwrap_or_else(|e| {
            warn!(error = %e, "continuing without head tracking");
            Self::Absent
        })
    }
}

impl ReportSource for Sensor {
    fn read_report(&mut self, buf: &mut [u8]) -> usize {
        match self {
            Self::Hid(hid) => hid.read_report(buf),
            Self::Sim(sim) => sim.read_report(buf),
            Self::Absent => 0,
        }
    }
}
