//! Display mode enumeration and forcing.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{AcquireError, Result};

/// A display mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplayMode {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Refresh rate in Hz.
    pub refresh_hz: u32,
}

impl DisplayMode {
    /// Creates a mode.
    #[must_use]
    pub const fn new(width: u32, height: u32, refresh_hz: u32) -> Self {
        Self {
            width,
            height,
            refresh_hz,
        }
    }

    /// Whether the mode has the given size.
    #[must_use]
    pub const fn has_size(&self, width: u32, height: u32) -> bool {
        self.width == width && self.height == height
    }
}

/// Platform display-settings API.
pub trait DisplayModes {
    /// Names of attached display devices, in enumeration order.
    fn devices(&self) -> Vec<String>;

    /// Modes supported by `device`.
    fn modes(&self, device: &str) -> Vec<DisplayMode>;

    /// Mode `device` is currently running.
    fn current_mode(&self, device: &str) -> Option<DisplayMode>;

    /// Switches `device` to `mode`.
    ///
    /// # Errors
    ///
    /// Returns [`AcquireError::ModeSet`] if the platform rejects the mode.
    fn apply_mode(&mut self, device: &str, mode: &DisplayMode) -> Result<()>;
}

impl<M: DisplayModes + ?Sized> DisplayModes for &mut M {
    fn devices(&self) -> Vec<String> {
        (**self).devices()
    }

    fn modes(&self, device: &str) -> Vec<DisplayMode> {
        (**self).modes(device)
    }

    fn current_mode(&self, device: &str) -> Option<DisplayMode> {
        (**self).current_mode(device)
    }

    fn apply_mode(&mut self, device: &str, mode: &DisplayMode) -> Result<()> {
        (**self).apply_mode(device, mode)
    }
}

/// Puts the first device that supports `width`x`height` into that mode.
///
/// Devices are tried in order. A device already at the size is accepted
/// without changing anything. If applying fails, the next device is tried.
/// Returns the device name.
///
/// # Errors
///
/// - [`AcquireError::ModeNotFound`] if no device lists the mode
/// - the last [`AcquireError::ModeSet`] if every candidate rejected it
pub fn force_resolution<M: DisplayModes + ?Sized>(
    displays: &mut M,
    width: u32,
    height: u32,
) -> Result<String> {
    let mut last_error = None;

    for device in displays.devices() {
        let Some(mode) = displays
            .modes(&device)
            .into_iter()
            .find(|m| m.has_size(width, height))
        else {
            continue;
        };

        if displays
            .current_mode(&device)
            .is_some_and(|m| m.has_size(width, height))
        {
            debug!(%device, width, height, "display already at target resolution");
            return Ok(device);
        }

        match displays.apply_mode(&device, &mode) {
            Ok(()) => {
                info!(%device, width, height, refresh_hz = mode.refresh_hz, "display mode applied");
                return Ok(device);
            }
            Err(e) => {
                warn!(%device, error = %e, "display mode change failed");
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or(AcquireError::ModeNotFound { width, height }))
}

/// First device whose current mode is `width` pixels wide.
pub fn find_display_with_width<M: DisplayModes + ?Sized>(displays: &M, width: u32) -> Option<String> {
    displays
        .devices()
        .into_iter()
        .find(|d| displays.current_mode(d).is_some_and(|m| m.width == width))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct Table {
        modes: BTreeMap<String, Vec<DisplayMode>>,
        current: BTreeMap<String, DisplayMode>,
        reject: Vec<String>,
        applied: Vec<String>,
    }

    impl Table {
        fn device(mut self, name: &str, current: DisplayMode, modes: &[DisplayMode]) -> Self {
            self.modes.insert(name.to_owned(), modes.to_vec());
            self.current.insert(name.to_owned(), current);
            self
        }
    }

    impl DisplayModes for Table {
        fn devices(&self) -> Vec<String> {
            self.modes.keys().cloned().collect()
        }

        fn modes(&self, device: &str) -> Vec<DisplayMode> {
            self.modes.get(device).cloned().unwrap_or_default()
        }

        fn current_mode(&self, device: &str) -> Option<DisplayMode> {
            self.current.get(device).copied()
        }

        fn apply_mode(&mut self, device: &str, mode: &DisplayMode) -> Result<()> {
            if self.reject.iter().any(|d| d == device) {
                return Err(AcquireError::mode_set(device, "rejected"));
            }
            self.applied.push(device.to_owned());
            self.current.insert(device.to_owned(), *mode);
            Ok(())
        }
    }

    const FHD: DisplayMode = DisplayMode::new(1920, 1080, 60);
    const WIDE: DisplayMode = DisplayMode::new(6000, 1080, 60);

    #[test]
    fn applies_on_first_capable_device() {
        let mut t = Table::default()
            .device("a", FHD, &[FHD])
            .device("b", FHD, &[FHD, WIDE]);
        assert_eq!(force_resolution(&mut t, 6000, 1080).unwrap(), "b");
        assert_eq!(t.applied, vec!["b".to_owned()]);
        assert_eq!(find_display_with_width(&t, 6000).as_deref(), Some("b"));
    }

    #[test]
    fn already_at_size_is_left_alone() {
        let mut t = Table::default().device("a", WIDE, &[FHD, WIDE]);
        assert_eq!(force_resolution(&mut t, 6000, 1080).unwrap(), "a");
        assert!(t.applied.is_empty());
    }

    #[test]
    fn rejected_device_falls_through() {
        let mut t = Table::default()
            .device("a", FHD, &[WIDE])
            .device("b", FHD, &[WIDE]);
        t.reject.push("a".to_owned());
        assert_eq!(force_resolution(&mut t, 6000, 1080).unwrap(), "b");
    }

    #[test]
    fn no_mode_anywhere() {
        let mut t = Table::default().device("a", FHD, &[FHD]);
        let err = force_resolution(&mut t, 6000, 1080).unwrap_err();
        assert!(matches!(
            err,
            AcquireError::ModeNotFound {
                width: 6000,
                height: 1080
            }
        ));
        assert!(find_display_with_width(&t, 6000).is_none());
    }

    #[test]
    fn every_candidate_rejected_reports_mode_set() {
        let mut t = Table::default().device("a", FHD, &[WIDE]);
        t.reject.push("a".to_owned());
        let err = force_resolution(&mut t, 6000, 1080).unwrap_err();
        assert!(matches!(err, AcquireError::ModeSet { .. }));
    }
}
