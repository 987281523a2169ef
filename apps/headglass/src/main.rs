//! headglass - head-tracked mouse and stabilized wide-screen viewer.
//!
//! # Commands
//!
//! - `headglass mouse` - Head movement moves the pointer, head tilt clicks
//! - `headglass viewer` - Acquire the virtual display and view it head-stabilized
//! - `headglass config` - Print the effective configuration as JSON
//!
//! Logging follows `RUST_LOG` (default `info`), or `--log-level`.

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod config;
mod mouse;
mod sensor;
mod sim;
mod sinks;
mod viewer;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use display_acquire::{AcquireError, AcquisitionCoordinator, DisplayDriver, DriverTool};
use head_fusion::ScreenSize;
use head_types::RealtimePacer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::sensor::Sensor;
use crate::sim::SimDisplays;
use crate::sinks::{LogCompositor, LogPointer, console_commands};

/// Head-tracked mouse and stabilized wide-screen viewer
#[derive(Parser)]
#[command(name = "headglass")]
#[command(about = "Head-tracked mouse and stabilized wide-screen viewer", long_about = None)]
#[command(version)]
struct Cli {
    /// Log filter, e.g. "debug" or "headglass=trace" (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Move the pointer with your head; tilt to click
    Mouse {
        /// Use a simulated headset instead of the HID device
        #[arg(long)]
        sim: bool,

        #[command(flatten)]
        tuning: Tuning,
    },

    /// Bring up the virtual display and view it head-stabilized
    Viewer {
        /// Use a simulated headset instead of the HID device
        #[arg(long)]
        sim: bool,

        #[command(flatten)]
        tuning: Tuning,
    },

    /// Print the effective configuration as JSON
    Config {
        #[command(flatten)]
        tuning: Tuning,
    },
}

/// Overrides applied on top of the defaults.
#[derive(Args, Debug, Default)]
struct Tuning {
    /// Screen size for the pointer, as WIDTHxHEIGHT
    #[arg(long, value_parser = parse_screen)]
    screen: Option<ScreenSize>,

    /// Cursor easing factor in (0, 1]
    #[arg(long)]
    smoothing: Option<f64>,

    /// Degrees of yaw from center to screen edge
    #[arg(long)]
    range_x: Option<f64>,

    /// Degrees of pitch from center to screen edge
    #[arg(long)]
    range_y: Option<f64>,

    /// Tilt in degrees that fires a click; must exceed the release margin
    #[arg(long)]
    click_threshold: Option<f64>,

    /// Viewer slerp factor in (0, 1]
    #[arg(long)]
    interpolation: Option<f64>,

    /// Viewer frame cap
    #[arg(long)]
    fps: Option<u32>,

    /// Directory of the virtual display driver tool (simulated if omitted)
    #[arg(long)]
    driver_dir: Option<PathBuf>,
}

impl Tuning {
    fn apply(self, config: &mut AppConfig) {
        if let Some(screen) = self.screen {
            config.screen = screen;
        }
        if let Some(s) = self.smoothing {
            config.cursor = config.cursor.smoothing(s);
        }
        if self.range_x.is_some() || self.range_y.is_some() {
            config.cursor = config.cursor.ranges(
                self.range_x.unwrap_or(config.cursor.range_x_deg),
                self.range_y.unwrap_or(config.cursor.range_y_deg),
            );
        }
        if let Some(t) = self.click_threshold {
            config.gesture = config.gesture.fire_threshold(t);
        }
        if let Some(f) = self.interpolation {
            config.orientation = config.orientation.interpolation(f);
        }
        if let Some(fps) = self.fps {
            config.viewer_fps = fps;
        }
        if self.driver_dir.is_some() {
            config.driver.dir = self.driver_dir;
        }
    }
}

fn parse_screen(s: &str) -> std::result::Result<ScreenSize, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
    let w = w.trim().parse().map_err(|e| format!("bad width: {e}"))?;
    let h = h.trim().parse().map_err(|e| format!("bad height: {e}"))?;
    Ok(ScreenSize::new(w, h))
}

fn build_config(tuning: Tuning) -> Result<AppConfig> {
    let mut config = AppConfig::default();
    tuning.apply(&mut config);
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn init_tracing(level: Option<&str>) -> Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level).context("invalid --log-level")?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
    Ok(())
}

fn interrupt_flag() -> Result<Arc<AtomicBool>> {
    let flag = Arc::new(AtomicBool::new(false));
    let handler = Arc::clone(&flag);
    ctrlc::set_handler(move || handler.store(true, Ordering::SeqCst))
        .context("installing Ctrl-C handler")?;
    Ok(flag)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref())?;

    match cli.command {
        Commands::Mouse { sim, tuning } => run_mouse(sim, &build_config(tuning)?),
        Commands::Viewer { sim, tuning } => run_viewer(sim, &build_config(tuning)?),
        Commands::Config { tuning } => {
            println!("{}", build_config(tuning)?.to_json()?);
            Ok(())
        }
    }
}

fn run_mouse(simulate: bool, config: &AppConfig) -> Result<()> {
    let stop = interrupt_flag()?;
    let mut sensor = Sensor::open(simulate, &config.sensor).context("opening sensor")?;
    let mut pointer = LogPointer::new(config.screen.center());
    let mut pacer = RealtimePacer::new();

    let outcome = mouse::run(config, &mut sensor, &mut pointer, &mut pacer, &stop);
    drop(sensor);

    let stats = outcome?;
    info!(
        ticks = stats.ticks,
        updates = stats.updates,
        clicks = stats.clicks,
        "head mouse stopped"
    );
    Ok(())
}

fn run_viewer(simulate: bool, config: &AppConfig) -> Result<()> {
    let stop = interrupt_flag()?;
    let params = config.acquisition;

    let mut tool: DriverTool;
    let mut sim_driver: SimDisplays;
    let (driver, displays): (&mut dyn DisplayDriver, SimDisplays) = match &config.driver.dir {
        Some(dir) => {
            tool = DriverTool::new(dir, &config.driver.program).toggle_command(&config.driver.toggle);
            let displays =
                SimDisplays::new(params.target_width, params.target_height).with_virtual_display();
            (&mut tool, displays)
        }
        None => {
            let displays = SimDisplays::new(params.target_width, params.target_height);
            sim_driver = displays.clone();
            (&mut sim_driver, displays)
        }
    };

    let mut acquire = AcquisitionCoordinator::new(params, driver, displays.clone(), displays)?
        .with_cancel_flag(Arc::clone(&stop));
    let mut pacer = RealtimePacer::new();

    let mut session = match acquire.run(&mut pacer) {
        Ok(session) => session,
        Err(e) => {
            acquire.teardown(None);
            if matches!(e, AcquireError::NoCaptureOutput { .. }) {
                error!("no capture output found; this is often a timing issue, run headglass again");
            }
            return Err(e).context("display acquisition failed");
        }
    };

    let mut sensor = Sensor::open_optional(simulate, &config.sensor);
    info!("viewer commands: Enter or r resets the view, q quits");
    let mut compositor = LogCompositor::new().with_commands(console_commands());
    let outcome = viewer::run(
        config,
        &mut sensor,
        &mut session,
        &mut compositor,
        &mut pacer,
        &stop,
    );

    drop(sensor);
    acquire.teardown(Some(session));

    let stats = outcome?;
    info!(
        presented = stats.presented,
        updates = stats.updates,
        captured = stats.captured,
        resets = stats.resets,
        "viewer stopped"
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn screen_parses() {
        assert_eq!(parse_screen("2560x1440").unwrap(), ScreenSize::new(2560, 1440));
        assert!(parse_screen("2560").is_err());
        assert!(parse_screen("ax1").is_err());
    }

    #[test]
    fn tuning_overrides_defaults() {
        let cli = Cli::try_parse_from([
            "headglass",
            "config",
            "--smoothing",
            "0.5",
            "--range-y",
            "10",
            "--fps",
            "60",
        ])
        .unwrap();
        let Commands::Config { tuning } = cli.command else {
            panic!("expected config");
        };
        let config = build_config(tuning).unwrap();
        assert!((config.cursor.smoothing - 0.5).abs() < f64::EPSILON);
        assert!((config.cursor.range_x_deg - 25.0).abs() < f64::EPSILON);
        assert!((config.cursor.range_y_deg - 10.0).abs() < f64::EPSILON);
        assert_eq!(config.viewer_fps, 60);
    }

    #[test]
    fn click_threshold_must_leave_a_dead_band() {
        let rejected = build_config(Tuning {
            click_threshold: Some(5.0),
            ..Tuning::default()
        });
        let message = format!("{:#}", rejected.unwrap_err());
        assert!(message.contains("release"), "{message}");

        let config = build_config(Tuning {
            click_threshold: Some(8.0),
            ..Tuning::default()
        })
        .unwrap();
        assert!((config.gesture.release_threshold() - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_override_is_rejected() {
        assert!(build_config(Tuning {
            smoothing: Some(2.0),
            ..Tuning::default()
        })
        .is_err());
    }
}
