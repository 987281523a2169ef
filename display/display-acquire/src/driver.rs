//! Virtual display driver control.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::{AcquireError, Result};

/// Turns the virtual display off and on.
pub trait DisplayDriver {
    /// Disables the virtual display.
    ///
    /// # Errors
    ///
    /// Returns [`AcquireError::Driver`] if the driver rejects the request.
    fn disable(&mut self) -> Result<()>;

    /// Enables the virtual display.
    ///
    /// # Errors
    ///
    /// Returns [`AcquireError::Driver`] if the driver rejects the request.
    fn enable(&mut self) -> Result<()>;
}

impl<D: DisplayDriver + ?Sized> DisplayDriver for &mut D {
    fn disable(&mut self) -> Result<()> {
        (**self).disable()
    }

    fn enable(&mut self) -> Result<()> {
        (**self).enable()
    }
}

/// Drives the virtual display through an external command-line tool.
///
/// Runs `<dir>/<program> <toggle> 0|1` with `dir` as the working
/// directory and both output streams discarded. Success is the exit
/// status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverTool {
    dir: PathBuf,
    program: PathBuf,
    toggle: String,
}

impl DriverTool {
    /// Default toggle subcommand.
    pub const DEFAULT_TOGGLE: &'static str = "enableidd";

    /// Creates a tool runner for `program` inside `dir`.
    pub fn new(dir: impl Into<PathBuf>, program: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            program: program.into(),
            toggle: Self::DEFAULT_TOGGLE.to_owned(),
        }
    }

    /// Set the toggle subcommand.
    #[must_use]
    pub fn toggle_command(mut self, toggle: impl Into<String>) -> Self {
        self.toggle = toggle.into();
        self
    }

    /// Working directory of the tool.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn run(&self, state: &str) -> Result<()> {
        let program = self.dir.join(&self.program);
        debug!(program = %program.display(), toggle = %self.toggle, state, "running display driver");
        let status = Command::new(&program)
            .arg(&self.toggle)
            .arg(state)
            .current_dir(&self.dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| AcquireError::driver(format!("{}: {e}", program.display())))?;

        if status.success() {
            Ok(())
        } else {
            Err(AcquireError::driver(format!(
                "{} {} {state} exited with {status}",
                program.display(),
                self.toggle
            )))
        }
    }
}

impl DisplayDriver for DriverTool {
    fn disable(&mut self) -> Result<()> {
        self.run("0")
    }

    fn enable(&mut self) -> Result<()> {
        self.run("1")
    }
}
