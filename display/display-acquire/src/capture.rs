//! Screen capture collaborators.

use tracing::{debug, info, warn};

use crate::error::Result;

/// Frame delivery policy for a capture stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CaptureMode {
    /// Deliver each frame as soon as it is produced (video mode).
    #[default]
    Immediate,
    /// Queue frames and deliver them in order.
    Buffered,
}

/// One captured frame, tightly packed RGB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel data, `width * height * 3` bytes.
    pub pixels: Vec<u8>,
}

impl Frame {
    /// Creates a frame.
    #[must_use]
    pub const fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }
}

/// An opened capture output.
pub trait CaptureOutput {
    /// Output width in pixels.
    fn width(&self) -> u32;

    /// Output height in pixels.
    fn height(&self) -> u32;

    /// Starts streaming.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AcquireError::Capture`] if the stream cannot start.
    fn start(&mut self, fps: u32, mode: CaptureMode) -> Result<()>;

    /// Stops streaming.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AcquireError::Capture`] if the stream did not stop cleanly.
    fn stop(&mut self) -> Result<()>;

    /// Most recent frame, if a new one arrived since the last call.
    fn latest_frame(&mut self) -> Option<Frame>;

    /// Frees the output's platform resources.
    fn release(self: Box<Self>);
}

/// Opens capture outputs by adapter and output index.
pub trait CaptureBackend {
    /// Whether an adapter exists at `adapter`.
    fn adapter_available(&mut self, adapter: usize) -> bool;

    /// Opens output `output` on `adapter`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AcquireError::Capture`] if the output does not exist
    /// or cannot be opened.
    fn open(&mut self, adapter: usize, output: usize) -> Result<Box<dyn CaptureOutput>>;
}

impl<C: CaptureBackend + ?Sized> CaptureBackend for &mut C {
    fn adapter_available(&mut self, adapter: usize) -> bool {
        (**self).adapter_available(adapter)
    }

    fn open(&mut self, adapter: usize, output: usize) -> Result<Box<dyn CaptureOutput>> {
        (**self).open(adapter, output)
    }
}

/// A started capture stream on a selected output.
///
/// Owns the output; [`shutdown`](Self::shutdown) stops and releases it.
pub struct CaptureSession {
    output: Box<dyn CaptureOutput>,
    adapter: usize,
    index: usize,
    fps: u32,
}

impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("adapter", &self.adapter)
            .field("output", &self.index)
            .field("width", &self.output.width())
            .field("height", &self.output.height())
            .field("fps", &self.fps)
            .finish()
    }
}

impl CaptureSession {
    pub(crate) fn new(output: Box<dyn CaptureOutput>, adapter: usize, index: usize, fps: u32) -> Self {
        info!(
            adapter,
            output = index,
            width = output.width(),
            height = output.height(),
            fps,
            "capture started"
        );
        Self {
            output,
            adapter,
            index,
            fps,
        }
    }

    /// Adapter index of the selected output.
    #[must_use]
    pub const fn adapter(&self) -> usize {
        self.adapter
    }

    /// Output index on the adapter.
    #[must_use]
    pub const fn output(&self) -> usize {
        self.index
    }

    /// Requested frame rate.
    #[must_use]
    pub const fn fps(&self) -> u32 {
        self.fps
    }

    /// Output width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.output.width()
    }

    /// Output height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.output.height()
    }

    /// Most recent frame, if a new one arrived.
    pub fn latest_frame(&mut self) -> Option<Frame> {
        self.output.latest_frame()
    }

    /// Stops the stream and releases the output.
    ///
    /// The output is released even if stopping fails.
    ///
    /// # Errors
    ///
    /// Returns the stop error, if any.
    pub fn shutdown(mut self) -> Result<()> {
        let stopped = self.output.stop();
        if let Err(e) = &stopped {
            warn!(error = %e, "capture did not stop cleanly");
        }
        self.output.release();
        debug!(adapter = self.adapter, output = self.index, "capture released");
        stopped
    }
}
