//! Actuation sinks.
//!
//! The OS cursor and the GL compositor live outside this crate; the loops
//! talk to them through these traits.

use std::io::{self, BufRead};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use display_acquire::Frame;
use glam::{DMat4, DQuat};
use head_fusion::{CursorPosition, GestureEvent};
use tracing::{debug, info, trace};

/// Moves and clicks the pointer.
pub trait PointerSink {
    /// Current pointer position.
    fn position(&self) -> CursorPosition;

    /// Moves the pointer.
    fn move_to(&mut self, position: CursorPosition);

    /// Clicks at the current position.
    fn click(&mut self, event: GestureEvent);
}

/// Pointer that only logs.
#[derive(Debug, Clone)]
pub struct LogPointer {
    position: CursorPosition,
    clicks: usize,
}

impl LogPointer {
    /// Creates a pointer at `position`.
    #[must_use]
    pub const fn new(position: CursorPosition) -> Self {
        Self {
            position,
            clicks: 0,
        }
    }

    /// Clicks so far.
    #[cfg(test)]
    #[must_use]
    pub const fn clicks(&self) -> usize {
        self.clicks
    }
}

impl PointerSink for LogPointer {
    fn position(&self) -> CursorPosition {
        self.position
    }

    fn move_to(&mut self, position: CursorPosition) {
        trace!(x = position.x, y = position.y, "pointer moved");
        self.position = position;
    }

    fn click(&mut self, event: GestureEvent) {
        self.clicks += 1;
        let button = match event {
            GestureEvent::Primary => "left",
            GestureEvent::Secondary => "right",
        };
        info!(button, x = self.position.x, y = self.position.y, "click");
    }
}

/// Requests the compositor can send back to the viewer loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerEvent {
    /// Make the current head orientation the new straight-ahead.
    ResetView,
    /// Leave the viewer.
    Quit,
}

/// Draws the captured screen with the head-stabilized view.
pub trait Compositor {
    /// Presents one frame. `frame` is `None` when capture has nothing new.
    fn present(&mut self, view: &DMat4, frame: Option<&Frame>) -> Option<ViewerEvent>;
}

/// Maps one console line to a viewer request.
///
/// `r`, `reset` or a blank line (Space then Enter) resets the view.
/// `q`, `quit` or `esc` leaves the viewer.
#[must_use]
pub fn parse_command(line: &str) -> Option<ViewerEvent> {
    match line.trim().to_ascii_lowercase().as_str() {
        "" | "r" | "reset" => Some(ViewerEvent::ResetView),
        "q" | "quit" | "esc" => Some(ViewerEvent::Quit),
        _ => None,
    }
}

/// Reads viewer commands from `input` on a background thread.
///
/// The thread ends at end of input or after forwarding `Quit`.
pub fn spawn_commands<R>(input: R) -> Receiver<ViewerEvent>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in input.lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    debug!(error = %e, "console input closed");
                    break;
                }
            };
            let Some(event) = parse_command(&line) else {
                info!(input = %line.trim(), "unknown command; use r to reset, q to quit");
                continue;
            };
            if tx.send(event).is_err() || event == ViewerEvent::Quit {
                break;
            }
        }
    });
    rx
}

/// [`spawn_commands`] on the process's stdin.
#[must_use]
pub fn console_commands() -> Receiver<ViewerEvent> {
    spawn_commands(io::BufReader::new(io::stdin()))
}

/// Compositor that only logs.
///
/// Viewer requests arrive through an optional command channel.
#[derive(Debug, Default)]
pub struct LogCompositor {
    presented: u64,
    frames: u64,
    commands: Option<Receiver<ViewerEvent>>,
}

impl LogCompositor {
    /// Presents between periodic summaries.
    const SUMMARY_EVERY: u64 = 1000;

    /// Creates a compositor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes viewer requests from `commands`, one per present.
    #[must_use]
    pub fn with_commands(mut self, commands: Receiver<ViewerEvent>) -> Self {
        self.commands = Some(commands);
        self
    }

    fn next_command(&mut self) -> Option<ViewerEvent> {
        let rx = self.commands.as_ref()?;
        match rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.commands = None;
                None
            }
        }
    }
}

impl Compositor for LogCompositor {
    fn present(&mut self, view: &DMat4, frame: Option<&Frame>) -> Option<ViewerEvent> {
        self.presented += 1;
        if let Some(frame) = frame {
            self.frames += 1;
            trace!(width = frame.width, height = frame.height, "texture upload");
        }

        let rotation = DQuat::from_mat4(view);
        debug!(
            angle_deg = rotation.angle_between(DQuat::IDENTITY).to_degrees(),
            "view presented"
        );
        if self.presented % Self::SUMMARY_EVERY == 0 {
            info!(
                presented = self.presented,
                frames = self.frames,
                "compositor summary"
            );
        }
        self.next_command()
    }
}
