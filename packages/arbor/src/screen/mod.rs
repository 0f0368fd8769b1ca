//! # Screen Driver
//!
//! A [`Screen`] presents frames produced by the [`Renderer`](crate::Renderer).
//! The event loop calls [`begin`](Screen::begin) once, then
//! [`draw`](Screen::draw) after every applied event, then
//! [`end`](Screen::end) once when it stops, even if drawing failed.

use crate::Frame;

mod keys;
pub use keys::KeyWatcher;
mod memory;
pub use memory::{MemoryFrames, MemoryScreen};
mod terminal;
pub use terminal::TerminalScreen;

/// Output device of an event loop
pub trait Screen: Send + 'static {
    /// Prepare the device before the first frame
    fn begin(&mut self) -> crate::Result<()>;
    /// Present one frame, replacing the previous one
    fn draw(&mut self, frame: &Frame) -> crate::Result<()>;
    /// Restore the device after the last frame
    fn end(&mut self) -> crate::Result<()>;
}

impl Screen for Box<dyn Screen> {
    fn begin(&mut self) -> crate::Result<()> {
        self.as_mut().begin()
    }
    fn draw(&mut self, frame: &Frame) -> crate::Result<()> {
        self.as_mut().draw(frame)
    }
    fn end(&mut self) -> crate::Result<()> {
        self.as_mut().end()
    }
}
