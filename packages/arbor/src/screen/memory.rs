use std::sync::{Arc, Mutex};

use crate::{Frame, Screen};

/// Headless screen that records every frame it is asked to draw.
///
/// Useful for tests, and for embedding the renderer without a terminal.
/// Keep a [`MemoryFrames`] handle from [`frames`](Self::frames) before
/// handing the screen to a session.
///
/// ```rust
/// # use pistonite_arbor as arbor;
/// use arbor::{Config, Session, MemoryScreen};
///
/// # fn main() -> arbor::Result<()> {
/// let screen = MemoryScreen::new();
/// let frames = screen.frames();
/// let session = Session::start_with_screen(Config::default(), screen)?;
/// session.quit();
/// session.wait()?;
/// assert!(frames.has_ended());
/// # Ok(()) }
/// ```
#[derive(Debug, Default)]
pub struct MemoryScreen {
    frames: MemoryFrames,
}

impl MemoryScreen {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the recorded frames
    pub fn frames(&self) -> MemoryFrames {
        self.frames.clone()
    }
}

impl Screen for MemoryScreen {
    fn begin(&mut self) -> crate::Result<()> {
        self.frames.with(|r| r.began = true)
    }

    fn draw(&mut self, frame: &Frame) -> crate::Result<()> {
        self.frames.with(|r| r.frames.push(frame.clone()))
    }

    fn end(&mut self) -> crate::Result<()> {
        self.frames.with(|r| r.ended = true)
    }
}

#[derive(Debug, Default)]
struct Recording {
    began: bool,
    ended: bool,
    frames: Vec<Frame>,
}

/// Cloneable view of the frames recorded by a [`MemoryScreen`]
#[derive(Debug, Default, Clone)]
pub struct MemoryFrames(Arc<Mutex<Recording>>);

impl MemoryFrames {
    fn with<T>(&self, f: impl FnOnce(&mut Recording) -> T) -> crate::Result<T> {
        let Ok(mut recording) = self.0.lock() else {
            crate::bail!("memory screen is poisoned");
        };
        Ok(f(&mut *recording))
    }

    fn read<T: Default>(&self, f: impl FnOnce(&Recording) -> T) -> T {
        self.0.lock().map(|r| f(&*r)).unwrap_or_default()
    }

    /// If the screen was started by the loop
    pub fn has_begun(&self) -> bool {
        self.read(|r| r.began)
    }

    /// If the screen was restored by the loop
    pub fn has_ended(&self) -> bool {
        self.read(|r| r.ended)
    }

    /// Number of frames drawn so far
    pub fn len(&self) -> usize {
        self.read(|r| r.frames.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The most recently drawn frame
    pub fn last(&self) -> Option<Frame> {
        self.read(|r| r.frames.last().cloned())
    }

    /// Copy of every frame drawn so far, oldest first
    pub fn snapshot(&self) -> Vec<Frame> {
        self.read(|r| r.frames.clone())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{BarTree, Event, RenderOptions, Renderer};

    #[test]
    fn test_records_frames_in_order() {
        let mut screen = MemoryScreen::new();
        let frames = screen.frames();
        let renderer = Renderer::new(RenderOptions::default(), false);
        let mut tree = BarTree::new();

        screen.begin().unwrap();
        screen.draw(&renderer.render(tree.forest())).unwrap();
        tree.apply(&Event::create(1, 3, "job")).unwrap();
        screen.draw(&renderer.render(tree.forest())).unwrap();
        screen.end().unwrap();

        assert!(frames.has_begun());
        assert!(frames.has_ended());
        let all = frames.snapshot();
        assert_eq!(all.len(), 2);
        assert!(all[0].is_idle());
        assert!(all[1].to_string().contains("job"));
        assert_eq!(frames.last(), Some(all[1].clone()));
    }
}
