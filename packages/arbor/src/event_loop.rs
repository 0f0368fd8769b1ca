//! # Event Loop
//!
//! The single consumer of the event queue. It owns the [`BarTree`], so no
//! other context can read or write the tree, and applies events strictly
//! one at a time in the order they were sent. After every event, the
//! current forest is rendered and drawn before the next event is taken.
//!
//! The loop runs until the quit signal fires. Quit is checked before every
//! event, so events still queued at that point are dropped. If every
//! producer is gone, the loop keeps the last frame on screen and only
//! waits for quit.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::{Atomic, BarTree, Event, Renderer, Screen};

/// State of an event loop. `Running` becomes `Stopped` exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LoopState {
    Running,
    Stopped,
}
impl From<u8> for LoopState {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Running,
            _ => Self::Stopped,
        }
    }
}
impl From<LoopState> for u8 {
    fn from(value: LoopState) -> Self {
        value as Self
    }
}

/// Shared view of the state of a loop
pub type LoopStateHandle = Arc<Atomic<u8, LoopState>>;

/// See [module documentation](self)
pub struct EventLoop<S: Screen> {
    tree: BarTree,
    renderer: Renderer,
    screen: S,
    state: LoopStateHandle,
    ready: Option<oneshot::Sender<()>>,
}

impl<S: Screen> EventLoop<S> {
    pub fn new(renderer: Renderer, screen: S) -> Self {
        Self {
            tree: BarTree::new(),
            renderer,
            screen,
            state: Arc::new(Atomic::new_u8(LoopState::Running as u8)),
            ready: None,
        }
    }

    /// Notify `ready` once the screen is up and the first frame is drawn
    pub fn notify_ready(mut self, ready: oneshot::Sender<()>) -> Self {
        self.ready = Some(ready);
        self
    }

    /// Handle to observe the state from other threads
    pub fn state(&self) -> LoopStateHandle {
        Arc::clone(&self.state)
    }

    #[inline(always)]
    pub fn tree(&self) -> &BarTree {
        &self.tree
    }

    /// Apply one event, then redraw
    pub fn step(&mut self, event: &Event) -> crate::Result<()> {
        if let Err(anomaly) = self.tree.apply(event) {
            log::debug!("{anomaly}");
        }
        self.redraw()
    }

    fn redraw(&mut self) -> crate::Result<()> {
        let frame = self.renderer.render(self.tree.forest());
        self.screen.draw(&frame)
    }

    /// Run until quit is signalled (or every quit sender is gone).
    ///
    /// The screen is ended even if drawing fails. The first error is returned.
    pub async fn run(
        mut self,
        recv: mpsc::Receiver<Event>,
        quit: watch::Receiver<bool>,
    ) -> crate::Result<()> {
        let result = self.drive(recv, quit).await;
        self.state.set(LoopState::Stopped);
        log::debug!("event loop stopped with {} live bars", self.tree.len());
        let end_result = self.screen.end();
        result.and(end_result)
    }

    async fn drive(
        &mut self,
        mut recv: mpsc::Receiver<Event>,
        mut quit: watch::Receiver<bool>,
    ) -> crate::Result<()> {
        self.screen.begin()?;
        self.redraw()?;
        if let Some(ready) = self.ready.take() {
            // _: the starter may have stopped waiting
            let _ = ready.send(());
        }
        loop {
            tokio::select! {
                biased;
                _ = crate::signal::co_wait_quit(&mut quit) => {
                    return Ok(());
                }
                event = recv.recv() => match event {
                    Some(event) => self.step(&event)?,
                    None => {
                        log::debug!("event queue closed, waiting for quit");
                        crate::signal::co_wait_quit(&mut quit).await;
                        return Ok(());
                    }
                }
            }
        }
    }
}
