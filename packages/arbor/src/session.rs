//! # Session
//!
//! A [`Session`] brings up an [`EventLoop`] on a dedicated thread running
//! a current-thread `tokio` runtime, together with the screen, the quit key
//! watcher and the Ctrl-C frame. Producers talk to it only through the
//! bounded queue behind [`Producer`].
//!
//! ```rust,no_run
//! # use pistonite_arbor as arbor;
//! # fn main() -> arbor::Result<()> {
//! let session = arbor::Session::start(arbor::Config::from_env()?)?;
//! let bars = session.producer();
//! bars.create(1, 100, "download");
//! for _ in 0..100 {
//!     bars.advance(1, 1);
//! }
//! bars.remove(1);
//! // blocks until the user presses q or Ctrl+C
//! session.wait()?;
//! # Ok(()) }
//! ```

use std::sync::Arc;
use std::thread::JoinHandle;

use tokio::sync::mpsc;

use crate::logging::{self, LogSink};
use crate::screen::KeyWatcher;
use crate::signal::{self, InterruptScope, QuitSignal};
use crate::{
    BarId, Config, Context as _, Event, EventLoop, LoopState, LoopStateHandle, RawEvent,
    Renderer, Screen, TerminalScreen, check,
};

/// A running event loop. See [module documentation](self)
pub struct Session {
    producer: Producer,
    quit: QuitSignal,
    state: LoopStateHandle,
    handle: Option<JoinHandle<crate::Result<()>>>,
    // dropped after the loop is joined, in this order
    _keys: Option<KeyWatcher>,
    _interrupt: Option<InterruptScope>,
}

impl Session {
    /// Start a session painting on the terminal.
    ///
    /// Returns once the first frame is drawn, or when the startup grace
    /// period of the config elapses.
    pub fn start(config: Config) -> crate::Result<Self> {
        let use_color = config.get_color().is_colored_for_stdout();
        let screen = TerminalScreen::new(config.get_alt_screen());
        let mut session = Self::spawn(&config, screen, use_color)?;

        if config.get_watch_keys() {
            match KeyWatcher::start(session.quit.clone()) {
                Ok(keys) => session._keys = Some(keys),
                Err(e) => log::warn!("quit key is not available: {e:?}"),
            }
        }
        match signal::push_interrupt_frame(&session.quit) {
            Ok(scope) => session._interrupt = Some(scope),
            Err(e) => log::warn!("{e}"),
        }
        Ok(session)
    }

    /// Start a session drawing on a caller supplied screen.
    ///
    /// Keys and Ctrl-C are not watched. Quit the session with
    /// [`quit`](Self::quit) or by dropping it.
    pub fn start_with_screen(config: Config, screen: impl Screen) -> crate::Result<Self> {
        let use_color = config.get_color() == crate::Color::Always;
        Self::spawn(&config, screen, use_color)
    }

    fn spawn(config: &Config, screen: impl Screen, use_color: bool) -> crate::Result<Self> {
        if let Some(path) = config.get_log_file() {
            logging::use_sink(LogSink::File(path.clone()))?;
        }
        let (producer, recv) = Producer::channel(config.get_capacity());
        let quit = QuitSignal::new();
        let quit_recv = quit.subscribe();
        let loop_quit = quit.clone();
        let (ready_send, ready_recv) = oneshot::channel();

        let renderer = Renderer::new(config.get_render().clone(), use_color);
        let event_loop = EventLoop::new(renderer, screen).notify_ready(ready_send);
        let state = event_loop.state();

        let handle = check!(
            std::thread::Builder::new()
                .name("arbor-loop".to_string())
                .spawn(move || {
                    let runtime = check!(
                        tokio::runtime::Builder::new_current_thread()
                            .enable_all()
                            .build(),
                        "failed to build tokio runtime for the event loop"
                    )?;
                    let result = runtime.block_on(event_loop.run(recv, quit_recv));
                    // waiters on the signal also wake when the loop fails
                    loop_quit.signal();
                    result
                }),
            "failed to spawn event loop thread"
        )?;

        let mut session = Self {
            producer,
            quit,
            state,
            handle: Some(handle),
            _keys: None,
            _interrupt: None,
        };

        match ready_recv.recv_timeout(config.get_startup_grace()) {
            Ok(()) => {}
            Err(oneshot::RecvTimeoutError::Timeout) => {
                log::debug!("event loop not ready after startup grace period, continuing");
            }
            Err(oneshot::RecvTimeoutError::Disconnected) => {
                // the loop exited before it was ready
                let result = session.join();
                result.context("event loop failed to start")?;
                crate::bail!("event loop exited before it was ready");
            }
        }
        log::debug!("session started");
        Ok(session)
    }

    /// Handle to send events with
    pub fn producer(&self) -> Producer {
        self.producer.clone()
    }

    /// Cloneable signal that quits this session when fired
    pub fn quit_signal(&self) -> QuitSignal {
        self.quit.clone()
    }

    /// Ask the loop to stop. Events still in the queue are dropped.
    pub fn quit(&self) {
        self.quit.signal();
    }

    pub fn state(&self) -> LoopState {
        self.state.get()
    }

    pub(crate) fn state_handle(&self) -> LoopStateHandle {
        Arc::clone(&self.state)
    }

    #[inline(always)]
    pub fn is_running(&self) -> bool {
        self.state() == LoopState::Running
    }

    /// Block until the loop stops, and return its result
    pub fn wait(mut self) -> crate::Result<()> {
        self.join()
    }

    fn join(&mut self) -> crate::Result<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        match handle.join() {
            Ok(result) => result,
            Err(e) => {
                let info = e
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| e.downcast_ref::<String>().cloned())
                    .unwrap_or_default();
                crate::bail!("event loop panicked: {info}");
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.quit.signal();
        if let Err(e) = self.join() {
            log::error!("{e:?}");
        }
    }
}

/// Cloneable handle to send events to a session.
///
/// Sending blocks while the queue is full. Once the loop has stopped,
/// sending does nothing. The blocking methods must not be called from
/// inside an async runtime; use [`co_send`](Self::co_send) there.
#[derive(Debug, Clone)]
pub struct Producer {
    send: mpsc::Sender<Event>,
}

impl Producer {
    /// Create a producer and the receiving end of its queue, for running an
    /// [`EventLoop`] directly
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Event>) {
        let (send, recv) = mpsc::channel(capacity.max(1));
        (Self { send }, recv)
    }

    /// Create a root bar
    pub fn create(&self, id: BarId, total: i64, label: impl Into<String>) {
        self.send(Event::create(id, total, label))
    }

    /// Create a bar under `parent`. If `parent` is not live when the event
    /// is applied, the bar becomes a root.
    pub fn create_child(&self, id: BarId, total: i64, label: impl Into<String>, parent: BarId) {
        self.send(Event::create_child(id, total, label, parent))
    }

    pub fn advance(&self, id: BarId, delta: i64) {
        self.send(Event::Advance { id, delta })
    }

    /// Remove a bar and all of its descendants
    pub fn remove(&self, id: BarId) {
        self.send(Event::Remove { id })
    }

    pub fn send_raw(&self, event: RawEvent) {
        self.send(event.into())
    }

    pub fn send(&self, event: Event) {
        if self.send.blocking_send(event).is_err() {
            log::trace!("event dropped, the loop has stopped");
        }
    }

    /// Async version of [`send`](Self::send)
    pub async fn co_send(&self, event: Event) {
        if self.send.send(event).await.is_err() {
            log::trace!("event dropped, the loop has stopped");
        }
    }

    /// If the loop has stopped receiving events
    pub fn is_closed(&self) -> bool {
        self.send.is_closed()
    }
}
