//! # Global Engine
//!
//! A process-wide session for callers that would rather not carry a
//! [`Session`] around, mirroring a flat exported API:
//!
//! ```rust,no_run
//! # use pistonite_arbor as arbor;
//! # fn main() -> arbor::Result<()> {
//! arbor::start()?;
//! arbor::create(1, 3, "stages");
//! arbor::create_with_parent(2, 10, "stage 1", 1);
//! arbor::advance(2, 10);
//! arbor::remove(2);
//! arbor::advance(1, 1);
//! arbor::stop()?;
//! # Ok(()) }
//! ```
//!
//! Starting twice is a no-op while the engine is running. Events sent
//! before start or after stop are dropped.

use std::sync::{Arc, Mutex};

use crate::{BarId, Config, Producer, Session};

static ENGINE: Mutex<Option<Session>> = Mutex::new(None);

/// Start the global engine with config from the environment
pub fn start() -> crate::Result<()> {
    start_with(Config::from_env()?)
}

/// Start the global engine with the config
pub fn start_with(config: Config) -> crate::Result<()> {
    let Ok(mut engine) = ENGINE.lock() else {
        crate::bail!("global engine is poisoned");
    };
    if let Some(session) = engine.as_ref() {
        if session.is_running() {
            log::debug!("global engine is already running");
            return Ok(());
        }
    }
    // a stopped session is replaced, and joined when dropped
    *engine = Some(Session::start(config)?);
    Ok(())
}

/// If the global engine is started and the user has not quit
pub fn is_running() -> bool {
    ENGINE
        .lock()
        .map(|e| e.as_ref().is_some_and(Session::is_running))
        .unwrap_or_default()
}

fn producer() -> Option<Producer> {
    // the lock is not held while sending, which may block
    ENGINE.lock().ok()?.as_ref().map(Session::producer)
}

pub fn create(id: BarId, total: i64, label: impl Into<String>) {
    if let Some(p) = producer() {
        p.create(id, total, label);
    }
}

pub fn create_with_parent(id: BarId, total: i64, label: impl Into<String>, parent: BarId) {
    if let Some(p) = producer() {
        p.create_child(id, total, label, parent);
    }
}

pub fn advance(id: BarId, delta: i64) {
    if let Some(p) = producer() {
        p.advance(id, delta);
    }
}

pub fn remove(id: BarId) {
    if let Some(p) = producer() {
        p.remove(id);
    }
}

/// Block until the global engine stops. Returns right away if it is not
/// started.
///
/// The engine stays reachable while waiting, so other threads can keep
/// sending events and call [`stop`]. Must not be called from inside an
/// async runtime.
pub fn wait() -> crate::Result<()> {
    let (quit, state) = {
        let Ok(engine) = ENGINE.lock() else {
            crate::bail!("global engine is poisoned");
        };
        match engine.as_ref() {
            Some(session) => (session.quit_signal(), session.state_handle()),
            None => return Ok(()),
        }
    };
    // the loop fires quit itself when it stops for any reason
    quit.wait()?;
    let session = {
        let Ok(mut engine) = ENGINE.lock() else {
            crate::bail!("global engine is poisoned");
        };
        // stop() may have taken it, or a new engine may have started since
        let same = engine
            .as_ref()
            .is_some_and(|session| Arc::ptr_eq(&session.state_handle(), &state));
        if same { engine.take() } else { None }
    };
    match session {
        Some(session) => session.wait(),
        None => Ok(()),
    }
}

/// Quit the global engine and wait for it to restore the terminal
pub fn stop() -> crate::Result<()> {
    let session = {
        let Ok(mut engine) = ENGINE.lock() else {
            crate::bail!("global engine is poisoned");
        };
        engine.take()
    };
    match session {
        Some(session) => {
            session.quit();
            session.wait()
        }
        None => Ok(()),
    }
}
