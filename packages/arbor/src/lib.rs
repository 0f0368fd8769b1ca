//! Live terminal renderer for a tree of nested progress bars
//!
//! # Overview
//! Producers describe units of work with three events: create a bar
//! (optionally under a parent bar), advance it, and remove it together with
//! everything nested under it. The events travel through a bounded queue to
//! a single [`EventLoop`], which owns the [`BarTree`], applies the events in
//! order and redraws the whole forest after each one.
//!
//! ```text
//!  producer ──> queue ──> EventLoop ──> BarTree ──> Renderer ──> Screen
//!                            ^
//!                 quit key / Ctrl+C
//! ```
//!
//! The easiest way to get started is a [`Session`]:
//! ```rust,no_run
//! # use pistonite_arbor as arbor;
//! # fn main() -> arbor::Result<()> {
//! arbor::logging::level("v");
//! let session = arbor::Session::start(arbor::Config::from_env()?)?;
//! let bars = session.producer();
//! bars.create(1, 5, "parent");
//! bars.create_child(2, 3, "child", 1);
//! bars.advance(2, 3);
//! bars.remove(1); // removes 2 as well
//! session.wait()?;
//! # Ok(()) }
//! ```
//!
//! There is also a process-wide engine with free functions
//! ([`start`], [`create`], [`advance`], [`remove`], [`stop`]), and the
//! [`Tracked`] iterator adapter which manages a bar for a loop.
//!
//! # Tolerance
//! Events that do not match the live tree never fail: duplicate creates
//! and updates of dead bars are ignored, and a bar created under a parent
//! that is not live becomes a root. See [`Anomaly`].
//!
//! # Feature flags
//! - `cli`: [`cli::Flags`](crate::cli) for clap parsers, and `clap` traits on [`Color`]
//! - `release-nolog` / `release-nodebuglog`: statically disable logging
//!   in release builds
//!
//! # Environment
//! See [`Config::from_env`] for the environment variables. `RUST_LOG` is
//! respected by [`logging::init`].

// Atomic helpers
mod atomic;
pub use atomic::*;

mod error_handling;
pub use error_handling::*;

/// Prelude to bring traits into scope
pub mod pre {
    pub use crate::Context as _;
}

mod env_var;
pub use env_var::env_var;

pub mod lv;
pub use lv::{Color, Print};

pub mod logging;

#[cfg(feature = "cli")]
pub mod cli;

mod config;
pub use config::*;

mod event;
pub use event::*;

pub mod tree;
pub use tree::{BarTree, Forest, Placement, ProgressNode};

pub mod fmt;

pub mod render;
pub use render::{Band, Frame, FrameKind, RenderOptions, Renderer};

pub mod screen;
pub use screen::{MemoryFrames, MemoryScreen, Screen, TerminalScreen};

mod signal;
pub use signal::{InterruptScope, QuitSignal, push_interrupt_frame};

pub mod event_loop;
pub use event_loop::{EventLoop, LoopState, LoopStateHandle};

pub mod session;
pub use session::{Producer, Session};

mod global;
pub use global::{advance, create, create_with_parent, is_running, remove, start, start_with, stop, wait};

mod tracked;
pub use tracked::Tracked;
