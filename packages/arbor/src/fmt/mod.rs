//! ANSI codes, display width and terminal size

pub mod ansi;

mod term_size;
pub use term_size::*;
