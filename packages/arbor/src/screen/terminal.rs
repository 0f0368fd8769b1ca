use std::io::{IsTerminal as _, Write as _};

use crate::fmt::ansi;
use crate::{Context as _, Frame, Screen, check};

/// Screen that paints frames on stdout.
///
/// When stdout is a terminal, the cursor is hidden and every frame
/// overwrites the previous one from the top-left corner, optionally on the
/// alternate screen. Lines wider than the terminal are clipped. When stdout
/// is not a terminal, frames are written one after another as plain text.
#[derive(Debug)]
pub struct TerminalScreen {
    alt_screen: bool,
    controls: ansi::Controls,
    is_terminal: bool,
    active: bool,
}

impl TerminalScreen {
    /// `alt_screen` is ignored if stdout is not a terminal
    pub fn new(alt_screen: bool) -> Self {
        let is_terminal = std::io::stdout().is_terminal();
        Self {
            alt_screen: alt_screen && is_terminal,
            controls: ansi::controls(is_terminal),
            is_terminal,
            active: false,
        }
    }

    fn write_all(&self, buf: &str) -> crate::Result<()> {
        let mut stdout = std::io::stdout().lock();
        check!(stdout.write_all(buf.as_bytes()), "failed to write to stdout")?;
        check!(stdout.flush(), "failed to flush stdout")?;
        Ok(())
    }

    fn paint(&self, frame: &Frame) -> String {
        let c = &self.controls;
        let (width, height) = match self.is_terminal {
            true => crate::fmt::term_width_height().unwrap_or((crate::fmt::MAX_TERM_SIZE, usize::MAX)),
            false => (usize::MAX, usize::MAX),
        };
        // the last row stays empty, otherwise the terminal scrolls
        let max_lines = height.saturating_sub(1).max(1);
        let mut out = String::from(c.home);
        for line in frame.lines().iter().take(max_lines) {
            ansi::push_clipped(&mut out, width, line);
            out.push_str(c.clear_line);
            out.push('\n');
        }
        out.push_str(c.clear_below);
        out
    }
}

impl Screen for TerminalScreen {
    fn begin(&mut self) -> crate::Result<()> {
        if self.active {
            return Ok(());
        }
        let c = &self.controls;
        let mut out = String::new();
        if self.alt_screen {
            out.push_str(c.enter_alt_screen);
        }
        out.push_str(c.hide_cursor);
        if self.is_terminal {
            // logs to the same terminal would tear the frame
            crate::logging::hold();
        }
        self.active = true;
        self.write_all(&out)
    }

    fn draw(&mut self, frame: &Frame) -> crate::Result<()> {
        let out = self.paint(frame);
        self.write_all(&out)
    }

    fn end(&mut self) -> crate::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        let c = &self.controls;
        let mut out = String::from(c.show_cursor);
        if self.alt_screen {
            out.push_str(c.leave_alt_screen);
        }
        let result = self.write_all(&out);
        crate::logging::release();
        result
    }
}

impl Drop for TerminalScreen {
    fn drop(&mut self) {
        // _: best effort to give the terminal back
        let _ = self.end();
    }
}
