//! # Logging
//!
//! The crate logs through the [`log`](https://docs.rs/log) facade. Call
//! [`init`] (or [`level`] in tests) to install the logger of this crate,
//! or install any other logger. Records are never written to stdout,
//! since stdout belongs to the screen.
//!
//! The `RUST_LOG` environment variable is respected through `env_filter`.
//! Otherwise the verbosity level decides what is printed:
//!
//! | Print level      | Printed       |
//! |------------------|---------------|
//! | `QuietQuiet`     | nothing       |
//! | `Quiet`          | error         |
//! | `Normal`         | warn and up   |
//! | `Verbose`        | debug and up  |
//! | `VerboseVerbose` | trace and up  |
//!
//! While a terminal screen is painting and logs go to a terminal stderr,
//! log lines are held back and printed after the screen is restored.

use std::fs::File;
use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use env_filter::{Builder as LogEnvBuilder, Filter as LogEnvFilter};

use crate::lv::{self, Lv, Print};
use crate::{Context as _, check};

/// Where log records are written
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LogSink {
    #[default]
    Stderr,
    /// Append to a file, created if missing
    File(PathBuf),
}

/// Lines held back beyond this are dropped and only counted
const MAX_HELD_LINES: usize = 1000;

static LOG_FILTER: OnceLock<LogEnvFilter> = OnceLock::new();
static OUTPUT: Mutex<Option<Output>> = Mutex::new(None);

struct Output {
    kind: LogSink,
    sink: Box<dyn Write + Send>,
    /// Lines held back while the screen is active
    held: Option<Vec<String>>,
    /// Lines dropped because the held buffer was full
    dropped: usize,
    /// If holding makes sense for this sink
    can_hold: bool,
}

impl Output {
    fn write_line(&mut self, line: &str) {
        if let Some(held) = self.held.as_mut() {
            if held.len() < MAX_HELD_LINES {
                held.push(line.to_string());
            } else {
                self.dropped += 1;
            }
            return;
        }
        // _: nowhere to report a failure to log
        let _ = writeln!(self.sink, "{line}");
        let _ = self.sink.flush();
    }
}

/// Shorthand to quickly setup logging to stderr. Can be useful in tests.
///
/// `qq`, `q`, `v` and `vv` inputs map to corresponding print levels. Other inputs
/// are mapped to default level
pub fn level(lv: &str) {
    let level = match lv {
        "qq" => Print::QuietQuiet,
        "q" => Print::Quiet,
        "v" => Print::Verbose,
        "vv" => Print::VerboseVerbose,
        _ => Print::Normal,
    };
    // _: stderr sink cannot fail to open
    let _ = init(level, LogSink::Stderr);
}

/// Install the logger of this crate with the verbosity level and sink.
///
/// Calling this again replaces the level and the sink.
pub fn init(level: Print, sink: LogSink) -> crate::Result<()> {
    let env_rust_log = std::env::var("RUST_LOG");
    let log_level = match env_rust_log {
        Ok(value) if !value.is_empty() => {
            let mut builder = LogEnvBuilder::new();
            let filter = builder.parse(&value).build();
            let log_level = filter.filter();
            let _ = LOG_FILTER.set(filter);
            log_level.max(level.into())
        }
        _ => level.into(),
    };

    let output = match &sink {
        LogSink::Stderr => Output {
            kind: LogSink::Stderr,
            sink: Box::new(std::io::stderr()),
            held: None,
            dropped: 0,
            can_hold: std::io::stderr().is_terminal(),
        },
        LogSink::File(path) => {
            let file = check!(
                File::options().create(true).append(true).open(path),
                "failed to open log file '{}'",
                path.display()
            )?;
            Output {
                kind: sink.clone(),
                sink: Box::new(file),
                held: None,
                dropped: 0,
                can_hold: false,
            }
        }
    };
    {
        let Ok(mut g_output) = OUTPUT.lock() else {
            crate::bail!("global log output is poisoned");
        };
        if let Some(old) = g_output.as_mut() {
            flush_held(old);
        }
        *g_output = Some(output);
    }

    lv::PRINT_LEVEL.set(level);
    log::set_max_level(log_level);
    // _: another logger may be installed already, which is fine
    let _ = log::set_logger(&LogImpl);
    Ok(())
}

/// Write log records to `sink` from now on.
///
/// The logger of this crate is installed at the current verbosity level if
/// it is not yet. Does nothing if `sink` is already in use.
pub fn use_sink(sink: LogSink) -> crate::Result<()> {
    let in_use = OUTPUT
        .lock()
        .map(|output| output.as_ref().is_some_and(|o| o.kind == sink))
        .unwrap_or_default();
    if in_use {
        return Ok(());
    }
    init(lv::PRINT_LEVEL.get(), sink)
}

/// Start holding back log lines, if the sink is a terminal
pub(crate) fn hold() {
    if let Ok(mut output) = OUTPUT.lock() {
        if let Some(output) = output.as_mut() {
            if output.can_hold && output.held.is_none() {
                output.held = Some(Vec::new());
            }
        }
    }
}

/// Stop holding back log lines and print what was held
pub(crate) fn release() {
    if let Ok(mut output) = OUTPUT.lock() {
        if let Some(output) = output.as_mut() {
            flush_held(output);
        }
    }
}

fn flush_held(output: &mut Output) {
    let Some(held) = output.held.take() else {
        return;
    };
    for line in held {
        output.write_line(&line);
    }
    let dropped = std::mem::take(&mut output.dropped);
    if dropped > 0 {
        let line = format!(
            "{} {dropped} log lines were dropped while the screen was active",
            Lv::Warn.prefix()
        );
        output.write_line(&line);
    }
}

struct LogImpl;
impl log::Log for LogImpl {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        match LOG_FILTER.get() {
            Some(filter) => filter.enabled(metadata),
            None => Lv::from(metadata.level()).can_print(lv::PRINT_LEVEL.get()),
        }
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let typ = Lv::from(record.level());
        let line = format_record(typ, record);
        if let Ok(mut output) = OUTPUT.lock() {
            if let Some(output) = output.as_mut() {
                output.write_line(&line);
            }
        }
    }

    fn flush(&self) {
        if let Ok(mut output) = OUTPUT.lock() {
            if let Some(output) = output.as_mut() {
                let _ = output.sink.flush();
            }
        }
    }
}

fn format_record(typ: Lv, record: &log::Record) -> String {
    use std::fmt::Write as _;

    let mut message = String::from(typ.prefix());
    message.push(' ');
    if typ == Lv::Trace {
        // source location for trace messages
        let start = message.len();
        message.push('[');
        if let Some(p) = record.module_path() {
            // aliased crate, use the shorthand
            message.push_str(p.strip_prefix("pistonite_").unwrap_or(p));
            message.push(' ');
        }
        if let Some(f) = record.file() {
            let name = match f.rfind(['/', '\\']) {
                None => f,
                Some(i) => &f[i + 1..],
            };
            message.push_str(name);
        }
        if let Some(l) = record.line() {
            let _ = write!(message, ":{l}");
        }
        if message.len() > start + 1 {
            message.push_str("] ");
        } else {
            message.truncate(start);
        }
    }
    let _ = write!(message, "{}", record.args());
    message
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_format_warn() {
        assert_eq!(
            format_record(
                Lv::Warn,
                &log::Record::builder()
                    .level(log::Level::Warn)
                    .args(format_args!("disk is {}", "full"))
                    .build()
            ),
            "W] disk is full"
        );
    }

    #[test]
    fn test_format_trace_has_location() {
        assert_eq!(
            format_record(
                Lv::Trace,
                &log::Record::builder()
                    .level(log::Level::Trace)
                    .module_path(Some("pistonite_arbor::tree"))
                    .file(Some("src/tree.rs"))
                    .line(Some(12))
                    .args(format_args!("x"))
                    .build()
            ),
            "*] [arbor::tree tree.rs:12] x"
        );
    }

    #[test]
    fn test_held_lines_are_released_in_order() {
        let mut output = Output {
            sink: Box::new(std::io::sink()),
            kind: LogSink::Stderr,
            held: Some(Vec::new()),
            dropped: 0,
            can_hold: true,
        };
        output.write_line("a");
        output.write_line("b");
        assert_eq!(output.held.as_deref(), Some(&["a".to_string(), "b".to_string()][..]));
        flush_held(&mut output);
        assert!(output.held.is_none());
    }

    /// Sink that appends into a shared buffer
    #[derive(Clone, Default)]
    struct SharedSink(std::sync::Arc<Mutex<Vec<u8>>>);
    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_held_lines_are_capped() {
        let sink = SharedSink::default();
        let mut output = Output {
            sink: Box::new(sink.clone()),
            kind: LogSink::Stderr,
            held: Some(Vec::new()),
            dropped: 0,
            can_hold: true,
        };
        for i in 0..MAX_HELD_LINES + 5 {
            output.write_line(&format!("line {i}"));
        }
        assert_eq!(output.held.as_ref().map(Vec::len), Some(MAX_HELD_LINES));
        assert_eq!(output.dropped, 5);

        flush_held(&mut output);
        assert_eq!(output.dropped, 0);
        let written = String::from_utf8(sink.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), MAX_HELD_LINES + 1);
        assert_eq!(lines[0], "line 0");
        assert_eq!(
            lines[MAX_HELD_LINES],
            "W] 5 log lines were dropped while the screen was active"
        );
    }
}
