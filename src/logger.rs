//! Severity-filtered logger with pluggable transports.
//!
//! A [`Logger`] is built once at startup and handed by reference to whatever
//! needs to emit diagnostics. Events below the configured minimum are
//! discarded before rendering; a failed transport write is reported through
//! the `log` facade and swallowed.

use std::fmt::{self, Debug};
use std::fs::OpenOptions;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use ansi_term::Colour;
use chrono_tz::Tz;
use clap::ValueEnum;
use serde::Serialize;
use serde_json::Value;

use crate::attempt::attempt;

/// Severity attached to a log event, and the logger's minimum filter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Routine progress output.
    #[default]
    Info,
    /// Developer detail; filtered like `info`.
    Debug,
    /// Something looks wrong but the launch continues.
    Warn,
    /// A failure worth the operator's attention.
    Error,
    /// Same severity as `error`.
    Fatal,
    /// Suppresses all output.
    Silent,
}

impl LogLevel {
    /// Ordinal compared against the logger's minimum.
    pub const fn rank(self) -> u8 {
        match self {
            LogLevel::Info | LogLevel::Debug => 0,
            LogLevel::Warn => 1,
            LogLevel::Error | LogLevel::Fatal => 2,
            LogLevel::Silent => 3,
        }
    }

    /// Lowercase name, as forwarded to the file server.
    pub const fn as_str(self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Fatal => "fatal",
            LogLevel::Silent => "silent",
        }
    }

    const fn label(self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Warn => "WARN",
            LogLevel::Error | LogLevel::Fatal => "ERROR",
            LogLevel::Silent => "LOG",
        }
    }

    const fn colour(self) -> Colour {
        match self {
            LogLevel::Info | LogLevel::Silent => Colour::RGB(0x80, 0xac, 0xf8),
            LogLevel::Debug => Colour::RGB(0x78, 0xdb, 0xcb),
            LogLevel::Warn => Colour::RGB(0xff, 0xe7, 0x6e),
            LogLevel::Error | LogLevel::Fatal => Colour::RGB(0xff, 0x4e, 0x52),
        }
    }

    const fn uses_stderr(self) -> bool {
        matches!(self, LogLevel::Warn | LogLevel::Error | LogLevel::Fatal)
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Destination a rendered log event is written to.
pub trait Transport: Send + Sync {
    /// Writes one already-filtered event; `rendered` is the stringified payload.
    fn write(&self, level: LogLevel, rendered: &str) -> io::Result<()>;
}

/// Writes labelled, colourised lines to stdout (info, debug) or stderr.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleTransport {
    stdout_colored: bool,
    stderr_colored: bool,
}

impl ConsoleTransport {
    /// Colours each stream only when it is attached to a terminal.
    pub fn new() -> Self {
        Self {
            stdout_colored: io::stdout().is_terminal(),
            stderr_colored: io::stderr().is_terminal(),
        }
    }
}

impl Default for ConsoleTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for ConsoleTransport {
    fn write(&self, level: LogLevel, rendered: &str) -> io::Result<()> {
        if level.uses_stderr() {
            let line = console_line(level, rendered, self.stderr_colored);
            writeln!(io::stderr().lock(), "{line}")
        } else {
            let line = console_line(level, rendered, self.stdout_colored);
            writeln!(io::stdout().lock(), "{line}")
        }
    }
}

fn console_line(level: LogLevel, rendered: &str, colored: bool) -> String {
    let label = format!("[{}]", level.label());
    if colored {
        let colour = level.colour();
        format!("{}: {}", colour.bold().paint(label), colour.paint(rendered))
    } else {
        format!("{label}: {rendered}")
    }
}

/// Appends timestamped lines to a file, opening it for every event.
#[derive(Debug, Clone)]
pub struct FileTransport {
    destination: PathBuf,
    timezone: Tz,
}

impl FileTransport {
    pub fn new(destination: impl Into<PathBuf>, timezone: Tz) -> Self {
        Self {
            destination: destination.into(),
            timezone,
        }
    }
}

impl Transport for FileTransport {
    fn write(&self, level: LogLevel, rendered: &str) -> io::Result<()> {
        let timestamp = chrono::Utc::now()
            .with_timezone(&self.timezone)
            .format("%Y-%m-%dT%H:%M:%S%:z");

        let mut log_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.destination)?;

        writeln!(log_file, "[{} {}] {}", timestamp, level.label(), rendered)
    }
}

/// Process-wide leveled logger.
pub struct Logger {
    minimum: LogLevel,
    transport: Box<dyn Transport>,
}

impl Logger {
    pub fn new(minimum: LogLevel, transport: impl Transport + 'static) -> Self {
        Self {
            minimum,
            transport: Box::new(transport),
        }
    }

    pub fn console(minimum: LogLevel) -> Self {
        Self::new(minimum, ConsoleTransport::new())
    }

    pub fn file(minimum: LogLevel, destination: impl Into<PathBuf>, timezone: Tz) -> Self {
        Self::new(minimum, FileTransport::new(destination, timezone))
    }

    /// Whether an event at `level` passes the minimum-severity filter.
    pub const fn enabled(&self, level: LogLevel) -> bool {
        level.rank() < LogLevel::Silent.rank() && level.rank() >= self.minimum.rank()
    }

    pub fn info<P: Serialize + Debug + ?Sized>(&self, payload: &P) {
        self.commit(LogLevel::Info, payload);
    }

    pub fn debug<P: Serialize + Debug + ?Sized>(&self, payload: &P) {
        self.commit(LogLevel::Debug, payload);
    }

    pub fn warn<P: Serialize + Debug + ?Sized>(&self, payload: &P) {
        self.commit(LogLevel::Warn, payload);
    }

    pub fn error<P: Serialize + Debug + ?Sized>(&self, payload: &P) {
        self.commit(LogLevel::Error, payload);
    }

    /// Logs at `fatal` severity. Does not terminate the process.
    pub fn fatal<P: Serialize + Debug + ?Sized>(&self, payload: &P) {
        self.commit(LogLevel::Fatal, payload);
    }

    fn commit<P: Serialize + Debug + ?Sized>(&self, level: LogLevel, payload: &P) {
        if !self.enabled(level) {
            return;
        }

        let rendered = safe_stringify(payload);
        if let Err(caught) = attempt(|| self.transport.write(level, &rendered)) {
            log::warn!("Dropped {} log event: {}", level, caught);
        }
    }
}

impl Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("minimum", &self.minimum)
            .finish_non_exhaustive()
    }
}

/// Renders a payload for output.
///
/// Strings pass through unchanged, other values become indented JSON. When
/// serialization fails the payload's `Debug` form is used instead.
pub fn safe_stringify<P: Serialize + Debug + ?Sized>(payload: &P) -> String {
    match attempt(|| serde_json::to_value(payload)) {
        Ok(Value::String(text)) => text,
        Ok(value) => {
            serde_json::to_string_pretty(&value).unwrap_or_else(|_| format!("{payload:?}"))
        }
        Err(caught) => {
            log::debug!("Falling back to raw payload: {}", caught);
            format!("{payload:?}")
        }
    }
}
