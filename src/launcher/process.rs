//! Spawns the file server and relays its output.
//!
//! The rendered command runs through the platform shell. Its stdout and
//! stderr are each pumped by a pool worker into the host's streams chunk by
//! chunk, so output appears as the server produces it.

use std::fmt;
use std::io::{self, Read, Write};
use std::process::{self, Stdio};
use std::sync::mpsc::{self, Sender};

use serde::Serialize;
use threadpool::ThreadPool;

use super::command::Command;
use super::error::ProcessError;
use crate::attempt::{Caught, attempt};
use crate::logger::Logger;

/// Bytes of each stream kept for the exit report.
const TAIL_LIMIT: usize = 4096;
const CHUNK_SIZE: usize = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stream::Stdout => f.write_str("stdout"),
            Stream::Stderr => f.write_str("stderr"),
        }
    }
}

/// The most recent output of one stream and a count of everything forwarded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputTail {
    bytes: Vec<u8>,
    forwarded: u64,
}

impl OutputTail {
    fn record(&mut self, chunk: &[u8]) {
        self.forwarded += chunk.len() as u64;
        self.bytes.extend_from_slice(chunk);
        if self.bytes.len() > TAIL_LIMIT {
            let excess = self.bytes.len() - TAIL_LIMIT;
            self.bytes.drain(..excess);
        }
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).trim_end().to_string()
    }

    pub const fn forwarded(&self) -> u64 {
        self.forwarded
    }
}

/// Copies `source` into `sink` as data arrives, flushing after every chunk.
pub fn forward<R: Read, W: Write>(mut source: R, mut sink: W) -> io::Result<OutputTail> {
    let mut tail = OutputTail::default();
    let mut buffer = [0u8; CHUNK_SIZE];

    loop {
        let read = match source.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        let chunk = &buffer[..read];
        sink.write_all(chunk)?;
        sink.flush()?;
        tail.record(chunk);
    }

    Ok(tail)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExitReport<'a> {
    command: &'a str,
    exit_code: Option<i32>,
    stdout: String,
    stderr: String,
}

/// Runs `command` to completion, relaying its output to the host's streams.
pub fn launch(command: &Command, logger: &Logger) -> Result<(), ProcessError> {
    launch_with(command, logger, io::stdout(), io::stderr())
}

/// [`launch`] with explicit sinks for the child's stdout and stderr.
pub fn launch_with<O, E>(
    command: &Command,
    logger: &Logger,
    stdout_sink: O,
    stderr_sink: E,
) -> Result<(), ProcessError>
where
    O: Write + Send + 'static,
    E: Write + Send + 'static,
{
    let line = command.format();
    log::debug!("Spawning file server: {}", line);

    let mut child = attempt(|| {
        shell(&line)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
    })
    .map_err(|caught| match caught {
        Caught::Failed(source) => ProcessError::Spawn {
            command: line.clone(),
            source,
        },
        Caught::Panicked(message) => ProcessError::Panicked(message),
    })?;

    let (Some(child_stdout), Some(child_stderr)) = (child.stdout.take(), child.stderr.take())
    else {
        drop(child.kill());
        drop(child.wait());
        return Err(ProcessError::Capture {
            stream: "output streams",
        });
    };

    let pool = ThreadPool::with_name(String::from("rsrv-forward"), 2);
    let (tx, rx) = mpsc::channel();
    spawn_forwarder(&pool, Stream::Stdout, child_stdout, stdout_sink, tx.clone());
    spawn_forwarder(&pool, Stream::Stderr, child_stderr, stderr_sink, tx);

    let status = match child.wait() {
        Ok(status) => status,
        Err(e) => {
            drop(child.kill());
            pool.join();
            return Err(ProcessError::Wait(e));
        }
    };
    pool.join();

    let mut stdout_tail = OutputTail::default();
    let mut stderr_tail = OutputTail::default();
    for (stream, forwarded) in rx.try_iter() {
        match (stream, forwarded) {
            (Stream::Stdout, Ok(tail)) => stdout_tail = tail,
            (Stream::Stderr, Ok(tail)) => stderr_tail = tail,
            (stream, Err(e)) => log::warn!("Stopped forwarding child {}: {}", stream, e),
        }
    }

    log::debug!(
        "File server exited with {:?} after forwarding {} stdout / {} stderr bytes",
        status.code(),
        stdout_tail.forwarded(),
        stderr_tail.forwarded()
    );

    if status.success() {
        let stdout = stdout_tail.text();
        if !stdout.is_empty() {
            logger.info(&stdout);
        }
        logger.info("File server exited successfully.");
        let stderr = stderr_tail.text();
        if !stderr.is_empty() {
            logger.error(&stderr);
        }
        return Ok(());
    }

    logger.error(&ExitReport {
        command: &line,
        exit_code: status.code(),
        stdout: stdout_tail.text(),
        stderr: stderr_tail.text(),
    });
    Err(ProcessError::NonZeroExit {
        code: status.code(),
    })
}

fn spawn_forwarder<R, W>(
    pool: &ThreadPool,
    stream: Stream,
    source: R,
    sink: W,
    tx: Sender<(Stream, io::Result<OutputTail>)>,
) where
    R: Read + Send + 'static,
    W: Write + Send + 'static,
{
    pool.execute(move || {
        let forwarded = forward(source, sink);
        drop(tx.send((stream, forwarded)));
    });
}

#[cfg(windows)]
fn shell(line: &str) -> process::Command {
    let mut command = process::Command::new("cmd");
    command.args(["/C", line]);
    command
}

#[cfg(not(windows))]
fn shell(line: &str) -> process::Command {
    let mut command = process::Command::new("sh");
    command.args(["-c", line]);
    command
}
