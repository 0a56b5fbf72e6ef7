//! Shared doubles for unit tests.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use crate::logger::{LogLevel, Transport};

/// Transport that records every event it is asked to write.
#[derive(Clone, Default)]
pub(crate) struct Recorder {
    events: Arc<Mutex<Vec<(LogLevel, String)>>>,
}

impl Recorder {
    pub(crate) fn events(&self) -> Vec<(LogLevel, String)> {
        self.events.lock().expect("recorder lock").clone()
    }

    pub(crate) fn levels(&self) -> Vec<LogLevel> {
        self.events().into_iter().map(|(level, _)| level).collect()
    }
}

impl Transport for Recorder {
    fn write(&self, level: LogLevel, rendered: &str) -> io::Result<()> {
        self.events
            .lock()
            .expect("recorder lock")
            .push((level, rendered.to_string()));
        Ok(())
    }
}

/// Cloneable in-memory sink for child output.
#[derive(Clone, Default)]
pub(crate) struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub(crate) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().expect("buffer lock")).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("buffer lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
