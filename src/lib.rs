//! Launcher for the `rsrv-core` static file server.
//!
//! Turns directory arguments and server options into a sanitized command
//! line, runs it, and relays the server's output through a leveled logger.

pub mod attempt;
pub mod launcher;
pub mod logger;

#[cfg(test)]
mod test_support;
