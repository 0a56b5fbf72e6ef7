use std::path::PathBuf;

use serde::Serialize;

use super::error::ConfigurationError;
use super::sanitize::{sanitize_arg, sanitize_args};
use crate::logger::LogLevel;

pub const DEFAULT_PORT: u16 = 8080;

/// Three days, in seconds.
pub const DEFAULT_CACHE_CONTROL_SECONDS: u64 = 259_200;

/// Cross-origin policy forwarded to the file server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "mode", content = "pattern")]
pub enum Cors {
    #[default]
    Disabled,
    Wildcard,
    Pattern(String),
}

impl Cors {
    /// Maps the optional-value `--cors` flag: absent disables CORS, a bare
    /// flag (or `*`, or `true`) allows any origin.
    pub fn from_flag(flag: Option<Option<String>>) -> Self {
        match flag {
            None => Cors::Disabled,
            Some(None) => Cors::Wildcard,
            Some(Some(pattern)) => match pattern.as_str() {
                "" | "*" | "true" => Cors::Wildcard,
                "false" => Cors::Disabled,
                _ => Cors::Pattern(pattern),
            },
        }
    }

    /// Strips a pattern down to characters an origin can contain, after the
    /// banished tokens are gone. A pattern with nothing left disables CORS.
    fn sanitized(self) -> Self {
        let Cors::Pattern(pattern) = self else {
            return self;
        };

        let origin: String = sanitize_arg(&pattern)
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || ":/.*-_,".contains(*c))
            .collect();
        if origin.is_empty() {
            Cors::Disabled
        } else {
            Cors::Pattern(origin)
        }
    }

    fn origin(&self) -> Option<&str> {
        match self {
            Cors::Disabled => None,
            Cors::Wildcard => Some("*"),
            Cors::Pattern(pattern) => Some(pattern),
        }
    }
}

/// Accumulates launch settings; [`CommandBuilder::build`] validates them.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    executable: Option<PathBuf>,
    directories: Option<Vec<String>>,
    port: u16,
    cors: Cors,
    cache_control_seconds: u64,
    fallback: bool,
    compression: bool,
    port_switching: bool,
    log_level: LogLevel,
}

impl Default for CommandBuilder {
    fn default() -> Self {
        Self {
            executable: None,
            directories: None,
            port: DEFAULT_PORT,
            cors: Cors::Disabled,
            cache_control_seconds: DEFAULT_CACHE_CONTROL_SECONDS,
            fallback: false,
            compression: true,
            port_switching: true,
            log_level: LogLevel::Info,
        }
    }
}

impl CommandBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = Some(path.into());
        self
    }

    /// Raw directory arguments; they are sanitized when the command is built.
    pub fn directories<I, S>(mut self, directories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.directories = Some(directories.into_iter().map(Into::into).collect());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn cors(mut self, cors: Cors) -> Self {
        self.cors = cors;
        self
    }

    pub fn cache_control_seconds(mut self, seconds: u64) -> Self {
        self.cache_control_seconds = seconds;
        self
    }

    pub fn fallback(mut self, enabled: bool) -> Self {
        self.fallback = enabled;
        self
    }

    pub fn compression(mut self, enabled: bool) -> Self {
        self.compression = enabled;
        self
    }

    pub fn port_switching(mut self, enabled: bool) -> Self {
        self.port_switching = enabled;
        self
    }

    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match &self.directories {
            Some(directories) if !directories.is_empty() => {}
            _ => return Err(ConfigurationError::MissingDirectories),
        }

        match &self.executable {
            Some(path) if !path.as_os_str().is_empty() => Ok(()),
            _ => Err(ConfigurationError::MissingExecutable),
        }
    }

    pub fn build(self) -> Result<Command, ConfigurationError> {
        self.validate()?;

        let (Some(executable), Some(directories)) = (self.executable, self.directories) else {
            return Err(ConfigurationError::MissingDirectories);
        };

        Ok(Command {
            executable,
            directories: sanitize_args(&directories),
            port: self.port,
            cors: self.cors.sanitized(),
            cache_control_seconds: self.cache_control_seconds,
            fallback: self.fallback,
            compression: self.compression,
            port_switching: self.port_switching,
            log_level: self.log_level,
        })
    }
}

/// A validated, read-only invocation of the file server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    executable: PathBuf,
    directories: Vec<String>,
    port: u16,
    cors: Cors,
    cache_control_seconds: u64,
    fallback: bool,
    compression: bool,
    port_switching: bool,
    log_level: LogLevel,
}

impl Command {
    /// Sanitized directories, in the order they were supplied.
    pub fn directories(&self) -> &[String] {
        &self.directories
    }

    pub const fn port(&self) -> u16 {
        self.port
    }

    pub const fn cors(&self) -> &Cors {
        &self.cors
    }

    pub const fn log_level(&self) -> LogLevel {
        self.log_level
    }

    /// Ordered tokens: executable, directories, port, log level, then the
    /// optional cors, fallback, no-compression and no-port-switching flags.
    /// A non-default cache lifetime is appended last.
    ///
    /// The executable head is not quoted. Once joined by [`Command::format`]
    /// the shell splits it on whitespace and interprets redirections, so a
    /// binary path containing a space must be quoted by whoever supplies it.
    pub fn tokens(&self) -> Vec<String> {
        let mut tokens = Vec::with_capacity(self.directories.len() + 8);
        tokens.push(self.executable.display().to_string());
        tokens.extend(self.directories.iter().map(|dir| format!("--dir={dir}")));
        tokens.push(format!("--port={}", self.port));
        tokens.push(format!("--log-level={}", self.log_level));

        if let Some(origin) = self.cors.origin() {
            tokens.push(format!("--cors={origin}"));
        }
        if self.fallback {
            tokens.push(String::from("--fallback"));
        }
        if !self.compression {
            tokens.push(String::from("--no-compression"));
        }
        if !self.port_switching {
            tokens.push(String::from("--no-port-switching"));
        }
        if self.cache_control_seconds != DEFAULT_CACHE_CONTROL_SECONDS {
            tokens.push(format!("--cache-control={}", self.cache_control_seconds));
        }

        tokens
    }

    /// The single shell command line.
    pub fn format(&self) -> String {
        self.tokens().join(" ")
    }
}
