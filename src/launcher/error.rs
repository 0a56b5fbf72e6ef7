//! Error taxonomy for the launcher.

use std::io;
use std::process::ExitCode;

use thiserror::Error;

/// Invalid launch settings. Fatal: nothing is spawned.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("FatalConfigException: Missing directory arguments.")]
    MissingDirectories,
    #[error(
        "FatalConfigException: Could not determine a path to an executable. This could be due to the host being an unknown or unsupported platform."
    )]
    MissingExecutable,
}

/// Failures of the spawned file server. Surfaced, never retried.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to capture the child's {stream}")]
    Capture { stream: &'static str },
    #[error("failed waiting for the file server to exit: {0}")]
    Wait(#[source] io::Error),
    #[error("file server exited with {}", describe_code(.code))]
    NonZeroExit { code: Option<i32> },
    #[error("launcher panicked while running the file server: {0}")]
    Panicked(String),
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => String::from("no status (terminated by a signal)"),
    }
}

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Process(#[from] ProcessError),
}

impl LaunchError {
    /// Exit status the launcher reports for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            LaunchError::Configuration(ConfigurationError::MissingDirectories) => 2,
            LaunchError::Process(ProcessError::NonZeroExit { code: Some(code) }) => {
                u8::try_from(*code).ok().filter(|code| *code != 0).unwrap_or(1)
            }
            _ => 1,
        }
    }
}

impl From<&LaunchError> for ExitCode {
    fn from(error: &LaunchError) -> Self {
        ExitCode::from(error.exit_code())
    }
}
