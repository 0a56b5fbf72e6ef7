pub mod command;
pub mod config;
pub mod error;
pub mod process;
pub mod sanitize;

use std::path::{Path, PathBuf};

use serde::Serialize;

use command::{Command, Cors};
use config::LaunchOptions;
use error::{ConfigurationError, LaunchError};
use crate::logger::{LogLevel, Logger};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LaunchSummary<'a> {
    directories: &'a [String],
    port: u16,
    cors: &'a Cors,
    log_level: LogLevel,
    command: String,
}

/// Builds the file server command from `options` and runs it to completion.
pub fn run(options: &LaunchOptions, logger: &Logger) -> Result<(), LaunchError> {
    let executable = config::resolve_executable(options.executable.as_deref());
    let command = prepare(options, executable)?;

    report_missing_directories(&command, logger);
    logger.info(&LaunchSummary {
        directories: command.directories(),
        port: command.port(),
        cors: command.cors(),
        log_level: command.log_level(),
        command: command.format(),
    });

    process::launch(&command, logger)?;
    Ok(())
}

/// Validates `options` into a finalized [`Command`].
pub fn prepare(
    options: &LaunchOptions,
    executable: Option<PathBuf>,
) -> Result<Command, ConfigurationError> {
    let mut builder = options.command_builder();
    if let Some(path) = executable {
        builder = builder.executable(path);
    }
    builder.build()
}

fn report_missing_directories(command: &Command, logger: &Logger) {
    for directory in command.directories() {
        if !Path::new(directory).is_dir() {
            logger.warn(&format!(
                "Directory '{directory}' does not exist; the file server may refuse to serve it."
            ));
        }
    }
}
