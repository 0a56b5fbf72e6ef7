use std::process::ExitCode;

use clap::Parser;
use log::debug;
use rsrv::launcher::{self, config::LaunchOptions, error::LaunchError, error::ProcessError};

fn main() -> ExitCode {
    env_logger::init();

    let options = LaunchOptions::parse();
    debug!("Starting rsrv launcher with options: {:?}", options);

    let logger = options.logger();

    match launcher::run(&options, &logger) {
        Ok(()) => ExitCode::SUCCESS,
        Err(LaunchError::Configuration(error)) => {
            eprintln!("{error}");
            ExitCode::from(&LaunchError::Configuration(error))
        }
        Err(error) => {
            // Non-zero exits were already reported with the child's output.
            if !matches!(error, LaunchError::Process(ProcessError::NonZeroExit { .. })) {
                logger.error(&error.to_string());
            }
            ExitCode::from(&error)
        }
    }
}
