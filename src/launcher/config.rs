use clap::{ArgAction, Parser};
use chrono_tz::Tz;
use std::env;
use std::path::{Path, PathBuf};

use super::command::{CommandBuilder, Cors, DEFAULT_CACHE_CONTROL_SECONDS, DEFAULT_PORT};
use crate::logger::{LogLevel, Logger};

/// Environment variable naming the file server binary.
pub const EXECUTABLE_ENV: &str = "RSRV_BIN";

/// File server binary expected next to the launcher.
pub const EXECUTABLE_NAME: &str = "rsrv-core";

const SUPPORTED_PLATFORMS: [&str; 3] = ["linux", "macos", "windows"];

#[derive(Parser, Debug, Clone)]
#[command(
    name = "rsrv",
    author,
    version,
    about = "A simple, fast command line file server, implemented in rust.",
    long_about = None
)]
pub struct LaunchOptions {
    /// Directories to serve files from
    #[arg(value_name = "DIRECTORIES", required = true, num_args = 1..)]
    pub directories: Vec<String>,

    /// Port to bind the server instance to
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Enable CORS: sets `Access-Control-Allow-Origin` to `*`, or to the given pattern
    #[arg(long, value_name = "PATTERN", num_args = 0..=1)]
    pub cors: Option<Option<String>>,

    /// Seconds clients may cache served files
    #[arg(long, value_name = "SECONDS", default_value_t = DEFAULT_CACHE_CONTROL_SECONDS)]
    pub cache_control: u64,

    /// Rewrite all not-found requests to `index.html`
    #[arg(long)]
    pub fallback: bool,

    /// Server and launcher log level
    #[arg(long, value_enum, ignore_case = true, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Do not compress outgoing files
    #[arg(long = "no-compression", action = ArgAction::SetFalse)]
    pub compression: bool,

    /// Do not open a port other than the one specified when it is taken
    #[arg(long = "no-port-switching", action = ArgAction::SetFalse)]
    pub port_switching: bool,

    /// Append launcher logs to this file instead of the console
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Timezone for log file timestamps
    #[arg(long, value_name = "TZ", default_value = "UTC", value_parser = parse_timezone)]
    pub log_timezone: Tz,

    /// Path to the file server binary (defaults to $RSRV_BIN, then a sibling `rsrv-core`)
    #[arg(long, value_name = "PATH")]
    pub executable: Option<PathBuf>,
}

impl LaunchOptions {
    pub fn logger(&self) -> Logger {
        match &self.log_file {
            Some(path) => Logger::file(self.log_level, path, self.log_timezone),
            None => Logger::console(self.log_level),
        }
    }

    /// Everything except the executable, which is resolved separately.
    pub fn command_builder(&self) -> CommandBuilder {
        CommandBuilder::new()
            .directories(self.directories.iter().cloned())
            .port(self.port)
            .cors(Cors::from_flag(self.cors.clone()))
            .cache_control_seconds(self.cache_control)
            .fallback(self.fallback)
            .compression(self.compression)
            .port_switching(self.port_switching)
            .log_level(self.log_level)
    }
}

fn parse_timezone(value: &str) -> Result<Tz, String> {
    value
        .parse::<Tz>()
        .map_err(|e| format!("unknown timezone '{value}': {e}"))
}

/// Locates the file server binary as an absolute path.
pub fn resolve_executable(override_path: Option<&Path>) -> Option<PathBuf> {
    let cwd = env::current_dir().ok();
    let launcher_dir = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));

    resolve_executable_from(
        override_path,
        env::var_os(EXECUTABLE_ENV).map(PathBuf::from),
        cwd.as_deref(),
        launcher_dir.as_deref(),
        env::consts::OS,
    )
}

fn resolve_executable_from(
    override_path: Option<&Path>,
    env_path: Option<PathBuf>,
    cwd: Option<&Path>,
    launcher_dir: Option<&Path>,
    platform: &str,
) -> Option<PathBuf> {
    let explicit = override_path
        .filter(|path| !path.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .or(env_path.filter(|path| !path.as_os_str().is_empty()));

    if let Some(path) = explicit {
        return Some(match cwd {
            Some(cwd) => cwd.join(path),
            None => path,
        });
    }

    if !SUPPORTED_PLATFORMS.contains(&platform) {
        log::debug!("No default file server binary for platform {}", platform);
        return None;
    }

    launcher_dir.map(|dir| dir.join(format!("{EXECUTABLE_NAME}{}", env::consts::EXE_SUFFIX)))
}

#[cfg(test)]
mod tests {
    use clap::error::ErrorKind;
    use rstest::rstest;

    use super::*;
    use crate::launcher::error::ConfigurationError;

    fn parse(args: &[&str]) -> Result<LaunchOptions, clap::Error> {
        LaunchOptions::try_parse_from(std::iter::once("rsrv").chain(args.iter().copied()))
    }

    #[test]
    fn applies_defaults() {
        let options = parse(&["./app"]).expect("parse");

        assert_eq!(options.directories, vec!["./app"]);
        assert_eq!(options.port, 8080);
        assert_eq!(options.cors, None);
        assert_eq!(options.cache_control, 259_200);
        assert!(!options.fallback);
        assert!(options.compression);
        assert!(options.port_switching);
        assert_eq!(options.log_level, LogLevel::Info);
        assert_eq!(options.log_timezone, chrono_tz::UTC);
        assert!(options.log_file.is_none());
    }

    #[test]
    fn missing_directories_is_a_usage_error() {
        let err = parse(&["--port", "3000"]).expect_err("should fail");
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn parses_every_option() {
        let options = parse(&[
            "-p",
            "3000",
            "--cors",
            "https://example.com",
            "--cache-control",
            "60",
            "--fallback",
            "--log-level",
            "WARN",
            "--no-compression",
            "--no-port-switching",
            "--log-timezone",
            "Europe/Moscow",
            "./app",
            "./public",
        ])
        .expect("parse");

        assert_eq!(options.directories, vec!["./app", "./public"]);
        assert_eq!(options.port, 3000);
        assert_eq!(options.cors, Some(Some(String::from("https://example.com"))));
        assert_eq!(options.cache_control, 60);
        assert!(options.fallback);
        assert_eq!(options.log_level, LogLevel::Warn);
        assert!(!options.compression);
        assert!(!options.port_switching);
        assert_eq!(options.log_timezone, chrono_tz::Europe::Moscow);
    }

    #[test]
    fn bare_cors_flag_means_wildcard() {
        let options = parse(&["./app", "--cors"]).expect("parse");
        assert_eq!(Cors::from_flag(options.cors), Cors::Wildcard);
    }

    #[rstest]
    #[case(&["--log-level", "loud", "./app"])]
    #[case(&["--port", "http", "./app"])]
    #[case(&["--log-timezone", "Mars/Olympus", "./app"])]
    fn rejects_invalid_values(#[case] args: &[&str]) {
        let err = parse(args).expect_err("should fail");
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn builder_renders_cli_options() {
        let options = parse(&["-p", "3000", "--fallback", "--no-compression", "./app", "../secret"])
            .expect("parse");

        let command = options
            .command_builder()
            .executable("/opt/rsrv-core")
            .build()
            .expect("build");

        assert_eq!(
            command.format(),
            "/opt/rsrv-core --dir=./app --dir=secret --port=3000 --log-level=info --fallback --no-compression"
        );
    }

    #[test]
    fn builder_without_executable_is_rejected() {
        let options = parse(&["./app"]).expect("parse");
        let err = options.command_builder().build().expect_err("should fail");
        assert_eq!(err, ConfigurationError::MissingExecutable);
    }

    #[test]
    fn override_wins_over_environment() {
        let resolved = resolve_executable_from(
            Some(Path::new("/custom/rsrv-core")),
            Some(PathBuf::from("/env/rsrv-core")),
            Some(Path::new("/work")),
            Some(Path::new("/usr/local/bin")),
            "linux",
        );
        assert_eq!(resolved, Some(PathBuf::from("/custom/rsrv-core")));
    }

    #[test]
    fn environment_used_without_override() {
        let resolved = resolve_executable_from(
            None,
            Some(PathBuf::from("bin/rsrv-core")),
            Some(Path::new("/work")),
            Some(Path::new("/usr/local/bin")),
            "linux",
        );
        assert_eq!(resolved, Some(PathBuf::from("/work/bin/rsrv-core")));
    }

    #[test]
    fn empty_override_falls_back_to_sibling_binary() {
        let resolved = resolve_executable_from(
            Some(Path::new("")),
            None,
            Some(Path::new("/work")),
            Some(Path::new("/usr/local/bin")),
            "macos",
        );
        let expected = format!("/usr/local/bin/{EXECUTABLE_NAME}{}", env::consts::EXE_SUFFIX);
        assert_eq!(resolved, Some(PathBuf::from(expected)));
    }

    #[test]
    fn empty_override_defers_to_environment() {
        let resolved = resolve_executable_from(
            Some(Path::new("")),
            Some(PathBuf::from("/env/rsrv-core")),
            Some(Path::new("/work")),
            Some(Path::new("/usr/local/bin")),
            "linux",
        );
        assert_eq!(resolved, Some(PathBuf::from("/env/rsrv-core")));
    }

    #[test]
    fn unsupported_platform_has_no_default() {
        let resolved = resolve_executable_from(
            None,
            None,
            Some(Path::new("/work")),
            Some(Path::new("/usr/local/bin")),
            "haiku",
        );
        assert_eq!(resolved, None);
    }
}
