//! Arguments shared by every subcommand.

use clap::{builder::ValueParser, Arg, ArgAction, Command};

use crate::client::config::DEFAULT_API_BASE_URL;

pub const ARG_VERBOSITY: &str = "verbosity";
pub const ARG_API_URL: &str = "api-url";
pub const ARG_SESSION_FILE: &str = "session-file";
pub const ARG_EPHEMERAL_FILE: &str = "ephemeral-session-file";

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Accepts a level name or its index (`error` = 0 .. `trace` = 4).
#[must_use]
pub fn validator_log_level() -> ValueParser {
    ValueParser::from(|level: &str| -> Result<u8, String> {
        let level = level.trim().to_lowercase();
        if let Ok(index) = level.parse::<u8>() {
            if usize::from(index) < LOG_LEVELS.len() {
                return Ok(index);
            }
        }
        LOG_LEVELS
            .iter()
            .position(|name| *name == level)
            .and_then(|index| u8::try_from(index).ok())
            .ok_or_else(|| format!("invalid log level, expected one of {}", LOG_LEVELS.join(", ")))
    })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_VERBOSITY)
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("CALCGATE_LOG_LEVEL")
                .global(true)
                .action(ArgAction::Count)
                .value_parser(validator_log_level()),
        )
        .arg(
            Arg::new(ARG_API_URL)
                .long(ARG_API_URL)
                .help("Base URL of the calcgate API")
                .env("CALCGATE_API_URL")
                .default_value(DEFAULT_API_BASE_URL)
                .global(true),
        )
        .arg(
            Arg::new(ARG_SESSION_FILE)
                .long(ARG_SESSION_FILE)
                .help("File holding the remembered session (default: ~/.calcgate/session.json)")
                .env("CALCGATE_SESSION_FILE")
                .global(true),
        )
        .arg(
            Arg::new(ARG_EPHEMERAL_FILE)
                .long(ARG_EPHEMERAL_FILE)
                .help("File holding a session that is not remembered (default: runtime dir)")
                .env("CALCGATE_EPHEMERAL_SESSION_FILE")
                .global(true),
        )
}
