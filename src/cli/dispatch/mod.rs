//! Maps validated CLI matches to an [`Action`].

use crate::cli::{
    actions::{
        server,
        session::{self, Operation},
        Action,
    },
    commands::{global, server as server_args, session as session_args},
};
use anyhow::{anyhow, Context, Result};
use clap::ArgMatches;
use secrecy::SecretString;
use std::path::PathBuf;

const SESSION_DIR: &str = ".calcgate";
const SESSION_FILE_NAME: &str = "session.json";

/// Map validated CLI matches to an action.
///
/// # Errors
/// Returns an error if required arguments are missing or no session file
/// location can be derived.
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    let (name, sub) = matches
        .subcommand()
        .context("missing subcommand")?;

    if name == "server" {
        return Ok(Action::Server(server_action(sub)));
    }

    let operation = match name {
        "register" => Operation::Register {
            username: required(sub, session_args::ARG_USERNAME)?,
            email: required(sub, session_args::ARG_EMAIL)?,
            password: SecretString::from(required(sub, session_args::ARG_PASSWORD)?),
            remember: sub.get_flag(session_args::ARG_REMEMBER),
        },
        "login" => Operation::Login {
            username_or_email: required(sub, session_args::ARG_IDENTIFIER)?,
            password: SecretString::from(required(sub, session_args::ARG_PASSWORD)?),
            remember: sub.get_flag(session_args::ARG_REMEMBER),
        },
        "logout" => Operation::Logout,
        "whoami" => Operation::WhoAmI,
        "status" => Operation::Status,
        other => return Err(anyhow!("unknown subcommand: {other}")),
    };

    Ok(Action::Session(session::Args {
        api_url: required(matches, global::ARG_API_URL)?,
        session_file: match matches.get_one::<String>(global::ARG_SESSION_FILE) {
            Some(path) => PathBuf::from(path),
            None => default_session_file()?,
        },
        ephemeral_session_file: match matches.get_one::<String>(global::ARG_EPHEMERAL_FILE) {
            Some(path) => PathBuf::from(path),
            None => default_ephemeral_session_file()?,
        },
        operation,
    }))
}

fn server_action(sub: &ArgMatches) -> server::Args {
    server::Args {
        port: sub
            .get_one::<u16>(server_args::ARG_PORT)
            .copied()
            .unwrap_or(8000),
        dsn: sub.get_one::<String>(server_args::ARG_DSN).cloned(),
        token_secret: sub
            .get_one::<String>(server_args::ARG_TOKEN_SECRET)
            .cloned()
            .map(SecretString::from),
        token_ttl_seconds: sub
            .get_one::<i64>(server_args::ARG_TOKEN_TTL)
            .copied()
            .unwrap_or(1800),
        frontend_base_url: sub.get_one::<String>(server_args::ARG_FRONTEND_URL).cloned(),
    }
}

fn required(matches: &ArgMatches, id: &str) -> Result<String> {
    matches
        .get_one::<String>(id)
        .cloned()
        .with_context(|| format!("missing required argument: --{id}"))
}

/// `~/.calcgate/session.json`.
fn default_session_file() -> Result<PathBuf> {
    let home = dirs::home_dir().context("no home directory found; pass --session-file")?;
    Ok(home.join(SESSION_DIR).join(SESSION_FILE_NAME))
}

/// The per-user runtime dir, else the per-user cache dir. Never a shared temp dir.
fn default_ephemeral_session_file() -> Result<PathBuf> {
    let base = dirs::runtime_dir()
        .or_else(dirs::cache_dir)
        .context("no runtime or cache directory found; pass --ephemeral-session-file")?;
    Ok(base.join("calcgate").join(SESSION_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;
    use secrecy::ExposeSecret;

    fn cleared_env<'a>(extra: &[(&'a str, Option<&'a str>)]) -> Vec<(&'a str, Option<&'a str>)> {
        let mut vars = vec![
            ("CALCGATE_SESSION_FILE", None),
            ("CALCGATE_EPHEMERAL_SESSION_FILE", None),
            ("CALCGATE_API_URL", None),
            ("CALCGATE_TOKEN_SECRET", None),
            ("CALCGATE_USER", None),
            ("CALCGATE_PASSWORD", None),
        ];
        vars.retain(|(key, _)| !extra.iter().any(|(name, _)| name == key));
        vars.extend_from_slice(extra);
        vars
    }

    #[test]
    fn server_action_uses_env_secret() {
        temp_env::with_vars(
            cleared_env(&[("CALCGATE_TOKEN_SECRET", Some("env-secret"))]),
            || {
                let matches = commands::new().get_matches_from(vec!["calcgate", "server"]);
                let Ok(Action::Server(args)) = handler(&matches) else {
                    panic!("expected server action");
                };
                assert_eq!(args.port, 8000);
                assert_eq!(args.dsn, None);
                assert_eq!(
                    args.token_secret.as_ref().map(|secret| secret.expose_secret()),
                    Some("env-secret")
                );
            },
        );
    }

    #[test]
    fn login_uses_default_session_paths() {
        temp_env::with_vars(
            cleared_env(&[
                ("HOME", Some("/home/calc")),
                ("XDG_RUNTIME_DIR", Some("/run/user/1000")),
            ]),
            || {
                let matches = commands::new().get_matches_from(vec![
                    "calcgate",
                    "login",
                    "-u",
                    "johndoe",
                    "--password",
                    "securepass123",
                ]);
                let Ok(Action::Session(args)) = handler(&matches) else {
                    panic!("expected session action");
                };
                assert_eq!(
                    args.session_file,
                    PathBuf::from("/home/calc/.calcgate/session.json")
                );
                if cfg!(target_os = "linux") {
                    assert_eq!(
                        args.ephemeral_session_file,
                        PathBuf::from("/run/user/1000/calcgate/session.json")
                    );
                }
                assert!(matches!(
                    args.operation,
                    Operation::Login { remember: false, .. }
                ));
            },
        );
    }

    #[test]
    fn explicit_session_file_wins() {
        temp_env::with_vars(
            cleared_env(&[("HOME", None), ("XDG_RUNTIME_DIR", Some("/run/user/1000"))]),
            || {
                let matches = commands::new().get_matches_from(vec![
                    "calcgate",
                    "--session-file",
                    "/tmp/calc.json",
                    "status",
                ]);
                let Ok(Action::Session(args)) = handler(&matches) else {
                    panic!("expected session action");
                };
                assert_eq!(args.session_file, PathBuf::from("/tmp/calc.json"));
                assert!(matches!(args.operation, Operation::Status));
            },
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn ephemeral_file_falls_back_to_user_cache() {
        temp_env::with_vars(
            cleared_env(&[
                ("HOME", Some("/home/calc")),
                ("XDG_RUNTIME_DIR", None),
                ("XDG_CACHE_HOME", None),
            ]),
            || {
                let matches = commands::new().get_matches_from(vec!["calcgate", "status"]);
                let Ok(Action::Session(args)) = handler(&matches) else {
                    panic!("expected session action");
                };
                assert_eq!(
                    args.ephemeral_session_file,
                    PathBuf::from("/home/calc/.cache/calcgate/session.json")
                );
                assert!(!args.ephemeral_session_file.starts_with(std::env::temp_dir()));
            },
        );
    }

    #[test]
    fn explicit_ephemeral_file_wins() {
        temp_env::with_vars(cleared_env(&[]), || {
            let matches = commands::new().get_matches_from(vec![
                "calcgate",
                "--session-file",
                "/srv/calc/persistent.json",
                "--ephemeral-session-file",
                "/srv/calc/ephemeral.json",
                "logout",
            ]);
            let Ok(Action::Session(args)) = handler(&matches) else {
                panic!("expected session action");
            };
            assert_eq!(
                args.ephemeral_session_file,
                PathBuf::from("/srv/calc/ephemeral.json")
            );
            assert!(matches!(args.operation, Operation::Logout));
        });
    }
}
