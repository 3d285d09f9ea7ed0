//! Client subcommands operating on the local session.

use clap::{Arg, ArgAction, Command};

pub const ARG_USERNAME: &str = "username";
pub const ARG_EMAIL: &str = "email";
pub const ARG_IDENTIFIER: &str = "user";
pub const ARG_PASSWORD: &str = "password";
pub const ARG_REMEMBER: &str = "remember";

fn password_arg() -> Arg {
    Arg::new(ARG_PASSWORD)
        .long(ARG_PASSWORD)
        .help("Account password")
        .env("CALCGATE_PASSWORD")
        .hide_env_values(true)
        .required(true)
}

fn remember_arg() -> Arg {
    Arg::new(ARG_REMEMBER)
        .long(ARG_REMEMBER)
        .help("Keep the session across reboots")
        .action(ArgAction::SetTrue)
}

#[must_use]
pub fn commands() -> [Command; 5] {
    [
        Command::new("register")
            .about("Create an account and sign in")
            .arg(
                Arg::new(ARG_USERNAME)
                    .long(ARG_USERNAME)
                    .help("Username (3-50 characters)")
                    .required(true),
            )
            .arg(
                Arg::new(ARG_EMAIL)
                    .long(ARG_EMAIL)
                    .help("Email address")
                    .required(true),
            )
            .arg(password_arg())
            .arg(remember_arg()),
        Command::new("login")
            .about("Sign in with a username or email")
            .arg(
                Arg::new(ARG_IDENTIFIER)
                    .short('u')
                    .long(ARG_IDENTIFIER)
                    .help("Username or email address")
                    .env("CALCGATE_USER")
                    .required(true),
            )
            .arg(password_arg())
            .arg(remember_arg()),
        Command::new("logout").about("Forget the stored session"),
        Command::new("whoami").about("Show the signed-in user as reported by the server"),
        Command::new("status").about("Show the local session state without contacting the server"),
    ]
}
