use crate::client::{
    codec, Client, ClientConfig, ClientError, ConsoleNavigator, Session, SessionStatus, Stored,
};
use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use std::{path::PathBuf, sync::Arc};

#[derive(Debug)]
pub enum Operation {
    Register {
        username: String,
        email: String,
        password: SecretString,
        remember: bool,
    },
    Login {
        username_or_email: String,
        password: SecretString,
        remember: bool,
    },
    Logout,
    WhoAmI,
    Status,
}

#[derive(Debug)]
pub struct Args {
    pub api_url: String,
    pub session_file: PathBuf,
    pub ephemeral_session_file: PathBuf,
    pub operation: Operation,
}

/// Execute a client subcommand against the stored session.
/// # Errors
/// Returns an error if the request fails or no valid session is available.
pub async fn execute(args: Args) -> Result<()> {
    let client = Client::with_session_files(
        ClientConfig::new(args.api_url),
        &args.session_file,
        &args.ephemeral_session_file,
        Arc::new(ConsoleNavigator),
    )?;

    match args.operation {
        Operation::Register {
            username,
            email,
            password,
            remember,
        } => {
            let session = client
                .auth
                .register(&username, &email, password.expose_secret(), remember)
                .await?;
            println!("Registered {}", describe(&session));
        }
        Operation::Login {
            username_or_email,
            password,
            remember,
        } => {
            let session = client
                .auth
                .login(&username_or_email, password.expose_secret(), remember)
                .await?;
            println!("Signed in as {}", describe(&session));
        }
        Operation::Logout => {
            client.auth.logout();
            println!("Signed out");
        }
        Operation::WhoAmI => {
            if !client.guard.enforce(None) {
                return Err(ClientError::NoCredential.into());
            }
            let user = client.current_user().await?;
            println!(
                "{}",
                serde_json::to_string_pretty(&user).context("Failed to render user")?
            );
        }
        Operation::Status => println!("{}", status_line(&client)),
    }

    Ok(())
}

fn describe(session: &Session) -> String {
    format!("{} <{}>", session.user.username, session.user.email)
}

fn status_line(client: &Client) -> String {
    let SessionStatus::Valid(session) = client.validator.check() else {
        return "Not signed in".to_string();
    };
    let scope = match client.store.read() {
        Stored::Complete(_, scope) => scope.to_string(),
        Stored::Empty | Stored::Partial(_) => "unknown".to_string(),
    };
    let remaining = codec::decode(&session.access_token)
        .map(|claims| claims.exp - codec::now_unix_seconds())
        .unwrap_or_default();
    format!(
        "Signed in as {} ({} session, expires in {}s)",
        describe(&session),
        scope,
        remaining.max(0)
    )
}
