use crate::api::{self, AuthConfig};
use anyhow::Result;
use secrecy::SecretString;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: Option<String>,
    pub token_secret: Option<SecretString>,
    pub token_ttl_seconds: i64,
    pub frontend_base_url: Option<String>,
}

impl Args {
    fn auth_config(self) -> AuthConfig {
        let config = match self.token_secret {
            Some(secret) => AuthConfig::new(secret),
            None => AuthConfig::with_generated_secret(),
        }
        .with_token_ttl_seconds(self.token_ttl_seconds);

        match self.frontend_base_url {
            Some(url) => config.with_frontend_base_url(url),
            None => config,
        }
    }
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database is unreachable or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let port = args.port;
    let dsn = args.dsn.clone();
    api::new(port, dsn, args.auth_config()).await
}
