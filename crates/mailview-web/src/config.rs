//! Process configuration from environment variables.
//!
//! Credentials are never hard-coded; the process refuses to start
//! without them.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use mailview_auth::OAuth2Config;
use url::Url;

/// Microsoft identity platform, common (multi-tenant) endpoints.
const DEFAULT_AUTH_URL: &str =
    "https://login.microsoftonline.com/common/oauth2/v2.0/authorize";
const DEFAULT_TOKEN_URL: &str =
    "https://login.microsoftonline.com/common/oauth2/v2.0/token";

const DEFAULT_SCOPES: &[&str] = &[
    "openid",
    "offline_access",
    "User.Read",
    "Mail.Read",
    "Calendars.Read",
    "Contacts.Read",
];

const DEFAULT_LISTEN: &str = "127.0.0.1:8000";

/// Everything the process needs, resolved once at startup.
pub struct AppConfig {
    pub oauth: OAuth2Config,
    pub listen_addr: SocketAddr,
}

impl AppConfig {
    /// Read configuration from the environment.
    ///
    /// Required: `MAILVIEW_CLIENT_ID`, `MAILVIEW_CLIENT_SECRET`,
    /// `MAILVIEW_REDIRECT_URI`. Optional: `MAILVIEW_SCOPES`
    /// (comma-separated), `MAILVIEW_AUTH_URL`, `MAILVIEW_TOKEN_URL`,
    /// `MAILVIEW_LISTEN`.
    pub fn from_env() -> Result<Self> {
        let client_id =
            std::env::var("MAILVIEW_CLIENT_ID").context("MAILVIEW_CLIENT_ID is required")?;
        let client_secret = std::env::var("MAILVIEW_CLIENT_SECRET")
            .context("MAILVIEW_CLIENT_SECRET is required")?;

        let redirect_uri =
            std::env::var("MAILVIEW_REDIRECT_URI").context("MAILVIEW_REDIRECT_URI is required")?;
        let redirect_uri: Url = redirect_uri
            .parse()
            .context("MAILVIEW_REDIRECT_URI is not a valid URL")?;

        let scopes = match std::env::var("MAILVIEW_SCOPES") {
            Ok(raw) => raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            Err(_) => DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
        };

        let auth_url =
            std::env::var("MAILVIEW_AUTH_URL").unwrap_or_else(|_| DEFAULT_AUTH_URL.to_string());
        let token_url =
            std::env::var("MAILVIEW_TOKEN_URL").unwrap_or_else(|_| DEFAULT_TOKEN_URL.to_string());

        let listen_addr = std::env::var("MAILVIEW_LISTEN")
            .unwrap_or_else(|_| DEFAULT_LISTEN.to_string())
            .parse()
            .context("MAILVIEW_LISTEN is not a valid socket address")?;

        Ok(Self {
            oauth: OAuth2Config {
                client_id,
                client_secret: Some(client_secret),
                auth_url,
                token_url,
                redirect_uri: redirect_uri.into(),
                scopes,
            },
            listen_addr,
        })
    }
}
