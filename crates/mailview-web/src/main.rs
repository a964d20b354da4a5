//! MailView - a small web front end over an OAuth2 identity provider
//! and a Graph-shaped mail/calendar/contacts API.
//!
//! The server is stateless: the token set rides in the browser's
//! cookies, so every request stands alone.

mod config;
mod cookies;
mod error;
mod pages;
mod routes;

use std::sync::Arc;

use anyhow::Context;
use mailview_auth::OAuth2Flow;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("mailview=debug".parse().unwrap()))
        .init();

    let config = config::AppConfig::from_env()?;
    let flow = OAuth2Flow::new(config.oauth).context("invalid OAuth2 configuration")?;

    let app = routes::router(routes::AppState {
        flow: Arc::new(flow),
    });

    tracing::info!("MailView listening on {}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
