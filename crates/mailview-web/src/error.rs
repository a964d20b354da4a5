//! Request-level error handling.
//!
//! Every failure from the auth or resource layer is converted into a
//! user-visible error page here; nothing propagates as an unhandled
//! fault.

use axum::response::{Html, IntoResponse, Response};
use mailview_auth::AuthError;
use mailview_graph::GraphError;

use crate::pages;

/// Errors a page handler can surface to the browser.
#[derive(Debug, thiserror::Error)]
pub(crate) enum PageError {
    /// Code exchange or flow configuration failed; nothing was persisted
    /// and the user stays signed out.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The callback itself was malformed: provider error parameter,
    /// missing code, or CSRF state mismatch.
    #[error("{0}")]
    Callback(String),

    /// The resource API failed outside a resource page (resolving the
    /// signed-in user during authorization).
    #[error(transparent)]
    Upstream(#[from] GraphError),
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        tracing::warn!(error = %self, "request failed");

        let (message, detail) = match &self {
            PageError::Auth(e) => ("Error exchanging code for token", e.to_string()),
            PageError::Callback(detail) => ("Authorization error", detail.clone()),
            PageError::Upstream(e) => ("Error contacting the resource API", e.to_string()),
        };

        Html(pages::error(message, &detail)).into_response()
    }
}
