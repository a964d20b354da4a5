//! Route handlers.
//!
//! The flow controller lives here: sign-in entry, OAuth2 callback,
//! sign-out, and the three resource pages. Authentication state is
//! whatever the cookie group says; there is no server-side session.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;
use axum_extra::extract::CookieJar;
use chrono::Utc;
use mailview_auth::{AuthError, OAuth2Flow, TokenSet};
use mailview_graph::GraphClient;
use serde::Deserialize;
use tracing::{info, warn};

use crate::cookies;
use crate::error::PageError;
use crate::pages;

/// Shared state for route handlers.
#[derive(Clone)]
pub struct AppState {
    pub flow: Arc<OAuth2Flow>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/authorize", get(authorize))
        .route("/authorize/signout", get(signout))
        .route("/mail", get(mail))
        .route("/calendar", get(calendar))
        .route("/contacts", get(contacts))
        .fallback(not_found)
        .with_state(state)
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "404 Not Found")
}

// ── Sign-in entry ──────────────────────────────────────────────────

async fn home(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Html<String>) {
    if let Some(tokens) = cookies::load_token_set(&jar) {
        let user = display_user(&tokens);
        return (jar, Html(pages::home_signed_in(&user)));
    }

    let request = state.flow.authorization_request();
    let jar = cookies::set_auth_state(jar, &request.csrf_state);
    (jar, Html(pages::sign_in(&request.url)))
}

// ── OAuth2 callback ────────────────────────────────────────────────

#[derive(Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

async fn authorize(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<(CookieJar, Redirect), PageError> {
    if let Some(error) = &params.error {
        let detail = params
            .error_description
            .clone()
            .unwrap_or_else(|| error.clone());
        warn!(error = %error, "provider returned an authorization error");
        return Err(PageError::Callback(detail));
    }

    let code = params
        .code
        .ok_or_else(|| PageError::Callback("Missing code parameter".to_string()))?;

    let (jar, stored_state) = cookies::take_auth_state(jar);
    let state_matches = match (&params.state, &stored_state) {
        (Some(returned), Some(stored)) => returned == stored,
        _ => false,
    };
    if !state_matches {
        warn!("authorization state mismatch");
        return Err(PageError::Callback("State parameter mismatch".to_string()));
    }

    let mut tokens = state.flow.exchange_code(&code).await?;

    // Consumer accounts may not carry an address in the id_token;
    // resolve one from /me before the first resource page needs it.
    if tokens.claims.preferred_username.is_none() {
        let user = GraphClient::new(tokens.access_token.clone())
            .get_user()
            .await?;
        tokens.claims.preferred_username = user.address().map(str::to_string);
        if tokens.claims.name.is_none() {
            tokens.claims.name = user.display_name;
        }
    }

    info!("sign-in complete");
    let jar = cookies::store_token_set(jar, &tokens);
    Ok((jar, Redirect::to("/mail")))
}

async fn signout(jar: CookieJar) -> (CookieJar, Redirect) {
    info!("signing out");
    (cookies::clear_token_set(jar), Redirect::to("/"))
}

// ── Resource pages ─────────────────────────────────────────────────

async fn mail(State(state): State<AppState>, jar: CookieJar) -> Result<Response, PageError> {
    let (jar, tokens) = session_token(&state, jar).await?;
    let Some(tokens) = tokens else {
        return Ok((jar, Redirect::to("/")).into_response());
    };

    let user = display_user(&tokens);
    let page = match graph_client(&tokens).list_inbox_messages().await {
        Ok(rows) => pages::mail(&user, &rows),
        Err(e) => {
            warn!(error = %e, "inbox fetch failed");
            pages::resource_error(&user, "Your inbox", &e)
        }
    };
    Ok((jar, Html(page)).into_response())
}

async fn calendar(State(state): State<AppState>, jar: CookieJar) -> Result<Response, PageError> {
    let (jar, tokens) = session_token(&state, jar).await?;
    let Some(tokens) = tokens else {
        return Ok((jar, Redirect::to("/")).into_response());
    };

    let user = display_user(&tokens);
    let page = match graph_client(&tokens).list_events().await {
        Ok(rows) => pages::calendar(&user, &rows),
        Err(e) => {
            warn!(error = %e, "event fetch failed");
            pages::resource_error(&user, "Your calendar", &e)
        }
    };
    Ok((jar, Html(page)).into_response())
}

async fn contacts(State(state): State<AppState>, jar: CookieJar) -> Result<Response, PageError> {
    let (jar, tokens) = session_token(&state, jar).await?;
    let Some(tokens) = tokens else {
        return Ok((jar, Redirect::to("/")).into_response());
    };

    let user = display_user(&tokens);
    let page = match graph_client(&tokens).list_contacts().await {
        Ok(rows) => pages::contacts(&user, &rows),
        Err(e) => {
            warn!(error = %e, "contact fetch failed");
            pages::resource_error(&user, "Your contacts", &e)
        }
    };
    Ok((jar, Html(page)).into_response())
}

// ── Helpers ────────────────────────────────────────────────────────

/// Resolve a usable token from the cookie jar, refreshing when needed.
///
/// A refreshed set is written back to the jar. `None` means the user
/// has to sign in again; a failed refresh also drops the cookie group
/// so the next page starts clean.
async fn session_token(
    state: &AppState,
    jar: CookieJar,
) -> Result<(CookieJar, Option<TokenSet>), PageError> {
    let stored = cookies::load_token_set(&jar);
    match state.flow.usable_token(stored, Utc::now()).await {
        Ok(Some(usable)) => {
            let refreshed = usable.was_refreshed();
            let tokens = usable.into_token();
            let jar = if refreshed {
                cookies::store_token_set(jar, &tokens)
            } else {
                jar
            };
            Ok((jar, Some(tokens)))
        }
        Ok(None) => Ok((jar, None)),
        Err(AuthError::RefreshFailed(detail)) => {
            warn!(%detail, "token refresh failed, dropping session");
            Ok((cookies::clear_token_set(jar), None))
        }
        Err(e) => Err(e.into()),
    }
}

fn graph_client(tokens: &TokenSet) -> GraphClient {
    let client = GraphClient::new(tokens.access_token.clone());
    match &tokens.claims.preferred_username {
        Some(email) => client.with_anchor_mailbox(email.clone()),
        None => client,
    }
}

fn display_user(tokens: &TokenSet) -> String {
    tokens
        .claims
        .name
        .clone()
        .or_else(|| tokens.claims.preferred_username.clone())
        .unwrap_or_else(|| "unknown user".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request};
    use http_body_util::BodyExt;
    use mailview_auth::OAuth2Config;
    use tower::ServiceExt;

    fn test_router() -> Router {
        let config = OAuth2Config {
            client_id: "test-client".to_string(),
            client_secret: Some("secret".to_string()),
            auth_url: "https://login.example.com/oauth2/v2.0/authorize".to_string(),
            token_url: "https://login.example.com/oauth2/v2.0/token".to_string(),
            redirect_uri: "http://localhost:8000/authorize".to_string(),
            scopes: vec!["openid".to_string(), "Mail.Read".to_string()],
        };
        router(AppState {
            flow: Arc::new(OAuth2Flow::new(config).unwrap()),
        })
    }

    async fn body_string(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_unknown_path_is_404_plain_text() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/doesnotexist")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(content_type.starts_with("text/plain"));
        assert_eq!(body_string(response).await, "404 Not Found");
    }

    #[tokio::test]
    async fn test_home_offers_sign_in_and_sets_state_cookie() {
        let response = test_router()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let set_cookie: Vec<String> = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert!(set_cookie
            .iter()
            .any(|c| c.starts_with(cookies::AUTH_STATE_COOKIE)));

        let body = body_string(response).await;
        assert!(body.contains("sign in"));
        assert!(body.contains("login.example.com"));
    }

    #[tokio::test]
    async fn test_resource_pages_without_token_redirect_home() {
        for path in ["/mail", "/calendar", "/contacts"] {
            let response = test_router()
                .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert!(
                response.status().is_redirection(),
                "{} should redirect",
                path
            );
            assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");
        }
    }

    #[tokio::test]
    async fn test_authorize_without_code_renders_error() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/authorize")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.contains("Authorization error"));
        assert!(body.contains("Missing code parameter"));
    }

    #[tokio::test]
    async fn test_authorize_with_state_mismatch_renders_error() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/authorize?code=abc123&state=forged")
                    .header(
                        header::COOKIE,
                        format!("{}=expected", cookies::AUTH_STATE_COOKIE),
                    )
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let body = body_string(response).await;
        assert!(body.contains("State parameter mismatch"));
    }

    #[tokio::test]
    async fn test_authorize_with_provider_error_param() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/authorize?error=access_denied&error_description=User+declined")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let body = body_string(response).await;
        assert!(body.contains("Authorization error"));
        assert!(body.contains("User declined"));
    }

    #[tokio::test]
    async fn test_signout_clears_token_cookies_and_redirects() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/authorize/signout")
                    .header(
                        header::COOKIE,
                        "mailview_token=abc; mailview_refresh_token=xyz; unrelated=keep",
                    )
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response.status().is_redirection());
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");

        let cleared: Vec<String> = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert!(cleared
            .iter()
            .any(|c| c.starts_with("mailview_token=") && c.contains("Max-Age=0")));
        assert!(cleared
            .iter()
            .any(|c| c.starts_with("mailview_refresh_token=") && c.contains("Max-Age=0")));
        assert!(!cleared.iter().any(|c| c.starts_with("unrelated=")));
    }

    #[tokio::test]
    async fn test_home_with_token_cookies_shows_identity() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(
                        header::COOKIE,
                        "mailview_token=abc; mailview_user_name=Ada",
                    )
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let body = body_string(response).await;
        assert!(body.contains("Sign out"));
        assert!(!body.contains("Please"));
    }
}
