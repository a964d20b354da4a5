//! OAuth2 authorization-code flow against the identity provider.
//!
//! Wraps the `oauth2` crate. The flow object is built explicitly from an
//! [`OAuth2Config`] and passed where needed; there is no process-global
//! client, so tests and multi-tenant setups substitute their own.
//!
//! The token endpoint of OpenID providers returns an `id_token` alongside
//! the access token, which the basic client type discards; the client
//! here keeps it as an extra response field so the display identity can
//! be decoded into [`IdClaims`].

use chrono::{DateTime, Utc};
use oauth2::basic::{
    BasicErrorResponse, BasicRevocationErrorResponse, BasicTokenIntrospectionResponse,
    BasicTokenType,
};
use oauth2::{
    AuthUrl, AuthorizationCode, Client, ClientId, ClientSecret, CsrfToken, ExtraTokenFields,
    RedirectUrl, RefreshToken, Scope, StandardRevocableToken, StandardTokenResponse,
    TokenResponse, TokenUrl,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{AuthError, AuthResult, IdClaims, TokenSet, UsableToken};

/// Identity provider configuration
#[derive(Debug, Clone)]
pub struct OAuth2Config {
    /// OAuth2 client ID
    pub client_id: String,
    /// OAuth2 client secret (confidential web client)
    pub client_secret: Option<String>,
    /// Authorization endpoint URL
    pub auth_url: String,
    /// Token endpoint URL
    pub token_url: String,
    /// Redirect URI registered for this client
    pub redirect_uri: String,
    /// Requested scopes
    pub scopes: Vec<String>,
}

/// Authorization URL plus the CSRF state that must round-trip through
/// the provider. The caller stores the state (MailView uses a
/// short-lived cookie) and checks it on callback.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: String,
    pub csrf_state: String,
}

/// Token response fields beyond the OAuth2 basics; OpenID providers
/// put the id_token here.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct IdTokenFields {
    #[serde(default)]
    id_token: Option<String>,
}

impl ExtraTokenFields for IdTokenFields {}

type IdTokenResponse = StandardTokenResponse<IdTokenFields, BasicTokenType>;

type AuthCodeClient = Client<
    BasicErrorResponse,
    IdTokenResponse,
    BasicTokenType,
    BasicTokenIntrospectionResponse,
    StandardRevocableToken,
    BasicRevocationErrorResponse,
>;

/// Drives the authorization-code flow and the token lifecycle.
pub struct OAuth2Flow {
    config: OAuth2Config,
    client: AuthCodeClient,
}

impl OAuth2Flow {
    /// Create a new flow from provider configuration.
    pub fn new(config: OAuth2Config) -> AuthResult<Self> {
        let auth_url = AuthUrl::new(config.auth_url.clone())
            .map_err(|e| AuthError::InvalidConfig(format!("Invalid auth URL: {}", e)))?;
        let token_url = TokenUrl::new(config.token_url.clone())
            .map_err(|e| AuthError::InvalidConfig(format!("Invalid token URL: {}", e)))?;
        let redirect_url = RedirectUrl::new(config.redirect_uri.clone())
            .map_err(|e| AuthError::InvalidConfig(format!("Invalid redirect URI: {}", e)))?;

        let client = AuthCodeClient::new(
            ClientId::new(config.client_id.clone()),
            config.client_secret.clone().map(ClientSecret::new),
            auth_url,
            Some(token_url),
        )
        .set_redirect_uri(redirect_url);

        Ok(Self { config, client })
    }

    /// Build the authorization URL for the sign-in link, with a fresh
    /// CSRF state and all configured scopes.
    pub fn authorization_request(&self) -> AuthorizationRequest {
        let mut request = self.client.authorize_url(CsrfToken::new_random);
        for scope in &self.config.scopes {
            request = request.add_scope(Scope::new(scope.clone()));
        }

        let (url, csrf_state) = request.url();
        debug!("Generated authorization URL");

        AuthorizationRequest {
            url: url.to_string(),
            csrf_state: csrf_state.secret().clone(),
        }
    }

    /// Exchange an authorization code for a fresh token set.
    ///
    /// The caller persists the result; nothing is stored here.
    pub async fn exchange_code(&self, code: &str) -> AuthResult<TokenSet> {
        let response = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(oauth2::reqwest::async_http_client)
            .await
            .map_err(|e| AuthError::ExchangeFailed(e.to_string()))?;

        info!("Authorization code exchanged for tokens");
        self.token_set_from_response(response, None)
    }

    /// Exchange a refresh token for a new token set.
    ///
    /// Providers may omit the refresh token from the response; the one
    /// being spent is carried over so the caller can keep refreshing.
    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<TokenSet> {
        let response = self
            .client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(oauth2::reqwest::async_http_client)
            .await
            .map_err(|e| AuthError::RefreshFailed(e.to_string()))?;

        info!("Access token refreshed");
        self.token_set_from_response(response, Some(refresh_token))
    }

    /// Return a token that is safe to use at `now`, refreshing if the
    /// stored one is past its skewed expiry.
    ///
    /// `Ok(None)` means nothing usable remains and the user has to go
    /// back through the sign-in entry point; an expired token is never
    /// returned.
    pub async fn usable_token(
        &self,
        state: Option<TokenSet>,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<UsableToken>> {
        let Some(state) = state else {
            return Ok(None);
        };

        if state.is_valid(now) {
            return Ok(Some(UsableToken::Current(state)));
        }

        match state.refresh_token.as_deref() {
            Some(refresh_token) => {
                debug!("Access token expired, refreshing");
                let refreshed = self.refresh(refresh_token).await?;
                Ok(Some(UsableToken::Refreshed(refreshed)))
            }
            None => {
                warn!("Access token expired and no refresh token present");
                Ok(None)
            }
        }
    }

    fn token_set_from_response(
        &self,
        response: IdTokenResponse,
        prior_refresh_token: Option<&str>,
    ) -> AuthResult<TokenSet> {
        let expires_in = response
            .expires_in()
            .unwrap_or(std::time::Duration::from_secs(3600));
        let expires_at = Utc::now() + chrono::Duration::seconds(expires_in.as_secs() as i64);

        let claims = match response.extra_fields().id_token.as_deref() {
            Some(id_token) => IdClaims::from_id_token(id_token)?,
            None => IdClaims::default(),
        };

        Ok(TokenSet {
            access_token: response.access_token().secret().clone(),
            refresh_token: response
                .refresh_token()
                .map(|t| t.secret().clone())
                .or_else(|| prior_refresh_token.map(str::to_string)),
            expires_at,
            claims,
        })
    }
}
