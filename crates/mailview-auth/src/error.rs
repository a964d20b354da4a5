//! Error types for the auth crate

use thiserror::Error;

/// Result type for auth operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Errors that can occur during authentication
#[derive(Debug, Error)]
pub enum AuthError {
    /// An endpoint or redirect URL in the configuration did not parse
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The provider rejected the authorization code (invalid, expired,
    /// or already redeemed)
    #[error("Code exchange failed: {0}")]
    ExchangeFailed(String),

    /// The provider rejected the refresh token
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    /// The id_token in the provider response could not be decoded
    #[error("Invalid id_token: {0}")]
    InvalidIdToken(String),
}
