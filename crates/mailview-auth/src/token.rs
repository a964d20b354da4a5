//! Token set and expiry logic.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::IdClaims;

/// Seconds subtracted from the expiry timestamp when judging validity.
/// Expiring the token early tolerates clock drift between this server
/// and the identity provider.
pub const EXPIRY_SKEW_SECS: i64 = 300;

/// Access/refresh token pair with its expiry instant and the identity
/// claims decoded from the id_token.
///
/// A token set is replaced whole on every exchange or refresh, never
/// patched field by field. Once past the skewed expiry line it must be
/// replaced via [`OAuth2Flow::refresh`](crate::OAuth2Flow::refresh).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    /// Bearer token for resource API calls
    pub access_token: String,
    /// Token for obtaining a new access token; not all providers issue one
    pub refresh_token: Option<String>,
    /// Instant the provider reported the access token expires
    pub expires_at: DateTime<Utc>,
    /// Claims decoded from the provider id_token
    pub claims: IdClaims,
}

impl TokenSet {
    /// True while the access token is still safely usable at `now`.
    ///
    /// The boundary is exclusive: at exactly `expires_at - skew` the
    /// token is already treated as expired.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at - Duration::seconds(EXPIRY_SKEW_SECS)
    }

    /// Expiry instant as epoch milliseconds, the representation the
    /// expiry cookie carries.
    pub fn expires_at_millis(&self) -> i64 {
        self.expires_at.timestamp_millis()
    }
}

/// Outcome of a usable-token lookup.
///
/// `Refreshed` tells the caller the cookie group has to be written back;
/// `Current` means the stored set is untouched.
#[derive(Debug, Clone)]
pub enum UsableToken {
    Current(TokenSet),
    Refreshed(TokenSet),
}

impl UsableToken {
    pub fn token(&self) -> &TokenSet {
        match self {
            UsableToken::Current(t) | UsableToken::Refreshed(t) => t,
        }
    }

    pub fn into_token(self) -> TokenSet {
        match self {
            UsableToken::Current(t) | UsableToken::Refreshed(t) => t,
        }
    }

    pub fn was_refreshed(&self) -> bool {
        matches!(self, UsableToken::Refreshed(_))
    }
}
