//! Identity claims from the provider id_token.
//!
//! The id_token is consumed only for display identity, so the payload
//! segment is base64url-decoded without signature verification. Do not
//! pass these claims to anything that makes authorization decisions.

use base64::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{AuthError, AuthResult};

/// Display identity decoded from the id_token payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdClaims {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub preferred_username: Option<String>,
}

impl IdClaims {
    /// Decode claims from a raw JWT without verifying the signature.
    pub fn from_id_token(id_token: &str) -> AuthResult<Self> {
        let payload = id_token
            .split('.')
            .nth(1)
            .ok_or_else(|| AuthError::InvalidIdToken("not a JWT".to_string()))?;

        let bytes = BASE64_URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|e| AuthError::InvalidIdToken(format!("payload not base64url: {}", e)))?;

        serde_json::from_slice(&bytes)
            .map_err(|e| AuthError::InvalidIdToken(format!("payload not claims JSON: {}", e)))
    }
}
