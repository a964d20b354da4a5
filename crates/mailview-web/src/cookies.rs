//! Cookie-held token state.
//!
//! The server keeps no session store: the whole token set rides in a
//! group of cookies on the client, written after every exchange or
//! refresh and removed together on sign-out. Parsing of the raw Cookie
//! header is delegated to the cookie jar, which matches names exactly
//! (a cookie named `mailview_token_expires` can never satisfy a lookup
//! for `mailview_token`).

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, TimeZone, Utc};
use mailview_auth::{IdClaims, TokenSet};
use time::Duration;

pub(crate) const ACCESS_TOKEN_COOKIE: &str = "mailview_token";
pub(crate) const REFRESH_TOKEN_COOKIE: &str = "mailview_refresh_token";
pub(crate) const TOKEN_EXPIRES_COOKIE: &str = "mailview_token_expires";
pub(crate) const USER_NAME_COOKIE: &str = "mailview_user_name";
pub(crate) const USER_EMAIL_COOKIE: &str = "mailview_user_email";
pub(crate) const AUTH_STATE_COOKIE: &str = "mailview_auth_state";

/// The cookies that make up the token state, cleared together on
/// sign-out.
const TOKEN_COOKIES: [&str; 5] = [
    ACCESS_TOKEN_COOKIE,
    REFRESH_TOKEN_COOKIE,
    TOKEN_EXPIRES_COOKIE,
    USER_NAME_COOKIE,
    USER_EMAIL_COOKIE,
];

const ACCESS_TOKEN_TTL: Duration = Duration::hours(1);
const REFRESH_TOKEN_TTL: Duration = Duration::hours(2);
const AUTH_STATE_TTL: Duration = Duration::minutes(5);

fn named(name: &'static str, value: String, ttl: Duration) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(ttl)
        .build()
}

fn removal(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path("/")
        .max_age(Duration::ZERO)
        .build()
}

/// Write the whole token set into the jar.
pub(crate) fn store_token_set(jar: CookieJar, tokens: &TokenSet) -> CookieJar {
    let mut jar = jar
        .add(named(
            ACCESS_TOKEN_COOKIE,
            tokens.access_token.clone(),
            ACCESS_TOKEN_TTL,
        ))
        .add(named(
            TOKEN_EXPIRES_COOKIE,
            tokens.expires_at_millis().to_string(),
            ACCESS_TOKEN_TTL,
        ));

    if let Some(refresh) = &tokens.refresh_token {
        jar = jar.add(named(
            REFRESH_TOKEN_COOKIE,
            refresh.clone(),
            REFRESH_TOKEN_TTL,
        ));
    }
    if let Some(name) = &tokens.claims.name {
        jar = jar.add(named(USER_NAME_COOKIE, name.clone(), ACCESS_TOKEN_TTL));
    }
    if let Some(email) = &tokens.claims.preferred_username {
        jar = jar.add(named(USER_EMAIL_COOKIE, email.clone(), ACCESS_TOKEN_TTL));
    }

    jar
}

/// Rebuild the token set from the jar.
///
/// `None` only when neither an access nor a refresh token is present.
/// A missing or unparseable expiry marks the access token as already
/// expired, which forces the refresh path.
pub(crate) fn load_token_set(jar: &CookieJar) -> Option<TokenSet> {
    let access_token = jar.get(ACCESS_TOKEN_COOKIE).map(|c| c.value().to_string());
    let refresh_token = jar.get(REFRESH_TOKEN_COOKIE).map(|c| c.value().to_string());
    if access_token.is_none() && refresh_token.is_none() {
        return None;
    }

    let expires_at = jar
        .get(TOKEN_EXPIRES_COOKIE)
        .and_then(|c| c.value().parse::<i64>().ok())
        .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
        .unwrap_or(DateTime::UNIX_EPOCH);

    Some(TokenSet {
        access_token: access_token.unwrap_or_default(),
        refresh_token,
        expires_at,
        claims: IdClaims {
            name: jar.get(USER_NAME_COOKIE).map(|c| c.value().to_string()),
            preferred_username: jar.get(USER_EMAIL_COOKIE).map(|c| c.value().to_string()),
        },
    })
}

/// Remove exactly the token cookie group; unrelated cookies survive.
pub(crate) fn clear_token_set(jar: CookieJar) -> CookieJar {
    TOKEN_COOKIES
        .into_iter()
        .fold(jar, |jar, name| jar.remove(removal(name)))
}

/// Stash the CSRF state of an authorization request.
pub(crate) fn set_auth_state(jar: CookieJar, state: &str) -> CookieJar {
    jar.add(named(
        AUTH_STATE_COOKIE,
        state.to_string(),
        AUTH_STATE_TTL,
    ))
}

/// Read and remove the stashed CSRF state.
pub(crate) fn take_auth_state(jar: CookieJar) -> (CookieJar, Option<String>) {
    let state = jar.get(AUTH_STATE_COOKIE).map(|c| c.value().to_string());
    (jar.remove(removal(AUTH_STATE_COOKIE)), state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::COOKIE;
    use axum::http::HeaderMap;

    fn jar_from_header(raw: &str) -> CookieJar {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, raw.parse().unwrap());
        CookieJar::from_headers(&headers)
    }

    fn sample_tokens() -> TokenSet {
        // Millisecond precision so the cookie round trip is lossless
        let expires_at = Utc
            .timestamp_millis_opt(Utc::now().timestamp_millis() + 3_600_000)
            .unwrap();
        TokenSet {
            access_token: "access-abc".to_string(),
            refresh_token: Some("refresh-xyz".to_string()),
            expires_at,
            claims: IdClaims {
                name: Some("Ada Lovelace".to_string()),
                preferred_username: Some("ada@example.com".to_string()),
            },
        }
    }

    #[test]
    fn test_exact_name_match_on_prefixed_cookie_names() {
        // mailview_token must never match inside mailview_token_expires
        let jar = jar_from_header("mailview_token_expires=100; mailview_token=abc");
        let tokens = load_token_set(&jar).unwrap();
        assert_eq!(tokens.access_token, "abc");
        assert_eq!(tokens.expires_at, Utc.timestamp_millis_opt(100).unwrap());
    }

    #[test]
    fn test_store_load_round_trip() {
        let tokens = sample_tokens();
        let jar = store_token_set(CookieJar::new(), &tokens);
        assert_eq!(load_token_set(&jar).unwrap(), tokens);
    }

    #[test]
    fn test_load_without_any_token_cookie() {
        let jar = jar_from_header("unrelated=value");
        assert!(load_token_set(&jar).is_none());
    }

    #[test]
    fn test_load_with_only_refresh_token_forces_refresh() {
        let jar = jar_from_header("mailview_refresh_token=refresh-xyz");
        let tokens = load_token_set(&jar).unwrap();
        assert_eq!(tokens.refresh_token.as_deref(), Some("refresh-xyz"));
        // No expiry cookie: treated as long expired
        assert!(!tokens.is_valid(Utc::now()));
    }

    #[test]
    fn test_garbled_expiry_treated_as_expired() {
        let jar = jar_from_header("mailview_token=abc; mailview_token_expires=not-a-number");
        let tokens = load_token_set(&jar).unwrap();
        assert!(!tokens.is_valid(Utc::now()));
    }

    #[test]
    fn test_clear_removes_only_the_token_group() {
        let jar = jar_from_header("unrelated=keep");
        let jar = store_token_set(jar, &sample_tokens());
        let jar = clear_token_set(jar);

        for name in TOKEN_COOKIES {
            assert!(jar.get(name).is_none(), "{} should be cleared", name);
        }
        assert_eq!(jar.get("unrelated").unwrap().value(), "keep");
    }

    #[test]
    fn test_auth_state_round_trip() {
        let jar = set_auth_state(CookieJar::new(), "csrf-123");
        let (jar, state) = take_auth_state(jar);
        assert_eq!(state.as_deref(), Some("csrf-123"));
        assert!(jar.get(AUTH_STATE_COOKIE).is_none());
    }
}
