// SPDX-License-Identifier: Apache-2.0

//! `Authorization` header construction.
//!
//! Accepts anything token-shaped and renders the right scheme without the
//! caller knowing which auth mode produced the token:
//! - a raw access token renders as `Bearer <token>`
//! - a `pat:`-prefixed token renders as HTTP Basic with an empty username
//! - anything without a usable token renders as the inert `Bearer `

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::debug;

use crate::auth::{AccessToken, PAT_PREFIX};

/// Something that may carry a token string.
pub trait AccessTokenLike {
    /// The carried token, or `None` if there is none.
    fn token_str(&self) -> Option<&str>;
}

impl AccessTokenLike for str {
    fn token_str(&self) -> Option<&str> {
        Some(self)
    }
}

impl AccessTokenLike for String {
    fn token_str(&self) -> Option<&str> {
        Some(self.as_str())
    }
}

impl AccessTokenLike for SecretString {
    fn token_str(&self) -> Option<&str> {
        Some(self.expose_secret())
    }
}

impl AccessTokenLike for AccessToken {
    fn token_str(&self) -> Option<&str> {
        Some(self.token.expose_secret())
    }
}

impl<T: AccessTokenLike> AccessTokenLike for Option<T> {
    fn token_str(&self) -> Option<&str> {
        self.as_ref().and_then(AccessTokenLike::token_str)
    }
}

impl<T: AccessTokenLike + ?Sized> AccessTokenLike for &T {
    fn token_str(&self) -> Option<&str> {
        (**self).token_str()
    }
}

/// A JSON string, or an object with a string `token` field.
impl AccessTokenLike for Value {
    fn token_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            Value::Object(map) => map.get("token").and_then(Value::as_str),
            _ => None,
        }
    }
}

/// Builds the `Authorization` header value for `raw`.
///
/// Never fails; input without a usable token yields `"Bearer "` so the
/// request fails at the HTTP layer instead of here.
#[must_use]
pub fn build_authorization_header<T: AccessTokenLike + ?Sized>(raw: &T) -> String {
    let token = match raw.token_str() {
        Some(token) if !token.is_empty() => token,
        _ => return "Bearer ".to_string(),
    };

    match token.strip_prefix(PAT_PREFIX) {
        Some(pat) => format!("Basic {}", STANDARD.encode(format!(":{pat}"))),
        None => format!("Bearer {token}"),
    }
}

/// Builds the headers a client attaches to an Azure DevOps request.
///
/// Values that are not valid header text are left out.
#[must_use]
pub fn auth_headers<T: AccessTokenLike + ?Sized>(raw: &T, user_agent: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();

    match HeaderValue::from_str(&build_authorization_header(raw)) {
        Ok(mut value) => {
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        Err(_) => debug!("Token is not valid header text, omitting Authorization"),
    }
    if let Ok(value) = HeaderValue::from_str(user_agent) {
        headers.insert(USER_AGENT, value);
    }

    headers
}
