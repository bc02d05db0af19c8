//! Access/refresh token pair and the store that owns it.

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::storage::{MemoryStorage, TokenStorage};
use crate::models::User;

/// Storage key for the access token
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

/// Storage key for the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Storage key for the cached user profile
pub const USER_KEY: &str = "user";

/// Seconds before `exp` at which a token already counts as expired, so a
/// request is not dispatched with a token that lapses mid-flight.
pub const DEFAULT_EXPIRY_BUFFER_SECS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

/// Payload claims of a JWT, decoded without signature verification.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenClaims(Map<String, Value>);

impl TokenClaims {
    /// Expiry in epoch seconds, if the claim is present and numeric
    pub fn exp(&self) -> Option<f64> {
        self.0.get("exp").and_then(Value::as_f64)
    }

    pub fn subject(&self) -> Option<&str> {
        self.0.get("sub").and_then(Value::as_str)
    }

    pub fn get(&self, claim: &str) -> Option<&Value> {
        self.0.get(claim)
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

/// Decode the payload segment of a `header.payload.signature` token.
///
/// Returns `None` for anything that is not three dot-separated parts with a
/// base64url JSON object in the middle.
pub fn decode_token(token: &str) -> Option<TokenClaims> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return None;
    }

    // Accept the standard alphabet too
    let payload: String = parts[1]
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            c => c,
        })
        .collect();
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    match serde_json::from_slice::<Value>(&bytes).ok()? {
        Value::Object(map) => Some(TokenClaims(map)),
        _ => None,
    }
}

/// Single source of truth for the current credential pair.
///
/// Clone is cheap; clones share the same backend.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn TokenStorage>,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn TokenStorage>) -> Self {
        Self { storage }
    }

    /// A store that forgets everything when the process exits
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    pub fn access_token(&self) -> Option<String> {
        self.storage.get(ACCESS_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.storage.get(REFRESH_TOKEN_KEY)
    }

    pub fn set_tokens(&self, tokens: &TokenPair) {
        self.storage.set_many(&[
            (ACCESS_TOKEN_KEY, tokens.access_token.as_str()),
            (REFRESH_TOKEN_KEY, tokens.refresh_token.as_str()),
        ]);
        debug!("Token pair stored");
    }

    /// Install a new access token next to the existing refresh token.
    pub fn set_access_token(&self, access_token: &str) {
        self.storage.set(ACCESS_TOKEN_KEY, access_token);
    }

    /// Remove both tokens and the cached user profile
    pub fn clear_tokens(&self) {
        self.storage
            .remove_many(&[ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY]);
        debug!("Tokens cleared");
    }

    /// True when an access token is present. Expiry is not checked.
    pub fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }

    pub fn decode_token(&self, token: &str) -> Option<TokenClaims> {
        decode_token(token)
    }

    /// Claims of the current access token
    pub fn claims(&self) -> Option<TokenClaims> {
        self.access_token().as_deref().and_then(decode_token)
    }

    /// True if there is no usable access token or it expires within
    /// `buffer_seconds`.
    pub fn is_token_expired(&self, buffer_seconds: i64) -> bool {
        let exp = match self.claims().and_then(|claims| claims.exp()) {
            Some(exp) => exp,
            None => return true,
        };

        let expiration_ms = exp * 1000.0;
        let buffer_ms = buffer_seconds as f64 * 1000.0;
        let now_ms = Utc::now().timestamp_millis() as f64;

        now_ms >= expiration_ms - buffer_ms
    }

    pub fn cached_user(&self) -> Option<User> {
        let raw = self.storage.get(USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable cached user");
                None
            }
        }
    }

    pub fn set_cached_user(&self, user: &User) {
        match serde_json::to_string(user) {
            Ok(raw) => self.storage.set(USER_KEY, &raw),
            Err(e) => warn!(error = %e, "Failed to serialize user for caching"),
        }
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
