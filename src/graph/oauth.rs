//! Client-credentials tokens for the scheduling backend and a cache
//! that keeps them around until they expire.

use std::collections::HashMap;
use std::future::Future;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::core::RelayError;

/// Treat tokens as expired slightly before the authority says they are
const EXPIRY_SKEW_SECS: i64 = 60;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub authority: String,
    pub scope: String,
}

#[derive(Clone, Debug)]
pub struct BearerToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl BearerToken {
    pub fn new(access_token: &str, expires_in: i64) -> Result<Self, RelayError> {
        let expires_at = Duration::try_seconds(expires_in)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or_else(|| {
                RelayError::AuthFailure(format!("token lifetime out of range: {}", expires_in))
            })?;
        Ok(Self {
            access_token: access_token.to_string(),
            expires_at,
        })
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() + Duration::seconds(EXPIRY_SKEW_SECS) >= self.expires_at
    }

    pub(crate) fn secret(&self) -> &str {
        &self.access_token
    }
}

/// Process-wide token cache. Refreshes happen while holding the lock
/// so concurrent requests wait on one exchange instead of each doing
/// their own.
#[derive(Debug, Default)]
pub struct TokenCache {
    entries: Mutex<HashMap<CacheKey, BearerToken>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Silent lookup, only returns a token that hasn't expired
    #[cfg(test)]
    async fn get(&self, key: &CacheKey) -> Option<BearerToken> {
        let entries = self.entries.lock().await;
        entries.get(key).filter(|token| !token.is_expired()).cloned()
    }

    pub async fn get_or_acquire<F, Fut>(
        &self,
        key: CacheKey,
        acquire: F,
    ) -> Result<BearerToken, RelayError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<BearerToken, RelayError>>,
    {
        let mut entries = self.entries.lock().await;
        if let Some(token) = entries.get(&key).filter(|token| !token.is_expired()) {
            return Ok(token.clone());
        }

        tracing::info!("No suitable token exists in cache, acquiring a new one");
        let token = acquire().await?;
        entries.insert(key, token.clone());
        Ok(token)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    error_description: Option<String>,
}

/// Exchange the application's id and secret for an access token.
/// The authority is the tenant URL, e.g.
/// `https://login.microsoftonline.com/<tenant id>`.
pub async fn acquire_token_for_client(
    http: &reqwest::Client,
    authority: &str,
    client_id: &str,
    client_secret: &str,
    scope: &str,
) -> Result<BearerToken, RelayError> {
    let url = format!("{}/oauth2/v2.0/token", authority.trim_end_matches('/'));
    let params = [
        ("grant_type", "client_credentials"),
        ("client_id", client_id),
        ("client_secret", client_secret),
        ("scope", scope),
    ];

    let response = http
        .post(url)
        .form(&params)
        .send()
        .await
        .map_err(|e| RelayError::AuthFailure(e.to_string()))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| RelayError::AuthFailure(e.to_string()))?;

    if !status.is_success() {
        let reason = match serde_json::from_str::<TokenErrorResponse>(&body) {
            Ok(err) => format!(
                "{}: {}",
                err.error,
                err.error_description.unwrap_or_default()
            ),
            Err(_) => format!("token endpoint returned {}", status),
        };
        tracing::error!("Token request failed: {}", reason);
        return Err(RelayError::AuthFailure(reason));
    }

    let token: TokenResponse = serde_json::from_str(&body)
        .map_err(|e| RelayError::AuthFailure(format!("unreadable token response: {}", e)))?;

    BearerToken::new(&token.access_token, token.expires_in)
}
