//! OAuth token caching for the Firestore REST API.
//!
//! Tokens are refreshed a minute before expiry, one refresh at a time; if a
//! refresh fails while the old token is still usable, the old token is served.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use gcp_auth::TokenProvider;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{FirestoreError, FirestoreResult};

const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Used when the provider reports an expiry we cannot convert.
const TOKEN_FALLBACK_TTL: Duration = Duration::from_secs(50 * 60);

pub const FIRESTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";

struct CachedToken {
    value: String,
    expires_at: Instant,
}

impl CachedToken {
    fn fresh(&self, now: Instant) -> bool {
        now + TOKEN_REFRESH_MARGIN < self.expires_at
    }

    fn usable(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Convert a wall-clock expiry into a monotonic deadline.
fn deadline_for(expires_at: DateTime<Utc>, now_wall: DateTime<Utc>, now: Instant) -> Instant {
    if expires_at <= now_wall {
        return now;
    }
    match (expires_at - now_wall).to_std() {
        Ok(ttl) => now + ttl,
        Err(_) => now + TOKEN_FALLBACK_TTL,
    }
}

pub struct TokenCache {
    provider: Arc<dyn TokenProvider>,
    cached: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new(provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            provider,
            cached: RwLock::new(None),
        }
    }

    /// Drop the cached token so the next call refreshes.
    pub async fn invalidate(&self) {
        *self.cached.write().await = None;
    }

    pub async fn get_token(&self) -> FirestoreResult<String> {
        if let Some(token) = self.cached.read().await.as_ref() {
            if token.fresh(Instant::now()) {
                return Ok(token.value.clone());
            }
        }

        let mut slot = self.cached.write().await;

        // Another task may have refreshed while we waited for the write lock.
        if let Some(token) = slot.as_ref() {
            if token.fresh(Instant::now()) {
                return Ok(token.value.clone());
            }
        }

        match self.provider.token(&[FIRESTORE_SCOPE]).await {
            Ok(token) => {
                let value = token.as_str().to_string();
                let expires_at = deadline_for(token.expires_at(), Utc::now(), Instant::now());
                *slot = Some(CachedToken {
                    value: value.clone(),
                    expires_at,
                });
                debug!("Refreshed Firestore access token");
                Ok(value)
            }
            Err(e) => match slot.as_ref() {
                Some(old) if old.usable(Instant::now()) => {
                    warn!("Token refresh failed, reusing current token: {}", e);
                    Ok(old.value.clone())
                }
                _ => Err(FirestoreError::auth_error(format!(
                    "Failed to obtain auth token: {}",
                    e
                ))),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline_for_future_expiry() {
        let now_wall = Utc::now();
        let now = Instant::now();
        let deadline = deadline_for(now_wall + chrono::Duration::seconds(600), now_wall, now);
        assert_eq!(deadline.duration_since(now), Duration::from_secs(600));
    }

    #[test]
    fn test_deadline_for_past_expiry_is_immediate() {
        let now_wall = Utc::now();
        let now = Instant::now();
        assert_eq!(deadline_for(now_wall - chrono::Duration::seconds(5), now_wall, now), now);
    }

    #[test]
    fn test_token_freshness_margin() {
        let now = Instant::now();
        let token = CachedToken {
            value: "t".into(),
            expires_at: now + Duration::from_secs(30),
        };
        assert!(!token.fresh(now));
        assert!(token.usable(now));
    }
}
