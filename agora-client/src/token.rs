//! Bearer token cache.

use std::sync::Arc;
use std::time::Duration;

use agora_core::AgoraResult;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::identity::{IdToken, IdentityProvider};

/// Caches the current id token and refreshes it shortly before expiry.
///
/// The async mutex is held across the provider call so that concurrent
/// requests needing a refresh share a single one.
#[derive(Debug, Clone)]
pub struct TokenCache {
    current: Arc<Mutex<Option<IdToken>>>,
    refresh_margin: Duration,
}

impl TokenCache {
    pub fn new(refresh_margin: Duration) -> Self {
        Self {
            current: Arc::new(Mutex::new(None)),
            refresh_margin,
        }
    }

    pub async fn get(&self, provider: &dyn IdentityProvider) -> AgoraResult<String> {
        let mut current = self.current.lock().await;
        if let Some(token) = current.as_ref() {
            if self.is_usable(token) {
                return Ok(token.token.clone());
            }
        }

        let force_refresh = current.is_some();
        let token = provider.id_token(force_refresh).await?;
        tracing::debug!(
            expires_at = %token.expires_at,
            force_refresh,
            "id token refreshed"
        );
        let value = token.token.clone();
        *current = Some(token);
        Ok(value)
    }

    pub async fn clear(&self) {
        *self.current.lock().await = None;
    }

    fn is_usable(&self, token: &IdToken) -> bool {
        let margin = chrono::Duration::from_std(self.refresh_margin)
            .unwrap_or_else(|_| chrono::Duration::zero());
        token.expires_at - margin > Utc::now()
    }
}
