//! Identity provider capability.
//!
//! Authentication itself is external; the client only needs the operations
//! below. Implementations map provider failures to `AuthError::Provider`.

use agora_core::{AgoraResult, AuthError, AuthUid, Timestamp};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The signed-in account as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub uid: AuthUid,
    pub email: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

impl UserIdentity {
    pub fn display_name_or_default(&self) -> &str {
        self.display_name.as_deref().unwrap_or(agora_core::ANONYMOUS)
    }
}

/// Short-lived bearer credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdToken {
    pub token: String,
    pub expires_at: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    Google,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    async fn sign_in(&self, email: &str, password: &str) -> AgoraResult<UserIdentity>;

    async fn sign_in_with_oauth(&self, provider: OAuthProvider) -> AgoraResult<UserIdentity>;

    async fn sign_up(&self, request: &SignUpRequest) -> AgoraResult<UserIdentity>;

    async fn sign_out(&self) -> AgoraResult<()>;

    async fn current_user(&self) -> AgoraResult<Option<UserIdentity>>;

    /// Fetch an id token; `force_refresh` bypasses the provider's own cache.
    async fn id_token(&self, force_refresh: bool) -> AgoraResult<IdToken>;

    async fn reset_password(&self, email: &str) -> AgoraResult<()>;

    async fn update_profile(&self, update: &ProfileUpdate) -> AgoraResult<UserIdentity>;
}

/// Provider for read-only sessions: never signed in, every sign-in attempt
/// fails. Used by the command-line browser.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignedOutIdentity;

impl SignedOutIdentity {
    fn unavailable<T>() -> AgoraResult<T> {
        Err(AuthError::Provider {
            message: "no identity provider configured".to_string(),
        }
        .into())
    }
}

#[async_trait]
impl IdentityProvider for SignedOutIdentity {
    async fn sign_in(&self, _email: &str, _password: &str) -> AgoraResult<UserIdentity> {
        Self::unavailable()
    }

    async fn sign_in_with_oauth(&self, _provider: OAuthProvider) -> AgoraResult<UserIdentity> {
        Self::unavailable()
    }

    async fn sign_up(&self, _request: &SignUpRequest) -> AgoraResult<UserIdentity> {
        Self::unavailable()
    }

    async fn sign_out(&self) -> AgoraResult<()> {
        Ok(())
    }

    async fn current_user(&self) -> AgoraResult<Option<UserIdentity>> {
        Ok(None)
    }

    async fn id_token(&self, _force_refresh: bool) -> AgoraResult<IdToken> {
        Err(AuthError::SessionExpired.into())
    }

    async fn reset_password(&self, _email: &str) -> AgoraResult<()> {
        Self::unavailable()
    }

    async fn update_profile(&self, _update: &ProfileUpdate) -> AgoraResult<UserIdentity> {
        Self::unavailable()
    }
}
