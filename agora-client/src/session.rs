//! Session state owned by the client.
//!
//! `SessionManager` is the only writer; views take snapshots or subscribe to
//! changes through a watch channel.

use std::sync::Arc;
use std::time::Duration;

use agora_core::{require_text, AgoraError, AgoraResult, AuthError, normalize_email};
use tokio::sync::watch;

use crate::events::EventSender;
use crate::identity::{IdentityProvider, OAuthProvider, ProfileUpdate, SignUpRequest};
use crate::token::TokenCache;

pub use crate::identity::UserIdentity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    None,
    Valid,
    /// The backend rejected the token; the user was signed out.
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub identity: Option<UserIdentity>,
    pub token_status: TokenStatus,
    /// True until the provider has reported the initial auth state.
    pub loading: bool,
}

impl Session {
    pub fn loading() -> Self {
        Self {
            identity: None,
            token_status: TokenStatus::None,
            loading: true,
        }
    }

    pub fn signed_out() -> Self {
        Self {
            identity: None,
            token_status: TokenStatus::None,
            loading: false,
        }
    }

    pub fn signed_in(identity: UserIdentity) -> Self {
        Self {
            identity: Some(identity),
            token_status: TokenStatus::Valid,
            loading: false,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.identity.is_some()
    }
}

#[derive(Clone)]
pub struct SessionManager {
    provider: Arc<dyn IdentityProvider>,
    state: Arc<watch::Sender<Session>>,
    tokens: TokenCache,
    events: EventSender,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("session", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        refresh_margin: Duration,
        events: EventSender,
    ) -> Self {
        let (state, _) = watch::channel(Session::loading());
        Self {
            provider,
            state: Arc::new(state),
            tokens: TokenCache::new(refresh_margin),
            events,
        }
    }

    /// Ask the provider for a persisted login and leave the loading state.
    pub async fn restore(&self) -> AgoraResult<Option<UserIdentity>> {
        let result = self.provider.current_user().await;
        let identity = match &result {
            Ok(identity) => identity.clone(),
            Err(err) => {
                tracing::warn!(error = %err, "failed to restore session");
                None
            }
        };
        self.replace(match identity.clone() {
            Some(identity) => Session::signed_in(identity),
            None => Session::signed_out(),
        });
        result.map(|_| identity)
    }

    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn current(&self) -> Option<UserIdentity> {
        self.state.borrow().identity.clone()
    }

    /// The signed-in identity, or `NotSignedIn` naming the attempted action.
    pub fn require(&self, action: &str) -> AgoraResult<UserIdentity> {
        self.current()
            .ok_or_else(|| AgoraError::not_signed_in(action))
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AgoraResult<UserIdentity> {
        let email = normalize_email(email)?;
        let password = require_text("password", password)?;
        let identity = self.provider.sign_in(&email, password).await?;
        self.establish(identity.clone()).await;
        Ok(identity)
    }

    pub async fn sign_in_with_oauth(&self, provider: OAuthProvider) -> AgoraResult<UserIdentity> {
        let identity = self.provider.sign_in_with_oauth(provider).await?;
        self.establish(identity.clone()).await;
        Ok(identity)
    }

    pub async fn sign_up(&self, request: &SignUpRequest) -> AgoraResult<UserIdentity> {
        let request = SignUpRequest {
            name: require_text("name", &request.name)?.to_string(),
            email: normalize_email(&request.email)?,
            password: require_text("password", &request.password)?.to_string(),
            photo_url: request.photo_url.clone(),
        };
        let identity = self.provider.sign_up(&request).await?;
        self.establish(identity.clone()).await;
        Ok(identity)
    }

    pub async fn sign_out(&self) -> AgoraResult<()> {
        let result = self.provider.sign_out().await;
        self.tokens.clear().await;
        self.replace(Session::signed_out());
        self.events.session_changed();
        tracing::info!("signed out");
        result
    }

    pub async fn reset_password(&self, email: &str) -> AgoraResult<()> {
        let email = normalize_email(email)?;
        self.provider.reset_password(&email).await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> AgoraResult<UserIdentity> {
        self.require("update your profile")?;
        let identity = self.provider.update_profile(update).await?;
        self.replace(Session::signed_in(identity.clone()));
        self.events.session_changed();
        Ok(identity)
    }

    /// Token for the `Authorization` header, `None` when signed out.
    pub async fn bearer_token(&self) -> AgoraResult<Option<String>> {
        if self.current().is_none() {
            return Ok(None);
        }
        match self.tokens.get(self.provider.as_ref()).await {
            Ok(token) => Ok(Some(token)),
            Err(AgoraError::Auth(AuthError::SessionExpired)) => {
                self.expire().await;
                Err(AuthError::SessionExpired.into())
            }
            Err(err) => Err(err),
        }
    }

    /// Forced sign-out after the backend rejected our credentials.
    pub async fn expire(&self) {
        if let Err(err) = self.provider.sign_out().await {
            tracing::warn!(error = %err, "provider sign-out failed during expiry");
        }
        self.tokens.clear().await;
        self.replace(Session {
            identity: None,
            token_status: TokenStatus::Expired,
            loading: false,
        });
        self.events.session_changed();
        tracing::info!("session expired");
    }

    async fn establish(&self, identity: UserIdentity) {
        self.tokens.clear().await;
        tracing::info!(uid = %identity.uid, "signed in");
        self.replace(Session::signed_in(identity));
        self.events.session_changed();
    }

    fn replace(&self, session: Session) {
        self.state.send_replace(session);
    }
}
