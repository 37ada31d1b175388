//! Harness shared by the client integration tests: mock capabilities and an
//! `App` wired to a `TestBackend`.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use agora_client::app::{App, Capabilities};
use agora_client::config::ClientConfig;
use agora_client::events::{AppEvent, EventReceiver};
use agora_client::identity::{
    IdToken, IdentityProvider, OAuthProvider, ProfileUpdate, SignUpRequest, UserIdentity,
};
use agora_client::nav::Route;
use agora_client::notifications::Toast;
use agora_client::payment::{CardHandle, PaymentConfirmation, PaymentProcessor};
use agora_client::upload::{ImageFile, ImageUploader};
use agora_core::{AgoraError, AgoraResult, AuthError, AuthUid, PaymentError};
use agora_test_utils::{bearer_for, TestBackend};
use async_trait::async_trait;
use chrono::{Duration, Utc};

pub fn identity(uid: &str, email: &str) -> UserIdentity {
    UserIdentity {
        uid: AuthUid::new(uid),
        email: email.to_string(),
        display_name: Some(email.split('@').next().unwrap_or_default().to_string()),
        photo_url: None,
    }
}

/// Identity provider with at most one registered account. Tokens are the
/// ones the test backend resolves to the account's email.
#[derive(Default)]
pub struct MockIdentityProvider {
    account: Mutex<Option<(UserIdentity, String)>>,
    current: Mutex<Option<UserIdentity>>,
    pub sign_outs: AtomicUsize,
    pub token_requests: AtomicUsize,
}

impl MockIdentityProvider {
    pub fn signed_out() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Persisted login, picked up by `App::start`.
    pub fn signed_in(user: UserIdentity) -> Arc<Self> {
        Arc::new(Self {
            account: Mutex::new(Some((user.clone(), "secret".to_string()))),
            current: Mutex::new(Some(user)),
            ..Self::default()
        })
    }

    /// Registered but not signed in.
    pub fn with_account(user: UserIdentity, password: &str) -> Arc<Self> {
        Arc::new(Self {
            account: Mutex::new(Some((user, password.to_string()))),
            ..Self::default()
        })
    }

    pub fn sign_out_count(&self) -> usize {
        self.sign_outs.load(Ordering::SeqCst)
    }

    fn provider_error(message: &str) -> AgoraError {
        AuthError::Provider {
            message: message.to_string(),
        }
        .into()
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> AgoraResult<UserIdentity> {
        let account = self.account.lock().unwrap().clone();
        match account {
            Some((user, expected)) if user.email == email && expected == password => {
                *self.current.lock().unwrap() = Some(user.clone());
                Ok(user)
            }
            _ => Err(Self::provider_error("invalid credentials")),
        }
    }

    async fn sign_in_with_oauth(&self, _provider: OAuthProvider) -> AgoraResult<UserIdentity> {
        let account = self.account.lock().unwrap().clone();
        match account {
            Some((user, _)) => {
                *self.current.lock().unwrap() = Some(user.clone());
                Ok(user)
            }
            None => Err(Self::provider_error("popup closed")),
        }
    }

    async fn sign_up(&self, request: &SignUpRequest) -> AgoraResult<UserIdentity> {
        let user = UserIdentity {
            uid: AuthUid::new(format!("uid-{}", request.email)),
            email: request.email.clone(),
            display_name: Some(request.name.clone()),
            photo_url: request.photo_url.clone(),
        };
        *self.account.lock().unwrap() = Some((user.clone(), request.password.clone()));
        *self.current.lock().unwrap() = Some(user.clone());
        Ok(user)
    }

    async fn sign_out(&self) -> AgoraResult<()> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        *self.current.lock().unwrap() = None;
        Ok(())
    }

    async fn current_user(&self) -> AgoraResult<Option<UserIdentity>> {
        Ok(self.current.lock().unwrap().clone())
    }

    async fn id_token(&self, _force_refresh: bool) -> AgoraResult<IdToken> {
        self.token_requests.fetch_add(1, Ordering::SeqCst);
        let current = self.current.lock().unwrap().clone();
        match current {
            Some(user) => Ok(IdToken {
                token: bearer_for(&user.email),
                expires_at: Utc::now() + Duration::hours(1),
            }),
            None => Err(AuthError::SessionExpired.into()),
        }
    }

    async fn reset_password(&self, _email: &str) -> AgoraResult<()> {
        Ok(())
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> AgoraResult<UserIdentity> {
        let mut current = self.current.lock().unwrap();
        let user = current
            .as_mut()
            .ok_or_else(|| AgoraError::from(AuthError::SessionExpired))?;
        if let Some(name) = &update.display_name {
            user.display_name = Some(name.clone());
        }
        if let Some(photo) = &update.photo_url {
            user.photo_url = Some(photo.clone());
        }
        Ok(user.clone())
    }
}

/// Card processor that approves or declines every payment, recording the
/// client secrets it was asked to confirm.
#[derive(Default)]
pub struct MockPaymentProcessor {
    pub decline: bool,
    pub confirmed: Mutex<Vec<String>>,
}

impl MockPaymentProcessor {
    pub fn approving() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn declining() -> Arc<Self> {
        Arc::new(Self {
            decline: true,
            ..Self::default()
        })
    }

    pub fn confirmations(&self) -> Vec<String> {
        self.confirmed.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentProcessor for MockPaymentProcessor {
    async fn confirm_card_payment(
        &self,
        client_secret: &str,
        _card: &CardHandle,
        _billing_email: Option<&str>,
    ) -> AgoraResult<PaymentConfirmation> {
        self.confirmed.lock().unwrap().push(client_secret.to_string());
        if self.decline {
            return Err(PaymentError::Declined {
                message: "Your card was declined.".to_string(),
            }
            .into());
        }
        let id = client_secret
            .split("_secret")
            .next()
            .unwrap_or(client_secret)
            .to_string();
        Ok(PaymentConfirmation {
            id,
            status: PaymentConfirmation::SUCCEEDED.to_string(),
        })
    }
}

/// Uploader that hands back a predictable URL per file name.
#[derive(Default)]
pub struct MockImageUploader {
    pub uploads: AtomicUsize,
}

#[async_trait]
impl ImageUploader for MockImageUploader {
    async fn upload(&self, image: ImageFile) -> AgoraResult<String> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(format!("https://images.test/{}", image.file_name))
    }
}

pub fn png(name: &str) -> ImageFile {
    ImageFile::new(vec![0x89, b'P', b'N', b'G'], "image/png", name)
}

pub fn config(base_url: &str) -> ClientConfig {
    let text = format!(
        r#"
api_base_url = "{base_url}"
request_timeout_ms = 5000

[auth]
token_refresh_margin_secs = 60

[cache]
stale_time_ms = 0
gc_time_ms = 300000
gc_interval_ms = 60000

[pagination]
feed_page_size = 10
users_page_size = 10
reports_page_size = 10
tags_page_size = 6
window_width = 5

[upload]
endpoint = "https://images.test/upload"
max_bytes = 1048576

[membership]
price_usd = 10
"#
    );
    ClientConfig::from_toml(&text).expect("test config should parse")
}

pub struct Harness {
    pub app: App,
    pub events: EventReceiver,
    pub identity: Arc<MockIdentityProvider>,
    pub payments: Arc<MockPaymentProcessor>,
    pub uploader: Arc<MockImageUploader>,
}

impl Harness {
    pub async fn new(backend: &TestBackend, identity: Arc<MockIdentityProvider>) -> Self {
        Self::with_payments(backend, identity, MockPaymentProcessor::approving()).await
    }

    pub async fn with_payments(
        backend: &TestBackend,
        identity: Arc<MockIdentityProvider>,
        payments: Arc<MockPaymentProcessor>,
    ) -> Self {
        let uploader = Arc::new(MockImageUploader::default());
        let capabilities = Capabilities {
            identity: identity.clone(),
            payments: payments.clone(),
            uploader: Some(uploader.clone()),
        };
        let (app, events) =
            App::new(config(&backend.url()), capabilities).expect("app should build");
        app.start().await.expect("app should start");
        Self {
            app,
            events,
            identity,
            payments,
            uploader,
        }
    }

    /// Every event emitted so far.
    pub fn drain(&mut self) -> Vec<AppEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    pub fn toasts(&mut self) -> Vec<Toast> {
        self.drain()
            .into_iter()
            .filter_map(|e| match e {
                AppEvent::Toast(toast) => Some(toast),
                _ => None,
            })
            .collect()
    }

    pub fn navigations(&mut self) -> Vec<Route> {
        self.drain()
            .into_iter()
            .filter_map(|e| match e {
                AppEvent::Navigate(route) => Some(route),
                _ => None,
            })
            .collect()
    }
}
