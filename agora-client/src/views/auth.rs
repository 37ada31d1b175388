//! Sign in, registration, OAuth, sign out, password reset.

use agora_core::{normalize_email, AgoraResult, Role, Subscription};
use chrono::Utc;

use super::helpers::{announce, report_failure};
use crate::app::App;
use crate::identity::{OAuthProvider, SignUpRequest};
use crate::nav::Route;
use crate::notifications::Toast;
use crate::session::UserIdentity;
use crate::types::NewUserBody;
use crate::upload::ImageFile;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub photo: Option<ImageFile>,
}

#[derive(Debug, Clone)]
pub struct AuthView {
    app: App,
    /// Where to go after a successful sign-in.
    return_to: Route,
}

impl AuthView {
    pub fn new(app: App) -> Self {
        Self {
            app,
            return_to: Route::Home,
        }
    }

    /// Remember the guarded route that sent the user here.
    pub fn returning_to(mut self, route: Route) -> Self {
        self.return_to = route;
        self
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AgoraResult<UserIdentity> {
        let result = self.app.session.sign_in(email, password).await;
        let identity = announce(
            &self.app,
            result,
            "Login successful!",
            "Login failed. Please check your credentials.",
        )?;
        self.app.events.navigate(self.return_to.clone());
        Ok(identity)
    }

    pub async fn sign_in_with_oauth(&self, provider: OAuthProvider) -> AgoraResult<UserIdentity> {
        let result = self.app.session.sign_in_with_oauth(provider).await;
        let identity = announce(&self.app, result, "Login successful!", "Login failed.")?;
        self.record_user(&identity, identity.display_name_or_default()).await;
        self.app.events.navigate(self.return_to.clone());
        Ok(identity)
    }

    /// Create the account, upload the avatar if one was picked, and store
    /// the user record with the default role.
    pub async fn register(&self, form: RegistrationForm) -> AgoraResult<UserIdentity> {
        let photo_url = match form.photo {
            Some(image) => {
                image.validate(self.app.config.upload.max_bytes)?;
                match self.app.uploader.upload(image).await {
                    Ok(url) => Some(url),
                    Err(err) => {
                        report_failure(&self.app, &err, "Failed to upload photo");
                        return Err(err);
                    }
                }
            }
            None => None,
        };
        let request = SignUpRequest {
            name: form.name,
            email: form.email,
            password: form.password,
            photo_url,
        };
        let result = self.app.session.sign_up(&request).await;
        let identity = announce(&self.app, result, "Registration successful!", "Registration failed.")?;
        self.record_user(&identity, request.name.trim()).await;
        self.app.events.navigate(Route::Home);
        Ok(identity)
    }

    pub async fn sign_out(&self) -> AgoraResult<()> {
        let result = self.app.session.sign_out().await;
        announce(&self.app, result, "Signed out", "Failed to sign out")?;
        self.app.events.navigate(Route::Home);
        Ok(())
    }

    pub async fn reset_password(&self, email: &str) -> AgoraResult<()> {
        let result = self.app.session.reset_password(email).await;
        announce(
            &self.app,
            result,
            "Password reset email sent! Check your inbox.",
            "Failed to send reset email.",
        )
    }

    /// Store the backend user record. The account already exists at the
    /// identity provider, so a failure here is logged and not surfaced.
    async fn record_user(&self, identity: &UserIdentity, name: &str) {
        let email = match normalize_email(&identity.email) {
            Ok(email) => email,
            Err(err) => {
                tracing::warn!(error = %err, "identity has no usable email");
                return;
            }
        };
        let body = NewUserBody {
            name: name.to_string(),
            email,
            photo: identity.photo_url.clone(),
            role: Role::User,
            subscription: Subscription::Free,
            created_at: Utc::now(),
        };
        if let Err(err) = self.app.api.create_user(&body).await {
            tracing::warn!(error = %err, uid = %identity.uid, "failed to store user record");
            self.app
                .events
                .toast(Toast::info("Signed in, but your profile could not be saved yet."));
        }
    }
}
