//! Plumbing shared by the view-models.

use std::future::Future;
use std::sync::Arc;

use agora_core::{
    normalize_email, AgoraError, AgoraResult, AuthUid, ErrorCategory, PostCount, RoleInfo,
};
use agora_query::{CacheEntry, ReadOptions};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use crate::api::ApiClient;
use crate::app::App;
use crate::keys;
use crate::notifications::{Toast, ToastAction};
use crate::session::UserIdentity;

/// Render state of a single cached value.
#[derive(Debug, Clone, PartialEq)]
pub enum Loadable<T> {
    /// The read is disabled (e.g. waiting on a session).
    Idle,
    Loading,
    Ready(Arc<T>),
    /// Fetch failed. `last` holds the previous data, if any, which the view
    /// may keep showing next to the retry affordance.
    Failed { message: String, last: Option<Arc<T>> },
}

impl<T> Loadable<T> {
    pub fn from_entry(entry: &CacheEntry<T>, fallback: &str) -> Self {
        match (&entry.data, &entry.error) {
            (last, Some(err)) if entry.is_error() => Loadable::Failed {
                message: err.user_message(fallback),
                last: last.clone(),
            },
            (Some(data), _) => Loadable::Ready(Arc::clone(data)),
            (None, _) if entry.is_loading() => Loadable::Loading,
            (None, _) => Loadable::Idle,
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Loadable::Ready(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Loadable::Loading)
    }
}

/// Future produced by a view's cache fetcher.
pub(crate) type Fetch<T> = BoxFuture<'static, AgoraResult<T>>;

/// Wrap an endpoint call as a cache fetcher. The client is cloned per call
/// so the returned future owns everything it touches.
pub(crate) fn fetcher<T, F, Fut>(
    api: &ApiClient,
    call: F,
) -> impl Fn() -> Fetch<T> + Send + Sync + 'static
where
    T: Send + 'static,
    F: Fn(ApiClient) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AgoraResult<T>> + Send + 'static,
{
    let api = api.clone();
    move || call(api.clone()).boxed()
}

/// The signed-in identity, or a login-prompt toast and `NotSignedIn`.
pub(crate) fn require_session(app: &App, action: &str) -> AgoraResult<UserIdentity> {
    app.session.require(action).inspect_err(|err| {
        tracing::debug!(action, "action needs a session");
        app.events
            .toast(Toast::error(err.user_message(action)).with_action(ToastAction::Login));
    })
}

/// Surface a failed action. Authorization failures already navigated away
/// and validation failures are shown inline, so neither gets a toast.
pub(crate) fn report_failure(app: &App, err: &AgoraError, fallback: &str) {
    match err.category() {
        ErrorCategory::Authorization | ErrorCategory::Validation => {}
        ErrorCategory::Server => app
            .events
            .toast(Toast::error(err.user_message(fallback)).with_action(ToastAction::Retry)),
        ErrorCategory::Authentication | ErrorCategory::NotFound => {
            app.events.toast(Toast::error(err.user_message(fallback)))
        }
    }
}

/// Run an action, toasting `success` or the failure.
pub(crate) fn announce<R>(app: &App, result: AgoraResult<R>, success: &str, fallback: &str) -> AgoraResult<R> {
    match &result {
        Ok(_) => app.events.toast(Toast::success(success)),
        Err(err) => report_failure(app, err, fallback),
    }
    result
}

/// Lowercased email of the signed-in account.
pub(crate) fn account_email(identity: &UserIdentity) -> AgoraResult<String> {
    Ok(normalize_email(&identity.email)?)
}

pub(crate) async fn fetch_role(app: &App, email: &str) -> AgoraResult<Arc<RoleInfo>> {
    let email = email.to_string();
    app.cache
        .fetch(
            keys::role(&email),
            fetcher(&app.api, move |api| {
                let email = email.clone();
                async move { api.role(&email).await }
            }),
            ReadOptions::default(),
        )
        .await
}

pub(crate) async fn fetch_post_count(app: &App, uid: &AuthUid) -> AgoraResult<Arc<PostCount>> {
    let owned = uid.clone();
    app.cache
        .fetch(
            keys::post_count(uid),
            fetcher(&app.api, move |api| {
                let uid = owned.clone();
                async move { api.post_count(&uid).await }
            }),
            ReadOptions::default(),
        )
        .await
}
