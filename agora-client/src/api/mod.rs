//! HTTP client for the Agora REST backend.
//!
//! Every request carries the session's bearer token when one exists. A `401`
//! signs the session out and sends the shell to the login route; a `403`
//! sends it to the forbidden route. Endpoint wrappers live in the submodules,
//! one per resource.

mod announcements;
mod connections;
mod membership;
mod notifications;
mod posts;
mod reports;
mod tags;
mod users;

pub use announcements::{AnnouncementCreated, NotificationFanout};

use agora_core::{AgoraError, AgoraResult, ApiError};
use reqwest::multipart::Form;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::events::EventSender;
use crate::nav::Route;
use crate::session::SessionManager;

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    session: SessionManager,
    events: EventSender,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

/// Error payloads seen from the backend: `{message}`, `{error}` or `{details}`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.message
            .or(self.error)
            .or(self.details)
            .filter(|m| !m.trim().is_empty())
    }
}

impl ApiClient {
    /// Build around an existing `reqwest::Client`, sharing its pool.
    pub fn with_client(
        client: Client,
        base_url: &str,
        session: SessionManager,
        events: EventSender,
    ) -> AgoraResult<Self> {
        let base_url = Url::parse(base_url).map_err(|e| ApiError::Network {
            reason: format!("invalid base URL {}: {}", base_url, e),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Network {
                reason: format!("base URL {} cannot carry a path", base_url),
            }
            .into());
        }
        Ok(Self {
            client,
            base_url,
            session,
            events,
        })
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn events(&self) -> &EventSender {
        &self.events
    }

    /// Resolve path segments against the base URL. Each segment is
    /// percent-encoded, so ids and emails cannot alter the path.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn request(&self, method: Method, segments: &[&str]) -> AgoraResult<RequestBuilder> {
        let url = self.url(segments);
        let mut request = self.client.request(method, url);
        if let Some(token) = self.session.bearer_token().await? {
            request = request.bearer_auth(token);
        }
        Ok(request)
    }

    /// Send and map non-success statuses to errors, running the 401/403
    /// side effects on the way.
    async fn execute(&self, request: RequestBuilder, path: &str) -> AgoraResult<Response> {
        let response = request.send().await.map_err(|e| ApiError::Network {
            reason: e.to_string(),
        })?;
        let status = response.status();
        tracing::debug!(path, status = status.as_u16(), "api response");
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(ErrorBody::into_message);

        match status {
            StatusCode::UNAUTHORIZED => {
                tracing::warn!(path, "unauthorized, signing out");
                self.session.expire().await;
                self.events.navigate(Route::Login);
            }
            StatusCode::FORBIDDEN => {
                tracing::warn!(path, "forbidden");
                self.events.navigate(Route::Forbidden);
                return Err(AgoraError::forbidden(path));
            }
            _ => {}
        }

        Err(ApiError::Server {
            status: status.as_u16(),
            message,
        }
        .into())
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> AgoraResult<T> {
        let bytes = response.bytes().await.map_err(|e| ApiError::Network {
            reason: e.to_string(),
        })?;
        serde_json::from_slice(&bytes).map_err(|e| {
            ApiError::Decode {
                reason: e.to_string(),
            }
            .into()
        })
    }

    async fn get_json<T, Q>(&self, segments: &[&str], query: Option<&Q>) -> AgoraResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let path = segments.join("/");
        let mut request = self.request(Method::GET, segments).await?;
        if let Some(query) = query {
            request = request.query(query);
        }
        let response = self.execute(request, &path).await?;
        Self::decode(response).await
    }

    async fn send_json<T, B>(&self, method: Method, segments: &[&str], body: &B) -> AgoraResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let path = segments.join("/");
        let request = self.request(method, segments).await?.json(body);
        let response = self.execute(request, &path).await?;
        Self::decode(response).await
    }

    /// Send a request whose response body carries nothing we need.
    async fn send_unit<B>(&self, method: Method, segments: &[&str], body: Option<&B>) -> AgoraResult<()>
    where
        B: Serialize + ?Sized,
    {
        let path = segments.join("/");
        let mut request = self.request(method, segments).await?;
        if let Some(body) = body {
            request = request.json(body);
        }
        self.execute(request, &path).await?;
        Ok(())
    }

    async fn post_multipart<T: DeserializeOwned>(&self, segments: &[&str], form: Form) -> AgoraResult<T> {
        let path = segments.join("/");
        let request = self.request(Method::POST, segments).await?.multipart(form);
        let response = self.execute(request, &path).await?;
        Self::decode(response).await
    }
}

/// Map a backend 404 to a typed not-found error for `resource`.
fn not_found_as(resource: &'static str) -> impl FnOnce(AgoraError) -> AgoraError {
    move |err| match err.status() {
        Some(404) => AgoraError::not_found(resource),
        _ => err,
    }
}

/// Empty request body for endpoints that take none.
const NO_BODY: Option<&()> = None;
