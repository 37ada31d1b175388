//! Application root: owns the shared services every view needs.

use std::sync::Arc;

use agora_core::AgoraResult;
use agora_query::QueryCache;
use reqwest::Client;

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::events::{self, EventReceiver, EventSender};
use crate::identity::IdentityProvider;
use crate::payment::PaymentProcessor;
use crate::session::SessionManager;
use crate::upload::{HostedImageUploader, ImageUploader};

/// External collaborators injected at startup.
pub struct Capabilities {
    pub identity: Arc<dyn IdentityProvider>,
    pub payments: Arc<dyn PaymentProcessor>,
    /// Defaults to the configured image host when `None`.
    pub uploader: Option<Arc<dyn ImageUploader>>,
}

/// Shared handles, cheap to clone into each view.
#[derive(Clone)]
pub struct App {
    pub config: Arc<ClientConfig>,
    pub api: ApiClient,
    pub cache: QueryCache,
    pub session: SessionManager,
    pub payments: Arc<dyn PaymentProcessor>,
    pub uploader: Arc<dyn ImageUploader>,
    pub events: EventSender,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("api", &self.api)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl App {
    /// Build the services. The receiver carries navigation and toast events
    /// for the UI shell.
    pub fn new(config: ClientConfig, capabilities: Capabilities) -> ClientResult<(Self, EventReceiver)> {
        config.validate()?;
        let (events, receiver) = events::channel();
        let http = Client::builder().timeout(config.request_timeout()).build()?;

        let session = SessionManager::new(
            capabilities.identity,
            config.token_refresh_margin(),
            events.clone(),
        );
        let api = ApiClient::with_client(http.clone(), &config.api_base_url, session.clone(), events.clone())?;
        let uploader = match capabilities.uploader {
            Some(uploader) => uploader,
            None => Arc::new(
                HostedImageUploader::new(http, &config.upload)
                    .map_err(|e| ClientError::Agora(e.into()))?,
            ),
        };
        let cache = QueryCache::new(config.cache_config());

        let app = Self {
            config: Arc::new(config),
            api,
            cache,
            session,
            payments: capabilities.payments,
            uploader,
            events,
        };
        Ok((app, receiver))
    }

    /// Restore the persisted session and start the cache janitor. Needs a
    /// running Tokio runtime.
    pub async fn start(&self) -> AgoraResult<()> {
        self.cache.spawn_gc(self.config.gc_interval())?;
        let identity = self.session.restore().await?;
        tracing::info!(
            signed_in = identity.is_some(),
            base_url = %self.config.api_base_url,
            "client started"
        );
        Ok(())
    }

    pub fn shutdown(&self) {
        self.cache.shutdown();
        tracing::info!("client shut down");
    }
}
