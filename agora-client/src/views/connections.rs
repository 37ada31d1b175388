//! Connection finder: member directory search and connection requests.

use std::sync::Arc;

use agora_core::{
    connect_state, connection_status, normalize_email, AgoraError, AgoraResult, ConnectState,
    Connection, ConnectionStatus, PublicUser, ValidationError,
};
use agora_query::{QueryKey, ReadOptions};

use super::helpers::{account_email, announce, fetcher, require_session, Fetch, Loadable};
use crate::app::App;
use crate::keys::{self, affected};
use crate::types::ConnectionRequestBody;

/// Entries revealed per "load more".
pub const DIRECTORY_BATCH: usize = 5;
const LOAD_FAILED: &str = "Failed to fetch users";

/// One directory entry with the state of its connect control.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub user: PublicUser,
    pub state: ConnectState,
}

/// The visible slice of the directory.
#[derive(Debug, Clone, PartialEq)]
pub struct Directory {
    pub candidates: Vec<Candidate>,
    /// More entries matched than are shown.
    pub has_more: bool,
}

#[derive(Debug, Clone)]
pub struct ConnectionsView {
    app: App,
    search: String,
    visible: usize,
}

impl ConnectionsView {
    pub fn new(app: App) -> Self {
        Self {
            app,
            search: String::new(),
            visible: DIRECTORY_BATCH,
        }
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn visible(&self) -> usize {
        self.visible
    }

    /// A new search term shows only the first batch again.
    pub fn set_search(&mut self, search: &str) {
        let search = search.trim();
        if self.search != search {
            self.search = search.to_string();
            self.visible = DIRECTORY_BATCH;
        }
    }

    pub fn load_more(&mut self) {
        self.visible += DIRECTORY_BATCH;
    }

    pub fn key(&self) -> QueryKey {
        keys::public_users(&self.search)
    }

    fn users_fetcher(&self) -> impl Fn() -> Fetch<Vec<PublicUser>> + Send + Sync + 'static {
        let search = self.search.clone();
        fetcher(&self.app.api, move |api| {
            let search = search.clone();
            async move { api.public_users(&search).await }
        })
    }

    fn connections_fetcher(
        &self,
        email: String,
    ) -> impl Fn() -> Fetch<Vec<Connection>> + Send + Sync + 'static {
        fetcher(&self.app.api, move |api| {
            let email = email.clone();
            async move { api.connections(&email).await }
        })
    }

    fn directory(&self, me: &str, users: &[PublicUser], connections: &[Connection]) -> Directory {
        let candidates = users
            .iter()
            .take(self.visible)
            .map(|user| Candidate {
                user: user.clone(),
                state: connect_state(connections, me, &user.email),
            })
            .collect();
        Directory {
            candidates,
            has_more: users.len() > self.visible,
        }
    }

    /// Current state of the directory; idle while signed out. A failed
    /// connection lookup renders every entry as connectable.
    pub fn read(&self) -> AgoraResult<Loadable<Directory>> {
        let Some(user) = self.app.session.current() else {
            return Ok(Loadable::Idle);
        };
        let email = account_email(&user)?;
        let users = self
            .app
            .cache
            .read(self.key(), self.users_fetcher(), ReadOptions::default())?;
        let connections = self.app.cache.read(
            keys::connections(&email),
            self.connections_fetcher(email.clone()),
            ReadOptions::default(),
        )?;
        if connections.data.is_none() && connections.is_loading() {
            return Ok(Loadable::Loading);
        }
        let known = connections.data.unwrap_or_default();
        let render = |users: &Arc<Vec<PublicUser>>| Arc::new(self.directory(&email, users, &known));

        Ok(match Loadable::from_entry(&users, LOAD_FAILED) {
            Loadable::Ready(list) => Loadable::Ready(render(&list)),
            Loadable::Failed { message, last } => Loadable::Failed {
                message,
                last: last.as_ref().map(render),
            },
            Loadable::Loading => Loadable::Loading,
            Loadable::Idle => Loadable::Idle,
        })
    }

    pub async fn load(&self) -> AgoraResult<Directory> {
        let user = self.app.session.require("find connections")?;
        let email = account_email(&user)?;
        let users = self
            .app
            .cache
            .fetch(self.key(), self.users_fetcher(), ReadOptions::default())
            .await?;
        let connections = self.connections_of(&email).await;
        Ok(self.directory(&email, &users, &connections))
    }

    /// Status of the request between the signed-in member and `other_email`.
    pub async fn status_for(&self, other_email: &str) -> AgoraResult<Option<ConnectionStatus>> {
        let user = self.app.session.require("find connections")?;
        let email = account_email(&user)?;
        let connections = self.connections_of(&email).await;
        Ok(connection_status(&connections, &email, other_email))
    }

    async fn connections_of(&self, email: &str) -> Arc<Vec<Connection>> {
        let result = self
            .app
            .cache
            .fetch(
                keys::connections(email),
                self.connections_fetcher(email.to_string()),
                ReadOptions::default(),
            )
            .await;
        result.unwrap_or_else(|err| {
            tracing::warn!(error = %err, "connection lookup failed, treating as none");
            Arc::new(Vec::new())
        })
    }

    pub async fn send_request(&self, to: &PublicUser) -> AgoraResult<()> {
        let me = require_session(&self.app, "send connection requests")?;
        let from_email = account_email(&me)?;
        let to_email = normalize_email(&to.email)?;
        if from_email == to_email {
            return Err(refused("You cannot connect with yourself"));
        }
        let body = ConnectionRequestBody {
            from_email: from_email.clone(),
            to_email: to_email.clone(),
        };
        let result = self
            .app
            .cache
            .mutate(
                self.app.api.send_connection_request(&body),
                &affected::connection_sent(&from_email, &to_email),
            )
            .await;
        let success = format!("Connection request sent to {}!", to.display_name());
        announce(&self.app, result, &success, "Failed to send connection request")
    }
}

fn refused(reason: &str) -> AgoraError {
    ValidationError::InvalidValue {
        field: "connection".to_string(),
        reason: reason.to_string(),
    }
    .into()
}
