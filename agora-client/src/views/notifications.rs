//! Notification bell: unread list, full history, mark as read.

use std::sync::Arc;

use agora_core::{AgoraResult, Notification, NotificationId};
use agora_query::ReadOptions;

use super::helpers::{account_email, fetcher, report_failure, require_session, Fetch, Loadable};
use crate::app::App;
use crate::keys::{self, affected};

#[derive(Debug, Clone)]
pub struct NotificationsView {
    app: App,
}

impl NotificationsView {
    pub fn new(app: App) -> Self {
        Self { app }
    }

    fn list_fetcher(
        &self,
        email: String,
        include_read: bool,
    ) -> impl Fn() -> Fetch<Vec<Notification>> + Send + Sync + 'static {
        fetcher(&self.app.api, move |api| {
            let email = email.clone();
            async move { api.notifications(&email, include_read).await }
        })
    }

    /// Current state of the list; idle while signed out.
    pub fn read(&self, include_read: bool) -> AgoraResult<Loadable<Vec<Notification>>> {
        let Some(user) = self.app.session.current() else {
            return Ok(Loadable::Idle);
        };
        let email = account_email(&user)?;
        let entry = self.app.cache.read(
            keys::notifications(&email, include_read),
            self.list_fetcher(email, include_read),
            ReadOptions::default(),
        )?;
        Ok(Loadable::from_entry(&entry, "Failed to load notifications"))
    }

    pub async fn load(&self, include_read: bool) -> AgoraResult<Arc<Vec<Notification>>> {
        let user = self.app.session.require("view notifications")?;
        let email = account_email(&user)?;
        self.app
            .cache
            .fetch(
                keys::notifications(&email, include_read),
                self.list_fetcher(email, include_read),
                ReadOptions::default(),
            )
            .await
    }

    pub async fn unread_count(&self) -> AgoraResult<usize> {
        let unread = self.load(false).await?;
        Ok(unread.iter().filter(|n| !n.read).count())
    }

    pub async fn mark_read(&self, id: &NotificationId) -> AgoraResult<()> {
        let user = require_session(&self.app, "read notifications")?;
        let email = account_email(&user)?;
        let result = self
            .app
            .cache
            .mutate(
                self.app.api.mark_notification_read(id),
                &affected::notifications_read(&email),
            )
            .await;
        if let Err(err) = &result {
            report_failure(&self.app, err, "Failed to mark notification as read");
        }
        result
    }

    pub async fn mark_all_read(&self) -> AgoraResult<()> {
        let user = require_session(&self.app, "read notifications")?;
        let email = account_email(&user)?;
        let result = self
            .app
            .cache
            .mutate(
                self.app.api.mark_all_notifications_read(&email),
                &affected::notifications_read(&email),
            )
            .await;
        if let Err(err) = &result {
            report_failure(&self.app, err, "Failed to mark notifications as read");
        }
        result
    }
}
