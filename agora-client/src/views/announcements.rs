//! Announcements: public list and the admin composer.

use std::sync::Arc;

use agora_core::{require_text, AgoraResult, Announcement, AnnouncementId};
use agora_query::ReadOptions;

use super::helpers::{announce, fetcher, require_session, Fetch, Loadable};
use crate::api::AnnouncementCreated;
use crate::app::App;
use crate::keys::{self, affected};
use crate::types::NewAnnouncement;
use crate::upload::ImageFile;

#[derive(Debug, Clone)]
pub struct AnnouncementsView {
    app: App,
}

impl AnnouncementsView {
    pub fn new(app: App) -> Self {
        Self { app }
    }

    fn fetcher(&self) -> impl Fn() -> Fetch<Vec<Announcement>> + Send + Sync + 'static {
        fetcher(&self.app.api, |api| async move { api.list_announcements().await })
    }

    pub fn read(&self) -> AgoraResult<Loadable<Vec<Announcement>>> {
        let entry = self
            .app
            .cache
            .read(keys::announcements(), self.fetcher(), ReadOptions::default())?;
        Ok(Loadable::from_entry(&entry, "Failed to load announcements"))
    }

    pub async fn load(&self) -> AgoraResult<Arc<Vec<Announcement>>> {
        self.app
            .cache
            .fetch(keys::announcements(), self.fetcher(), ReadOptions::default())
            .await
    }

    /// Post an announcement. Every user is notified server-side, so the
    /// notification lists are invalidated too.
    pub async fn create(
        &self,
        author_name: &str,
        title: &str,
        description: &str,
        author_image: ImageFile,
    ) -> AgoraResult<AnnouncementCreated> {
        require_session(&self.app, "post announcements")?;
        let announcement = NewAnnouncement {
            author_name: require_text("authorName", author_name)?.to_string(),
            title: require_text("title", title)?.to_string(),
            description: require_text("description", description)?.to_string(),
        };
        author_image.validate(self.app.config.upload.max_bytes)?;

        let result = self
            .app
            .cache
            .mutate(
                self.app.api.create_announcement(&announcement, author_image),
                &affected::announcements_changed(),
            )
            .await;
        let success = match &result {
            Ok(created) => format!(
                "Announcement posted successfully! Notified {} users.",
                created.notifications.success
            ),
            Err(_) => String::new(),
        };
        announce(&self.app, result, &success, "Failed to post announcement")
    }

    pub async fn delete(&self, id: &AnnouncementId) -> AgoraResult<()> {
        require_session(&self.app, "delete announcements")?;
        let result = self
            .app
            .cache
            .mutate(
                self.app.api.delete_announcement(id),
                &affected::announcements_changed(),
            )
            .await;
        announce(&self.app, result, "Announcement deleted", "Failed to delete announcement")
    }
}
