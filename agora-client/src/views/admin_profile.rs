//! Admin profile: site totals and tag management.

use std::sync::Arc;

use agora_core::{normalize_tag, AdminStats, AgoraResult, Tag, ValidationError};
use agora_query::ReadOptions;

use super::helpers::{announce, fetcher, require_session, Fetch};
use crate::app::App;
use crate::keys::{self, affected};

#[derive(Debug, Clone)]
pub struct AdminProfileView {
    app: App,
}

impl AdminProfileView {
    pub fn new(app: App) -> Self {
        Self { app }
    }

    pub async fn stats(&self) -> AgoraResult<Arc<AdminStats>> {
        self.app.session.require("view site statistics")?;
        self.app
            .cache
            .fetch(
                keys::admin_stats(),
                fetcher(&self.app.api, |api| async move { api.admin_stats().await }),
                ReadOptions::default(),
            )
            .await
    }

    fn tags_fetcher(&self) -> impl Fn() -> Fetch<Vec<Tag>> + Send + Sync + 'static {
        fetcher(&self.app.api, |api| async move { api.list_tags().await })
    }

    pub async fn tags(&self) -> AgoraResult<Arc<Vec<Tag>>> {
        self.app
            .cache
            .fetch(keys::tags(), self.tags_fetcher(), ReadOptions::default())
            .await
    }

    /// Add a tag. Blank names and names already present (ignoring case) are
    /// rejected locally.
    pub async fn add_tag(&self, name: &str) -> AgoraResult<()> {
        require_session(&self.app, "add tags")?;
        let name = normalize_tag(name)?;
        let existing = self.tags().await?;
        if existing.iter().any(|t| t.name.eq_ignore_ascii_case(&name)) {
            return Err(ValidationError::InvalidValue {
                field: "tag".to_string(),
                reason: format!("Tag '{}' already exists", name),
            }
            .into());
        }
        let result = self
            .app
            .cache
            .mutate(self.app.api.add_tag(&name), &affected::tags_changed())
            .await;
        announce(&self.app, result, "Tag added successfully!", "Failed to add tag")
    }

    pub async fn delete_tag(&self, name: &str) -> AgoraResult<()> {
        require_session(&self.app, "delete tags")?;
        let result = self
            .app
            .cache
            .mutate(self.app.api.delete_tag(name), &affected::tags_changed())
            .await;
        announce(&self.app, result, "Tag deleted successfully!", "Failed to delete tag")
    }
}
