//! Moderation queue: reports joined with their post, comment and author.

use std::sync::Arc;

use agora_core::{
    enrich_reports, AgoraError, AgoraResult, EnrichedReport, Post, ReportPage, UserPage,
    ValidationError,
};
use agora_query::{QueryKey, ReadOptions};

use super::helpers::{announce, fetcher, require_session};
use crate::app::App;
use crate::keys::{self, affected};
use crate::pagination::{page_state, ListState, Paged};

const LOAD_FAILED: &str = "Failed to load reports";

#[derive(Debug, Clone)]
pub struct AdminReportsView {
    app: App,
    page: u32,
}

/// A page of enriched reports, shaped for `page_state`.
struct EnrichedPage {
    reports: Vec<EnrichedReport>,
    total_count: u64,
}

impl Paged for EnrichedPage {
    type Item = EnrichedReport;

    fn items(&self) -> &[EnrichedReport] {
        &self.reports
    }

    fn total_count(&self) -> u64 {
        self.total_count
    }
}

impl AdminReportsView {
    pub fn new(app: App) -> Self {
        Self { app, page: 1 }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    fn page_size(&self) -> u32 {
        self.app.config.pagination.reports_page_size
    }

    pub fn key(&self) -> QueryKey {
        keys::reports_page(self.page, self.page_size())
    }

    async fn fetch_all(&self) -> AgoraResult<(Arc<ReportPage>, Arc<Vec<Post>>, Arc<UserPage>)> {
        let (page, limit) = (self.page, self.page_size());
        let cache = &self.app.cache;
        tokio::try_join!(
            cache.fetch(
                self.key(),
                fetcher(&self.app.api, move |api| async move {
                    api.list_reports(page, limit).await
                }),
                ReadOptions::default(),
            ),
            cache.fetch(
                keys::all_posts(),
                fetcher(&self.app.api, |api| async move { api.all_posts().await }),
                ReadOptions::default(),
            ),
            cache.fetch(
                keys::all_users(),
                fetcher(&self.app.api, |api| async move { api.all_users().await }),
                ReadOptions::default(),
            ),
        )
    }

    pub async fn load(&self) -> ListState<EnrichedReport> {
        match self.fetch_all().await {
            Ok((reports, posts, users)) => {
                let enriched = EnrichedPage {
                    reports: enrich_reports(&reports.reports, &posts, &users.users),
                    total_count: reports.total_count,
                };
                page_state(
                    &enriched,
                    self.page,
                    self.page_size(),
                    self.app.config.pagination.window_width,
                )
            }
            Err(err) => ListState::Failed {
                message: err.user_message(LOAD_FAILED),
            },
        }
    }

    /// Delete the account that wrote the reported comment.
    pub async fn ban_user(&self, report: &EnrichedReport) -> AgoraResult<()> {
        require_session(&self.app, "ban users")?;
        let user_id = report.commented_user_id.as_ref().ok_or_else(|| {
            AgoraError::from(ValidationError::InvalidValue {
                field: "user".to_string(),
                reason: "The commenter's account could not be found".to_string(),
            })
        })?;
        let result = self
            .app
            .cache
            .mutate(self.app.api.delete_user(user_id), &affected::user_changed())
            .await;
        announce(&self.app, result, "User banned", "Failed to ban user")
    }

    pub async fn delete_comment(&self, report: &EnrichedReport) -> AgoraResult<()> {
        require_session(&self.app, "delete comments")?;
        let post_id = &report.report.post_id;
        let result = self
            .app
            .cache
            .mutate(
                self.app.api.delete_comment(post_id, &report.report.comment_id),
                &affected::comment_deleted(post_id),
            )
            .await;
        announce(&self.app, result, "Comment deleted", "Failed to delete comment")
    }
}
