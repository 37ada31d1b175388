//! Tag browser: tag chips, tag search, and a locally paginated post grid.

use std::sync::Arc;

use agora_core::{normalize_tag, AgoraResult, Post, Tag};
use agora_query::ReadOptions;

use super::helpers::{fetcher, Fetch, Loadable};
use super::interactions::PostActions;
use crate::app::App;
use crate::keys;
use crate::pagination::{local_page, ListState};

#[derive(Debug, Clone)]
pub struct TagBrowserView {
    app: App,
    page: u32,
    /// Normalized tag of the active search, if any.
    selected: Option<String>,
}

impl TagBrowserView {
    pub fn new(app: App) -> Self {
        Self {
            app,
            page: 1,
            selected: None,
        }
    }

    fn tags_fetcher(&self) -> impl Fn() -> Fetch<Vec<Tag>> + Send + Sync + 'static {
        fetcher(&self.app.api, |api| async move { api.list_tags().await })
    }

    fn posts_fetcher(&self) -> impl Fn() -> Fetch<Vec<Post>> + Send + Sync + 'static {
        fetcher(&self.app.api, |api| async move { api.all_posts().await })
    }

    pub fn read_tags(&self) -> AgoraResult<Loadable<Vec<Tag>>> {
        let entry = self
            .app
            .cache
            .read(keys::tags(), self.tags_fetcher(), ReadOptions::default())?;
        Ok(Loadable::from_entry(&entry, "Failed to load tags"))
    }

    pub async fn load_tags(&self) -> AgoraResult<Arc<Vec<Tag>>> {
        self.app
            .cache
            .fetch(keys::tags(), self.tags_fetcher(), ReadOptions::default())
            .await
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    /// Search posts by tag. The tag is lowercased; a blank tag is rejected
    /// without a request. Selecting a tag returns to the first page.
    pub async fn search(&mut self, tag: &str) -> AgoraResult<Arc<Vec<Post>>> {
        let tag = normalize_tag(tag)?;
        self.selected = Some(tag.clone());
        self.page = 1;
        let key = keys::post_search(&tag);
        self.app
            .cache
            .fetch(
                key,
                fetcher(&self.app.api, move |api| {
                    let tag = tag.clone();
                    async move { api.search_posts(&tag).await }
                }),
                ReadOptions::default(),
            )
            .await
    }

    pub fn clear_search(&mut self) {
        self.selected = None;
        self.page = 1;
    }

    /// Posts for the grid: the search results when a tag is selected,
    /// otherwise every post, sliced to the current page.
    pub async fn load_posts(&self) -> ListState<Post> {
        let result = match &self.selected {
            Some(tag) => {
                let tag = tag.clone();
                self.app
                    .cache
                    .fetch(
                        keys::post_search(&tag),
                        fetcher(&self.app.api, move |api| {
                            let tag = tag.clone();
                            async move { api.search_posts(&tag).await }
                        }),
                        ReadOptions::default(),
                    )
                    .await
            }
            None => {
                self.app
                    .cache
                    .fetch(keys::all_posts(), self.posts_fetcher(), ReadOptions::default())
                    .await
            }
        };
        let pagination = &self.app.config.pagination;
        match result {
            Ok(posts) => local_page(&posts, self.page, pagination.tags_page_size, pagination.window_width),
            Err(err) => ListState::Failed {
                message: err.user_message("Failed to load posts"),
            },
        }
    }

    pub fn actions(&self) -> PostActions {
        PostActions::new(self.app.clone())
    }
}
