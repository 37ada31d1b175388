//! The paginated post feed on the home page.

use agora_core::{AgoraResult, Post, PostPage, PostSort};
use agora_query::{QueryKey, QueryObserver, ReadOptions};

use super::helpers::{fetcher, Fetch};
use super::interactions::PostActions;
use crate::app::App;
use crate::keys;
use crate::pagination::{list_state, page_state, ListState, Pager};

const LOAD_FAILED: &str = "Failed to load posts";

#[derive(Debug, Clone)]
pub struct FeedView {
    app: App,
    pager: Pager<PostSort>,
}

impl FeedView {
    pub fn new(app: App) -> Self {
        let page_size = app.config.pagination.feed_page_size;
        Self {
            app,
            pager: Pager::new(PostSort::Newest, page_size),
        }
    }

    pub fn pager(&self) -> &Pager<PostSort> {
        &self.pager
    }

    pub fn set_sort(&mut self, sort: PostSort) {
        self.pager.set_sort(sort);
    }

    pub fn set_page(&mut self, page: u32) {
        self.pager.set_page(page);
    }

    pub fn key(&self) -> QueryKey {
        keys::posts_page(self.pager.sort(), self.pager.page(), self.pager.page_size())
    }

    fn fetcher(&self) -> impl Fn() -> Fetch<PostPage> + Send + Sync + 'static {
        let (sort, page, limit) = (self.pager.sort(), self.pager.page(), self.pager.page_size());
        fetcher(&self.app.api, move |api| async move {
            api.list_posts(sort, page, limit).await
        })
    }

    /// Current state without waiting; starts a fetch when needed.
    pub fn read(&self) -> AgoraResult<ListState<Post>> {
        let entry = self
            .app
            .cache
            .read(self.key(), self.fetcher(), ReadOptions::default())?;
        Ok(list_state(
            &entry,
            self.pager.page(),
            self.pager.page_size(),
            self.width(),
            LOAD_FAILED,
        ))
    }

    /// Wait for the current page to settle.
    pub async fn load(&self) -> ListState<Post> {
        let result = self
            .app
            .cache
            .fetch(self.key(), self.fetcher(), ReadOptions::default())
            .await;
        match result {
            Ok(page) => page_state(
                page.as_ref(),
                self.pager.page(),
                self.pager.page_size(),
                self.width(),
            ),
            Err(err) => ListState::Failed {
                message: err.user_message(LOAD_FAILED),
            },
        }
    }

    /// Move to the next page if there is one, using the last known total.
    pub fn next_page(&mut self, total_pages: u32) {
        self.pager.next(total_pages);
    }

    pub fn previous_page(&mut self) {
        self.pager.previous();
    }

    pub async fn retry(&self) -> AgoraResult<()> {
        self.app.cache.refetch(&self.key()).await
    }

    pub fn observe(&self) -> AgoraResult<QueryObserver> {
        self.app.cache.observe(self.key())
    }

    pub fn actions(&self) -> PostActions {
        PostActions::new(self.app.clone())
    }

    fn width(&self) -> u32 {
        self.app.config.pagination.window_width
    }
}
