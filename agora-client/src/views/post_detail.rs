//! Single post page and its comment thread.

use agora_core::{sort_comments, AgoraResult, Comment, CommentSort, Post, PostId};
use agora_query::{QueryKey, QueryObserver, ReadOptions};
use std::sync::Arc;

use super::helpers::{fetcher, Fetch, Loadable};
use super::interactions::PostActions;
use crate::app::App;
use crate::keys;

const LOAD_FAILED: &str = "Post not found.";

#[derive(Debug, Clone)]
pub struct PostDetailView {
    app: App,
    post_id: PostId,
    comment_sort: CommentSort,
}

impl PostDetailView {
    pub fn new(app: App, post_id: PostId) -> Self {
        Self {
            app,
            post_id,
            comment_sort: CommentSort::default(),
        }
    }

    pub fn post_id(&self) -> &PostId {
        &self.post_id
    }

    pub fn key(&self) -> QueryKey {
        keys::post(&self.post_id)
    }

    fn fetcher(&self) -> impl Fn() -> Fetch<Post> + Send + Sync + 'static {
        let post_id = self.post_id.clone();
        fetcher(&self.app.api, move |api| {
            let post_id = post_id.clone();
            async move { api.get_post(&post_id).await }
        })
    }

    pub fn read(&self) -> AgoraResult<Loadable<Post>> {
        let entry = self
            .app
            .cache
            .read(self.key(), self.fetcher(), ReadOptions::default())?;
        Ok(Loadable::from_entry(&entry, LOAD_FAILED))
    }

    pub async fn load(&self) -> AgoraResult<Arc<Post>> {
        self.app
            .cache
            .fetch(self.key(), self.fetcher(), ReadOptions::default())
            .await
    }

    pub async fn retry(&self) -> AgoraResult<()> {
        self.app.cache.refetch(&self.key()).await
    }

    pub fn observe(&self) -> AgoraResult<QueryObserver> {
        self.app.cache.observe(self.key())
    }

    pub fn comment_sort(&self) -> CommentSort {
        self.comment_sort
    }

    pub fn set_comment_sort(&mut self, sort: CommentSort) {
        self.comment_sort = sort;
    }

    /// The post's comments in the selected order.
    pub fn comments(&self, post: &Post) -> Vec<Comment> {
        sort_comments(&post.comments, self.comment_sort)
    }

    pub fn actions(&self) -> PostActions {
        PostActions::new(self.app.clone())
    }
}
