//! The signed-in user's own posts.

use std::sync::Arc;

use agora_core::{AgoraResult, Post, PostId};
use agora_query::ReadOptions;

use super::helpers::{announce, fetcher, require_session};
use crate::app::App;
use crate::keys::{self, affected};

#[derive(Debug, Clone)]
pub struct MyPostsView {
    app: App,
}

impl MyPostsView {
    pub fn new(app: App) -> Self {
        Self { app }
    }

    pub async fn load(&self) -> AgoraResult<Arc<Vec<Post>>> {
        let user = self.app.session.require("view your posts")?;
        let uid = user.uid.clone();
        self.app
            .cache
            .fetch(
                keys::user_posts(&user.uid),
                fetcher(&self.app.api, move |api| {
                    let uid = uid.clone();
                    async move { api.user_posts(&uid).await }
                }),
                ReadOptions::default(),
            )
            .await
    }

    pub async fn delete(&self, post_id: &PostId) -> AgoraResult<()> {
        let user = require_session(&self.app, "delete posts")?;
        let result = self
            .app
            .cache
            .mutate(
                self.app.api.delete_post(post_id),
                &affected::post_deleted(post_id, &user.uid),
            )
            .await;
        announce(&self.app, result, "Post deleted successfully!", "Failed to delete post")
    }
}
