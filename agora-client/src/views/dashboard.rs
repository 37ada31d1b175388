//! Dashboard home: account summary and the latest posts.

use std::cmp::Reverse;

use agora_core::{AgoraResult, Badge, Post, PostQuota, RoleInfo};
use agora_query::ReadOptions;

use super::helpers::{account_email, fetch_post_count, fetch_role, fetcher};
use crate::app::App;
use crate::keys;
use crate::session::UserIdentity;

/// How many recent posts the dashboard shows.
pub const RECENT_POSTS: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary {
    pub identity: UserIdentity,
    pub role: RoleInfo,
    pub badge: Badge,
    pub post_count: u64,
    pub quota: PostQuota,
    pub recent_posts: Vec<Post>,
}

#[derive(Debug, Clone)]
pub struct DashboardView {
    app: App,
}

impl DashboardView {
    pub fn new(app: App) -> Self {
        Self { app }
    }

    pub async fn load(&self) -> AgoraResult<DashboardSummary> {
        let identity = self.app.session.require("view your dashboard")?;
        let email = account_email(&identity)?;
        let uid = identity.uid.clone();
        let posts = self.app.cache.fetch(
            keys::user_posts(&identity.uid),
            fetcher(&self.app.api, move |api| {
                let uid = uid.clone();
                async move { api.user_posts(&uid).await }
            }),
            ReadOptions::default(),
        );
        let (role, count, posts) = tokio::try_join!(
            fetch_role(&self.app, &email),
            fetch_post_count(&self.app, &identity.uid),
            posts
        )?;

        Ok(DashboardSummary {
            badge: role.subscription.badge(),
            quota: PostQuota::evaluate(count.count, &role),
            post_count: count.count,
            recent_posts: most_recent(&posts, RECENT_POSTS),
            role: role.as_ref().clone(),
            identity,
        })
    }
}

/// Newest first; undated posts sort last and keep server order among
/// themselves.
fn most_recent(posts: &[Post], limit: usize) -> Vec<Post> {
    let mut sorted = posts.to_vec();
    sorted.sort_by_key(|p| Reverse(p.created_at));
    sorted.truncate(limit);
    sorted
}
