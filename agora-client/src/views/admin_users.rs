//! Admin user table: search, paging, role changes, deletion.

use agora_core::{
    AgoraError, AgoraResult, Role, UserPage, UserProfile, ValidationError,
};
use agora_query::{QueryKey, ReadOptions};

use super::helpers::{announce, fetcher, require_session, Fetch};
use crate::app::App;
use crate::keys::{self, affected};
use crate::pagination::{list_state, page_state, ListState};

const LOAD_FAILED: &str = "Failed to load users";

#[derive(Debug, Clone)]
pub struct AdminUsersView {
    app: App,
    search: String,
    page: u32,
}

impl AdminUsersView {
    pub fn new(app: App) -> Self {
        Self {
            app,
            search: String::new(),
            page: 1,
        }
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    /// A new search term starts over at page one.
    pub fn set_search(&mut self, search: &str) {
        let search = search.trim();
        if self.search != search {
            self.search = search.to_string();
            self.page = 1;
        }
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    fn page_size(&self) -> u32 {
        self.app.config.pagination.users_page_size
    }

    pub fn key(&self) -> QueryKey {
        keys::users_page(&self.search, self.page, self.page_size())
    }

    fn fetcher(&self) -> impl Fn() -> Fetch<UserPage> + Send + Sync + 'static {
        let (search, page, limit) = (self.search.clone(), self.page, self.page_size());
        fetcher(&self.app.api, move |api| {
            let search = search.clone();
            async move { api.list_users(&search, page, limit).await }
        })
    }

    pub fn read(&self) -> AgoraResult<ListState<UserProfile>> {
        let entry = self
            .app
            .cache
            .read(self.key(), self.fetcher(), ReadOptions::default())?;
        Ok(list_state(
            &entry,
            self.page,
            self.page_size(),
            self.app.config.pagination.window_width,
            LOAD_FAILED,
        ))
    }

    pub async fn load(&self) -> ListState<UserProfile> {
        match self
            .app
            .cache
            .fetch(self.key(), self.fetcher(), ReadOptions::default())
            .await
        {
            Ok(page) => page_state(
                page.as_ref(),
                self.page,
                self.page_size(),
                self.app.config.pagination.window_width,
            ),
            Err(err) => ListState::Failed {
                message: err.user_message(LOAD_FAILED),
            },
        }
    }

    pub async fn make_admin(&self, user: &UserProfile) -> AgoraResult<()> {
        require_session(&self.app, "manage users")?;
        let result = self
            .app
            .cache
            .mutate(self.app.api.make_admin(&user.id), &affected::user_changed())
            .await;
        announce(&self.app, result, "User promoted to admin", "Failed to make admin")
    }

    /// Admins cannot demote themselves.
    pub async fn remove_admin(&self, user: &UserProfile) -> AgoraResult<()> {
        let me = require_session(&self.app, "manage users")?;
        if me.email.eq_ignore_ascii_case(&user.email) {
            return Err(refused("You cannot remove your own admin role"));
        }
        let result = self
            .app
            .cache
            .mutate(self.app.api.remove_admin(&user.id), &affected::user_changed())
            .await;
        announce(&self.app, result, "Admin role removed", "Failed to remove admin")
    }

    /// Admin accounts cannot be deleted.
    pub async fn delete_user(&self, user: &UserProfile) -> AgoraResult<()> {
        require_session(&self.app, "manage users")?;
        if user.role == Role::Admin {
            return Err(refused("Admins cannot be deleted"));
        }
        let result = self
            .app
            .cache
            .mutate(self.app.api.delete_user(&user.id), &affected::user_changed())
            .await;
        announce(&self.app, result, "User deleted", "Failed to delete user")
    }
}

fn refused(reason: &str) -> AgoraError {
    ValidationError::InvalidValue {
        field: "user".to_string(),
        reason: reason.to_string(),
    }
    .into()
}
