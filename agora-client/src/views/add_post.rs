//! "Add post" form: quota check, optional photo, submission.

use std::sync::Arc;

use agora_core::{
    AgoraResult, PostDraft, PostQuota, Tag, PLACEHOLDER_AUTHOR_IMAGE,
};
use agora_query::ReadOptions;
use chrono::Utc;

use super::helpers::{
    account_email, announce, fetch_post_count, fetch_role, fetcher, report_failure,
    require_session,
};
use crate::app::App;
use crate::keys::{self, affected};
use crate::nav::Route;
use crate::types::NewPostBody;
use crate::upload::ImageFile;

#[derive(Debug, Clone)]
pub struct AddPostView {
    app: App,
    photo_url: Option<String>,
}

impl AddPostView {
    pub fn new(app: App) -> Self {
        Self {
            app,
            photo_url: None,
        }
    }

    /// Tags offered in the tag picker.
    pub async fn tags(&self) -> AgoraResult<Arc<Vec<Tag>>> {
        self.app
            .cache
            .fetch(
                keys::tags(),
                fetcher(&self.app.api, |api| async move { api.list_tags().await }),
                ReadOptions::default(),
            )
            .await
    }

    /// How many more posts the signed-in account may create.
    pub async fn quota(&self) -> AgoraResult<PostQuota> {
        let user = self.app.session.require("add a post")?;
        let email = account_email(&user)?;
        let (role, count) = tokio::try_join!(
            fetch_role(&self.app, &email),
            fetch_post_count(&self.app, &user.uid)
        )?;
        Ok(PostQuota::evaluate(count.count, &role))
    }

    pub fn photo_url(&self) -> Option<&str> {
        self.photo_url.as_deref()
    }

    /// Validate and upload the (already cropped) photo, remembering its URL.
    pub async fn upload_photo(&mut self, image: ImageFile) -> AgoraResult<String> {
        require_session(&self.app, "upload a photo")?;
        image.validate(self.app.config.upload.max_bytes)?;
        match self.app.uploader.upload(image).await {
            Ok(url) => {
                self.photo_url = Some(url.clone());
                Ok(url)
            }
            Err(err) => {
                report_failure(&self.app, &err, "Failed to upload photo");
                Err(err)
            }
        }
    }

    pub fn remove_photo(&mut self) {
        self.photo_url = None;
    }

    /// Create the post. Blank fields and an exhausted quota fail before any
    /// write; success returns to the dashboard.
    pub async fn submit(&mut self, draft: &PostDraft) -> AgoraResult<()> {
        let user = require_session(&self.app, "add a post")?;
        let draft = draft.validate()?;
        self.quota().await?.ensure_allows_post()?;

        let body = NewPostBody {
            author_image: user
                .photo_url
                .clone()
                .unwrap_or_else(|| PLACEHOLDER_AUTHOR_IMAGE.to_string()),
            author_name: user.display_name_or_default().to_string(),
            author_email: user.email.clone(),
            post_title: draft.title,
            post_description: draft.description,
            post_photo: self.photo_url.clone().unwrap_or_default(),
            tag: draft.tag,
            up_vote: 0,
            down_vote: 0,
            user_id: user.uid.clone(),
            created_at: Utc::now(),
        };

        let result = self
            .app
            .cache
            .mutate(
                self.app.api.create_post(&user.uid, &body),
                &affected::post_created(&user.uid),
            )
            .await;
        announce(&self.app, result, "Post created successfully!", "Failed to create post")?;
        self.photo_url = None;
        self.app.events.navigate(Route::DashboardHome);
        Ok(())
    }
}
