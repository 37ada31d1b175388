//! Vote, comment, reply and report actions shared by every post view.
//!
//! Each action needs a session: without one it toasts a login prompt and
//! returns before any request is made. Text is validated locally. A vote,
//! comment or reply invalidates the post's detail key and every list that
//! can contain the post; a report only touches the moderation queue.

use agora_core::{
    require_text, AgoraResult, CommentId, PostId, VoteDirection, PLACEHOLDER_AVATAR,
};

use super::helpers::{announce, report_failure, require_session};
use crate::app::App;
use crate::keys::{self, affected};
use crate::types::{CommentBody, ReplyBody, ReportBody};

#[derive(Debug, Clone)]
pub struct PostActions {
    app: App,
}

impl PostActions {
    pub fn new(app: App) -> Self {
        Self { app }
    }

    pub async fn vote_post(&self, post_id: &PostId, direction: VoteDirection) -> AgoraResult<()> {
        require_session(&self.app, direction.verb())?;
        let result = self
            .app
            .cache
            .mutate(
                self.app.api.vote_post(post_id, direction),
                &affected::post_content(post_id),
            )
            .await;
        if let Err(err) = &result {
            report_failure(&self.app, err, &format!("Failed to {} post.", direction.verb()));
        }
        result
    }

    pub async fn vote_comment(
        &self,
        post_id: &PostId,
        comment_id: &CommentId,
        direction: VoteDirection,
    ) -> AgoraResult<()> {
        require_session(&self.app, &format!("{} comments", direction.verb()))?;
        let result = self
            .app
            .cache
            .mutate(
                self.app.api.vote_comment(post_id, comment_id, direction),
                &affected::post_content(post_id),
            )
            .await;
        if let Err(err) = &result {
            report_failure(&self.app, err, &format!("Failed to {} comment.", direction.verb()));
        }
        result
    }

    pub async fn comment(&self, post_id: &PostId, text: &str) -> AgoraResult<()> {
        let user = require_session(&self.app, "comment")?;
        let body = CommentBody {
            comment: require_text("comment", text)?.to_string(),
            user_name: user.display_name_or_default().to_string(),
            user_image: user
                .photo_url
                .clone()
                .unwrap_or_else(|| PLACEHOLDER_AVATAR.to_string()),
            user_email: user.email.clone(),
        };
        let result = self
            .app
            .cache
            .mutate(
                self.app.api.add_comment(post_id, &body),
                &affected::post_content(post_id),
            )
            .await;
        announce(&self.app, result, "Comment added successfully!", "Failed to add comment.")
    }

    pub async fn reply(&self, post_id: &PostId, comment_id: &CommentId, text: &str) -> AgoraResult<()> {
        let user = require_session(&self.app, "reply")?;
        let body = ReplyBody {
            reply: require_text("reply", text)?.to_string(),
            user_name: user.display_name_or_default().to_string(),
            user_image: user
                .photo_url
                .clone()
                .unwrap_or_else(|| PLACEHOLDER_AVATAR.to_string()),
            user_email: user.email.clone(),
        };
        let result = self
            .app
            .cache
            .mutate(
                self.app.api.add_reply(post_id, comment_id, &body),
                &affected::post_content(post_id),
            )
            .await;
        announce(&self.app, result, "Reply added successfully!", "Failed to add reply.")
    }

    pub async fn report(&self, post_id: &PostId, comment_id: &CommentId, feedback: &str) -> AgoraResult<()> {
        require_session(&self.app, "report comments")?;
        let body = ReportBody {
            feedback: require_text("feedback", feedback)?.to_string(),
        };
        let result = self
            .app
            .cache
            .mutate(
                self.app.api.report_comment(post_id, comment_id, &body),
                &[keys::reports(), keys::admin_stats()],
            )
            .await;
        announce(&self.app, result, "Comment reported.", "Failed to report comment.")
    }
}
