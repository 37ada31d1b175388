//! Entity types returned by the Agora REST backend.
//!
//! Field names follow the backend's camelCase JSON. Counters and collections
//! default to zero/empty because older documents omit them.

use crate::enums::{Role, Subscription};
use crate::identity::{
    AnnouncementId, AuthUid, CommentId, NotificationId, PostId, ReplyId, ReportId, Timestamp,
    UserId,
};
use serde::{Deserialize, Serialize};

/// Placeholder used when a commenter has no avatar.
pub const PLACEHOLDER_AVATAR: &str = "https://placehold.co/40x40";
/// Placeholder used when a post author has no avatar.
pub const PLACEHOLDER_AUTHOR_IMAGE: &str = "https://placehold.co/100x100";
/// Placeholder used when a post photo fails to load.
pub const PLACEHOLDER_POST_IMAGE: &str = "https://placehold.co/150x150";
/// Display name used when the author is unknown.
pub const ANONYMOUS: &str = "Anonymous";
/// Tag shown on posts that were created without one.
pub const DEFAULT_TAG: &str = "Lifestyle";

fn non_blank_or<'a>(value: &'a Option<String>, fallback: &'a str) -> &'a str {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => v,
        _ => fallback,
    }
}

/// A forum post with its embedded comment thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: PostId,
    #[serde(default, alias = "userId")]
    pub author_id: Option<AuthUid>,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub author_email: Option<String>,
    #[serde(default)]
    pub author_image: Option<String>,
    #[serde(rename = "postTitle")]
    pub title: String,
    #[serde(rename = "postDescription", default)]
    pub description: String,
    #[serde(rename = "postPhoto", default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub up_vote: i64,
    #[serde(default)]
    pub down_vote: i64,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

impl Post {
    pub fn author_display_name(&self) -> &str {
        non_blank_or(&self.author_name, ANONYMOUS)
    }

    pub fn author_image_or_placeholder(&self) -> &str {
        non_blank_or(&self.author_image, PLACEHOLDER_AUTHOR_IMAGE)
    }

    pub fn tag_or_default(&self) -> &str {
        non_blank_or(&self.tag, DEFAULT_TAG)
    }

    pub fn comment(&self, comment_id: &CommentId) -> Option<&Comment> {
        self.comments.iter().find(|c| &c.id == comment_id)
    }

    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }
}

/// A comment on a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: CommentId,
    #[serde(alias = "comment")]
    pub text: String,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub user_image: Option<String>,
    #[serde(default)]
    pub up_vote: i64,
    #[serde(default)]
    pub down_vote: i64,
    #[serde(default)]
    pub replies: Vec<Reply>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

impl Comment {
    pub fn author_display_name(&self) -> &str {
        non_blank_or(&self.user_name, ANONYMOUS)
    }

    pub fn avatar_or_placeholder(&self) -> &str {
        non_blank_or(&self.user_image, PLACEHOLDER_AVATAR)
    }
}

/// A reply to a comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    #[serde(rename = "_id")]
    pub id: ReplyId,
    #[serde(alias = "reply")]
    pub text: String,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub user_image: Option<String>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

/// A user record as seen by administrators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: UserId,
    #[serde(default, alias = "username")]
    pub name: Option<String>,
    pub email: String,
    #[serde(default, alias = "photoURL")]
    pub photo: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub subscription: Subscription,
    #[serde(default, alias = "created_at")]
    pub created_at: Option<Timestamp>,
}

/// Role lookup result for the signed-in account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleInfo {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub subscription: Subscription,
    #[serde(default, alias = "username")]
    pub name: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
}

impl Default for RoleInfo {
    fn default() -> Self {
        Self {
            email: None,
            role: Role::User,
            subscription: Subscription::Free,
            name: None,
            photo: None,
        }
    }
}

/// A topic tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
}

/// A user report against a comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(rename = "_id")]
    pub id: ReportId,
    pub post_id: PostId,
    pub comment_id: CommentId,
    #[serde(default)]
    pub reporter_email: Option<String>,
    #[serde(default)]
    pub feedback: String,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

/// A site-wide announcement published by an admin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    #[serde(rename = "_id")]
    pub id: AnnouncementId,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub author_image: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

/// A per-user notification, usually fanned out from an announcement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(rename = "_id")]
    pub id: NotificationId,
    #[serde(default, alias = "userEmail")]
    pub email: Option<String>,
    pub message: String,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub announcement_id: Option<AnnouncementId>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

/// One page of the post feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub total_count: u64,
}

/// One page of the admin user table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPage {
    pub users: Vec<UserProfile>,
    pub total_count: u64,
}

/// One page of the report queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPage {
    pub reports: Vec<Report>,
    pub total_count: u64,
}

/// Number of posts authored by one account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostCount {
    pub count: u64,
}

/// Site-wide totals for the admin profile page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub total_posts: u64,
    #[serde(default)]
    pub total_comments: u64,
    #[serde(default)]
    pub total_users: u64,
    #[serde(default)]
    pub total_up_votes: u64,
    #[serde(default)]
    pub total_down_votes: u64,
    #[serde(default)]
    pub total_reports: u64,
    #[serde(default)]
    pub total_notifications: u64,
}
