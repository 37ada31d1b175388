//! Report enrichment for the moderation queue.
//!
//! A report only references a post and a comment by id. Moderators need the
//! post title, the comment text and the commenter's account, so reports are
//! joined against the post and user lists fetched alongside them.

use crate::entities::{Post, Report, UserProfile};
use crate::identity::UserId;

pub const POST_NOT_FOUND: &str = "Post not found";
pub const COMMENT_NOT_FOUND: &str = "Comment not found";
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// A report joined with the content it points at.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedReport {
    pub report: Report,
    pub post_title: String,
    pub comment_text: String,
    pub commented_by_name: String,
    pub commented_by_email: String,
    /// Account that wrote the comment; `None` when it could not be resolved,
    /// in which case the "ban" action is unavailable.
    pub commented_user_id: Option<UserId>,
}

impl EnrichedReport {
    pub fn can_ban(&self) -> bool {
        self.commented_user_id.is_some()
    }
}

/// Join each report with its post, comment and commenter.
pub fn enrich_reports(
    reports: &[Report],
    posts: &[Post],
    users: &[UserProfile],
) -> Vec<EnrichedReport> {
    reports
        .iter()
        .map(|report| enrich_report(report, posts, users))
        .collect()
}

fn enrich_report(report: &Report, posts: &[Post], users: &[UserProfile]) -> EnrichedReport {
    let post = posts.iter().find(|p| p.id == report.post_id);
    let comment = post.and_then(|p| p.comment(&report.comment_id));
    let commenter = comment
        .and_then(|c| c.user_email.as_deref())
        .and_then(|email| {
            users
                .iter()
                .find(|u| u.email.eq_ignore_ascii_case(email))
        });

    EnrichedReport {
        report: report.clone(),
        post_title: post
            .map(|p| p.title.clone())
            .unwrap_or_else(|| POST_NOT_FOUND.to_string()),
        comment_text: comment
            .map(|c| c.text.clone())
            .unwrap_or_else(|| COMMENT_NOT_FOUND.to_string()),
        commented_by_name: comment
            .and_then(|c| c.user_name.clone())
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
        commented_by_email: comment
            .and_then(|c| c.user_email.clone())
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
        commented_user_id: commenter.map(|u| u.id.clone()),
    }
}
