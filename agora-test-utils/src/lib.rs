//! Agora Test Utilities
//!
//! Shared test infrastructure for the Agora workspace:
//! - An in-process HTTP backend speaking the Agora REST API
//! - Proptest generators for entity types
//! - Fixtures for common scenarios
//! - Assertions over the error taxonomy

pub mod backend;

pub use backend::{bearer_for, BackendStore, TestBackend};

// Re-export core types for convenience
pub use agora_core::{
    AgoraError, AgoraResult, Announcement, AnnouncementId, ApiError, AuthError, AuthUid, Comment,
    CommentId, Connection, ConnectionStatus, Notification, NotificationId, Post, PostId, Reply,
    ReplyId, Report, ReportId, Role, Subscription, Tag, Timestamp, UserId, UserProfile,
    ValidationError,
};

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    use super::*;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    /// Timestamps within a year after 2024-01-01.
    pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
        (0i64..31_536_000).prop_map(|secs| {
            Utc.timestamp_opt(1_704_067_200 + secs, 0)
                .single()
                .unwrap_or_else(Utc::now)
        })
    }

    pub fn arb_post_id() -> impl Strategy<Value = PostId> {
        "[a-f0-9]{24}".prop_map(PostId::new)
    }

    pub fn arb_comment_id() -> impl Strategy<Value = CommentId> {
        "[a-f0-9]{24}".prop_map(CommentId::new)
    }

    pub fn arb_email() -> impl Strategy<Value = String> {
        ("[a-z]{1,10}", "[a-z]{2,8}").prop_map(|(user, domain)| format!("{user}@{domain}.test"))
    }

    pub fn arb_role() -> impl Strategy<Value = Role> {
        prop_oneof![Just(Role::User), Just(Role::Admin)]
    }

    pub fn arb_subscription() -> impl Strategy<Value = Subscription> {
        prop_oneof![Just(Subscription::Free), Just(Subscription::Premium)]
    }

    /// Comments with random votes; about one in ten has no timestamp.
    pub fn arb_comment() -> impl Strategy<Value = Comment> {
        (
            arb_comment_id(),
            "[A-Za-z ]{1,40}",
            0i64..100,
            0i64..100,
            prop::option::weighted(0.9, arb_timestamp()),
        )
            .prop_map(|(id, text, up_vote, down_vote, created_at)| Comment {
                id,
                text,
                user_name: None,
                user_email: None,
                user_image: None,
                up_vote,
                down_vote,
                replies: Vec::new(),
                created_at,
            })
    }

    pub fn arb_post() -> impl Strategy<Value = Post> {
        (
            arb_post_id(),
            "[A-Za-z ]{1,60}",
            0i64..500,
            0i64..500,
            prop::collection::vec(arb_comment(), 0..8),
            arb_timestamp(),
        )
            .prop_map(|(id, title, up_vote, down_vote, comments, created_at)| Post {
                id,
                author_id: None,
                author_name: None,
                author_email: None,
                author_image: None,
                title,
                description: String::new(),
                photo: None,
                tag: None,
                up_vote,
                down_vote,
                comments,
                created_at: Some(created_at),
            })
    }

    pub fn arb_user() -> impl Strategy<Value = UserProfile> {
        (
            "[a-f0-9]{24}",
            arb_email(),
            arb_role(),
            arb_subscription(),
        )
            .prop_map(|(id, email, role, subscription)| UserProfile {
                id: UserId::new(id),
                name: Some(email.split('@').next().unwrap_or_default().to_string()),
                email,
                photo: None,
                role,
                subscription,
                created_at: None,
            })
    }

    /// `(current, total, width)` for page selectors: width is odd and at
    /// least 3, current may overshoot the last page.
    pub fn arb_page_geometry() -> impl Strategy<Value = (u32, u32, u32)> {
        (0u32..200, 1u32..5).prop_flat_map(|(total, half)| {
            (0u32..=total + 2, Just(total), Just(half * 2 + 1))
        })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    /// 2024-01-01T00:00:00Z shifted by `minutes`.
    pub fn at(minutes: i64) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .map(|base| base + Duration::minutes(minutes))
            .unwrap_or_else(Utc::now)
    }

    pub fn post(id: &str, title: &str) -> Post {
        Post {
            id: PostId::new(id),
            author_id: None,
            author_name: Some("Test Author".to_string()),
            author_email: Some("author@example.com".to_string()),
            author_image: None,
            title: title.to_string(),
            description: format!("About {title}"),
            photo: None,
            tag: Some("general".to_string()),
            up_vote: 0,
            down_vote: 0,
            comments: Vec::new(),
            created_at: Some(at(0)),
        }
    }

    /// A post authored by `uid`, created `minutes` after the epoch above.
    pub fn post_by(id: &str, uid: &AuthUid, minutes: i64) -> Post {
        Post {
            author_id: Some(uid.clone()),
            created_at: Some(at(minutes)),
            ..post(id, &format!("Post {id}"))
        }
    }

    pub fn tagged_post(id: &str, tag: &str) -> Post {
        Post {
            tag: Some(tag.to_string()),
            ..post(id, &format!("About {tag}"))
        }
    }

    pub fn voted_post(id: &str, up_vote: i64, down_vote: i64) -> Post {
        Post {
            up_vote,
            down_vote,
            ..post(id, &format!("Post {id}"))
        }
    }

    /// `count` posts, `p1` oldest.
    pub fn numbered_posts(count: usize) -> Vec<Post> {
        (1..=count)
            .map(|n| Post {
                created_at: Some(at(n as i64)),
                ..post(&format!("p{n}"), &format!("Post {n}"))
            })
            .collect()
    }

    pub fn comment(id: &str, text: &str, up_vote: i64, down_vote: i64, minutes: i64) -> Comment {
        Comment {
            id: CommentId::new(id),
            text: text.to_string(),
            user_name: Some("Commenter".to_string()),
            user_email: Some("commenter@example.com".to_string()),
            user_image: None,
            up_vote,
            down_vote,
            replies: Vec::new(),
            created_at: Some(at(minutes)),
        }
    }

    pub fn commented_post(id: &str, comments: Vec<Comment>) -> Post {
        Post {
            comments,
            ..post(id, &format!("Post {id}"))
        }
    }

    pub fn user(id: &str, email: &str) -> UserProfile {
        UserProfile {
            id: UserId::new(id),
            name: email.split('@').next().map(str::to_string),
            email: email.to_string(),
            photo: None,
            role: Role::User,
            subscription: Subscription::Free,
            created_at: Some(at(0)),
        }
    }

    pub fn admin(id: &str, email: &str) -> UserProfile {
        UserProfile {
            role: Role::Admin,
            ..user(id, email)
        }
    }

    pub fn premium(id: &str, email: &str) -> UserProfile {
        UserProfile {
            subscription: Subscription::Premium,
            ..user(id, email)
        }
    }

    pub fn report(id: &str, post_id: &str, comment_id: &str) -> Report {
        Report {
            id: ReportId::new(id),
            post_id: PostId::new(post_id),
            comment_id: CommentId::new(comment_id),
            reporter_email: Some("reporter@example.com".to_string()),
            feedback: "Spam".to_string(),
            created_at: Some(at(0)),
        }
    }

    pub fn tag(name: &str) -> Tag {
        Tag {
            name: name.to_string(),
        }
    }

    pub fn announcement(id: &str, title: &str) -> Announcement {
        Announcement {
            id: AnnouncementId::new(id),
            author_name: Some("Admin".to_string()),
            author_image: None,
            title: title.to_string(),
            description: format!("{title} details"),
            created_at: Some(at(0)),
        }
    }

    pub fn notification(id: &str, email: &str, read: bool) -> Notification {
        Notification {
            id: NotificationId::new(id),
            email: Some(email.to_string()),
            message: format!("Notification {id}"),
            read,
            announcement_id: None,
            created_at: Some(at(0)),
        }
    }

    pub fn connection(from: &str, to: &str, status: ConnectionStatus) -> Connection {
        Connection {
            from_email: from.to_string(),
            to_email: to.to_string(),
            status,
            created_at: Some(at(0)),
        }
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    use super::*;

    pub fn assert_not_signed_in<T: std::fmt::Debug>(result: &AgoraResult<T>) {
        assert!(
            matches!(result, Err(AgoraError::Auth(AuthError::NotSignedIn { .. }))),
            "Expected NotSignedIn, got {:?}",
            result
        );
    }

    pub fn assert_validation_error<T: std::fmt::Debug>(result: &AgoraResult<T>) {
        assert!(
            matches!(result, Err(AgoraError::Validation(_))),
            "Expected a validation error, got {:?}",
            result
        );
    }

    pub fn assert_forbidden<T: std::fmt::Debug>(result: &AgoraResult<T>) {
        assert!(
            matches!(result, Err(AgoraError::Forbidden { .. })),
            "Expected Forbidden, got {:?}",
            result
        );
    }

    pub fn assert_not_found<T: std::fmt::Debug>(result: &AgoraResult<T>, resource: &str) {
        match result {
            Err(AgoraError::NotFound { resource: actual }) => assert_eq!(actual, resource),
            other => panic!("Expected NotFound({}), got {:?}", resource, other),
        }
    }

    pub fn assert_server_status<T: std::fmt::Debug>(result: &AgoraResult<T>, status: u16) {
        match result {
            Err(AgoraError::Api(ApiError::Server { status: actual, .. })) => {
                assert_eq!(*actual, status)
            }
            other => panic!("Expected HTTP {}, got {:?}", status, other),
        }
    }
}
