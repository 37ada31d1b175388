//! Request bodies and query parameters, one per endpoint that takes input.

use agora_core::{AuthUid, PostSort, Role, Subscription, Timestamp};
use serde::{Deserialize, Serialize};

/// `GET /posts?sort&page&limit`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostListQuery {
    pub sort: PostSort,
    pub page: u32,
    pub limit: u32,
}

/// `GET /posts/search?tag=`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagSearchQuery {
    pub tag: String,
}

/// `GET /users?search&page&limit`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserListQuery {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub search: String,
    pub page: u32,
    pub limit: u32,
}

/// `GET /public-users?search=`, sent even when the search is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicUserQuery {
    pub search: String,
}

/// `GET /reports?page&limit`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageQuery {
    pub page: u32,
    pub limit: u32,
}

/// `GET /notifications/:email?all=true`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NotificationQuery {
    pub all: bool,
}

/// `POST /post/:id/comment`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentBody {
    pub comment: String,
    pub user_name: String,
    pub user_image: String,
    pub user_email: String,
}

/// `POST /post/:id/comment/:cid/reply`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyBody {
    pub reply: String,
    pub user_name: String,
    pub user_image: String,
    pub user_email: String,
}

/// `POST /post/:id/comment/:cid/report`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportBody {
    pub feedback: String,
}

/// `POST /user/post/:uid`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPostBody {
    pub author_image: String,
    pub author_name: String,
    pub author_email: String,
    pub post_title: String,
    pub post_description: String,
    pub post_photo: String,
    pub tag: String,
    pub up_vote: i64,
    pub down_vote: i64,
    pub user_id: AuthUid,
    pub created_at: Timestamp,
}

/// `POST /users`, sent once after registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUserBody {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    pub role: Role,
    pub subscription: Subscription,
    pub created_at: Timestamp,
}

/// `POST /tags`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTagBody {
    pub name: String,
}

/// `PUT /users/update`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdateBody {
    pub email: String,
    pub updates: ProfileFields,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "photoURL", skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

/// `POST /create-payment-intent`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntentBody {
    pub price: u32,
}

/// `POST /user/membership/upgrade`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeBody {
    pub payment_intent_id: String,
    pub subscription: Subscription,
}

/// `POST /connections`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRequestBody {
    pub from_email: String,
    pub to_email: String,
}

/// Fields of the multipart `POST /announcements` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAnnouncement {
    pub author_name: String,
    pub title: String,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_post_list_query_encoding() {
        let query = PostListQuery {
            sort: PostSort::Popular,
            page: 2,
            limit: 5,
        };
        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            json!({"sort": "popular", "page": 2, "limit": 5})
        );
    }

    #[test]
    fn test_comment_body_field_names() {
        let body = CommentBody {
            comment: "Nice".to_string(),
            user_name: "Ada".to_string(),
            user_image: "img".to_string(),
            user_email: "ada@example.com".to_string(),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["comment"], "Nice");
        assert_eq!(value["userEmail"], "ada@example.com");
    }

    #[test]
    fn test_profile_update_body() {
        let body = ProfileUpdateBody {
            email: "ada@example.com".to_string(),
            updates: ProfileFields {
                name: Some("Ada".to_string()),
                photo_url: None,
            },
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"email": "ada@example.com", "updates": {"name": "Ada"}})
        );
    }

    #[test]
    fn test_upgrade_body() {
        let body = UpgradeBody {
            payment_intent_id: "pi_1".to_string(),
            subscription: Subscription::Premium,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"paymentIntentId": "pi_1", "subscription": "premium"})
        );
    }
}
