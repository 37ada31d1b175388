use agora_core::{AdminStats, AgoraResult, EntityIdType, RoleInfo, UserId, UserPage};
use reqwest::Method;

use super::{ApiClient, NO_BODY};
use crate::types::{NewUserBody, ProfileUpdateBody, UserListQuery};

impl ApiClient {
    pub async fn create_user(&self, body: &NewUserBody) -> AgoraResult<()> {
        self.send_unit(Method::POST, &["users"], Some(body)).await
    }

    pub async fn list_users(&self, search: &str, page: u32, limit: u32) -> AgoraResult<UserPage> {
        let query = UserListQuery {
            search: search.trim().to_string(),
            page,
            limit,
        };
        self.get_json(&["users"], Some(&query)).await
    }

    /// The whole user table (first page with the server's default limit).
    pub async fn all_users(&self) -> AgoraResult<UserPage> {
        self.get_json::<_, ()>(&["users"], None).await
    }

    /// Role and subscription for `email`, which must already be normalized.
    pub async fn role(&self, email: &str) -> AgoraResult<RoleInfo> {
        self.get_json::<_, ()>(&["users", "role", email], None).await
    }

    pub async fn make_admin(&self, user_id: &UserId) -> AgoraResult<()> {
        self.send_unit(Method::PATCH, &["users", "make-admin", user_id.as_str()], NO_BODY)
            .await
    }

    pub async fn remove_admin(&self, user_id: &UserId) -> AgoraResult<()> {
        self.send_unit(Method::PATCH, &["users", "remove-admin", user_id.as_str()], NO_BODY)
            .await
    }

    pub async fn delete_user(&self, user_id: &UserId) -> AgoraResult<()> {
        self.send_unit(Method::DELETE, &["users", user_id.as_str()], NO_BODY)
            .await
    }

    pub async fn update_profile(&self, body: &ProfileUpdateBody) -> AgoraResult<()> {
        self.send_unit(Method::PUT, &["users", "update"], Some(body)).await
    }

    pub async fn admin_stats(&self) -> AgoraResult<AdminStats> {
        self.get_json::<_, ()>(&["admin", "profile"], None).await
    }
}
