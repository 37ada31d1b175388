use agora_core::{AgoraResult, Connection, PublicUser};
use reqwest::Method;

use super::ApiClient;
use crate::types::{ConnectionRequestBody, PublicUserQuery};

impl ApiClient {
    /// Member directory filtered by `search`.
    pub async fn public_users(&self, search: &str) -> AgoraResult<Vec<PublicUser>> {
        let query = PublicUserQuery {
            search: search.trim().to_string(),
        };
        self.get_json(&["public-users"], Some(&query)).await
    }

    /// Requests sent or received by `email`, which must already be normalized.
    pub async fn connections(&self, email: &str) -> AgoraResult<Vec<Connection>> {
        self.get_json::<_, ()>(&["connections", email], None).await
    }

    pub async fn send_connection_request(&self, body: &ConnectionRequestBody) -> AgoraResult<()> {
        self.send_unit(Method::POST, &["connections"], Some(body)).await
    }
}
