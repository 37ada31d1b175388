use agora_core::{AgoraResult, Tag};
use reqwest::Method;

use super::{ApiClient, NO_BODY};
use crate::types::NewTagBody;

impl ApiClient {
    pub async fn list_tags(&self) -> AgoraResult<Vec<Tag>> {
        self.get_json::<_, ()>(&["tags"], None).await
    }

    pub async fn add_tag(&self, name: &str) -> AgoraResult<()> {
        let body = NewTagBody {
            name: name.to_string(),
        };
        self.send_unit(Method::POST, &["tags"], Some(&body)).await
    }

    pub async fn delete_tag(&self, name: &str) -> AgoraResult<()> {
        self.send_unit(Method::DELETE, &["tags", name], NO_BODY).await
    }
}
