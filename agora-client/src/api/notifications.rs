use agora_core::{AgoraResult, EntityIdType, Notification, NotificationId};
use reqwest::Method;

use super::{ApiClient, NO_BODY};
use crate::types::NotificationQuery;

impl ApiClient {
    /// Unread notifications for `email`, or every notification with `all`.
    pub async fn notifications(&self, email: &str, all: bool) -> AgoraResult<Vec<Notification>> {
        if all {
            self.get_json(&["notifications", email], Some(&NotificationQuery { all }))
                .await
        } else {
            self.get_json::<_, ()>(&["notifications", email], None).await
        }
    }

    pub async fn mark_notification_read(&self, id: &NotificationId) -> AgoraResult<()> {
        self.send_unit(Method::PATCH, &["notifications", id.as_str(), "read"], NO_BODY)
            .await
    }

    pub async fn mark_all_notifications_read(&self, email: &str) -> AgoraResult<()> {
        self.send_unit(Method::PATCH, &["notifications", email, "read-all"], NO_BODY)
            .await
    }
}
