use agora_core::{AgoraResult, Announcement, AnnouncementId, EntityIdType, UploadError};
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::Deserialize;

use super::{ApiClient, NO_BODY};
use crate::types::NewAnnouncement;
use crate::upload::ImageFile;

/// Result of `POST /announcements`: how many users were notified.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AnnouncementCreated {
    #[serde(default)]
    pub notifications: NotificationFanout,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct NotificationFanout {
    #[serde(default)]
    pub success: u64,
    #[serde(default)]
    pub failed: u64,
}

impl ApiClient {
    pub async fn list_announcements(&self) -> AgoraResult<Vec<Announcement>> {
        self.get_json::<_, ()>(&["announcements"], None).await
    }

    /// Multipart create; the author image travels as the `authorImage` file.
    pub async fn create_announcement(
        &self,
        announcement: &NewAnnouncement,
        author_image: ImageFile,
    ) -> AgoraResult<AnnouncementCreated> {
        let image = Part::bytes(author_image.bytes)
            .file_name(author_image.file_name)
            .mime_str(&author_image.content_type)
            .map_err(|e| UploadError::Failed {
                reason: e.to_string(),
            })?;
        let form = Form::new()
            .text("authorName", announcement.author_name.clone())
            .text("title", announcement.title.clone())
            .text("description", announcement.description.clone())
            .part("authorImage", image);
        self.post_multipart(&["announcements"], form).await
    }

    pub async fn delete_announcement(&self, id: &AnnouncementId) -> AgoraResult<()> {
        self.send_unit(Method::DELETE, &["announcements", id.as_str()], NO_BODY)
            .await
    }
}
