//! Image validation and upload to the image host.

use agora_core::{validate_image, AgoraResult, UploadError};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::config::UploadConfig;

/// An image picked by the user, already cropped by the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub file_name: String,
}

impl ImageFile {
    pub fn new(bytes: Vec<u8>, content_type: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            bytes,
            content_type: content_type.into(),
            file_name: file_name.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Check type and size against `max_bytes` before any upload.
    pub fn validate(&self, max_bytes: usize) -> Result<(), UploadError> {
        validate_image(&self.content_type, self.size(), max_bytes)
    }
}

#[async_trait]
pub trait ImageUploader: Send + Sync + 'static {
    /// Upload the image and return its public URL.
    async fn upload(&self, image: ImageFile) -> AgoraResult<String>;
}

/// Uploader for an imgbb-style host: multipart field `image`, API key in the
/// query string, URL returned under `data`.
#[derive(Debug, Clone)]
pub struct HostedImageUploader {
    client: Client,
    endpoint: Url,
    max_bytes: usize,
}

#[derive(Debug, Deserialize)]
struct HostResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    data: Option<HostData>,
    #[serde(default)]
    error: Option<HostError>,
}

#[derive(Debug, Deserialize)]
struct HostData {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    display_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HostError {
    #[serde(default)]
    message: Option<String>,
}

impl HostedImageUploader {
    pub fn new(client: Client, config: &UploadConfig) -> Result<Self, UploadError> {
        let mut endpoint = Url::parse(&config.endpoint).map_err(|e| UploadError::Failed {
            reason: format!("invalid upload endpoint: {}", e),
        })?;
        if let Some(key) = &config.api_key {
            endpoint.query_pairs_mut().append_pair("key", key);
        }
        Ok(Self {
            client,
            endpoint,
            max_bytes: config.max_bytes,
        })
    }
}

#[async_trait]
impl ImageUploader for HostedImageUploader {
    async fn upload(&self, image: ImageFile) -> AgoraResult<String> {
        image.validate(self.max_bytes)?;
        let size = image.size();
        let part = Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(&image.content_type)
            .map_err(|e| UploadError::Failed {
                reason: e.to_string(),
            })?;
        let form = Form::new().part("image", part);

        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadError::Failed {
                reason: e.to_string(),
            })?;

        let status = response.status();
        let body: HostResponse = response.json().await.map_err(|e| UploadError::Failed {
            reason: format!("HTTP {}: {}", status.as_u16(), e),
        })?;

        if !status.is_success() || body.success == Some(false) {
            let reason = body
                .error
                .and_then(|e| e.message)
                .unwrap_or_else(|| format!("Upload failed with status {}", status.as_u16()));
            return Err(UploadError::Failed { reason }.into());
        }

        let url = body
            .data
            .and_then(|d| d.url.or(d.display_url))
            .ok_or_else(|| UploadError::Failed {
                reason: "image host returned no URL".to_string(),
            })?;
        tracing::debug!(size, url = %url, "image uploaded");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_unsupported_type() {
        let image = ImageFile::new(vec![0; 10], "image/webp", "a.webp");
        assert!(matches!(
            image.validate(1024),
            Err(UploadError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn test_rejects_oversized() {
        let image = ImageFile::new(vec![0; 2048], "image/png", "a.png");
        assert_eq!(
            image.validate(1024),
            Err(UploadError::TooLarge {
                size: 2048,
                max_bytes: 1024
            })
        );
        assert!(image.validate(4096).is_ok());
    }

    #[test]
    fn test_api_key_in_query() {
        let config = UploadConfig {
            endpoint: "https://images.example.com/1/upload".to_string(),
            api_key: Some("k3y".to_string()),
            max_bytes: 1024,
        };
        let uploader = HostedImageUploader::new(Client::new(), &config).unwrap();
        assert_eq!(uploader.endpoint.query(), Some("key=k3y"));
    }
}
