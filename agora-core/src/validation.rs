//! Input validation that runs before any network call.

use crate::error::{UploadError, ValidationError};

/// Largest accepted image upload (5 MB).
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Accepted image content types.
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif"];

/// Reject blank text, returning the trimmed value otherwise.
pub fn require_text<'a>(field: &str, value: &'a str) -> Result<&'a str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::RequiredFieldMissing {
            field: field.to_string(),
        });
    }
    Ok(trimmed)
}

/// Emails are compared and sent lowercase.
pub fn normalize_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = require_text("email", email)?;
    if !trimmed.contains('@') {
        return Err(ValidationError::InvalidValue {
            field: "email".to_string(),
            reason: "must contain '@'".to_string(),
        });
    }
    Ok(trimmed.to_lowercase())
}

/// Tags are stored lowercase with surrounding whitespace removed.
pub fn normalize_tag(tag: &str) -> Result<String, ValidationError> {
    Ok(require_text("tag", tag)?.to_lowercase())
}

/// Check an image before upload against the accepted types and `max_bytes`.
pub fn validate_image(content_type: &str, size: usize, max_bytes: usize) -> Result<(), UploadError> {
    if !ALLOWED_IMAGE_TYPES
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(content_type))
    {
        return Err(UploadError::UnsupportedType {
            content_type: content_type.to_string(),
        });
    }
    if size > max_bytes {
        return Err(UploadError::TooLarge { size, max_bytes });
    }
    Ok(())
}

/// A post as typed into the "add post" form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostDraft {
    pub title: String,
    pub description: String,
    pub tag: String,
}

/// A draft that passed validation, with whitespace trimmed and the tag normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidPostDraft {
    pub title: String,
    pub description: String,
    pub tag: String,
}

impl PostDraft {
    pub fn validate(&self) -> Result<ValidPostDraft, ValidationError> {
        let title = require_text("title", &self.title)?;
        let description = require_text("description", &self.description)?;
        let tag = normalize_tag(&self.tag)?;
        Ok(ValidPostDraft {
            title: title.to_string(),
            description: description.to_string(),
            tag,
        })
    }
}
