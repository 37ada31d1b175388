//! Error types for Agora operations

use std::fmt;
use thiserror::Error;

/// Authentication errors (missing or expired session).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("You must be logged in to {action}.")]
    NotSignedIn { action: String },

    #[error("Session expired, please sign in again")]
    SessionExpired,

    #[error("Identity provider error: {message}")]
    Provider { message: String },
}

/// Input validation errors. These never reach the network.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Limit reached: {reason}")]
    LimitReached { limit: u64, reason: String },
}

/// Errors produced while talking to the REST backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("HTTP {status}: {}", message.as_deref().unwrap_or("request failed"))]
    Server {
        status: u16,
        message: Option<String>,
    },

    #[error("Network error: {reason}")]
    Network { reason: String },

    #[error("Unexpected response: {reason}")]
    Decode { reason: String },
}

/// Server-state cache errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cached value for {key} is not a {expected}")]
    TypeMismatch { key: String, expected: &'static str },

    #[error("No fetcher registered for {key}")]
    NoFetcher { key: String },

    #[error("Query {key} is disabled and has no cached data")]
    Disabled { key: String },

    #[error("Cache lock poisoned")]
    LockPoisoned,

    #[error("No async runtime available to run fetches")]
    NoRuntime,

    #[error("Query cache has been shut down")]
    Shutdown,
}

/// Payment capture errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PaymentError {
    #[error("No client secret received from backend")]
    MissingClientSecret,

    #[error("Payment declined: {message}")]
    Declined { message: String },

    #[error("Payment did not succeed (status: {status})")]
    NotSucceeded { status: String },
}

/// Image upload errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("Image must be less than {max_bytes} bytes (got {size})")]
    TooLarge { size: usize, max_bytes: usize },

    #[error("Please select a valid image file (JPEG, PNG, or GIF), got {content_type}")]
    UnsupportedType { content_type: String },

    #[error("Failed to upload photo: {reason}")]
    Failed { reason: String },
}

/// Master error type for all Agora errors.
///
/// `Clone` is required: a single fetch result is fanned out to every reader
/// that joined the same in-flight request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AgoraError {
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Forbidden: {resource}")]
    Forbidden { resource: String },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),
}

/// Result type alias for Agora operations.
pub type AgoraResult<T> = Result<T, AgoraError>;

/// How the UI should react to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Missing or expired session: redirect to login or sign out.
    Authentication,
    /// 403: redirect to the forbidden page.
    Authorization,
    /// Bad input: inline field message.
    Validation,
    /// Network or server failure: toast with a retry affordance.
    Server,
    /// Dedicated empty-state message.
    NotFound,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorCategory::Authentication => "authentication",
            ErrorCategory::Authorization => "authorization",
            ErrorCategory::Validation => "validation",
            ErrorCategory::Server => "server",
            ErrorCategory::NotFound => "not_found",
        };
        f.write_str(label)
    }
}

impl AgoraError {
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn forbidden(resource: impl Into<String>) -> Self {
        Self::Forbidden {
            resource: resource.into(),
        }
    }

    pub fn not_signed_in(action: impl Into<String>) -> Self {
        Self::Auth(AuthError::NotSignedIn {
            action: action.into(),
        })
    }

    pub fn required(field: impl Into<String>) -> Self {
        Self::Validation(ValidationError::RequiredFieldMissing {
            field: field.into(),
        })
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            AgoraError::Auth(_) => ErrorCategory::Authentication,
            AgoraError::Forbidden { .. } => ErrorCategory::Authorization,
            AgoraError::NotFound { .. } => ErrorCategory::NotFound,
            AgoraError::Validation(_) | AgoraError::Upload(UploadError::TooLarge { .. })
            | AgoraError::Upload(UploadError::UnsupportedType { .. }) => {
                ErrorCategory::Validation
            }
            AgoraError::Api(ApiError::Server { status: 401, .. }) => {
                ErrorCategory::Authentication
            }
            AgoraError::Api(ApiError::Server { status: 403, .. }) => {
                ErrorCategory::Authorization
            }
            AgoraError::Api(ApiError::Server { status: 404, .. }) => ErrorCategory::NotFound,
            AgoraError::Api(_)
            | AgoraError::Cache(_)
            | AgoraError::Payment(_)
            | AgoraError::Upload(_) => ErrorCategory::Server,
        }
    }

    /// HTTP status carried by the error, if it came from the backend.
    pub fn status(&self) -> Option<u16> {
        match self {
            AgoraError::Api(ApiError::Server { status, .. }) => Some(*status),
            _ => None,
        }
    }

    /// Text shown to the user: the server-provided message when there is one,
    /// the error's own description for client-side errors, else `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            AgoraError::Api(ApiError::Server {
                message: Some(message),
                ..
            }) if !message.trim().is_empty() => message.clone(),
            AgoraError::Api(_) | AgoraError::Cache(_) => fallback.to_string(),
            AgoraError::Auth(inner) => inner.to_string(),
            AgoraError::Validation(inner) => inner.to_string(),
            AgoraError::Payment(inner) => inner.to_string(),
            AgoraError::Upload(inner) => inner.to_string(),
            AgoraError::Forbidden { .. } => "Unauthorized access".to_string(),
            AgoraError::NotFound { resource } => format!("{} not found.", capitalize(resource)),
        }
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_message_preferred_over_fallback() {
        let err = AgoraError::Api(ApiError::Server {
            status: 400,
            message: Some("Post is locked".to_string()),
        });
        assert_eq!(err.user_message("Failed to upvote post."), "Post is locked");
    }

    #[test]
    fn test_fallback_when_server_silent() {
        let err = AgoraError::Api(ApiError::Server {
            status: 500,
            message: None,
        });
        assert_eq!(err.user_message("Failed to upvote post."), "Failed to upvote post.");

        let err = AgoraError::Api(ApiError::Network {
            reason: "connection refused".to_string(),
        });
        assert_eq!(err.user_message("Failed to load posts"), "Failed to load posts");
    }

    #[test]
    fn test_not_signed_in_message() {
        let err = AgoraError::not_signed_in("upvote");
        assert_eq!(err.user_message("ignored"), "You must be logged in to upvote.");
        assert_eq!(err.category(), ErrorCategory::Authentication);
    }

    #[test]
    fn test_status_categories() {
        let unauthorized = AgoraError::Api(ApiError::Server {
            status: 401,
            message: None,
        });
        let forbidden = AgoraError::Api(ApiError::Server {
            status: 403,
            message: None,
        });
        let missing = AgoraError::Api(ApiError::Server {
            status: 404,
            message: None,
        });
        assert_eq!(unauthorized.category(), ErrorCategory::Authentication);
        assert_eq!(forbidden.category(), ErrorCategory::Authorization);
        assert_eq!(missing.category(), ErrorCategory::NotFound);
        assert_eq!(missing.status(), Some(404));
    }

    #[test]
    fn test_validation_category() {
        let err = AgoraError::required("title");
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert!(err.user_message("x").contains("title"));
    }

    #[test]
    fn test_not_found_message() {
        let err = AgoraError::not_found("post");
        assert_eq!(err.user_message("x"), "Post not found.");
    }
}
