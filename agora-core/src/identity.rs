//! Identity types for Agora entities.
//!
//! The backend hands out opaque document ids, so every id is a string newtype.
//! The newtypes exist so a `CommentId` can never be passed where a `PostId`
//! is expected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Common behaviour shared by all strongly-typed ids.
pub trait EntityIdType: Clone + Eq + std::hash::Hash + fmt::Display {
    /// Human readable name of the entity the id refers to.
    const ENTITY_NAME: &'static str;

    /// Borrow the raw id string.
    fn as_str(&self) -> &str;

    /// Returns true when the id carries no characters.
    fn is_blank(&self) -> bool {
        self.as_str().trim().is_empty()
    }
}

macro_rules! define_entity_id {
    ($(#[$meta:meta])* $name:ident, $entity:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl EntityIdType for $name {
            const ENTITY_NAME: &'static str = $entity;

            fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

define_entity_id!(
    /// Backend id of a post.
    PostId,
    "post"
);
define_entity_id!(
    /// Backend id of a comment, unique within its post.
    CommentId,
    "comment"
);
define_entity_id!(ReplyId, "reply");
define_entity_id!(
    /// Backend id of a user record (not the identity provider uid).
    UserId,
    "user"
);
define_entity_id!(
    /// Identity provider uid. Post ownership is keyed on this value.
    AuthUid,
    "account"
);
define_entity_id!(ReportId, "report");
define_entity_id!(AnnouncementId, "announcement");
define_entity_id!(NotificationId, "notification");
