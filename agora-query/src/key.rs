//! Structured query keys.
//!
//! A key is a resource tag followed by an ordered list of primitive params.
//! Keys compare structurally, so two reads built from the same values always
//! address the same cache slot. A shorter key *covers* every key of the same
//! resource whose params start with it, which is how a single invalidation
//! reaches every page and sort order of a list.

use std::fmt;

/// Server resources the client caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Resource {
    /// Paginated, sorted post feed.
    Posts,
    /// Full post list used by the tag browser and report enrichment.
    AllPosts,
    /// Single post with its comments.
    Post,
    /// Posts matching a tag search.
    PostSearch,
    /// Posts authored by one account.
    UserPosts,
    /// Post count for one account.
    PostCount,
    Tags,
    /// Paginated admin user table.
    Users,
    /// Full user list used by report enrichment.
    AllUsers,
    /// Role and subscription of one account.
    Role,
    Reports,
    Announcements,
    Notifications,
    /// Site-wide totals shown on the admin profile.
    AdminStats,
    /// Member directory searched by the connection finder.
    PublicUsers,
    /// Connection requests involving one account.
    Connections,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Posts => "posts",
            Resource::AllPosts => "all-posts",
            Resource::Post => "post",
            Resource::PostSearch => "post-search",
            Resource::UserPosts => "user-posts",
            Resource::PostCount => "post-count",
            Resource::Tags => "tags",
            Resource::Users => "users",
            Resource::AllUsers => "all-users",
            Resource::Role => "role",
            Resource::Reports => "reports",
            Resource::Announcements => "announcements",
            Resource::Notifications => "notifications",
            Resource::AdminStats => "admin-stats",
            Resource::PublicUsers => "public-users",
            Resource::Connections => "connections",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One primitive key parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyPart {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPart::Str(s) => f.write_str(s),
            KeyPart::Int(i) => write!(f, "{}", i),
            KeyPart::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for KeyPart {
    fn from(value: &str) -> Self {
        KeyPart::Str(value.to_string())
    }
}

impl From<String> for KeyPart {
    fn from(value: String) -> Self {
        KeyPart::Str(value)
    }
}

impl From<i64> for KeyPart {
    fn from(value: i64) -> Self {
        KeyPart::Int(value)
    }
}

impl From<u32> for KeyPart {
    fn from(value: u32) -> Self {
        KeyPart::Int(i64::from(value))
    }
}

impl From<u64> for KeyPart {
    fn from(value: u64) -> Self {
        KeyPart::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<bool> for KeyPart {
    fn from(value: bool) -> Self {
        KeyPart::Bool(value)
    }
}

/// Address of one cached query result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
    resource: Resource,
    params: Vec<KeyPart>,
}

impl QueryKey {
    pub fn new(resource: Resource) -> Self {
        Self {
            resource,
            params: Vec::new(),
        }
    }

    /// Append a param.
    pub fn with(mut self, part: impl Into<KeyPart>) -> Self {
        self.params.push(part.into());
        self
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }

    pub fn params(&self) -> &[KeyPart] {
        &self.params
    }

    /// True when `other` is this key or a more specific key of the same resource.
    pub fn covers(&self, other: &QueryKey) -> bool {
        self.resource == other.resource && other.params.starts_with(&self.params)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.resource)?;
        for part in &self.params {
            write!(f, "/{}", part)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_structural_equality() {
        let a = QueryKey::new(Resource::Posts).with("newest").with(1u32);
        let b = QueryKey::new(Resource::Posts).with("newest".to_string()).with(1i64);
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a.clone());
        assert!(set.contains(&b));
    }

    #[test]
    fn test_prefix_coverage() {
        let all_posts = QueryKey::new(Resource::Posts);
        let page = QueryKey::new(Resource::Posts).with("popular").with(3u32);
        let other = QueryKey::new(Resource::Post).with("a");

        assert!(all_posts.covers(&page));
        assert!(page.covers(&page));
        assert!(!page.covers(&all_posts));
        assert!(!all_posts.covers(&other));
        assert!(!other.covers(&QueryKey::new(Resource::Post).with("b")));
    }

    #[test]
    fn test_display() {
        let key = QueryKey::new(Resource::Notifications)
            .with("a@b.c")
            .with(true);
        assert_eq!(key.to_string(), "notifications/a@b.c/true");
    }
}
