//! Canonical query keys.
//!
//! Each resource has exactly one constructor here. Reads and invalidations
//! both go through these functions, so a mutation can never target a key
//! shape that no read produces.

use agora_core::{AuthUid, EntityIdType, PostId, PostSort};
use agora_query::{QueryKey, Resource};

/// Every page and sort order of the feed.
pub fn posts() -> QueryKey {
    QueryKey::new(Resource::Posts)
}

pub fn posts_page(sort: PostSort, page: u32, page_size: u32) -> QueryKey {
    posts().with(sort.as_str()).with(page).with(page_size)
}

pub fn all_posts() -> QueryKey {
    QueryKey::new(Resource::AllPosts)
}

pub fn post(id: &PostId) -> QueryKey {
    QueryKey::new(Resource::Post).with(id.as_str())
}

/// Every tag search.
pub fn post_searches() -> QueryKey {
    QueryKey::new(Resource::PostSearch)
}

pub fn post_search(tag: &str) -> QueryKey {
    post_searches().with(tag)
}

/// Every author's post list.
pub fn all_user_posts() -> QueryKey {
    QueryKey::new(Resource::UserPosts)
}

pub fn user_posts(uid: &AuthUid) -> QueryKey {
    all_user_posts().with(uid.as_str())
}

pub fn post_count(uid: &AuthUid) -> QueryKey {
    QueryKey::new(Resource::PostCount).with(uid.as_str())
}

pub fn tags() -> QueryKey {
    QueryKey::new(Resource::Tags)
}

/// Every search and page of the admin user table.
pub fn users() -> QueryKey {
    QueryKey::new(Resource::Users)
}

pub fn users_page(search: &str, page: u32, page_size: u32) -> QueryKey {
    users().with(search.trim()).with(page).with(page_size)
}

pub fn all_users() -> QueryKey {
    QueryKey::new(Resource::AllUsers)
}

/// Role lookups for every account.
pub fn roles() -> QueryKey {
    QueryKey::new(Resource::Role)
}

/// `email` must already be normalized.
pub fn role(email: &str) -> QueryKey {
    roles().with(email)
}

pub fn reports() -> QueryKey {
    QueryKey::new(Resource::Reports)
}

pub fn reports_page(page: u32, page_size: u32) -> QueryKey {
    reports().with(page).with(page_size)
}

pub fn announcements() -> QueryKey {
    QueryKey::new(Resource::Announcements)
}

/// Unread and full notification lists for every account.
pub fn all_notifications() -> QueryKey {
    QueryKey::new(Resource::Notifications)
}

/// Both lists (unread and all) for one account.
pub fn notifications_for(email: &str) -> QueryKey {
    all_notifications().with(email)
}

pub fn notifications(email: &str, include_read: bool) -> QueryKey {
    notifications_for(email).with(include_read)
}

pub fn admin_stats() -> QueryKey {
    QueryKey::new(Resource::AdminStats)
}

/// Every search of the member directory.
pub fn public_user_searches() -> QueryKey {
    QueryKey::new(Resource::PublicUsers)
}

pub fn public_users(search: &str) -> QueryKey {
    public_user_searches().with(search.trim())
}

/// `email` must already be normalized.
pub fn connections(email: &str) -> QueryKey {
    QueryKey::new(Resource::Connections).with(email)
}

/// Invalidation sets, one per kind of mutation.
pub mod affected {
    use super::*;

    /// A vote, comment, reply or report on `post_id`.
    pub fn post_content(post_id: &PostId) -> Vec<QueryKey> {
        vec![
            post(post_id),
            posts(),
            all_posts(),
            post_searches(),
            all_user_posts(),
            admin_stats(),
        ]
    }

    pub fn comment_deleted(post_id: &PostId) -> Vec<QueryKey> {
        let mut keys = post_content(post_id);
        keys.push(reports());
        keys
    }

    pub fn post_created(uid: &AuthUid) -> Vec<QueryKey> {
        vec![
            posts(),
            all_posts(),
            post_searches(),
            user_posts(uid),
            post_count(uid),
            admin_stats(),
        ]
    }

    pub fn post_deleted(post_id: &PostId, uid: &AuthUid) -> Vec<QueryKey> {
        vec![
            post(post_id),
            posts(),
            all_posts(),
            post_searches(),
            user_posts(uid),
            post_count(uid),
            reports(),
            admin_stats(),
        ]
    }

    /// Role change or deletion of some account.
    pub fn user_changed() -> Vec<QueryKey> {
        vec![users(), all_users(), roles(), reports(), admin_stats()]
    }

    pub fn tags_changed() -> Vec<QueryKey> {
        vec![tags()]
    }

    pub fn announcements_changed() -> Vec<QueryKey> {
        vec![announcements(), all_notifications(), admin_stats()]
    }

    pub fn notifications_read(email: &str) -> Vec<QueryKey> {
        vec![notifications_for(email)]
    }

    pub fn membership_upgraded(email: &str, uid: &AuthUid) -> Vec<QueryKey> {
        vec![role(email), post_count(uid), users(), all_users()]
    }

    pub fn profile_updated(email: &str) -> Vec<QueryKey> {
        vec![role(email), users(), all_users()]
    }

    /// A request from `from` to `to`; both lists now carry it.
    pub fn connection_sent(from: &str, to: &str) -> Vec<QueryKey> {
        vec![connections(from), connections(to)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn covered(targets: &[QueryKey], read: &QueryKey) -> bool {
        targets.iter().any(|t| t.covers(read))
    }

    #[test]
    fn test_post_content_covers_every_list_read() {
        let id = PostId::new("p1");
        let uid = AuthUid::new("u1");
        let targets = affected::post_content(&id);
        for read in [
            post(&id),
            posts_page(PostSort::Newest, 1, 5),
            posts_page(PostSort::Popular, 4, 5),
            all_posts(),
            post_search("rust"),
            user_posts(&uid),
            user_posts(&AuthUid::new("u2")),
        ] {
            assert!(covered(&targets, &read), "{} not invalidated", read);
        }
        assert!(!covered(&targets, &post(&PostId::new("p2"))));
        assert!(!covered(&targets, &tags()));
    }

    #[test]
    fn test_post_created_covers_quota() {
        let uid = AuthUid::new("u1");
        let targets = affected::post_created(&uid);
        assert!(covered(&targets, &post_count(&uid)));
        assert!(covered(&targets, &user_posts(&uid)));
        assert!(covered(&targets, &posts_page(PostSort::Newest, 1, 5)));
        assert!(!covered(&targets, &post_count(&AuthUid::new("u2"))));
    }

    #[test]
    fn test_notification_keys() {
        let targets = affected::notifications_read("ada@example.com");
        assert!(covered(&targets, &notifications("ada@example.com", false)));
        assert!(covered(&targets, &notifications("ada@example.com", true)));
        assert!(!covered(&targets, &notifications("bob@example.com", false)));

        let fanout = affected::announcements_changed();
        assert!(covered(&fanout, &notifications("bob@example.com", true)));
    }

    #[test]
    fn test_user_changes_cover_tables_and_roles() {
        let targets = affected::user_changed();
        assert!(covered(&targets, &users_page("", 1, 10)));
        assert!(covered(&targets, &users_page("ada", 3, 10)));
        assert!(covered(&targets, &role("ada@example.com")));
        assert!(covered(&targets, &reports_page(1, 10)));
    }

    #[test]
    fn test_connection_request_covers_both_members() {
        let targets = affected::connection_sent("ada@example.com", "bob@example.com");
        assert!(covered(&targets, &connections("ada@example.com")));
        assert!(covered(&targets, &connections("bob@example.com")));
        assert!(!covered(&targets, &connections("cy@example.com")));
        assert!(!covered(&targets, &public_users("")));
    }

    #[test]
    fn test_membership_upgrade_covers_role() {
        let uid = AuthUid::new("u1");
        let targets = affected::membership_upgraded("ada@example.com", &uid);
        assert!(covered(&targets, &role("ada@example.com")));
        assert!(covered(&targets, &post_count(&uid)));
    }
}
