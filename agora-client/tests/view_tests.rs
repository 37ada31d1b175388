//! Screen-level flows against the in-process backend.

mod common;

use std::sync::atomic::Ordering;

use agora_client::nav::Route;
use agora_client::pagination::ListState;
use agora_client::payment::CardHandle;
use agora_client::notifications::{ToastAction, ToastLevel};
use agora_client::views::{
    AddPostView, AdminUsersView, AnnouncementsView, AuthView, ConnectionsView, FeedView, Loadable,
    MembershipView, NotificationsView, PostActions, ProfileView, RegistrationForm,
    TagBrowserView,
};
use agora_client::views::membership::UPGRADE_SUCCESS;
use agora_core::{
    AgoraError, AuthUid, CommentId, ConnectState, ConnectionStatus, PostDraft, PostId, PostSort,
    Role, Subscription, ValidationError, FREE_POST_LIMIT,
};
use agora_test_utils::assertions::*;
use agora_test_utils::fixtures::{
    admin, comment, commented_post, connection, notification, numbered_posts, post_by, premium,
    tag, tagged_post, user, voted_post,
};
use agora_test_utils::{BackendStore, TestBackend};
use common::{identity, png, Harness, MockIdentityProvider, MockPaymentProcessor};

const ADA: &str = "ada@example.com";
const ROOT: &str = "root@example.com";
const BOB: &str = "bob@example.com";

fn draft() -> PostDraft {
    PostDraft {
        title: "Hello".to_string(),
        description: "First post".to_string(),
        tag: "General".to_string(),
    }
}

// === Feed ===

#[tokio::test]
async fn test_feed_pages_through_47_posts() {
    let backend = TestBackend::with_store(BackendStore {
        posts: numbered_posts(47),
        ..BackendStore::default()
    })
    .await;
    let h = Harness::new(&backend, MockIdentityProvider::signed_out()).await;
    let mut feed = FeedView::new(h.app.clone());

    match feed.load().await {
        ListState::Page {
            items,
            page,
            total_pages,
            ..
        } => {
            assert_eq!(items.len(), 10);
            assert_eq!(page, 1);
            assert_eq!(total_pages, 5);
            assert_eq!(items[0].id, PostId::new("p47"));
        }
        other => panic!("unexpected state {:?}", other),
    }

    feed.set_page(5);
    assert_eq!(feed.load().await.items().len(), 7);

    feed.set_page(6);
    assert_eq!(feed.load().await, ListState::NoMorePages { total_pages: 5 });
}

#[tokio::test]
async fn test_feed_sort_change_returns_to_first_page() {
    let mut posts = numbered_posts(12);
    posts.push(voted_post("hot", 40, 2));
    let backend = TestBackend::with_store(BackendStore {
        posts,
        ..BackendStore::default()
    })
    .await;
    let h = Harness::new(&backend, MockIdentityProvider::signed_out()).await;
    let mut feed = FeedView::new(h.app.clone());

    feed.set_page(2);
    feed.set_sort(PostSort::Popular);
    assert_eq!(feed.pager().page(), 1);

    let state = feed.load().await;
    assert_eq!(state.items()[0].id, PostId::new("hot"));
}

#[tokio::test]
async fn test_empty_feed() {
    let backend = TestBackend::start().await;
    let h = Harness::new(&backend, MockIdentityProvider::signed_out()).await;

    assert_eq!(FeedView::new(h.app.clone()).load().await, ListState::Empty);
}

#[tokio::test]
async fn test_feed_failure_offers_retry() {
    let backend = TestBackend::with_store(BackendStore {
        posts: numbered_posts(3),
        ..BackendStore::default()
    })
    .await;
    let h = Harness::new(&backend, MockIdentityProvider::signed_out()).await;
    let feed = FeedView::new(h.app.clone());

    backend.force_status("/posts", 500);
    assert!(matches!(feed.load().await, ListState::Failed { .. }));

    backend.clear_forced();
    feed.retry().await.unwrap();
    assert_eq!(feed.load().await.items().len(), 3);
}

// === Interactions ===

#[tokio::test]
async fn test_blank_comment_is_rejected_locally() {
    let backend = TestBackend::with_store(BackendStore {
        posts: numbered_posts(1),
        ..BackendStore::default()
    })
    .await;
    let h = Harness::new(&backend, MockIdentityProvider::signed_in(identity("u-ada", ADA))).await;

    let result = PostActions::new(h.app.clone())
        .comment(&PostId::new("p1"), "   ")
        .await;

    assert_validation_error(&result);
    assert_eq!(backend.total_hits(), 0);
}

#[tokio::test]
async fn test_comment_and_reply_reach_the_thread() {
    let backend = TestBackend::with_store(BackendStore {
        posts: vec![commented_post("p1", vec![comment("c1", "First", 0, 0, 1)])],
        ..BackendStore::default()
    })
    .await;
    let h = Harness::new(&backend, MockIdentityProvider::signed_in(identity("u-ada", ADA))).await;
    let actions = PostActions::new(h.app.clone());

    actions.comment(&PostId::new("p1"), "Second").await.unwrap();
    actions
        .reply(&PostId::new("p1"), &CommentId::new("c1"), "Agreed")
        .await
        .unwrap();

    let store = backend.store();
    let post = &store.posts[0];
    assert_eq!(post.comments.len(), 2);
    assert_eq!(post.comments[1].user_email.as_deref(), Some(ADA));
    assert_eq!(post.comments[0].replies[0].text, "Agreed");
}

#[tokio::test]
async fn test_report_lands_in_queue() {
    let backend = TestBackend::with_store(BackendStore {
        posts: vec![commented_post("p1", vec![comment("c1", "Spam", 0, 0, 1)])],
        ..BackendStore::default()
    })
    .await;
    let h = Harness::new(&backend, MockIdentityProvider::signed_in(identity("u-ada", ADA))).await;

    PostActions::new(h.app.clone())
        .report(&PostId::new("p1"), &CommentId::new("c1"), "Spam link")
        .await
        .unwrap();

    let store = backend.store();
    assert_eq!(store.reports.len(), 1);
    assert_eq!(store.reports[0].feedback, "Spam link");
}

// === Tags ===

#[tokio::test]
async fn test_tag_search_normalizes_and_paginates_locally() {
    let mut posts: Vec<_> = (1..=8).map(|n| tagged_post(&format!("r{n}"), "rust")).collect();
    posts.push(tagged_post("g1", "go"));
    let backend = TestBackend::with_store(BackendStore {
        posts,
        tags: vec![tag("rust"), tag("go")],
        ..BackendStore::default()
    })
    .await;
    let h = Harness::new(&backend, MockIdentityProvider::signed_out()).await;
    let mut view = TagBrowserView::new(h.app.clone());

    let found = view.search("  Rust ").await.unwrap();
    assert_eq!(found.len(), 8);
    assert_eq!(view.selected(), Some("rust"));

    let first = view.load_posts().await;
    assert_eq!(first.items().len(), 6);
    assert_eq!(first.total_pages(), 2);
    assert_eq!(backend.hits("GET", "/posts/search"), 1);

    assert_validation_error(&view.search("   ").await);
}

// === Posting and quota ===

#[tokio::test]
async fn test_free_member_blocked_at_post_limit() {
    let uid = AuthUid::new("u-ada");
    let posts = (0..FREE_POST_LIMIT as i64)
        .map(|n| post_by(&format!("p{n}"), &uid, n))
        .collect();
    let backend = TestBackend::with_store(BackendStore {
        posts,
        users: vec![user("u-ada", ADA)],
        ..BackendStore::default()
    })
    .await;
    let h = Harness::new(&backend, MockIdentityProvider::signed_in(identity("u-ada", ADA))).await;

    let result = AddPostView::new(h.app.clone()).submit(&draft()).await;

    assert!(matches!(
        result,
        Err(AgoraError::Validation(ValidationError::LimitReached { .. }))
    ));
    assert_eq!(backend.hits("POST", "/user/post/u-ada"), 0);
}

#[tokio::test]
async fn test_premium_member_posts_past_limit() {
    let uid = AuthUid::new("u-ada");
    let posts = (0..FREE_POST_LIMIT as i64 + 2)
        .map(|n| post_by(&format!("p{n}"), &uid, n))
        .collect();
    let backend = TestBackend::with_store(BackendStore {
        posts,
        users: vec![premium("u-ada", ADA)],
        ..BackendStore::default()
    })
    .await;
    let mut h =
        Harness::new(&backend, MockIdentityProvider::signed_in(identity("u-ada", ADA))).await;
    let mut view = AddPostView::new(h.app.clone());

    let before = view.quota().await.unwrap();
    assert!(before.allows_post());
    view.submit(&draft()).await.unwrap();

    assert_eq!(backend.store().posts.len(), FREE_POST_LIMIT as usize + 3);
    assert!(h.navigations().contains(&Route::DashboardHome));
}

#[tokio::test]
async fn test_new_post_refreshes_count() {
    let backend = TestBackend::with_store(BackendStore {
        users: vec![user("u-ada", ADA)],
        ..BackendStore::default()
    })
    .await;
    let h = Harness::new(&backend, MockIdentityProvider::signed_in(identity("u-ada", ADA))).await;
    let mut view = AddPostView::new(h.app.clone());

    view.quota().await.unwrap();
    view.upload_photo(png("cover.png")).await.unwrap();
    view.submit(&draft()).await.unwrap();
    view.quota().await.unwrap();

    assert_eq!(backend.hits("GET", "/user/post/count/u-ada"), 2);
    let store = backend.store();
    assert_eq!(store.posts[0].tag.as_deref(), Some("general"));
    assert_eq!(
        store.posts[0].photo.as_deref(),
        Some("https://images.test/cover.png")
    );
}

// === Administration ===

fn admin_store() -> BackendStore {
    BackendStore {
        users: vec![
            admin("u-root", ROOT),
            admin("u-other", "other@example.com"),
            user("u-ada", ADA),
        ],
        ..BackendStore::default()
    }
}

#[tokio::test]
async fn test_admin_cannot_demote_self() {
    let backend = TestBackend::with_store(admin_store()).await;
    let h = Harness::new(&backend, MockIdentityProvider::signed_in(identity("u-root", ROOT))).await;
    let view = AdminUsersView::new(h.app.clone());
    let me = backend.store().users[0].clone();

    let result = view.remove_admin(&me).await;

    assert_validation_error(&result);
    assert_eq!(backend.hits("PATCH", "/users/remove-admin/u-root"), 0);
}

#[tokio::test]
async fn test_admins_cannot_be_deleted() {
    let backend = TestBackend::with_store(admin_store()).await;
    let h = Harness::new(&backend, MockIdentityProvider::signed_in(identity("u-root", ROOT))).await;
    let view = AdminUsersView::new(h.app.clone());
    let other = backend.store().users[1].clone();

    assert_validation_error(&view.delete_user(&other).await);
    assert_eq!(backend.store().users.len(), 3);
}

#[tokio::test]
async fn test_make_admin_updates_table() {
    let backend = TestBackend::with_store(admin_store()).await;
    let h = Harness::new(&backend, MockIdentityProvider::signed_in(identity("u-root", ROOT))).await;
    let view = AdminUsersView::new(h.app.clone());
    let ada = backend.store().users[2].clone();

    assert_eq!(view.load().await.items().len(), 3);
    view.make_admin(&ada).await.unwrap();

    let table = view.load().await;
    let row = table.items().iter().find(|u| u.email == ADA).cloned().unwrap();
    assert_eq!(row.role, Role::Admin);
    assert_eq!(backend.hits("GET", "/users"), 2);
}

#[tokio::test]
async fn test_announcement_fans_out_notifications() {
    let backend = TestBackend::with_store(admin_store()).await;
    let mut h =
        Harness::new(&backend, MockIdentityProvider::signed_in(identity("u-root", ROOT))).await;
    let view = AnnouncementsView::new(h.app.clone());

    let created = view
        .create("Root", "Maintenance", "Down at noon", png("root.png"))
        .await
        .unwrap();

    assert_eq!(created.notifications.success, 3);
    assert_eq!(view.load().await.unwrap().len(), 1);
    assert!(h
        .toasts()
        .iter()
        .any(|t| t.message.contains("Notified 3 users")));
}

#[tokio::test]
async fn test_announcement_requires_title() {
    let backend = TestBackend::with_store(admin_store()).await;
    let h = Harness::new(&backend, MockIdentityProvider::signed_in(identity("u-root", ROOT))).await;

    let result = AnnouncementsView::new(h.app.clone())
        .create("Root", " ", "Body", png("root.png"))
        .await;

    assert_validation_error(&result);
    assert_eq!(backend.total_hits(), 0);
}

// === Notifications ===

#[tokio::test]
async fn test_mark_all_read_clears_unread_count() {
    let backend = TestBackend::with_store(BackendStore {
        users: vec![user("u-ada", ADA)],
        notifications: vec![
            notification("n1", ADA, false),
            notification("n2", ADA, false),
            notification("n3", ADA, true),
        ],
        ..BackendStore::default()
    })
    .await;
    let h = Harness::new(&backend, MockIdentityProvider::signed_in(identity("u-ada", ADA))).await;
    let view = NotificationsView::new(h.app.clone());

    assert_eq!(view.unread_count().await.unwrap(), 2);
    assert_eq!(view.load(true).await.unwrap().len(), 3);
    view.mark_all_read().await.unwrap();

    assert_eq!(view.unread_count().await.unwrap(), 0);
}

// === Membership ===

#[tokio::test]
async fn test_checkout_upgrades_to_premium() {
    let backend = TestBackend::with_store(BackendStore {
        users: vec![user("u-ada", ADA)],
        ..BackendStore::default()
    })
    .await;
    let mut h =
        Harness::new(&backend, MockIdentityProvider::signed_in(identity("u-ada", ADA))).await;
    let view = MembershipView::new(h.app.clone());
    assert!(!view.status().await.unwrap().is_premium());

    let confirmation = view.checkout(&CardHandle("card-1".to_string())).await.unwrap();

    assert_eq!(confirmation.id, "pi_1");
    assert_eq!(h.payments.confirmations(), vec!["pi_1_secret_test".to_string()]);
    assert_eq!(backend.store().upgrades, vec!["pi_1".to_string()]);
    assert!(view.status().await.unwrap().is_premium());
    assert!(h.toasts().iter().any(|t| t.message == UPGRADE_SUCCESS));
}

#[tokio::test]
async fn test_declined_card_leaves_subscription_unchanged() {
    let backend = TestBackend::with_store(BackendStore {
        users: vec![user("u-ada", ADA)],
        ..BackendStore::default()
    })
    .await;
    let h = Harness::with_payments(
        &backend,
        MockIdentityProvider::signed_in(identity("u-ada", ADA)),
        MockPaymentProcessor::declining(),
    )
    .await;

    let result = MembershipView::new(h.app.clone())
        .checkout(&CardHandle("card-1".to_string()))
        .await;

    assert!(matches!(result, Err(AgoraError::Payment(_))));
    let store = backend.store();
    assert!(store.upgrades.is_empty());
    assert_eq!(store.users[0].subscription, Subscription::Free);
}

#[tokio::test]
async fn test_premium_member_is_not_charged_again() {
    let backend = TestBackend::with_store(BackendStore {
        users: vec![premium("u-ada", ADA)],
        ..BackendStore::default()
    })
    .await;
    let h = Harness::new(&backend, MockIdentityProvider::signed_in(identity("u-ada", ADA))).await;

    let result = MembershipView::new(h.app.clone())
        .checkout(&CardHandle("card-1".to_string()))
        .await;

    assert_validation_error(&result);
    assert_eq!(backend.hits("POST", "/create-payment-intent"), 0);
    assert!(h.payments.confirmations().is_empty());
}

// === Accounts ===

#[tokio::test]
async fn test_register_uploads_photo_and_stores_user() {
    let backend = TestBackend::start().await;
    let mut h = Harness::new(&backend, MockIdentityProvider::signed_out()).await;

    let form = RegistrationForm {
        name: "Grace".to_string(),
        email: "Grace@Example.com".to_string(),
        password: "hunter22".to_string(),
        photo: Some(png("grace.png")),
    };
    let created = AuthView::new(h.app.clone()).register(form).await.unwrap();

    assert_eq!(created.email, "grace@example.com");
    assert_eq!(h.uploader.uploads.load(Ordering::SeqCst), 1);
    let store = backend.store();
    assert_eq!(store.users.len(), 1);
    assert_eq!(store.users[0].role, Role::User);
    assert_eq!(store.users[0].subscription, Subscription::Free);
    assert_eq!(
        store.users[0].photo.as_deref(),
        Some("https://images.test/grace.png")
    );
    drop(store);
    assert!(h.navigations().contains(&Route::Home));
}

#[tokio::test]
async fn test_sign_in_with_wrong_password_stays_signed_out() {
    let backend = TestBackend::start().await;
    let mut h = Harness::new(
        &backend,
        MockIdentityProvider::with_account(identity("u-ada", ADA), "right"),
    )
    .await;
    let auth = AuthView::new(h.app.clone());

    assert!(auth.sign_in(ADA, "wrong").await.is_err());
    assert!(h.app.session.current().is_none());
    assert!(!h.toasts().is_empty());

    auth.sign_in(ADA, "right").await.unwrap();
    assert!(h.app.session.current().is_some());
}

#[tokio::test]
async fn test_profile_update_reaches_backend() {
    let backend = TestBackend::with_store(BackendStore {
        users: vec![user("u-ada", ADA)],
        ..BackendStore::default()
    })
    .await;
    let h = Harness::new(&backend, MockIdentityProvider::signed_in(identity("u-ada", ADA))).await;
    let view = ProfileView::new(h.app.clone());

    let updated = view.update(Some("Ada L."), Some(png("ada.png"))).await.unwrap();

    assert_eq!(updated.display_name.as_deref(), Some("Ada L."));
    let summary = view.load().await.unwrap();
    assert_eq!(summary.role.name.as_deref(), Some("Ada L."));
    assert_eq!(summary.role.photo.as_deref(), Some("https://images.test/ada.png"));
}

// === Connections ===

#[tokio::test]
async fn test_connection_request_marks_member_pending() {
    let backend = TestBackend::with_store(BackendStore {
        users: vec![
            user("u-ada", ADA),
            user("u-bob", BOB),
            premium("u-cy", "cy@example.com"),
        ],
        connections: vec![connection("cy@example.com", ADA, ConnectionStatus::Accepted)],
        ..BackendStore::default()
    })
    .await;
    let mut h =
        Harness::new(&backend, MockIdentityProvider::signed_in(identity("u-ada", ADA))).await;
    let view = ConnectionsView::new(h.app.clone());

    let directory = view.load().await.unwrap();
    let states: Vec<ConnectState> = directory.candidates.iter().map(|c| c.state).collect();
    assert_eq!(
        states,
        vec![ConnectState::You, ConnectState::Available, ConnectState::Connected]
    );
    assert_eq!(directory.candidates[2].user.badge_or_default(), "Gold");
    assert!(!directory.has_more);
    h.drain();

    let bob = directory.candidates[1].user.clone();
    view.send_request(&bob).await.unwrap();

    let toasts = h.toasts();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].level, ToastLevel::Success);
    assert_eq!(toasts[0].message, "Connection request sent to bob!");
    assert_eq!(backend.store().connections.len(), 2);

    let directory = view.load().await.unwrap();
    assert_eq!(directory.candidates[1].state, ConnectState::Pending);
    assert!(!directory.candidates[1].state.can_connect());
    assert_eq!(
        view.status_for(BOB).await.unwrap(),
        Some(ConnectionStatus::Pending)
    );
}

#[tokio::test]
async fn test_rejected_connection_request_shows_server_error() {
    let backend = TestBackend::with_store(BackendStore {
        users: vec![user("u-ada", ADA), user("u-bob", BOB)],
        connections: vec![connection(BOB, ADA, ConnectionStatus::Pending)],
        ..BackendStore::default()
    })
    .await;
    let mut h =
        Harness::new(&backend, MockIdentityProvider::signed_in(identity("u-ada", ADA))).await;
    let view = ConnectionsView::new(h.app.clone());
    let bob = view.load().await.unwrap().candidates[1].user.clone();
    h.drain();

    let result = view.send_request(&bob).await;

    assert_server_status(&result, 400);
    let toasts = h.toasts();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].level, ToastLevel::Error);
    assert_eq!(toasts[0].message, "Connection request already exists");
    assert_eq!(backend.store().connections.len(), 1);
}

#[tokio::test]
async fn test_directory_search_resets_visible_batch() {
    let users = (1..=12)
        .map(|i| user(&format!("u{i}"), &format!("member{i}@example.com")))
        .collect();
    let backend = TestBackend::with_store(BackendStore {
        users,
        ..BackendStore::default()
    })
    .await;
    let h = Harness::new(&backend, MockIdentityProvider::signed_in(identity("u-ada", ADA))).await;
    let mut view = ConnectionsView::new(h.app.clone());

    let directory = view.load().await.unwrap();
    assert_eq!(directory.candidates.len(), 5);
    assert!(directory.has_more);

    view.load_more();
    view.load_more();
    let directory = view.load().await.unwrap();
    assert_eq!(directory.candidates.len(), 12);
    assert!(!directory.has_more);
    assert_eq!(backend.hits("GET", "/public-users"), 1);

    view.set_search("  member1 ");
    assert_eq!(view.visible(), 5);
    let names: Vec<String> = view
        .load()
        .await
        .unwrap()
        .candidates
        .iter()
        .map(|c| c.user.display_name().to_string())
        .collect();
    assert_eq!(names, vec!["member1", "member10", "member11", "member12"]);
    assert_eq!(backend.hits("GET", "/public-users"), 2);
}

#[tokio::test]
async fn test_connection_finder_needs_a_session() {
    let backend = TestBackend::with_store(BackendStore {
        users: vec![user("u-bob", BOB)],
        ..BackendStore::default()
    })
    .await;
    let mut h = Harness::new(&backend, MockIdentityProvider::signed_out()).await;
    let view = ConnectionsView::new(h.app.clone());

    assert!(matches!(view.read().unwrap(), Loadable::Idle));
    assert_not_signed_in(&view.load().await);

    let bob = user("u-bob", BOB);
    let stranger = agora_core::PublicUser {
        name: bob.name,
        username: None,
        email: bob.email,
        photo_url: None,
        bio: None,
        badge: None,
    };
    assert_not_signed_in(&view.send_request(&stranger).await);
    let toasts = h.toasts();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].action, Some(ToastAction::Login));
    assert_eq!(backend.hits("POST", "/connections"), 0);
    assert_eq!(backend.hits("GET", "/public-users"), 0);
}
