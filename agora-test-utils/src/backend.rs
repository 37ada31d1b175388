//! In-process Agora backend for integration tests.
//!
//! Serves the REST API the client speaks from an in-memory store on an
//! ephemeral localhost port. Every request is counted per `METHOD path`,
//! the last `Authorization` header is recorded, and any path can be forced
//! to answer with a fixed status.
//!
//! Bearer tokens are resolved to a caller email with [`bearer_for`]; routes
//! that act on behalf of a user answer `401` without one.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use agora_core::{
    AdminStats, Announcement, AnnouncementId, Comment, CommentId, Connection, ConnectionStatus,
    EntityIdType, Notification,
    NotificationId, Post, PostId, Reply, ReplyId, Report, ReportId, Role, RoleInfo, Subscription,
    Tag, UserId, UserProfile,
};
use axum::extract::{Multipart, Path, Query, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, patch, post, put};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

const TOKEN_PREFIX: &str = "test-token:";

/// Bearer token the backend resolves to `email`.
pub fn bearer_for(email: &str) -> String {
    format!("{TOKEN_PREFIX}{email}")
}

/// Backend data. Seed it before a test and inspect it afterwards.
#[derive(Debug, Clone, Default)]
pub struct BackendStore {
    pub posts: Vec<Post>,
    pub users: Vec<UserProfile>,
    pub tags: Vec<Tag>,
    pub reports: Vec<Report>,
    pub announcements: Vec<Announcement>,
    pub notifications: Vec<Notification>,
    pub connections: Vec<Connection>,
    /// Ids of payment intents handed out, in order.
    pub payment_intents: Vec<String>,
    /// Payment intent ids redeemed through the upgrade endpoint.
    pub upgrades: Vec<String>,
}

impl BackendStore {
    fn user_by_email_mut(&mut self, email: &str) -> Option<&mut UserProfile> {
        self.users
            .iter_mut()
            .find(|u| u.email.eq_ignore_ascii_case(email))
    }

    fn post_mut(&mut self, id: &str) -> Option<&mut Post> {
        self.posts.iter_mut().find(|p| p.id.as_str() == id)
    }

    fn comment_mut(&mut self, post_id: &str, comment_id: &str) -> Option<&mut Comment> {
        self.post_mut(post_id)?
            .comments
            .iter_mut()
            .find(|c| c.id.as_str() == comment_id)
    }

    fn stats(&self, caller: &str) -> AdminStats {
        let caller = self.users.iter().find(|u| u.email.eq_ignore_ascii_case(caller));
        let sum = |f: fn(&Post) -> i64| -> u64 {
            self.posts.iter().map(|p| f(p).max(0) as u64).sum()
        };
        AdminStats {
            name: caller.and_then(|u| u.name.clone()),
            email: caller.map(|u| u.email.clone()),
            image: caller.and_then(|u| u.photo.clone()),
            total_posts: self.posts.len() as u64,
            total_comments: self.posts.iter().map(|p| p.comments.len() as u64).sum(),
            total_users: self.users.len() as u64,
            total_up_votes: sum(|p| p.up_vote),
            total_down_votes: sum(|p| p.down_vote),
            total_reports: self.reports.len() as u64,
            total_notifications: self.notifications.len() as u64,
        }
    }
}

#[derive(Default)]
struct BackendState {
    store: Mutex<BackendStore>,
    hits: Mutex<HashMap<String, usize>>,
    authorization: Mutex<Option<String>>,
    forced: Mutex<HashMap<String, u16>>,
    latency: Mutex<Option<Duration>>,
}

type Shared = Arc<BackendState>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Running backend. Shuts down when dropped.
pub struct TestBackend {
    addr: SocketAddr,
    state: Shared,
    shutdown: Option<oneshot::Sender<()>>,
    _server: JoinHandle<()>,
}

impl TestBackend {
    pub async fn start() -> Self {
        Self::with_store(BackendStore::default()).await
    }

    pub async fn with_store(store: BackendStore) -> Self {
        let state: Shared = Arc::new(BackendState {
            store: Mutex::new(store),
            ..BackendState::default()
        });
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("test backend should bind an ephemeral port");
        let addr = listener
            .local_addr()
            .expect("bound listener should have an address");
        let app = router(state.clone());
        let (tx, rx) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            let shutdown = async {
                let _ = rx.await;
            };
            if let Err(err) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await
            {
                tracing::error!(error = %err, "test backend stopped");
            }
        });
        Self {
            addr,
            state,
            shutdown: Some(tx),
            _server: server,
        }
    }

    /// Base URL to hand to the client, without a trailing slash.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Requests seen for `method path`, e.g. `hits("GET", "/posts")`.
    pub fn hits(&self, method: &str, path: &str) -> usize {
        lock(&self.state.hits)
            .get(&format!("{method} {path}"))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_hits(&self) -> usize {
        lock(&self.state.hits).values().sum()
    }

    pub fn reset_hits(&self) {
        lock(&self.state.hits).clear();
    }

    /// `Authorization` header of the most recent request.
    pub fn last_authorization(&self) -> Option<String> {
        lock(&self.state.authorization).clone()
    }

    /// Answer every request to `path` with `status` until cleared.
    pub fn force_status(&self, path: &str, status: u16) {
        lock(&self.state.forced).insert(path.to_string(), status);
    }

    pub fn clear_forced(&self) {
        lock(&self.state.forced).clear();
    }

    /// Delay every response, to keep requests in flight.
    pub fn set_latency(&self, latency: Duration) {
        *lock(&self.state.latency) = Some(latency);
    }

    pub fn store(&self) -> MutexGuard<'_, BackendStore> {
        lock(&self.state.store)
    }
}

impl Drop for TestBackend {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/posts", get(list_posts))
        .route("/posts/search", get(search_posts))
        .route("/post/:id", get(get_post).delete(delete_post))
        .route("/post/:id/:action", put(vote_post).post(post_action))
        .route("/post/:id/comment/:cid", delete(delete_comment))
        .route(
            "/post/:id/comment/:cid/:action",
            put(vote_comment).post(comment_action),
        )
        .route("/user/posts/:uid", get(user_posts))
        .route("/user/post/count/:uid", get(post_count))
        .route("/user/post/:uid", post(create_post))
        .route("/user/membership/upgrade", post(upgrade_membership))
        .route("/users", get(list_users).post(create_user))
        .route("/users/:segment", put(update_profile).delete(delete_user))
        .route("/users/:action/:value", get(user_role).patch(toggle_admin))
        .route("/tags", get(list_tags).post(add_tag))
        .route("/tags/:name", delete(delete_tag))
        .route("/reports", get(list_reports))
        .route(
            "/announcements",
            get(list_announcements).post(create_announcement),
        )
        .route("/announcements/:id", delete(delete_announcement))
        .route("/notifications/:key", get(list_notifications))
        .route("/notifications/:key/:action", patch(mark_notifications))
        .route("/public-users", get(public_users))
        .route("/connections", post(create_connection))
        .route("/connections/:email", get(list_connections))
        .route("/create-payment-intent", post(create_payment_intent))
        .route("/admin/profile", get(admin_profile))
        .layer(middleware::from_fn_with_state(state.clone(), track))
        .with_state(state)
}

/// Count the request, record its credentials, then apply latency and any
/// forced status.
async fn track(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let key = format!("{} {}", request.method(), path);
    *lock(&state.hits).entry(key).or_insert(0) += 1;
    *lock(&state.authorization) = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let latency = *lock(&state.latency);
    if let Some(latency) = latency {
        tokio::time::sleep(latency).await;
    }
    let forced = lock(&state.forced).get(&path).copied();
    if let Some(status) = forced {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return error(status, &format!("forced {}", status.as_u16()));
    }
    next.run(request).await
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

/// Error in the `{error}` shape the connection routes answer with.
fn rejected(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn ok(value: Value) -> Response {
    Json(value).into_response()
}

fn not_found(what: &str) -> Response {
    error(StatusCode::NOT_FOUND, &format!("{what} not found"))
}

/// Caller email from the bearer token, or the `401` to answer with.
fn caller(headers: &HeaderMap) -> Result<String, Response> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .and_then(|token| token.strip_prefix(TOKEN_PREFIX))
        .map(str::to_string)
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "Unauthorized"))
}

fn new_id() -> String {
    uuid::Uuid::now_v7().simple().to_string()
}

fn text_field(body: &Value, field: &str) -> Option<String> {
    body.get(field).and_then(Value::as_str).map(str::to_string)
}

fn to_json<T: serde::Serialize>(value: &T) -> Response {
    match serde_json::to_value(value) {
        Ok(value) => ok(value),
        Err(err) => error(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string()),
    }
}

fn paginate<T: Clone>(items: &[T], page: u32, limit: u32) -> Vec<T> {
    let start = (page.max(1) as usize - 1) * limit as usize;
    items.iter().skip(start).take(limit as usize).cloned().collect()
}

fn vote_delta(action: &str) -> Option<(i64, i64)> {
    match action {
        "upvote" => Some((1, 0)),
        "downvote" => Some((0, 1)),
        _ => None,
    }
}

// === Posts ===

#[derive(Debug, Deserialize)]
struct PostListParams {
    sort: Option<String>,
    page: Option<u32>,
    limit: Option<u32>,
}

async fn list_posts(State(state): State<Shared>, Query(params): Query<PostListParams>) -> Response {
    let mut posts = lock(&state.store).posts.clone();
    if params.sort.as_deref() == Some("popular") {
        posts.sort_by_key(|p| std::cmp::Reverse(p.up_vote - p.down_vote));
    } else {
        posts.sort_by_key(|p| std::cmp::Reverse(p.created_at));
    }
    match (params.page, params.limit) {
        (None, None) => to_json(&posts),
        (page, limit) => {
            let page_items = paginate(&posts, page.unwrap_or(1), limit.unwrap_or(5));
            ok(json!({ "posts": page_items, "totalCount": posts.len() }))
        }
    }
}

#[derive(Debug, Deserialize)]
struct TagParams {
    tag: String,
}

async fn search_posts(State(state): State<Shared>, Query(params): Query<TagParams>) -> Response {
    let matches: Vec<Post> = lock(&state.store)
        .posts
        .iter()
        .filter(|p| {
            p.tag
                .as_deref()
                .is_some_and(|t| t.eq_ignore_ascii_case(&params.tag))
        })
        .cloned()
        .collect();
    to_json(&matches)
}

async fn get_post(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let store = lock(&state.store);
    match store.posts.iter().find(|p| p.id.as_str() == id) {
        Some(post) => to_json(post),
        None => not_found("Post"),
    }
}

async fn delete_post(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    if let Err(denied) = caller(&headers) {
        return denied;
    }
    let mut store = lock(&state.store);
    let before = store.posts.len();
    store.posts.retain(|p| p.id.as_str() != id);
    if store.posts.len() == before {
        return not_found("Post");
    }
    store.reports.retain(|r| r.post_id.as_str() != id);
    ok(json!({ "deletedCount": 1 }))
}

async fn vote_post(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path((id, action)): Path<(String, String)>,
) -> Response {
    if let Err(denied) = caller(&headers) {
        return denied;
    }
    let Some((up, down)) = vote_delta(&action) else {
        return not_found("Route");
    };
    let mut store = lock(&state.store);
    match store.post_mut(&id) {
        Some(post) => {
            post.up_vote += up;
            post.down_vote += down;
            ok(json!({ "modifiedCount": 1 }))
        }
        None => not_found("Post"),
    }
}

async fn post_action(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path((id, action)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(denied) = caller(&headers) {
        return denied;
    }
    if action != "comment" {
        return not_found("Route");
    }
    let Some(text) = text_field(&body, "comment") else {
        return error(StatusCode::BAD_REQUEST, "Comment is required");
    };
    let mut store = lock(&state.store);
    let Some(post) = store.post_mut(&id) else {
        return not_found("Post");
    };
    post.comments.push(Comment {
        id: CommentId::new(new_id()),
        text,
        user_name: text_field(&body, "userName"),
        user_email: text_field(&body, "userEmail"),
        user_image: text_field(&body, "userImage"),
        up_vote: 0,
        down_vote: 0,
        replies: Vec::new(),
        created_at: Some(Utc::now()),
    });
    ok(json!({ "modifiedCount": 1 }))
}

async fn delete_comment(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path((id, cid)): Path<(String, String)>,
) -> Response {
    if let Err(denied) = caller(&headers) {
        return denied;
    }
    let mut store = lock(&state.store);
    let Some(post) = store.post_mut(&id) else {
        return not_found("Post");
    };
    let before = post.comments.len();
    post.comments.retain(|c| c.id.as_str() != cid);
    if post.comments.len() == before {
        return not_found("Comment");
    }
    store.reports.retain(|r| r.comment_id.as_str() != cid);
    ok(json!({ "modifiedCount": 1 }))
}

async fn vote_comment(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path((id, cid, action)): Path<(String, String, String)>,
) -> Response {
    if let Err(denied) = caller(&headers) {
        return denied;
    }
    let Some((up, down)) = vote_delta(&action) else {
        return not_found("Route");
    };
    let mut store = lock(&state.store);
    match store.comment_mut(&id, &cid) {
        Some(comment) => {
            comment.up_vote += up;
            comment.down_vote += down;
            ok(json!({ "modifiedCount": 1 }))
        }
        None => not_found("Comment"),
    }
}

async fn comment_action(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path((id, cid, action)): Path<(String, String, String)>,
    Json(body): Json<Value>,
) -> Response {
    let reporter = match caller(&headers) {
        Ok(email) => email,
        Err(denied) => return denied,
    };
    let mut store = lock(&state.store);
    match action.as_str() {
        "reply" => {
            let Some(text) = text_field(&body, "reply") else {
                return error(StatusCode::BAD_REQUEST, "Reply is required");
            };
            let Some(comment) = store.comment_mut(&id, &cid) else {
                return not_found("Comment");
            };
            comment.replies.push(Reply {
                id: ReplyId::new(new_id()),
                text,
                user_name: text_field(&body, "userName"),
                user_email: text_field(&body, "userEmail"),
                user_image: text_field(&body, "userImage"),
                created_at: Some(Utc::now()),
            });
            ok(json!({ "modifiedCount": 1 }))
        }
        "report" => {
            if store.comment_mut(&id, &cid).is_none() {
                return not_found("Comment");
            }
            store.reports.push(Report {
                id: ReportId::new(new_id()),
                post_id: PostId::new(id),
                comment_id: CommentId::new(cid),
                reporter_email: Some(reporter),
                feedback: text_field(&body, "feedback").unwrap_or_default(),
                created_at: Some(Utc::now()),
            });
            ok(json!({ "insertedId": new_id() }))
        }
        _ => not_found("Route"),
    }
}

async fn user_posts(State(state): State<Shared>, headers: HeaderMap, Path(uid): Path<String>) -> Response {
    if let Err(denied) = caller(&headers) {
        return denied;
    }
    let posts: Vec<Post> = lock(&state.store)
        .posts
        .iter()
        .filter(|p| p.author_id.as_ref().is_some_and(|a| a.as_str() == uid))
        .cloned()
        .collect();
    to_json(&posts)
}

async fn post_count(State(state): State<Shared>, headers: HeaderMap, Path(uid): Path<String>) -> Response {
    if let Err(denied) = caller(&headers) {
        return denied;
    }
    let count = lock(&state.store)
        .posts
        .iter()
        .filter(|p| p.author_id.as_ref().is_some_and(|a| a.as_str() == uid))
        .count();
    ok(json!({ "count": count }))
}

async fn create_post(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(_uid): Path<String>,
    Json(mut body): Json<Value>,
) -> Response {
    if let Err(denied) = caller(&headers) {
        return denied;
    }
    let id = new_id();
    if let Some(fields) = body.as_object_mut() {
        fields.insert("_id".to_string(), json!(id));
    }
    match serde_json::from_value::<Post>(body) {
        Ok(post) => {
            lock(&state.store).posts.push(post);
            ok(json!({ "insertedId": id }))
        }
        Err(err) => error(StatusCode::BAD_REQUEST, &err.to_string()),
    }
}

async fn upgrade_membership(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let email = match caller(&headers) {
        Ok(email) => email,
        Err(denied) => return denied,
    };
    let Some(intent) = text_field(&body, "paymentIntentId") else {
        return error(StatusCode::BAD_REQUEST, "paymentIntentId is required");
    };
    let mut store = lock(&state.store);
    if !store.payment_intents.contains(&intent) {
        return error(StatusCode::BAD_REQUEST, "Unknown payment intent");
    }
    match store.user_by_email_mut(&email) {
        Some(user) => user.subscription = Subscription::Premium,
        None => return not_found("User"),
    }
    store.upgrades.push(intent);
    ok(json!({ "modifiedCount": 1 }))
}

// === Users ===

#[derive(Debug, Deserialize)]
struct UserListParams {
    search: Option<String>,
    page: Option<u32>,
    limit: Option<u32>,
}

async fn list_users(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<UserListParams>,
) -> Response {
    if let Err(denied) = caller(&headers) {
        return denied;
    }
    let store = lock(&state.store);
    let needle = params.search.unwrap_or_default().to_lowercase();
    let matching: Vec<UserProfile> = store
        .users
        .iter()
        .filter(|u| {
            needle.is_empty()
                || u.name
                    .as_deref()
                    .is_some_and(|n| n.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect();
    let users = match (params.page, params.limit) {
        (None, None) => matching.clone(),
        (page, limit) => paginate(&matching, page.unwrap_or(1), limit.unwrap_or(10)),
    };
    ok(json!({ "users": users, "totalCount": matching.len() }))
}

async fn create_user(State(state): State<Shared>, Json(mut body): Json<Value>) -> Response {
    let Some(email) = text_field(&body, "email") else {
        return error(StatusCode::BAD_REQUEST, "Email is required");
    };
    let mut store = lock(&state.store);
    if store.user_by_email_mut(&email).is_some() {
        return ok(json!({ "message": "user already exists", "insertedId": null }));
    }
    let id = new_id();
    if let Some(fields) = body.as_object_mut() {
        fields.insert("_id".to_string(), json!(id));
    }
    match serde_json::from_value::<UserProfile>(body) {
        Ok(user) => {
            store.users.push(user);
            ok(json!({ "insertedId": id }))
        }
        Err(err) => error(StatusCode::BAD_REQUEST, &err.to_string()),
    }
}

async fn update_profile(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(segment): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(denied) = caller(&headers) {
        return denied;
    }
    if segment != "update" {
        return not_found("Route");
    }
    let Some(email) = text_field(&body, "email") else {
        return error(StatusCode::BAD_REQUEST, "Email is required");
    };
    let updates = body.get("updates").cloned().unwrap_or(Value::Null);
    let mut store = lock(&state.store);
    let Some(user) = store.user_by_email_mut(&email) else {
        return not_found("User");
    };
    if let Some(name) = text_field(&updates, "name") {
        user.name = Some(name);
    }
    if let Some(photo) = text_field(&updates, "photoURL") {
        user.photo = Some(photo);
    }
    ok(json!({ "modifiedCount": 1 }))
}

async fn delete_user(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    if let Err(denied) = caller(&headers) {
        return denied;
    }
    let mut store = lock(&state.store);
    let before = store.users.len();
    store.users.retain(|u| u.id.as_str() != id);
    if store.users.len() == before {
        return not_found("User");
    }
    ok(json!({ "deletedCount": 1 }))
}

async fn user_role(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path((action, email)): Path<(String, String)>,
) -> Response {
    if let Err(denied) = caller(&headers) {
        return denied;
    }
    if action != "role" {
        return not_found("Route");
    }
    let store = lock(&state.store);
    let info = match store.users.iter().find(|u| u.email.eq_ignore_ascii_case(&email)) {
        Some(user) => RoleInfo {
            email: Some(user.email.clone()),
            role: user.role,
            subscription: user.subscription,
            name: user.name.clone(),
            photo: user.photo.clone(),
        },
        None => RoleInfo {
            email: Some(email),
            ..RoleInfo::default()
        },
    };
    to_json(&info)
}

async fn toggle_admin(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path((action, id)): Path<(String, String)>,
) -> Response {
    if let Err(denied) = caller(&headers) {
        return denied;
    }
    let role = match action.as_str() {
        "make-admin" => Role::Admin,
        "remove-admin" => Role::User,
        _ => return not_found("Route"),
    };
    let mut store = lock(&state.store);
    match store.users.iter_mut().find(|u| u.id == UserId::new(id.as_str())) {
        Some(user) => {
            user.role = role;
            ok(json!({ "modifiedCount": 1 }))
        }
        None => not_found("User"),
    }
}

// === Tags, reports, announcements ===

async fn list_tags(State(state): State<Shared>) -> Response {
    to_json(&lock(&state.store).tags)
}

async fn add_tag(State(state): State<Shared>, headers: HeaderMap, Json(tag): Json<Tag>) -> Response {
    if let Err(denied) = caller(&headers) {
        return denied;
    }
    let mut store = lock(&state.store);
    if store.tags.iter().any(|t| t.name.eq_ignore_ascii_case(&tag.name)) {
        return error(StatusCode::BAD_REQUEST, "Tag already exists");
    }
    store.tags.push(tag);
    ok(json!({ "insertedId": new_id() }))
}

async fn delete_tag(State(state): State<Shared>, headers: HeaderMap, Path(name): Path<String>) -> Response {
    if let Err(denied) = caller(&headers) {
        return denied;
    }
    let mut store = lock(&state.store);
    let before = store.tags.len();
    store.tags.retain(|t| t.name != name);
    if store.tags.len() == before {
        return not_found("Tag");
    }
    ok(json!({ "deletedCount": 1 }))
}

#[derive(Debug, Deserialize)]
struct PageParams {
    page: Option<u32>,
    limit: Option<u32>,
}

async fn list_reports(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<PageParams>,
) -> Response {
    if let Err(denied) = caller(&headers) {
        return denied;
    }
    let store = lock(&state.store);
    let reports = paginate(
        &store.reports,
        params.page.unwrap_or(1),
        params.limit.unwrap_or(10),
    );
    ok(json!({ "reports": reports, "totalCount": store.reports.len() }))
}

async fn list_announcements(State(state): State<Shared>) -> Response {
    to_json(&lock(&state.store).announcements)
}

/// Multipart create; fans a notification out to every stored user.
async fn create_announcement(
    State(state): State<Shared>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    if let Err(denied) = caller(&headers) {
        return denied;
    }
    let mut fields: HashMap<String, String> = HashMap::new();
    let mut image: Option<String> = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => return error(StatusCode::BAD_REQUEST, &err.to_string()),
        };
        let name = field.name().unwrap_or_default().to_string();
        if name == "authorImage" {
            let file_name = field.file_name().unwrap_or("image").to_string();
            if field.bytes().await.is_err() {
                return error(StatusCode::BAD_REQUEST, "Unreadable image");
            }
            image = Some(format!("https://images.test/{file_name}"));
        } else {
            let value = field.text().await.unwrap_or_default();
            fields.insert(name, value);
        }
    }
    let Some(title) = fields.get("title").cloned() else {
        return error(StatusCode::BAD_REQUEST, "Title is required");
    };
    let Some(image) = image else {
        return error(StatusCode::BAD_REQUEST, "Author image is required");
    };

    let mut store = lock(&state.store);
    let id = AnnouncementId::new(new_id());
    store.announcements.push(Announcement {
        id: id.clone(),
        author_name: fields.get("authorName").cloned(),
        author_image: Some(image),
        title: title.clone(),
        description: fields.get("description").cloned().unwrap_or_default(),
        created_at: Some(Utc::now()),
    });
    let recipients: Vec<String> = store.users.iter().map(|u| u.email.clone()).collect();
    for email in &recipients {
        store.notifications.push(Notification {
            id: NotificationId::new(new_id()),
            email: Some(email.clone()),
            message: format!("New announcement: {title}"),
            read: false,
            announcement_id: Some(id.clone()),
            created_at: Some(Utc::now()),
        });
    }
    ok(json!({
        "insertedId": id.as_str(),
        "notifications": { "success": recipients.len(), "failed": 0 }
    }))
}

async fn delete_announcement(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(denied) = caller(&headers) {
        return denied;
    }
    let mut store = lock(&state.store);
    let before = store.announcements.len();
    store.announcements.retain(|a| a.id.as_str() != id);
    if store.announcements.len() == before {
        return not_found("Announcement");
    }
    store
        .notifications
        .retain(|n| n.announcement_id.as_ref().map(|a| a.as_str()) != Some(id.as_str()));
    ok(json!({ "deletedCount": 1 }))
}

// === Notifications ===

#[derive(Debug, Deserialize)]
struct NotificationParams {
    all: Option<bool>,
}

async fn list_notifications(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(email): Path<String>,
    Query(params): Query<NotificationParams>,
) -> Response {
    if let Err(denied) = caller(&headers) {
        return denied;
    }
    let include_read = params.all.unwrap_or(false);
    let list: Vec<Notification> = lock(&state.store)
        .notifications
        .iter()
        .filter(|n| n.email.as_deref().is_some_and(|e| e.eq_ignore_ascii_case(&email)))
        .filter(|n| include_read || !n.read)
        .cloned()
        .collect();
    to_json(&list)
}

async fn mark_notifications(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path((key, action)): Path<(String, String)>,
) -> Response {
    if let Err(denied) = caller(&headers) {
        return denied;
    }
    let mut store = lock(&state.store);
    let modified = match action.as_str() {
        "read" => store
            .notifications
            .iter_mut()
            .filter(|n| n.id.as_str() == key)
            .map(|n| n.read = true)
            .count(),
        "read-all" => store
            .notifications
            .iter_mut()
            .filter(|n| n.email.as_deref().is_some_and(|e| e.eq_ignore_ascii_case(&key)))
            .map(|n| n.read = true)
            .count(),
        _ => return not_found("Route"),
    };
    if action == "read" && modified == 0 {
        return not_found("Notification");
    }
    ok(json!({ "modifiedCount": modified }))
}

// === Connections ===

#[derive(Debug, Deserialize)]
struct DirectoryParams {
    search: Option<String>,
}

async fn public_users(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<DirectoryParams>,
) -> Response {
    if let Err(denied) = caller(&headers) {
        return denied;
    }
    let needle = params.search.unwrap_or_default().trim().to_lowercase();
    let store = lock(&state.store);
    let listed: Vec<Value> = store
        .users
        .iter()
        .filter(|u| {
            needle.is_empty()
                || u.email.to_lowercase().contains(&needle)
                || u.name
                    .as_deref()
                    .is_some_and(|n| n.to_lowercase().contains(&needle))
        })
        .map(|u| {
            let badge = match u.subscription {
                Subscription::Premium => "Gold",
                Subscription::Free => "Bronze",
            };
            json!({
                "name": u.name,
                "email": u.email,
                "photoURL": u.photo,
                "Badge": badge,
            })
        })
        .collect();
    ok(Value::Array(listed))
}

async fn list_connections(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(email): Path<String>,
) -> Response {
    if let Err(denied) = caller(&headers) {
        return denied;
    }
    let list: Vec<Connection> = lock(&state.store)
        .connections
        .iter()
        .filter(|c| {
            c.from_email.eq_ignore_ascii_case(&email) || c.to_email.eq_ignore_ascii_case(&email)
        })
        .cloned()
        .collect();
    to_json(&list)
}

async fn create_connection(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let email = match caller(&headers) {
        Ok(email) => email,
        Err(denied) => return denied,
    };
    let from = text_field(&body, "fromEmail");
    let to = text_field(&body, "toEmail");
    let (Some(from), Some(to)) = (from, to) else {
        return rejected(StatusCode::BAD_REQUEST, "fromEmail and toEmail are required");
    };
    if !from.eq_ignore_ascii_case(&email) {
        return rejected(StatusCode::FORBIDDEN, "Cannot send requests for another user");
    }
    if from.eq_ignore_ascii_case(&to) {
        return rejected(StatusCode::BAD_REQUEST, "Cannot connect with yourself");
    }
    let mut store = lock(&state.store);
    let exists = store
        .connections
        .iter()
        .any(|c| c.links(&from, &to) && c.status != ConnectionStatus::Other);
    if exists {
        return rejected(StatusCode::BAD_REQUEST, "Connection request already exists");
    }
    store.connections.push(Connection {
        from_email: from,
        to_email: to,
        status: ConnectionStatus::Pending,
        created_at: Some(Utc::now()),
    });
    ok(json!({ "insertedId": new_id() }))
}

// === Payments and admin ===

async fn create_payment_intent(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let email = match caller(&headers) {
        Ok(email) => email,
        Err(denied) => return denied,
    };
    if body.get("price").and_then(Value::as_u64).unwrap_or(0) == 0 {
        return error(StatusCode::BAD_REQUEST, "Invalid price");
    }
    let mut store = lock(&state.store);
    let id = format!("pi_{}", store.payment_intents.len() + 1);
    store.payment_intents.push(id.clone());
    ok(json!({ "clientSecret": format!("{id}_secret_test"), "email": email }))
}

async fn admin_profile(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let email = match caller(&headers) {
        Ok(email) => email,
        Err(denied) => return denied,
    };
    let store = lock(&state.store);
    let is_admin = store
        .users
        .iter()
        .any(|u| u.email.eq_ignore_ascii_case(&email) && u.role.is_admin());
    if !is_admin {
        return error(StatusCode::FORBIDDEN, "Admin access required");
    }
    to_json(&store.stats(&email))
}
