//! Agora Client - Headless Forum Client
//!
//! HTTP bindings for the Agora REST backend, the signed-in session, and one
//! view-model per screen. Views read through the shared
//! [`QueryCache`](agora_query::QueryCache) and report navigation and toasts
//! over the [`events`] channel; a UI shell renders both.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod identity;
pub mod keys;
pub mod nav;
pub mod notifications;
pub mod pagination;
pub mod payment;
pub mod session;
pub mod telemetry;
pub mod token;
pub mod types;
pub mod upload;
pub mod views;

pub use api::ApiClient;
pub use app::{App, Capabilities};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use events::{AppEvent, EventReceiver, EventSender};
pub use nav::{GuardDecision, Route};
pub use session::{Session, SessionManager, TokenStatus, UserIdentity};
