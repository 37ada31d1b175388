//! View-models, one per screen.
//!
//! A view holds a clone of [`App`](crate::app::App) plus its own UI state
//! (page, sort, search). Reads go through the query cache; actions run as
//! cache mutations and report their outcome as toasts.

mod helpers;

pub mod add_post;
pub mod admin_profile;
pub mod admin_reports;
pub mod admin_users;
pub mod announcements;
pub mod auth;
pub mod connections;
pub mod dashboard;
pub mod feed;
pub mod interactions;
pub mod membership;
pub mod my_posts;
pub mod notifications;
pub mod post_detail;
pub mod profile;
pub mod tags;

pub use add_post::AddPostView;
pub use admin_profile::AdminProfileView;
pub use admin_reports::AdminReportsView;
pub use admin_users::AdminUsersView;
pub use announcements::AnnouncementsView;
pub use auth::{AuthView, RegistrationForm};
pub use connections::{Candidate, ConnectionsView, Directory};
pub use dashboard::{DashboardSummary, DashboardView};
pub use feed::FeedView;
pub use helpers::Loadable;
pub use interactions::PostActions;
pub use membership::{MembershipStatus, MembershipView};
pub use my_posts::MyPostsView;
pub use notifications::NotificationsView;
pub use post_detail::PostDetailView;
pub use profile::{ProfileSummary, ProfileView};
pub use tags::TagBrowserView;
