//! Route definitions and access guards.

use agora_core::{PostId, Role};
use serde::{Deserialize, Serialize};

use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Route {
    Home,
    Login,
    Register,
    About,
    Membership,
    Forbidden,
    NotFound,
    DashboardHome,
    UpdateProfile,
    AddPost,
    MyPosts,
    AdminProfile,
    ManageUsers,
    ReportedActivities,
    MakeAnnouncement,
    PostDetail(PostId),
    PostComments(PostId),
}

/// Who may open a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    Public,
    Private,
    Admin,
}

/// Outcome of running a route's guard against the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    /// Session or role lookup still resolving; show a spinner.
    Pending,
    RedirectLogin,
    RedirectForbidden,
}

impl Route {
    pub fn title(&self) -> &'static str {
        match self {
            Route::Home => "Home",
            Route::Login => "Join Us",
            Route::Register => "Register",
            Route::About => "About",
            Route::Membership => "Membership",
            Route::Forbidden => "Forbidden",
            Route::NotFound => "Page not found",
            Route::DashboardHome => "Dashboard",
            Route::UpdateProfile => "Update Profile",
            Route::AddPost => "Add Post",
            Route::MyPosts => "My Posts",
            Route::AdminProfile => "Admin Profile",
            Route::ManageUsers => "Manage Users",
            Route::ReportedActivities => "Reported Activities",
            Route::MakeAnnouncement => "Make Announcement",
            Route::PostDetail(_) => "Post",
            Route::PostComments(_) => "Comments",
        }
    }

    pub fn access(&self) -> RouteAccess {
        match self {
            Route::Membership
            | Route::DashboardHome
            | Route::UpdateProfile
            | Route::AddPost
            | Route::MyPosts => RouteAccess::Private,
            Route::AdminProfile
            | Route::ManageUsers
            | Route::ReportedActivities
            | Route::MakeAnnouncement => RouteAccess::Admin,
            _ => RouteAccess::Public,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Login => "/join-us".to_string(),
            Route::Register => "/register".to_string(),
            Route::About => "/about".to_string(),
            Route::Membership => "/membership".to_string(),
            Route::Forbidden => "/forbidden".to_string(),
            Route::NotFound => "/404".to_string(),
            Route::DashboardHome => "/dashboard".to_string(),
            Route::UpdateProfile => "/dashboard/update-profile".to_string(),
            Route::AddPost => "/dashboard/add-post".to_string(),
            Route::MyPosts => "/dashboard/my-posts".to_string(),
            Route::AdminProfile => "/dashboard/admin-profile".to_string(),
            Route::ManageUsers => "/dashboard/manage-users".to_string(),
            Route::ReportedActivities => "/dashboard/reported-activities".to_string(),
            Route::MakeAnnouncement => "/dashboard/make-announcement".to_string(),
            Route::PostDetail(id) => format!("/post/{}", id),
            Route::PostComments(id) => format!("/post/{}/comments", id),
        }
    }

    /// Resolve a location path. Unknown paths map to `NotFound`.
    pub fn from_path(path: &str) -> Route {
        let segments: Vec<&str> = path
            .split('?')
            .next()
            .unwrap_or_default()
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        match segments.as_slice() {
            [] => Route::Home,
            ["join-us"] | ["login"] => Route::Login,
            ["register"] => Route::Register,
            ["about"] => Route::About,
            ["membership"] => Route::Membership,
            ["forbidden"] => Route::Forbidden,
            ["dashboard"] => Route::DashboardHome,
            ["dashboard", "update-profile"] => Route::UpdateProfile,
            ["dashboard", "add-post"] => Route::AddPost,
            ["dashboard", "my-posts"] => Route::MyPosts,
            ["dashboard", "admin-profile"] => Route::AdminProfile,
            ["dashboard", "manage-users"] => Route::ManageUsers,
            ["dashboard", "reported-activities"] => Route::ReportedActivities,
            ["dashboard", "make-announcement"] => Route::MakeAnnouncement,
            ["post", id] => Route::PostDetail(PostId::new(*id)),
            ["post", id, "comments"] => Route::PostComments(PostId::new(*id)),
            _ => Route::NotFound,
        }
    }

    /// Check access for this route. `role` is `None` while the role lookup
    /// for a signed-in user is still in flight.
    pub fn guard(&self, session: &Session, role: Option<Role>) -> GuardDecision {
        let access = self.access();
        if access == RouteAccess::Public {
            return GuardDecision::Allow;
        }
        if session.loading {
            return GuardDecision::Pending;
        }
        if session.identity.is_none() {
            return GuardDecision::RedirectLogin;
        }
        match (access, role) {
            (RouteAccess::Admin, None) => GuardDecision::Pending,
            (RouteAccess::Admin, Some(role)) if !role.is_admin() => {
                GuardDecision::RedirectForbidden
            }
            _ => GuardDecision::Allow,
        }
    }

    pub fn dashboard_menu(is_admin: bool) -> &'static [Route] {
        if is_admin {
            &[
                Route::AdminProfile,
                Route::ManageUsers,
                Route::ReportedActivities,
                Route::MakeAnnouncement,
            ]
        } else {
            &[
                Route::DashboardHome,
                Route::UpdateProfile,
                Route::AddPost,
                Route::MyPosts,
            ]
        }
    }
}

impl GuardDecision {
    /// Where to send the user instead, if anywhere.
    pub fn redirect(&self) -> Option<Route> {
        match self {
            GuardDecision::RedirectLogin => Some(Route::Login),
            GuardDecision::RedirectForbidden => Some(Route::Forbidden),
            GuardDecision::Allow | GuardDecision::Pending => None,
        }
    }
}
