//! Member directory entries and connection requests between members.

use crate::entities::ANONYMOUS;
use crate::identity::Timestamp;
use serde::{Deserialize, Serialize};

/// Badge label shown when the directory omits one.
pub const DEFAULT_BADGE: &str = "Bronze";
/// Bio shown when a member has not written one.
pub const NO_BIO: &str = "No bio";

/// A member as listed by `GET /public-users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    pub email: String,
    #[serde(default, rename = "photoURL")]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default, rename = "Badge")]
    pub badge: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

impl PublicUser {
    /// Name, then username, then the anonymous placeholder.
    pub fn display_name(&self) -> &str {
        non_blank(&self.name)
            .or_else(|| non_blank(&self.username))
            .unwrap_or(ANONYMOUS)
    }

    pub fn bio_or_default(&self) -> &str {
        non_blank(&self.bio).unwrap_or(NO_BIO)
    }

    pub fn badge_or_default(&self) -> &str {
        non_blank(&self.badge).unwrap_or(DEFAULT_BADGE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Pending,
    Accepted,
    /// Any status this client does not act on, e.g. a declined request.
    #[serde(other)]
    Other,
}

/// A connection request between two members, in either state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub from_email: String,
    pub to_email: String,
    pub status: ConnectionStatus,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

impl Connection {
    /// True if the request links `a` and `b`, whichever of them sent it.
    pub fn links(&self, a: &str, b: &str) -> bool {
        let matches = |x: &str, y: &str| {
            self.from_email.eq_ignore_ascii_case(x) && self.to_email.eq_ignore_ascii_case(y)
        };
        matches(a, b) || matches(b, a)
    }
}

/// How the connect control renders for one directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectState {
    /// The entry is the signed-in member.
    You,
    /// A request between the two is waiting for an answer.
    Pending,
    Connected,
    /// No request yet, or only one the client does not act on.
    Available,
}

impl ConnectState {
    pub fn label(&self) -> &'static str {
        match self {
            ConnectState::You => "You",
            ConnectState::Pending => "Pending",
            ConnectState::Connected => "Connected",
            ConnectState::Available => "Connect",
        }
    }

    pub fn can_connect(&self) -> bool {
        matches!(self, ConnectState::Available)
    }
}

/// Status of the first request linking `me` and `other`.
pub fn connection_status(
    connections: &[Connection],
    me: &str,
    other: &str,
) -> Option<ConnectionStatus> {
    connections
        .iter()
        .find(|c| c.links(me, other))
        .map(|c| c.status)
}

pub fn connect_state(connections: &[Connection], me: &str, other: &str) -> ConnectState {
    if me.eq_ignore_ascii_case(other) {
        return ConnectState::You;
    }
    match connection_status(connections, me, other) {
        Some(ConnectionStatus::Pending) => ConnectState::Pending,
        Some(ConnectionStatus::Accepted) => ConnectState::Connected,
        Some(ConnectionStatus::Other) | None => ConnectState::Available,
    }
}
