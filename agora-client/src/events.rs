//! Events emitted by the client for the UI shell to act on.

use tokio::sync::mpsc;

use crate::nav::Route;
use crate::notifications::Toast;

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    Navigate(Route),
    Toast(Toast),
    /// Sign-in, sign-out, or token expiry changed the session.
    SessionChanged,
}

/// Cloneable sending half handed to every component that can emit events.
///
/// Sends never block and never fail loudly: once the shell has dropped its
/// receiver there is nobody left to show the event to.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<AppEvent>,
}

pub type EventReceiver = mpsc::UnboundedReceiver<AppEvent>;

pub fn channel() -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx }, rx)
}

impl EventSender {
    pub fn send(&self, event: AppEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("event receiver dropped");
        }
    }

    pub fn navigate(&self, route: Route) {
        tracing::debug!(route = %route.path(), "navigate");
        self.send(AppEvent::Navigate(route));
    }

    pub fn toast(&self, toast: Toast) {
        self.send(AppEvent::Toast(toast));
    }

    pub fn session_changed(&self) {
        self.send(AppEvent::SessionChanged);
    }
}
