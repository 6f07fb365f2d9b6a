use models::FavoriteSet;
use tokio::sync::broadcast::{channel, Receiver, Sender};

/// Session transitions, for views that want to refresh without polling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn { username: String },
    ProfileUpdated { username: String },
    FavoritesChanged { username: String, favorites: FavoriteSet },
    LoggedOut,
}

#[derive(Clone)]
pub struct EventBroadcaster {
    sender: Sender<SessionEvent>,
}

impl Default for EventBroadcaster {
    fn default() -> Self { Self::new() }
}

impl EventBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = channel(64);
        Self { sender }
    }

    pub fn broadcast(&self, event: SessionEvent) {
        // no subscribers is fine
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> Receiver<SessionEvent> {
        self.sender.subscribe()
    }
}
