//! # Session State
//!
//! Process-wide state shared by every mode and tab, passed around as an
//! `Arc<SessionState>` rather than living in globals.
//!
//! ```text
//! SessionState
//! ├── dimensions: RwLock<Dimensions>     // terminal size, written on every resize
//! ├── server: RwLock<Option<Server>>     // written by server selection
//! └── cache: RwLock<ReadyCache>          // written by the gateway handshake
//! ```
//!
//! Writers take the exclusive lock, readers the shared one. Getters hand back
//! owned copies so nothing borrowed from inside a lock outlives its guard.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use log::debug;

use crate::client::{Channel, ChannelId, ReadySnapshot, Server, User, UserId};

/// Terminal size in cells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u16,
    pub height: u16,
}

/// Lookup tables built from the gateway's ready snapshot.
#[derive(Debug, Default)]
struct ReadyCache {
    ready: bool,
    servers: Vec<Server>,
    channels: HashMap<ChannelId, Channel>,
    users: HashMap<UserId, User>,
}

#[derive(Debug, Default)]
pub struct SessionState {
    dimensions: RwLock<Dimensions>,
    server: RwLock<Option<Server>>,
    cache: RwLock<ReadyCache>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_dimensions(&self, width: u16, height: u16) {
        let mut dims = self
            .dimensions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *dims = Dimensions { width, height };
    }

    pub fn dimensions(&self) -> Dimensions {
        *self
            .dimensions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn width(&self) -> u16 {
        self.dimensions().width
    }

    pub fn height(&self) -> u16 {
        self.dimensions().height
    }

    /// Records the server the user is interacting with.
    pub fn set_server(&self, server: Server) {
        debug!("Selected server {} ({})", server.name, server.id);
        *self.server.write().unwrap_or_else(PoisonError::into_inner) = Some(server);
    }

    /// The currently selected server, if any.
    pub fn server(&self) -> Option<Server> {
        self.server
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the ready cache with a fresh snapshot.
    pub fn store_ready(&self, snapshot: ReadySnapshot) {
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        debug!(
            "Ready cache updated (first: {}, servers: {}, channels: {}, users: {})",
            !cache.ready,
            snapshot.servers.len(),
            snapshot.channels.len(),
            snapshot.users.len()
        );
        cache.servers = snapshot.servers;
        cache.channels = snapshot
            .channels
            .into_iter()
            .map(|c| (c.id.clone(), c))
            .collect();
        cache.users = snapshot
            .users
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();
        cache.ready = true;
    }

    /// Whether the ready cache has been populated at least once.
    pub fn is_ready(&self) -> bool {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).ready
    }

    pub fn servers(&self) -> Vec<Server> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .servers
            .clone()
    }

    pub fn cached_channel(&self, id: &ChannelId) -> Option<Channel> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .channels
            .get(id)
            .cloned()
    }

    /// Adds a user fetched outside the ready snapshot.
    pub fn remember_user(&self, user: User) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .users
            .insert(user.id.clone(), user);
    }

    /// Display label for a user, if known.
    pub fn user_name(&self, id: &UserId) -> Option<String> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .users
            .get(id)
            .map(|u| u.label().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ServerId;
    use crate::test_support::{test_channel, test_server, test_user};

    #[test]
    fn test_dimensions_track_last_resize() {
        let state = SessionState::new();
        let sizes = [(80, 24), (120, 40), (10, 3), (200, 60), (81, 25)];
        for (w, h) in sizes {
            state.set_dimensions(w, h);
        }
        assert_eq!(state.dimensions(), Dimensions { width: 81, height: 25 });
        assert_eq!(state.width(), 81);
        assert_eq!(state.height(), 25);
    }

    #[test]
    fn test_server_starts_unset() {
        let state = SessionState::new();
        assert!(state.server().is_none());
        state.set_server(test_server("s1", &["c1"]));
        assert_eq!(state.server().map(|s| s.id), Some(ServerId::from("s1")));
    }

    #[test]
    fn test_ready_cache_lookup() {
        let state = SessionState::new();
        assert!(!state.is_ready());
        assert!(state.servers().is_empty());

        state.store_ready(ReadySnapshot {
            users: vec![test_user("u1", "alice")],
            servers: vec![test_server("s1", &["c1"])],
            channels: vec![test_channel("c1", "general")],
        });

        assert!(state.is_ready());
        assert_eq!(state.servers().len(), 1);
        assert_eq!(state.servers()[0].id, ServerId::from("s1"));
        assert_eq!(
            state.cached_channel(&ChannelId::from("c1")).and_then(|c| c.name),
            Some("general".to_string())
        );
        assert_eq!(state.user_name(&UserId::from("u1")).as_deref(), Some("alice"));
        assert!(state.user_name(&UserId::from("nobody")).is_none());
    }

    #[test]
    fn test_returned_servers_are_copies() {
        let state = SessionState::new();
        state.store_ready(ReadySnapshot {
            servers: vec![test_server("s1", &[])],
            ..Default::default()
        });
        let mut servers = state.servers();
        servers[0].name = "mutated".to_string();
        assert_eq!(state.servers()[0].name, "server s1");
    }

    #[test]
    fn test_remember_user() {
        let state = SessionState::new();
        state.remember_user(test_user("u9", "zed"));
        assert_eq!(state.user_name(&UserId::from("u9")).as_deref(), Some("zed"));
    }
}
