//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::client::{
    Channel, ChannelId, ChannelType, ChatClient, ClientError, FetchMessages, Message, MessageId,
    Server, ServerId, User, UserId,
};
use crate::core::state::SessionState;

/// A scripted in-memory chat client.
///
/// Lookups answer from the maps (404 when absent). Message fetches pop the
/// next scripted page, returning an empty page once the script runs out.
#[derive(Default)]
pub struct MockClient {
    servers: Mutex<HashMap<ServerId, Server>>,
    channels: Mutex<HashMap<ChannelId, Channel>>,
    users: Mutex<HashMap<UserId, User>>,
    pages: Mutex<VecDeque<Result<Vec<Message>, ClientError>>>,
    queries: Mutex<Vec<FetchMessages>>,
    sent: Mutex<Vec<(ChannelId, String)>>,
    send_error: Mutex<Option<ClientError>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_server(self, server: Server) -> Self {
        self.servers.lock().unwrap().insert(server.id.clone(), server);
        self
    }

    pub fn with_channel(self, channel: Channel) -> Self {
        self.channels
            .lock()
            .unwrap()
            .insert(channel.id.clone(), channel);
        self
    }

    pub fn with_user(self, user: User) -> Self {
        self.users.lock().unwrap().insert(user.id.clone(), user);
        self
    }

    pub fn push_page(&self, page: Result<Vec<Message>, ClientError>) {
        self.pages.lock().unwrap().push_back(page);
    }

    pub fn fail_sends(&self, error: ClientError) {
        *self.send_error.lock().unwrap() = Some(error);
    }

    pub fn queries(&self) -> Vec<FetchMessages> {
        self.queries.lock().unwrap().clone()
    }
}

fn not_found(what: &str) -> ClientError {
    ClientError::Api {
        status: 404,
        message: format!("{what} not found"),
    }
}

#[async_trait]
impl ChatClient for MockClient {
    async fn fetch_self(&self) -> Result<User, ClientError> {
        Ok(test_user("me", "me"))
    }

    async fn fetch_server(&self, id: &ServerId) -> Result<Server, ClientError> {
        self.servers
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("server"))
    }

    async fn fetch_channel(&self, id: &ChannelId) -> Result<Channel, ClientError> {
        self.channels
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("channel"))
    }

    async fn fetch_user(&self, id: &UserId) -> Result<User, ClientError> {
        self.users
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("user"))
    }

    async fn fetch_messages(
        &self,
        _channel: &ChannelId,
        query: FetchMessages,
    ) -> Result<Vec<Message>, ClientError> {
        self.queries.lock().unwrap().push(query);
        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn send_message(
        &self,
        channel: &ChannelId,
        content: &str,
    ) -> Result<Message, ClientError> {
        if let Some(error) = self.send_error.lock().unwrap().clone() {
            return Err(error);
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push((channel.clone(), content.to_string()));
        let id = format!("01ZZZZZZZZZZZZZZZZZZZZ{:04}", sent.len());
        Ok(test_message(&id, channel.as_str(), content))
    }
}

pub fn test_server(id: &str, channels: &[&str]) -> Server {
    Server {
        id: ServerId::from(id),
        owner: UserId::from("owner"),
        name: format!("server {id}"),
        description: None,
        channels: channels.iter().map(|c| ChannelId::from(*c)).collect(),
        discoverable: false,
    }
}

pub fn test_channel(id: &str, name: &str) -> Channel {
    Channel {
        id: ChannelId::from(id),
        channel_type: ChannelType::TextChannel,
        name: Some(name.to_string()),
        description: None,
        server: None,
    }
}

pub fn test_voice_channel(id: &str, name: &str) -> Channel {
    Channel {
        channel_type: ChannelType::VoiceChannel,
        ..test_channel(id, name)
    }
}

pub fn test_user(id: &str, username: &str) -> User {
    User {
        id: UserId::from(id),
        username: username.to_string(),
        display_name: None,
    }
}

pub fn test_message(id: &str, channel: &str, content: &str) -> Message {
    Message {
        id: MessageId::from(id),
        channel: ChannelId::from(channel),
        author: UserId::from("author"),
        content: Some(content.to_string()),
        system: None,
    }
}

/// Session state with a terminal size and, optionally, a selected server.
pub fn test_state(server: Option<Server>) -> Arc<SessionState> {
    let state = SessionState::new();
    state.set_dimensions(80, 24);
    if let Some(server) = server {
        state.set_server(server);
    }
    Arc::new(state)
}
