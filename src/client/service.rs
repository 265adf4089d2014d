use std::fmt;

use async_trait::async_trait;

use super::types::{Channel, ChannelId, FetchMessages, Message, Server, ServerId, User, UserId};

/// Errors that can occur while talking to the chat service.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientError {
    /// Network-level failure (timeout, DNS, connection refused). Retryable.
    Network(String),
    /// The service answered with an error status.
    Api { status: u16, message: String },
    /// Failed to parse the service's response. Not retryable.
    Parse(String),
    /// Credentials or session token were rejected.
    Auth(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Network(msg) => write!(f, "network error: {msg}"),
            ClientError::Api { status, message } => {
                write!(f, "API error (HTTP {status}): {message}")
            }
            ClientError::Parse(msg) => write!(f, "parse error: {msg}"),
            ClientError::Auth(msg) => write!(f, "authentication failed: {msg}"),
        }
    }
}

impl std::error::Error for ClientError {}

/// Request/response surface of the chat service used by the UI and the sync loop.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// The account the session belongs to. Used to validate a stored token.
    async fn fetch_self(&self) -> Result<User, ClientError>;

    async fn fetch_server(&self, id: &ServerId) -> Result<Server, ClientError>;

    async fn fetch_channel(&self, id: &ChannelId) -> Result<Channel, ClientError>;

    async fn fetch_user(&self, id: &UserId) -> Result<User, ClientError>;

    /// Fetches a page of messages. With `SortOrder::Latest` the result is newest-first.
    async fn fetch_messages(
        &self,
        channel: &ChannelId,
        query: FetchMessages,
    ) -> Result<Vec<Message>, ClientError>;

    /// Posts a message and returns the service's echo of it.
    async fn send_message(&self, channel: &ChannelId, content: &str)
    -> Result<Message, ClientError>;
}
