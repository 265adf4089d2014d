//! REST implementation of [`ChatClient`] for the Revolt API.
//!
//! Every request carries the session token in the `x-session-token` header.
//! Message sends carry a fresh `Idempotency-Key` so a retried request cannot
//! post the same message twice.

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::client::{
    Channel, ChannelId, ChatClient, ClientError, FetchMessages, Message, Server, ServerId, User,
    UserId,
};

pub const DEFAULT_API_URL: &str = "https://api.revolt.chat";

const TOKEN_HEADER: &str = "x-session-token";

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Serialize, Debug)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
    friendly_name: &'a str,
}

#[derive(Deserialize, Debug)]
#[serde(tag = "result")]
enum LoginResponse {
    Success {
        token: String,
        user_id: String,
    },
    #[serde(rename = "MFA")]
    Mfa {},
    Disabled {},
}

#[derive(Serialize, Debug)]
struct SendMessageRequest<'a> {
    content: &'a str,
}

// ============================================================================
// Client
// ============================================================================

pub struct RevoltClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl RevoltClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    /// Opens a new session with email/password credentials.
    pub async fn login(
        base_url: &str,
        email: &str,
        password: &str,
        friendly_name: &str,
    ) -> Result<Self, ClientError> {
        let base_url = base_url.trim_end_matches('/');
        let body = LoginRequest {
            email,
            password,
            friendly_name,
        };
        let request = reqwest::Client::new()
            .post(format!("{base_url}/auth/session/login"))
            .json(&body);

        match send_json::<LoginResponse>(request).await {
            Ok(LoginResponse::Success { token, user_id }) => {
                info!("Logged in as user {}", user_id);
                Ok(Self::new(base_url, token))
            }
            Ok(LoginResponse::Mfa {}) => Err(ClientError::Auth(
                "multi-factor authentication is not supported".to_string(),
            )),
            Ok(LoginResponse::Disabled {}) => {
                Err(ClientError::Auth("account is disabled".to_string()))
            }
            Err(ClientError::Auth(_)) => Err(ClientError::Auth(
                "invalid email or password".to_string(),
            )),
            Err(ClientError::Api {
                status: 403,
                message,
            }) => Err(ClientError::Auth(message)),
            Err(e) => Err(e),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.http
            .get(format!("{}{}", self.base_url, path))
            .header(TOKEN_HEADER, &self.token)
    }
}

/// Sends a request and decodes a JSON body, mapping failures onto `ClientError`.
async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ClientError> {
    let response = request
        .send()
        .await
        .map_err(|e| ClientError::Network(e.to_string()))?;

    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(ClientError::Auth("session token rejected".to_string()));
    }
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        warn!("Request failed with HTTP {}: {}", status.as_u16(), message);
        return Err(ClientError::Api {
            status: status.as_u16(),
            message,
        });
    }

    let body = response
        .text()
        .await
        .map_err(|e| ClientError::Network(e.to_string()))?;
    serde_json::from_str(&body).map_err(|e| ClientError::Parse(e.to_string()))
}

#[async_trait]
impl ChatClient for RevoltClient {
    async fn fetch_self(&self) -> Result<User, ClientError> {
        send_json(self.get("/users/@me")).await
    }

    async fn fetch_server(&self, id: &ServerId) -> Result<Server, ClientError> {
        debug!("Fetching server {}", id);
        send_json(self.get(&format!("/servers/{id}"))).await
    }

    async fn fetch_channel(&self, id: &ChannelId) -> Result<Channel, ClientError> {
        debug!("Fetching channel {}", id);
        send_json(self.get(&format!("/channels/{id}"))).await
    }

    async fn fetch_user(&self, id: &UserId) -> Result<User, ClientError> {
        send_json(self.get(&format!("/users/{id}"))).await
    }

    async fn fetch_messages(
        &self,
        channel: &ChannelId,
        query: FetchMessages,
    ) -> Result<Vec<Message>, ClientError> {
        let mut params = vec![
            ("limit", query.limit.to_string()),
            ("sort", query.sort.as_str().to_string()),
        ];
        if let Some(after) = &query.after {
            params.push(("after", after.to_string()));
        }
        debug!("Fetching messages for {} ({:?})", channel, params);
        send_json(self.get(&format!("/channels/{channel}/messages")).query(&params)).await
    }

    async fn send_message(
        &self,
        channel: &ChannelId,
        content: &str,
    ) -> Result<Message, ClientError> {
        let request = self
            .http
            .post(format!("{}/channels/{}/messages", self.base_url, channel))
            .header(TOKEN_HEADER, &self.token)
            .header("Idempotency-Key", uuid::Uuid::new_v4().to_string())
            .json(&SendMessageRequest { content });
        send_json(request).await
    }
}
