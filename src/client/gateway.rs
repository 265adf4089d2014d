//! Websocket subscription to the Revolt event gateway.
//!
//! The gateway pushes a `Ready` snapshot right after authentication, which
//! fills the ready cache in [`SessionState`], followed by live events. Only
//! message notifications are forwarded to the UI. The connection is kept alive
//! with periodic pings and re-established after a delay when it drops.

use std::sync::{mpsc, Arc};
use std::time::Duration;

use futures::{Sink, SinkExt, StreamExt};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use crate::client::{ClientError, ClientEvent, Message, ReadySnapshot};
use crate::core::state::SessionState;

pub const DEFAULT_GATEWAY_URL: &str = "wss://ws.revolt.chat";

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(20);
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

#[derive(Serialize, Debug)]
#[serde(tag = "type")]
enum ClientFrame<'a> {
    Authenticate { token: &'a str },
    Ping { data: u64 },
}

#[derive(Deserialize, Debug)]
#[serde(tag = "type")]
enum ServerFrame {
    Authenticated,
    Ready(ReadySnapshot),
    Message(Message),
    Error { error: String },
    #[serde(other)]
    Other,
}

/// What a single gateway frame means for the session.
#[derive(Debug, PartialEq)]
enum FrameOutcome {
    Ignore,
    Forward(ClientEvent),
    /// The gateway refused the session; reconnecting will not help.
    Fatal(String),
}

enum SessionEnd {
    Closed,
    ReceiverGone,
    Rejected,
}

/// Spawns the gateway task. It runs until the UI side of `tx` is dropped or
/// the gateway rejects the token.
pub fn spawn_gateway<T>(
    url: String,
    token: String,
    state: Arc<SessionState>,
    tx: mpsc::Sender<T>,
) -> JoinHandle<()>
where
    T: From<ClientEvent> + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            match run_session(&url, &token, &state, &tx).await {
                Ok(SessionEnd::ReceiverGone) => {
                    debug!("UI channel closed, stopping gateway");
                    return;
                }
                Ok(SessionEnd::Rejected) => return,
                Ok(SessionEnd::Closed) => info!("Gateway connection closed"),
                Err(e) => warn!("Gateway session failed: {}", e),
            }
            info!("Reconnecting to gateway in {}s", RECONNECT_DELAY.as_secs());
            tokio::time::sleep(RECONNECT_DELAY).await;
        }
    })
}

async fn run_session<T>(
    url: &str,
    token: &str,
    state: &SessionState,
    tx: &mpsc::Sender<T>,
) -> Result<SessionEnd, ClientError>
where
    T: From<ClientEvent>,
{
    let endpoint = format!("{}?version=1&format=json", url.trim_end_matches('/'));
    let (socket, _) = connect_async(endpoint.as_str())
        .await
        .map_err(|e| ClientError::Network(e.to_string()))?;
    info!("Connected to gateway {}", url);

    let (mut write, mut read) = socket.split();
    send_frame(&mut write, &ClientFrame::Authenticate { token }).await?;

    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
    heartbeat.tick().await;
    let mut ping_seq: u64 = 0;

    loop {
        tokio::select! {
            _ = heartbeat.tick() => {
                ping_seq += 1;
                send_frame(&mut write, &ClientFrame::Ping { data: ping_seq }).await?;
            }
            frame = read.next() => {
                let text = match frame {
                    None | Some(Ok(WsMessage::Close(_))) => return Ok(SessionEnd::Closed),
                    Some(Err(e)) => return Err(ClientError::Network(e.to_string())),
                    Some(Ok(WsMessage::Text(text))) => text,
                    Some(Ok(_)) => continue,
                };
                match apply_frame(text.as_str(), state) {
                    FrameOutcome::Ignore => {}
                    FrameOutcome::Forward(event) => {
                        if tx.send(T::from(event)).is_err() {
                            return Ok(SessionEnd::ReceiverGone);
                        }
                    }
                    FrameOutcome::Fatal(reason) => {
                        error!("Gateway rejected session: {}", reason);
                        return Ok(SessionEnd::Rejected);
                    }
                }
            }
        }
    }
}

async fn send_frame<S>(sink: &mut S, frame: &ClientFrame<'_>) -> Result<(), ClientError>
where
    S: Sink<WsMessage> + Unpin,
    S::Error: std::fmt::Display,
{
    let json = serde_json::to_string(frame).map_err(|e| ClientError::Parse(e.to_string()))?;
    sink.send(WsMessage::Text(json.into()))
        .await
        .map_err(|e| ClientError::Network(e.to_string()))
}

/// Decodes one frame and applies its side effects on the session state.
fn apply_frame(text: &str, state: &SessionState) -> FrameOutcome {
    let frame: ServerFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            debug!("Skipping undecodable gateway frame: {}", e);
            return FrameOutcome::Ignore;
        }
    };

    match frame {
        ServerFrame::Authenticated => {
            info!("Gateway session authenticated");
            FrameOutcome::Ignore
        }
        ServerFrame::Ready(snapshot) => {
            state.store_ready(snapshot);
            FrameOutcome::Forward(ClientEvent::ReadyCacheUpdated)
        }
        ServerFrame::Message(message) => FrameOutcome::Forward(ClientEvent::MessageArrived {
            channel_id: message.channel,
        }),
        ServerFrame::Error { error } if error == "InvalidSession" => FrameOutcome::Fatal(error),
        ServerFrame::Error { error } => {
            warn!("Gateway error: {}", error);
            FrameOutcome::Ignore
        }
        ServerFrame::Other => FrameOutcome::Ignore,
    }
}
