//! # Effect Runner
//!
//! Carries out the [`Effect`]s returned by the controller. Client calls are
//! spawned on the tokio runtime and report back through the UI event channel
//! as `Event::Client`; sync commands go to the sync worker, which is started
//! on first use.

use std::io::stdout;
use std::sync::{Arc, mpsc};

use crossterm::cursor::Show;
use crossterm::execute;
use futures::future::join_all;
use log::{debug, info, warn};
use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};

use crate::client::{ChannelId, ChatClient, ClientEvent, ServerId};
use crate::core::state::SessionState;
use crate::core::sync::{SyncCommand, SyncSettings, SyncWorker};
use crate::tui::effect::Effect;
use crate::tui::event::Event;

/// Whether the event loop should keep going after an effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct EffectRunner {
    client: Arc<dyn ChatClient>,
    state: Arc<SessionState>,
    tx: mpsc::Sender<Event>,
    settings: SyncSettings,
    sync_tx: Option<UnboundedSender<SyncCommand>>,
}

impl EffectRunner {
    pub fn new(
        client: Arc<dyn ChatClient>,
        state: Arc<SessionState>,
        tx: mpsc::Sender<Event>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            client,
            state,
            tx,
            settings,
            sync_tx: None,
        }
    }

    /// Must be called from within a tokio runtime.
    pub fn run(&mut self, effect: Effect) -> Flow {
        match effect {
            Effect::None => Flow::Continue,
            Effect::Quit => Flow::Quit,
            Effect::Blink => {
                if let Err(e) = execute!(stdout(), Show) {
                    debug!("Failed to blink cursor: {}", e);
                }
                Flow::Continue
            }
            Effect::Batch(effects) => {
                let mut flow = Flow::Continue;
                for effect in effects {
                    if self.run(effect) == Flow::Quit {
                        flow = Flow::Quit;
                    }
                }
                flow
            }
            Effect::FetchServer(server_id) => {
                self.fetch_server(server_id);
                Flow::Continue
            }
            Effect::ResolveChannels {
                server_id,
                channel_ids,
            } => {
                self.resolve_channels(server_id, channel_ids);
                Flow::Continue
            }
            Effect::FetchUser(user_id) => {
                let client = self.client.clone();
                let state = self.state.clone();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let result = client.fetch_user(&user_id).await;
                    if let Ok(user) = &result {
                        state.remember_user(user.clone());
                    }
                    post(&tx, ClientEvent::UserFetched { user_id, result });
                });
                Flow::Continue
            }
            Effect::SendMessage {
                channel_id,
                content,
            } => {
                info!("Sending message to {} ({} bytes)", channel_id, content.len());
                let client = self.client.clone();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let result = client.send_message(&channel_id, &content).await;
                    post(&tx, ClientEvent::MessageSent { channel_id, result });
                });
                Flow::Continue
            }
            Effect::Sync(command) => {
                self.send_sync(command);
                Flow::Continue
            }
        }
    }

    fn fetch_server(&self, server_id: ServerId) {
        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.fetch_server(&server_id).await;
            post(&tx, ClientEvent::ServerFetched { server_id, result });
        });
    }

    /// Each id resolves on its own; cached channels skip the network.
    fn resolve_channels(&self, server_id: ServerId, channel_ids: Vec<ChannelId>) {
        let client = self.client.clone();
        let state = self.state.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let lookups = channel_ids.into_iter().map(|id| {
                let client = client.clone();
                let cached = state.cached_channel(&id);
                async move {
                    let result = match cached {
                        Some(channel) => Ok(channel),
                        None => client.fetch_channel(&id).await,
                    };
                    (id, result)
                }
            });
            let channels = join_all(lookups).await;
            debug!("Resolved {} channels for {}", channels.len(), server_id);
            post(&tx, ClientEvent::ChannelsResolved { server_id, channels });
        });
    }

    fn send_sync(&mut self, command: SyncCommand) {
        let sync_tx = self.sync_tx.get_or_insert_with(|| {
            info!("Starting sync worker");
            let (sync_tx, sync_rx) = unbounded_channel();
            SyncWorker::new(self.client.clone(), self.settings, self.tx.clone()).spawn(sync_rx);
            sync_tx
        });
        if sync_tx.send(command).is_err() {
            warn!("Sync worker has stopped, dropping command");
        }
    }
}

fn post(tx: &mpsc::Sender<Event>, event: ClientEvent) {
    if tx.send(Event::Client(event)).is_err() {
        warn!("Failed to post client event: receiver dropped");
    }
}
