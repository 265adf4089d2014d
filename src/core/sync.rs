//! # Background Message Sync
//!
//! One worker per chat tab keeps the watched channel's [`MessageStore`] up to
//! date. It owns the store outright; the UI only ever sees the snapshots it
//! posts.
//!
//! ```text
//!  UI thread                       sync worker (tokio task)
//!  ─────────                       ────────────────────────
//!  Effect::Sync(cmd) ──unbounded──▶ apply(cmd)
//!                                  every poll_interval: poll()
//!  Event::Sync(evt)  ◀───mpsc────── SyncEvent::Updated / Failed
//! ```

use std::sync::{mpsc, Arc};
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::client::{ChannelId, ChatClient, ClientError, FetchMessages, Message};
use crate::core::message_store::MessageStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    pub poll_interval: Duration,
    /// Page size when the store is empty.
    pub initial_fetch_limit: u32,
    /// Page size for "newer than cursor" fetches.
    pub refresh_fetch_limit: u32,
    /// How many of the newest messages each snapshot carries.
    pub display_limit: usize,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(15),
            initial_fetch_limit: 30,
            refresh_fetch_limit: 75,
            display_limit: 15,
        }
    }
}

/// Instructions from the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncCommand {
    /// Start following a channel. Clears the store and polls immediately.
    Watch(ChannelId),
    Unwatch,
    /// A message this client sent successfully.
    RecordSent(Message),
    /// The gateway saw activity in this channel; poll now.
    Refresh(ChannelId),
}

/// Notifications to the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// The newest messages of the channel, oldest first.
    Updated {
        channel_id: ChannelId,
        messages: Vec<Message>,
    },
    Failed {
        channel_id: ChannelId,
        error: ClientError,
    },
}

pub struct SyncWorker<T> {
    client: Arc<dyn ChatClient>,
    settings: SyncSettings,
    store: MessageStore,
    channel: Option<ChannelId>,
    tx: mpsc::Sender<T>,
    ui_closed: bool,
}

impl<T> SyncWorker<T>
where
    T: From<SyncEvent> + Send + 'static,
{
    pub fn new(client: Arc<dyn ChatClient>, settings: SyncSettings, tx: mpsc::Sender<T>) -> Self {
        Self {
            client,
            settings,
            store: MessageStore::new(),
            channel: None,
            tx,
            ui_closed: false,
        }
    }

    pub fn spawn(self, commands: UnboundedReceiver<SyncCommand>) -> JoinHandle<()> {
        tokio::spawn(self.run(commands))
    }

    /// Runs until the command sender or the UI receiver goes away.
    pub async fn run(mut self, mut commands: UnboundedReceiver<SyncCommand>) {
        let mut ticker = tokio::time::interval(self.settings.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while !self.ui_closed {
            tokio::select! {
                _ = ticker.tick() => {
                    self.poll().await;
                }
                command = commands.recv() => match command {
                    Some(command) => self.apply(command).await,
                    None => break,
                },
            }
        }
        debug!("Sync worker stopped");
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    pub fn channel(&self) -> Option<&ChannelId> {
        self.channel.as_ref()
    }

    pub async fn apply(&mut self, command: SyncCommand) {
        match command {
            SyncCommand::Watch(channel_id) => {
                info!("Watching channel {}", channel_id);
                self.store.reset();
                self.channel = Some(channel_id);
                self.poll().await;
            }
            SyncCommand::Unwatch => {
                if let Some(channel_id) = self.channel.take() {
                    info!("Stopped watching channel {}", channel_id);
                }
                self.store.reset();
            }
            SyncCommand::RecordSent(message) => {
                let Some(channel_id) = self.channel.clone() else {
                    return;
                };
                if message.channel != channel_id {
                    debug!("Ignoring sent message for unwatched channel {}", message.channel);
                    return;
                }
                // Catch up to the cursor first: messages from others that
                // landed before ours sort below it and would never be fetched
                // once the cursor moved past them.
                if !self.poll().await {
                    return;
                }
                if !self.store.contains(&message.id) {
                    self.store.record_sent(message);
                    self.publish(channel_id);
                }
            }
            SyncCommand::Refresh(channel_id) => {
                if self.channel.as_ref() == Some(&channel_id) {
                    self.poll().await;
                }
            }
        }
    }

    /// Fetches whatever is new for the watched channel. Returns whether the
    /// fetch succeeded.
    pub async fn poll(&mut self) -> bool {
        let Some(channel_id) = self.channel.clone() else {
            return false;
        };

        let query = match self.store.newest_fetched() {
            None => FetchMessages::latest(self.settings.initial_fetch_limit),
            Some(cursor) => FetchMessages::after(self.settings.refresh_fetch_limit, cursor.clone()),
        };
        let initial = query.after.is_none();

        match self.client.fetch_messages(&channel_id, query).await {
            Ok(batch) => {
                let count = batch.len();
                let changed = if initial {
                    self.store.install(batch);
                    !self.store.is_empty()
                } else {
                    self.store
                        .prepend_newer(batch, self.settings.refresh_fetch_limit as usize)
                };
                if changed {
                    debug!("Fetched {} messages for {}", count, channel_id);
                    self.publish(channel_id);
                }
                true
            }
            Err(error) => {
                warn!("Failed to fetch messages for {}: {}", channel_id, error);
                self.send(SyncEvent::Failed { channel_id, error });
                false
            }
        }
    }

    fn publish(&mut self, channel_id: ChannelId) {
        let messages = self.store.recent(self.settings.display_limit);
        self.send(SyncEvent::Updated {
            channel_id,
            messages,
        });
    }

    fn send(&mut self, event: SyncEvent) {
        if self.tx.send(T::from(event)).is_err() {
            self.ui_closed = true;
        }
    }
}
