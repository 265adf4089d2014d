use log::{debug, warn};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::widgets::Paragraph;

use crate::client::{Channel, ChannelId, ClientError, ClientEvent, Server, ServerId};
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::{ListEntry, ListEvent, SelectableList};
use crate::tui::effect::Effect;
use crate::tui::event::Event;

use super::link::{ActiveChannel, ActiveChannelReader};
use super::tab::{Tab, TabId};

const UNKNOWN_CHANNEL: &str = "[unknown]";

/// The server's text channels. Confirming one hands over to the chat tab.
pub struct ChannelsTab {
    active: ActiveChannel,
    server_id: Option<ServerId>,
    list: SelectableList<Option<Channel>>,
    loading: bool,
    error: Option<String>,
}

impl Default for ChannelsTab {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelsTab {
    pub fn new() -> Self {
        Self {
            active: ActiveChannel::new(),
            server_id: None,
            list: SelectableList::new("Channels").with_empty_text("No text channels."),
            loading: false,
            error: None,
        }
    }

    /// Read handle on the selected channel for the chat tab.
    pub fn reader(&self) -> ActiveChannelReader {
        self.active.reader()
    }

    pub fn active_channel(&self) -> Option<Channel> {
        self.active.get()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn entries(&self) -> &[ListEntry<Option<Channel>>] {
        self.list.entries()
    }

    fn populate(&mut self, resolved: &[(ChannelId, Result<Channel, ClientError>)]) {
        let entries = resolved
            .iter()
            .filter_map(|(id, result)| match result {
                Ok(channel) if channel.is_text() => Some(ListEntry::new(
                    channel_label(channel),
                    channel.description.clone().unwrap_or_default(),
                    Some(channel.clone()),
                )),
                Ok(channel) => {
                    debug!("Skipping non-text channel {}", channel.id);
                    None
                }
                Err(e) => {
                    warn!("Failed to resolve channel {}: {}", id, e);
                    Some(ListEntry::new(
                        UNKNOWN_CHANNEL,
                        "failed to retrieve channel information",
                        None,
                    ))
                }
            })
            .collect();
        self.list.set_entries(entries);
        self.loading = false;
    }

    fn confirm(&mut self, index: usize) -> TabId {
        let Some(entry) = self.list.get(index) else {
            return TabId::Channels;
        };
        match &entry.value {
            Some(channel) => {
                debug!("Selected channel {}", channel.id);
                self.active.set(channel.clone());
                self.error = None;
                TabId::Chat
            }
            None => {
                let message = format!("an error has occurred changing channel to {}", entry.title);
                warn!("{}", message);
                self.error = Some(message);
                TabId::Channels
            }
        }
    }
}

fn channel_label(channel: &Channel) -> String {
    channel
        .name
        .clone()
        .unwrap_or_else(|| channel.id.to_string())
}

impl Tab for ChannelsTab {
    fn id(&self) -> TabId {
        TabId::Channels
    }

    fn name(&self) -> &str {
        "Channels"
    }

    fn enabled(&self) -> bool {
        true
    }

    fn init(&mut self, server: &Server, _width: u16, _height: u16) -> Effect {
        self.active.clear();
        self.error = None;
        self.loading = true;
        self.list.set_entries(Vec::new());
        self.server_id = Some(server.id.clone());
        Effect::ResolveChannels {
            server_id: server.id.clone(),
            channel_ids: server.channels.clone(),
        }
    }

    fn update(&mut self, event: &Event) -> (Effect, TabId) {
        match event {
            Event::Client(ClientEvent::ChannelsResolved {
                server_id,
                channels,
            }) => {
                if self.server_id.as_ref() == Some(server_id) {
                    self.populate(channels);
                }
                (Effect::None, TabId::Channels)
            }
            _ => match self.list.handle_event(event) {
                Some(ListEvent::Confirmed(index)) => (Effect::None, self.confirm(index)),
                Some(ListEvent::Moved) | None => (Effect::None, TabId::Channels),
            },
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [list_area, error_area] =
            Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(area);

        if self.loading {
            frame.render_widget(
                Paragraph::new("Loading channels...").style(Style::default().fg(Color::DarkGray)),
                list_area,
            );
        } else {
            self.list.render(frame, list_area);
        }

        if let Some(error) = &self.error {
            frame.render_widget(
                Paragraph::new(error.as_str()).style(Style::default().fg(Color::Red)),
                error_area,
            );
        }
    }
}
