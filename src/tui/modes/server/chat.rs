use std::cell::RefCell;
use std::collections::HashSet;
use std::sync::Arc;

use log::{debug, warn};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::widgets::Paragraph;

use crate::client::{ChannelId, ClientEvent, Message, Server, UserId};
use crate::core::state::SessionState;
use crate::core::sync::{SyncCommand, SyncEvent};
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::{ComposeBox, MessageView, format_message};
use crate::tui::effect::Effect;
use crate::tui::event::Event;

use super::link::ActiveChannelReader;
use super::tab::{Tab, TabId};

/// Messages of the channel picked in the channels tab, plus a compose box.
///
/// The message history itself lives in the sync worker; this tab renders the
/// snapshots it posts and forwards sends and gateway activity to it.
pub struct ChatTab {
    channel: ActiveChannelReader,
    state: Arc<SessionState>,
    watched: Option<ChannelId>,
    messages: Vec<Message>,
    view: MessageView,
    compose: ComposeBox,
    /// Channel of the send in flight, if any.
    sending: Option<ChannelId>,
    send_error: Option<String>,
    sync_error: Option<String>,
    /// Users already asked for, so each is fetched once.
    requested_users: HashSet<UserId>,
}

impl ChatTab {
    pub fn new(channel: ActiveChannelReader, state: Arc<SessionState>) -> Self {
        Self {
            channel,
            state,
            watched: None,
            messages: Vec::new(),
            view: MessageView::new(),
            compose: ComposeBox::new("Message"),
            sending: None,
            send_error: None,
            sync_error: None,
            requested_users: HashSet::new(),
        }
    }

    pub fn watched(&self) -> Option<&ChannelId> {
        self.watched.as_ref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn draft(&self) -> &str {
        self.compose.content()
    }

    pub fn error(&self) -> Option<&str> {
        self.send_error.as_deref().or(self.sync_error.as_deref())
    }

    fn reset(&mut self) {
        self.watched = None;
        self.messages.clear();
        self.view.clear();
        self.compose.clear();
        self.compose.set_title("Message");
        self.sending = None;
        self.send_error = None;
        self.sync_error = None;
    }

    fn is_watched(&self, channel_id: &ChannelId) -> bool {
        self.watched.as_ref() == Some(channel_id)
    }

    /// Re-renders the snapshot and asks for any author names not yet known.
    fn rebuild_lines(&mut self) -> Effect {
        let missing = RefCell::new(Vec::new());
        let name_of = |id: &UserId| match self.state.user_name(id) {
            Some(name) => name,
            None => {
                missing.borrow_mut().push(id.clone());
                id.to_string()
            }
        };
        let lines = self
            .messages
            .iter()
            .map(|m| format_message(m, &name_of))
            .collect();
        self.view.set_lines(lines);

        let fetches: Vec<Effect> = missing
            .into_inner()
            .into_iter()
            .filter(|id| self.requested_users.insert(id.clone()))
            .map(Effect::FetchUser)
            .collect();
        Effect::batch(fetches)
    }

    fn submit(&mut self) -> Effect {
        let Some(channel_id) = self.watched.clone() else {
            return Effect::Blink;
        };
        if self.sending.is_some() || self.compose.is_blank() {
            return Effect::Blink;
        }
        self.sending = Some(channel_id.clone());
        self.send_error = None;
        Effect::SendMessage {
            channel_id,
            content: self.compose.content().to_string(),
        }
    }

    fn handle_client(&mut self, event: &ClientEvent) -> Effect {
        match event {
            ClientEvent::MessageSent { channel_id, result } => {
                if self.sending.as_ref() == Some(channel_id) {
                    self.sending = None;
                }
                if !self.is_watched(channel_id) {
                    return Effect::None;
                }
                match result {
                    Ok(message) => {
                        self.compose.clear();
                        Effect::Sync(SyncCommand::RecordSent(message.clone()))
                    }
                    Err(e) => {
                        warn!("Failed to send message to {}: {}", channel_id, e);
                        self.send_error = Some(format!("failed to send message: {e}"));
                        Effect::None
                    }
                }
            }
            ClientEvent::MessageArrived { channel_id } if self.is_watched(channel_id) => {
                Effect::Sync(SyncCommand::Refresh(channel_id.clone()))
            }
            ClientEvent::UserFetched { user_id, .. }
                if self.requested_users.contains(user_id) =>
            {
                self.rebuild_lines()
            }
            _ => Effect::None,
        }
    }

    fn handle_sync(&mut self, event: &SyncEvent) -> Effect {
        match event {
            SyncEvent::Updated {
                channel_id,
                messages,
            } if self.is_watched(channel_id) => {
                self.messages = messages.clone();
                self.sync_error = None;
                self.rebuild_lines()
            }
            SyncEvent::Failed { channel_id, error } if self.is_watched(channel_id) => {
                self.sync_error = Some(format!("failed to refresh messages: {error}"));
                Effect::None
            }
            _ => Effect::None,
        }
    }
}

impl Tab for ChatTab {
    fn id(&self) -> TabId {
        TabId::Chat
    }

    fn name(&self) -> &str {
        "Chat"
    }

    fn enabled(&self) -> bool {
        self.channel.get().is_some()
    }

    fn init(&mut self, _server: &Server, _width: u16, _height: u16) -> Effect {
        self.reset();
        Effect::Sync(SyncCommand::Unwatch)
    }

    fn focus(&mut self) -> Effect {
        let Some(channel) = self.channel.get() else {
            return Effect::None;
        };
        if self.is_watched(&channel.id) {
            return Effect::None;
        }
        debug!("Chat now watching channel {}", channel.id);
        self.reset();
        let name = channel.name.clone().unwrap_or_else(|| channel.id.to_string());
        self.compose.set_title(format!("Message #{name}"));
        self.watched = Some(channel.id.clone());
        Effect::Sync(SyncCommand::Watch(channel.id))
    }

    fn update(&mut self, event: &Event) -> (Effect, TabId) {
        let effect = match event {
            Event::Submit => self.submit(),
            Event::Client(client) => self.handle_client(client),
            Event::Sync(sync) => self.handle_sync(sync),
            Event::Resize(..) => Effect::None,
            Event::CursorUp | Event::CursorDown | Event::PageUp | Event::PageDown => {
                self.view.handle_event(event);
                Effect::None
            }
            _ => {
                self.compose.handle_event(event);
                Effect::None
            }
        };
        (effect, TabId::Chat)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        if self.watched.is_none() {
            let placeholder = Paragraph::new("No channel selected.")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center);
            frame.render_widget(placeholder, area);
            return;
        }

        let compose_height = self.compose.calculate_height(area.width);
        let [messages_area, compose_area, error_area] = Layout::vertical([
            Constraint::Min(0),
            Constraint::Length(compose_height),
            Constraint::Length(1),
        ])
        .areas(area);

        self.view.render(frame, messages_area);
        self.compose.render(frame, compose_area);
        if let Some(error) = self.error() {
            frame.render_widget(
                Paragraph::new(error.to_string()).style(Style::default().fg(Color::Red)),
                error_area,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientError;
    use crate::test_support::{test_channel, test_message, test_server, test_state, test_user};
    use crate::tui::modes::server::link::ActiveChannel;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn focused_tab(active: &ActiveChannel) -> ChatTab {
        let state = test_state(None);
        state.remember_user(test_user("author", "alice"));
        let mut tab = ChatTab::new(active.reader(), state);
        tab.init(&test_server("s1", &["c1"]), 78, 20);
        active.set(test_channel("c1", "general"));
        tab.focus();
        tab
    }

    fn type_text(tab: &mut ChatTab, text: &str) {
        for c in text.chars() {
            tab.update(&Event::InputChar(c));
        }
    }

    fn updated(channel: &str, messages: Vec<Message>) -> Event {
        Event::Sync(SyncEvent::Updated {
            channel_id: channel.into(),
            messages,
        })
    }

    fn screen(tab: &mut ChatTab) -> String {
        let mut terminal = Terminal::new(TestBackend::new(60, 12)).unwrap();
        terminal.draw(|f| tab.render(f, f.area())).unwrap();
        let buffer = terminal.backend().buffer();
        (0..12)
            .map(|y| (0..60).map(|x| buffer[(x, y)].symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_enabled_follows_active_channel() {
        let active = ActiveChannel::new();
        let tab = ChatTab::new(active.reader(), test_state(None));
        assert!(!tab.enabled());
        active.set(test_channel("c1", "general"));
        assert!(tab.enabled());
    }

    #[test]
    fn test_init_unwatches() {
        let active = ActiveChannel::new();
        let mut tab = ChatTab::new(active.reader(), test_state(None));
        assert_eq!(
            tab.init(&test_server("s1", &[]), 78, 20),
            Effect::Sync(SyncCommand::Unwatch)
        );
    }

    #[test]
    fn test_focus_watches_new_channel_once() {
        let active = ActiveChannel::new();
        let mut tab = ChatTab::new(active.reader(), test_state(None));
        tab.init(&test_server("s1", &["c1"]), 78, 20);
        assert_eq!(tab.focus(), Effect::None);

        active.set(test_channel("c1", "general"));
        assert_eq!(tab.focus(), Effect::Sync(SyncCommand::Watch("c1".into())));
        assert_eq!(tab.focus(), Effect::None);

        active.set(test_channel("c2", "random"));
        assert_eq!(tab.focus(), Effect::Sync(SyncCommand::Watch("c2".into())));
        assert_eq!(tab.watched(), Some(&ChannelId::from("c2")));
    }

    #[test]
    fn test_blank_submit_only_blinks() {
        let active = ActiveChannel::new();
        let mut tab = focused_tab(&active);
        type_text(&mut tab, "   ");

        let (effect, next) = tab.update(&Event::Submit);

        assert_eq!(effect, Effect::Blink);
        assert_eq!(next, TabId::Chat);
        assert_eq!(tab.draft(), "   ");
    }

    #[test]
    fn test_submit_sends_and_blocks_until_done() {
        let active = ActiveChannel::new();
        let mut tab = focused_tab(&active);
        type_text(&mut tab, "hi");

        let (effect, _) = tab.update(&Event::Submit);
        assert_eq!(
            effect,
            Effect::SendMessage {
                channel_id: "c1".into(),
                content: "hi".into(),
            }
        );
        // A second confirm while the first send is in flight.
        assert_eq!(tab.update(&Event::Submit).0, Effect::Blink);

        let sent = test_message("01ARYZ6S41TSV4RRFFQ69G5FAV", "c1", "hi");
        let (effect, _) = tab.update(&Event::Client(ClientEvent::MessageSent {
            channel_id: "c1".into(),
            result: Ok(sent.clone()),
        }));
        assert_eq!(effect, Effect::Sync(SyncCommand::RecordSent(sent)));
        assert_eq!(tab.draft(), "");
    }

    #[test]
    fn test_stale_send_result_does_not_unblock_new_channel() {
        let active = ActiveChannel::new();
        let mut tab = focused_tab(&active);
        type_text(&mut tab, "to c1");
        tab.update(&Event::Submit);

        active.set(test_channel("c2", "random"));
        tab.focus();
        type_text(&mut tab, "to c2");
        assert!(matches!(tab.update(&Event::Submit).0, Effect::SendMessage { .. }));

        // The c1 result lands while the c2 send is still in flight.
        let (effect, _) = tab.update(&Event::Client(ClientEvent::MessageSent {
            channel_id: "c1".into(),
            result: Ok(test_message("01ARYZ6S41TSV4RRFFQ69G5FA1", "c1", "to c1")),
        }));
        assert_eq!(effect, Effect::None);
        assert_eq!(tab.update(&Event::Submit).0, Effect::Blink);
        assert_eq!(tab.draft(), "to c2");

        tab.update(&Event::Client(ClientEvent::MessageSent {
            channel_id: "c2".into(),
            result: Err(ClientError::Network("down".into())),
        }));
        assert!(matches!(tab.update(&Event::Submit).0, Effect::SendMessage { .. }));
    }

    #[test]
    fn test_failed_send_keeps_draft_and_shows_error() {
        let active = ActiveChannel::new();
        let mut tab = focused_tab(&active);
        type_text(&mut tab, "hi");
        tab.update(&Event::Submit);

        let (effect, _) = tab.update(&Event::Client(ClientEvent::MessageSent {
            channel_id: "c1".into(),
            result: Err(ClientError::Network("down".into())),
        }));

        assert_eq!(effect, Effect::None);
        assert_eq!(tab.draft(), "hi");
        assert_eq!(tab.error(), Some("failed to send message: network error: down"));
        assert!(screen(&mut tab).contains("failed to send message"));
    }

    #[test]
    fn test_gateway_activity_refreshes_watched_channel() {
        let active = ActiveChannel::new();
        let mut tab = focused_tab(&active);

        let (effect, _) = tab.update(&Event::Client(ClientEvent::MessageArrived {
            channel_id: "c1".into(),
        }));
        assert_eq!(effect, Effect::Sync(SyncCommand::Refresh("c1".into())));

        let (effect, _) = tab.update(&Event::Client(ClientEvent::MessageArrived {
            channel_id: "other".into(),
        }));
        assert_eq!(effect, Effect::None);
    }

    #[test]
    fn test_snapshot_renders_oldest_first() {
        let active = ActiveChannel::new();
        let mut tab = focused_tab(&active);

        let effect = tab
            .update(&updated(
                "c1",
                vec![
                    test_message("01ARYZ6S41TSV4RRFFQ69G5FA1", "c1", "first"),
                    test_message("01ARYZ6S41TSV4RRFFQ69G5FA2", "c1", "second"),
                ],
            ))
            .0;

        assert_eq!(effect, Effect::None);
        let text = screen(&mut tab);
        let first = text.find("alice: first").unwrap();
        let second = text.find("alice: second").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_snapshot_for_other_channel_ignored() {
        let active = ActiveChannel::new();
        let mut tab = focused_tab(&active);
        tab.update(&updated(
            "c9",
            vec![test_message("01ARYZ6S41TSV4RRFFQ69G5FA1", "c9", "x")],
        ));
        assert!(tab.messages().is_empty());
    }

    #[test]
    fn test_unknown_author_fetched_once_then_named() {
        let active = ActiveChannel::new();
        let mut tab = focused_tab(&active);
        let mut message = test_message("01ARYZ6S41TSV4RRFFQ69G5FA1", "c1", "yo");
        message.author = "u2".into();

        let (effect, _) = tab.update(&updated("c1", vec![message.clone()]));
        assert_eq!(effect, Effect::FetchUser("u2".into()));
        assert!(screen(&mut tab).contains("u2: yo"));

        let (effect, _) = tab.update(&updated("c1", vec![message]));
        assert_eq!(effect, Effect::None);

        tab.state.remember_user(test_user("u2", "bob"));
        tab.update(&Event::Client(ClientEvent::UserFetched {
            user_id: "u2".into(),
            result: Ok(test_user("u2", "bob")),
        }));
        assert!(screen(&mut tab).contains("bob: yo"));
    }

    #[test]
    fn test_sync_failure_shown_until_next_update() {
        let active = ActiveChannel::new();
        let mut tab = focused_tab(&active);

        tab.update(&Event::Sync(SyncEvent::Failed {
            channel_id: "c1".into(),
            error: ClientError::Network("down".into()),
        }));
        assert_eq!(
            tab.error(),
            Some("failed to refresh messages: network error: down")
        );

        tab.update(&updated("c1", Vec::new()));
        assert_eq!(tab.error(), None);
    }

    #[test]
    fn test_compose_title_names_channel() {
        let active = ActiveChannel::new();
        let mut tab = focused_tab(&active);
        assert!(screen(&mut tab).contains("Message #general"));
    }
}
