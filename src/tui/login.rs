//! # Login Form
//!
//! Email and password prompt shown when there is no usable stored token.
//! Runs its own terminal session before the main UI starts.

use std::sync::mpsc;
use std::time::Duration;

use log::{info, warn};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::Paragraph;

use crate::client::{ClientError, RevoltClient};
use crate::core::config::ResolvedConfig;
use crate::tui::TerminalModeGuard;
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::ComposeBox;
use crate::tui::event::{Event, poll_event_immediate, poll_event_timeout};

const FORM_WIDTH: u16 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Email,
    Password,
}

/// What the form wants after an event.
#[derive(Debug, Clone, PartialEq)]
pub enum FormAction {
    None,
    Submit { email: String, password: String },
    Cancel,
}

pub enum LoginOutcome {
    LoggedIn(RevoltClient),
    Cancelled,
}

pub struct LoginForm {
    email: ComposeBox,
    password: ComposeBox,
    field: Field,
    pending: bool,
    error: Option<String>,
}

impl Default for LoginForm {
    fn default() -> Self {
        Self::new()
    }
}

impl LoginForm {
    pub fn new() -> Self {
        let mut password = ComposeBox::masked("Password");
        password.focused = false;
        Self {
            email: ComposeBox::new("Email"),
            password,
            field: Field::Email,
            pending: false,
            error: None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    fn switch_field(&mut self) {
        self.field = match self.field {
            Field::Email => Field::Password,
            Field::Password => Field::Email,
        };
        self.email.focused = self.field == Field::Email;
        self.password.focused = self.field == Field::Password;
    }

    pub fn handle(&mut self, event: &Event) -> FormAction {
        match event {
            Event::Interrupt | Event::Escape => FormAction::Cancel,
            _ if self.pending => FormAction::None,
            Event::NextTab | Event::PrevTab => {
                self.switch_field();
                FormAction::None
            }
            Event::Submit => {
                if self.email.is_blank() || self.password.content().is_empty() {
                    self.error = Some("Email and password are required.".to_string());
                    return FormAction::None;
                }
                self.pending = true;
                self.error = None;
                FormAction::Submit {
                    email: self.email.content().trim().to_string(),
                    password: self.password.content().to_string(),
                }
            }
            event => {
                match self.field {
                    Field::Email => self.email.handle_event(event),
                    Field::Password => self.password.handle_event(event),
                };
                FormAction::None
            }
        }
    }

    /// Outcome of a submitted login.
    pub fn finish(&mut self, result: &Result<(), ClientError>) {
        self.pending = false;
        if let Err(e) = result {
            self.error = Some(match e {
                ClientError::Auth(reason) => format!("Login failed: {reason}"),
                other => format!("Login failed: {other}"),
            });
        }
    }
}

impl Component for LoginForm {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [column] = Layout::horizontal([Constraint::Length(FORM_WIDTH)])
            .flex(Flex::Center)
            .areas(area);
        let [title, _, email, password, _, status] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .flex(Flex::Center)
        .areas(column);

        frame.render_widget(
            Paragraph::new("Log in to Revolt")
                .alignment(Alignment::Center)
                .style(Style::default().add_modifier(Modifier::BOLD)),
            title,
        );
        self.email.render(frame, email);
        self.password.render(frame, password);

        let status_line = match (&self.error, self.pending) {
            (_, true) => Paragraph::new("Logging in...").style(Style::default().fg(Color::Gray)),
            (Some(error), false) => {
                Paragraph::new(error.as_str()).style(Style::default().fg(Color::Red))
            }
            (None, false) => Paragraph::new("Tab switches field, Enter logs in, Esc quits")
                .style(Style::default().fg(Color::DarkGray)),
        };
        frame.render_widget(status_line.alignment(Alignment::Center), status);
    }
}

/// Shows the form until a login succeeds or the user gives up.
///
/// Must be called from within a tokio runtime.
pub fn prompt(config: &ResolvedConfig) -> std::io::Result<LoginOutcome> {
    let mut terminal = ratatui::init();
    let guard = TerminalModeGuard::new();
    let result = run_form(&mut terminal, config);
    drop(guard);
    ratatui::restore();
    result
}

fn run_form(
    terminal: &mut ratatui::DefaultTerminal,
    config: &ResolvedConfig,
) -> std::io::Result<LoginOutcome> {
    let mut form = LoginForm::new();
    let (tx, rx) = mpsc::channel::<Result<RevoltClient, ClientError>>();

    loop {
        terminal.draw(|f| form.render(f, f.area()))?;

        let first = poll_event_timeout(Duration::from_millis(100))?;
        let mut events = first.into_iter().collect::<Vec<_>>();
        while let Some(event) = poll_event_immediate()? {
            events.push(event);
        }

        for event in events {
            match form.handle(&event) {
                FormAction::None => {}
                FormAction::Cancel => {
                    info!("Login cancelled");
                    return Ok(LoginOutcome::Cancelled);
                }
                FormAction::Submit { email, password } => {
                    info!("Logging in as {}", email);
                    let tx = tx.clone();
                    let api_url = config.api_url.clone();
                    let friendly_name = config.friendly_name.clone();
                    tokio::spawn(async move {
                        let result =
                            RevoltClient::login(&api_url, &email, &password, &friendly_name).await;
                        if tx.send(result).is_err() {
                            warn!("Login finished after the form closed");
                        }
                    });
                }
            }
        }

        if let Ok(result) = rx.try_recv() {
            match result {
                Ok(client) => return Ok(LoginOutcome::LoggedIn(client)),
                Err(e) => {
                    warn!("Login failed: {}", e);
                    form.finish(&Err(e));
                }
            }
        }
    }
}
