//! # Root Controller
//!
//! Owns the mode registry and the active mode. Every event goes through
//! [`Controller::update`]:
//!
//! 1. once quitting, nothing else happens;
//! 2. Ctrl+C always quits;
//! 3. a resize is recorded in the session state;
//! 4. the event is forwarded to the active mode's action;
//! 5. if the action asked for another mode, that mode is entered and its
//!    effect runs after the one the old mode returned. A mode that refuses to
//!    enter ends the program.
//!
//! Mode transitions happen only here, at the end of an update.

use std::sync::Arc;

use log::{debug, error, info};
use ratatui::Frame;

use crate::core::state::SessionState;
use crate::tui::effect::Effect;
use crate::tui::event::Event;
use crate::tui::modes::Mode;
use crate::tui::registry::ModeRegistry;

pub struct Controller {
    registry: ModeRegistry,
    state: Arc<SessionState>,
    mode: Mode,
    quitting: bool,
    initial_effect: Effect,
}

impl Controller {
    /// Starts in server selection.
    pub fn initial(mut registry: ModeRegistry, state: Arc<SessionState>) -> Self {
        let mode = Mode::ServerSelection;
        let (quitting, initial_effect) = match registry.get(mode).enter() {
            Ok(effect) => (false, effect),
            Err(e) => {
                error!("Failed to enter initial mode {:?}: {}", mode, e);
                (true, Effect::Quit)
            }
        };
        Self {
            registry,
            state,
            mode,
            quitting,
            initial_effect,
        }
    }

    /// The effect produced by entering the initial mode. Yields it once.
    pub fn init(&mut self) -> Effect {
        std::mem::take(&mut self.initial_effect)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn quitting(&self) -> bool {
        self.quitting
    }

    pub fn update(&mut self, event: &Event) -> Effect {
        if self.quitting {
            return Effect::None;
        }

        match event {
            Event::Interrupt => {
                info!("Interrupt received, quitting");
                self.quitting = true;
                return Effect::Quit;
            }
            Event::Resize(width, height) => self.state.set_dimensions(*width, *height),
            _ => {}
        }

        let action = self.registry.get(self.mode);
        let effect = action.update(event);
        match action.wants_mode_change() {
            Some(next) => Effect::batch([effect, self.switch_to(next)]),
            None => effect,
        }
    }

    fn switch_to(&mut self, next: Mode) -> Effect {
        info!("Switching mode {:?} -> {:?}", self.mode, next);
        self.mode = next;
        match self.registry.get(next).enter() {
            Ok(effect) => effect,
            Err(e) => {
                error!("Failed to enter mode {:?}: {}", next, e);
                self.quitting = true;
                Effect::Quit
            }
        }
    }

    pub fn render(&mut self, frame: &mut Frame) {
        if self.quitting {
            debug!("Quitting, skipping render");
            return;
        }
        let area = frame.area();
        self.registry.get(self.mode).render(frame, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::modes::{Action, EnterError};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use ratatui::layout::Rect;
    use ratatui::widgets::Paragraph;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// An action driven entirely by the test.
    struct Scripted {
        label: &'static str,
        enter_result: Result<Effect, EnterError>,
        next_mode: Rc<RefCell<Option<Mode>>>,
        seen: Rc<RefCell<Vec<Event>>>,
        entered: Rc<RefCell<usize>>,
    }

    impl Action for Scripted {
        fn enter(&mut self) -> Result<Effect, EnterError> {
            *self.entered.borrow_mut() += 1;
            self.enter_result.clone()
        }
        fn update(&mut self, event: &Event) -> Effect {
            self.seen.borrow_mut().push(event.clone());
            Effect::Blink
        }
        fn wants_mode_change(&mut self) -> Option<Mode> {
            self.next_mode.borrow_mut().take()
        }
        fn render(&mut self, frame: &mut Frame, area: Rect) {
            frame.render_widget(Paragraph::new(self.label), area);
        }
    }

    struct Harness {
        controller: Controller,
        state: Arc<SessionState>,
        selection_next: Rc<RefCell<Option<Mode>>>,
        selection_seen: Rc<RefCell<Vec<Event>>>,
        server_entered: Rc<RefCell<usize>>,
    }

    fn harness(server_enter: Result<Effect, EnterError>) -> Harness {
        let selection_next = Rc::new(RefCell::new(None));
        let selection_seen = Rc::new(RefCell::new(Vec::new()));
        let server_entered = Rc::new(RefCell::new(0));

        let mut registry = ModeRegistry::new();
        registry.register(
            Mode::ServerSelection,
            Box::new(Scripted {
                label: "selection",
                enter_result: Ok(Effect::None),
                next_mode: selection_next.clone(),
                seen: selection_seen.clone(),
                entered: Rc::new(RefCell::new(0)),
            }),
        );
        registry.register(
            Mode::Server,
            Box::new(Scripted {
                label: "server",
                enter_result: server_enter,
                next_mode: Rc::new(RefCell::new(None)),
                seen: Rc::new(RefCell::new(Vec::new())),
                entered: server_entered.clone(),
            }),
        );

        let state = Arc::new(SessionState::new());
        Harness {
            controller: Controller::initial(registry, state.clone()),
            state,
            selection_next,
            selection_seen,
            server_entered,
        }
    }

    fn screen(controller: &mut Controller) -> String {
        let mut terminal = Terminal::new(TestBackend::new(20, 2)).unwrap();
        terminal.draw(|f| controller.render(f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_starts_in_server_selection() {
        let mut h = harness(Ok(Effect::None));
        assert_eq!(h.controller.mode(), Mode::ServerSelection);
        assert!(!h.controller.quitting());
        assert!(screen(&mut h.controller).contains("selection"));
    }

    #[test]
    fn test_init_yields_effect_once() {
        let mut registry = ModeRegistry::new();
        registry.register(
            Mode::ServerSelection,
            Box::new(Scripted {
                label: "selection",
                enter_result: Ok(Effect::Blink),
                next_mode: Rc::new(RefCell::new(None)),
                seen: Rc::new(RefCell::new(Vec::new())),
                entered: Rc::new(RefCell::new(0)),
            }),
        );
        let mut controller = Controller::initial(registry, Arc::new(SessionState::new()));
        assert_eq!(controller.init(), Effect::Blink);
        assert_eq!(controller.init(), Effect::None);
    }

    #[test]
    fn test_initial_enter_failure_quits_and_renders_nothing() {
        let mut registry = ModeRegistry::new();
        registry.register(
            Mode::ServerSelection,
            Box::new(Scripted {
                label: "selection",
                enter_result: Err(EnterError::NoServerSelected),
                next_mode: Rc::new(RefCell::new(None)),
                seen: Rc::new(RefCell::new(Vec::new())),
                entered: Rc::new(RefCell::new(0)),
            }),
        );
        let mut controller = Controller::initial(registry, Arc::new(SessionState::new()));
        assert!(controller.quitting());
        assert_eq!(controller.init(), Effect::Quit);
        assert!(!screen(&mut controller).contains("selection"));
    }

    #[test]
    fn test_interrupt_always_quits() {
        let mut h = harness(Ok(Effect::None));
        assert_eq!(h.controller.update(&Event::Interrupt), Effect::Quit);
        assert!(h.controller.quitting());
        assert!(h.selection_seen.borrow().is_empty());
        // Once quitting, further events are ignored.
        assert_eq!(h.controller.update(&Event::Submit), Effect::None);
        assert!(h.selection_seen.borrow().is_empty());
    }

    #[test]
    fn test_resize_updates_state_and_forwards() {
        let mut h = harness(Ok(Effect::None));
        for (w, h_) in [(80, 24), (100, 50), (33, 12)] {
            h.controller.update(&Event::Resize(w, h_));
        }
        assert_eq!(h.state.width(), 33);
        assert_eq!(h.state.height(), 12);
        assert_eq!(h.selection_seen.borrow().len(), 3);
    }

    #[test]
    fn test_forwards_effect_without_transition() {
        let mut h = harness(Ok(Effect::None));
        assert_eq!(h.controller.update(&Event::Submit), Effect::Blink);
        assert_eq!(h.controller.mode(), Mode::ServerSelection);
    }

    #[test]
    fn test_transition_enters_new_mode() {
        let mut h = harness(Ok(Effect::FetchUser("u1".into())));
        *h.selection_next.borrow_mut() = Some(Mode::Server);

        let effect = h.controller.update(&Event::Submit);

        assert_eq!(h.controller.mode(), Mode::Server);
        assert_eq!(*h.server_entered.borrow(), 1);
        // The leaving mode's effect is kept ahead of the entered mode's.
        assert_eq!(
            effect,
            Effect::Batch(vec![Effect::Blink, Effect::FetchUser("u1".into())])
        );
        assert!(screen(&mut h.controller).contains("server"));
    }

    #[test]
    fn test_failed_enter_on_transition_quits() {
        let mut h = harness(Err(EnterError::NoServerSelected));
        *h.selection_next.borrow_mut() = Some(Mode::Server);

        let effect = h.controller.update(&Event::Submit);

        assert_eq!(effect, Effect::Batch(vec![Effect::Blink, Effect::Quit]));
        assert!(h.controller.quitting());
    }
}
