use std::collections::HashMap;

use log::{error, warn};

use crate::tui::modes::{Action, Mode};

/// Maps each mode to its single, long-lived action.
#[derive(Default)]
pub struct ModeRegistry {
    actions: HashMap<Mode, Box<dyn Action>>,
}

impl ModeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, mode: Mode, action: Box<dyn Action>) {
        if self.actions.insert(mode, action).is_some() {
            warn!("Mode {:?} registered twice, keeping the latest action", mode);
        }
    }

    /// The action for `mode`.
    ///
    /// # Panics
    ///
    /// If `mode` was never registered. Modes are registered once at startup,
    /// so this is a programming error.
    pub fn get(&mut self, mode: Mode) -> &mut dyn Action {
        match self.actions.get_mut(&mode) {
            Some(action) => action.as_mut(),
            None => {
                error!("No action registered for mode {:?}", mode);
                panic!("no action registered for mode {mode:?}");
            }
        }
    }
}
