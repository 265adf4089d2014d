//! The channel picked in the channels tab, shared read-only with the chat
//! tab. The channels tab owns the only strong handle.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::client::Channel;

#[derive(Debug, Default)]
pub struct ActiveChannel(Rc<RefCell<Option<Channel>>>);

impl ActiveChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, channel: Channel) {
        *self.0.borrow_mut() = Some(channel);
    }

    pub fn clear(&self) {
        *self.0.borrow_mut() = None;
    }

    pub fn get(&self) -> Option<Channel> {
        self.0.borrow().clone()
    }

    pub fn reader(&self) -> ActiveChannelReader {
        ActiveChannelReader(Rc::downgrade(&self.0))
    }
}

#[derive(Debug, Clone)]
pub struct ActiveChannelReader(Weak<RefCell<Option<Channel>>>);

impl ActiveChannelReader {
    /// None when no channel is selected or the owner is gone.
    pub fn get(&self) -> Option<Channel> {
        self.0.upgrade().and_then(|cell| cell.borrow().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_channel;

    #[test]
    fn test_reader_sees_owner_updates() {
        let active = ActiveChannel::new();
        let reader = active.reader();
        assert_eq!(reader.get(), None);

        active.set(test_channel("c1", "general"));
        assert_eq!(reader.get().map(|c| c.id.0), Some("c1".to_string()));

        active.clear();
        assert_eq!(reader.get(), None);
    }

    #[test]
    fn test_reader_outliving_owner() {
        let active = ActiveChannel::new();
        active.set(test_channel("c1", "general"));
        let reader = active.reader();
        drop(active);
        assert_eq!(reader.get(), None);
    }
}
