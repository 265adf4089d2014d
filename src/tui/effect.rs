use crate::client::{ChannelId, ServerId, UserId};
use crate::core::sync::SyncCommand;

/// Side effects requested by `update`.
///
/// Modes and tabs never do I/O themselves; they describe it here and the
/// event loop's [`EffectRunner`](crate::tui::runner::EffectRunner) carries it
/// out, posting results back as events.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Effect {
    #[default]
    None,
    /// Visual/audible nudge for rejected input.
    Blink,
    Quit,
    Batch(Vec<Effect>),
    FetchServer(ServerId),
    /// Resolve each id to a channel, cache first.
    ResolveChannels {
        server_id: ServerId,
        channel_ids: Vec<ChannelId>,
    },
    FetchUser(UserId),
    SendMessage {
        channel_id: ChannelId,
        content: String,
    },
    Sync(SyncCommand),
}

impl Effect {
    /// Combines effects, dropping `None`s and flattening nested batches.
    pub fn batch(effects: impl IntoIterator<Item = Effect>) -> Effect {
        let mut flat = Vec::new();
        for effect in effects {
            match effect {
                Effect::None => {}
                Effect::Batch(inner) => match Effect::batch(inner) {
                    Effect::None => {}
                    Effect::Batch(more) => flat.extend(more),
                    single => flat.push(single),
                },
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => Effect::None,
            1 => flat.pop().unwrap_or_default(),
            _ => Effect::Batch(flat),
        }
    }
}
