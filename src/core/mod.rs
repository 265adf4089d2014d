//! # Core Application Logic
//!
//! Everything here is independent of the terminal: shared session state, the
//! per-channel message store, the background sync worker, and the files
//! RevoltTUI keeps on disk.
//!
//! ```text
//!     ┌──────────────────────────────────────────────────┐
//!     │                      CORE                        │
//!     │                                                  │
//!     │  state          Arc<SessionState> (RwLock)       │
//!     │  message_store  ordered, deduplicated messages   │
//!     │  sync           worker owning a MessageStore     │
//!     │  config         config dir, config.toml, env     │
//!     │  credentials    token file                       │
//!     └────────────────────────┬─────────────────────────┘
//!                              │ snapshots / events
//!                              ▼
//!                       ┌────────────┐
//!                       │    TUI     │
//!                       │ (ratatui)  │
//!                       └────────────┘
//! ```

pub mod config;
pub mod credentials;
pub mod message_store;
pub mod state;
pub mod sync;
