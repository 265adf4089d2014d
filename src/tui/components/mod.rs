//! # TUI Components
//!
//! Reusable widgets shared by the modes and tabs.
//!
//! ## Component Architecture
//!
//! Components in this directory follow two patterns:
//!
//! ### Stateless Components (Props-Based Rendering)
//!
//! Created per frame from the data they display:
//! - `TabBar`: the row of tab boxes above the server view
//!
//! ### Stateful Components (Event-Driven)
//!
//! Hold presentation state and turn low-level events into high-level ones:
//! - `SelectableList`: server and channel lists
//! - `ComposeBox`: message composition and login fields
//! - `MessageView`: scrollable message history
//!
//! Each component file contains its state, events, rendering and tests.
//!
//! ```text
//! components/
//! ├── mod.rs              (this file)
//! ├── selectable_list.rs  (Typed, titled list with selection)
//! ├── compose_box/        (Text entry with optional masking)
//! ├── message_view.rs     (Scrollable message history)
//! └── tab_bar.rs          (Rounded tab boxes)
//! ```

pub mod compose_box;
pub mod message_view;
pub mod selectable_list;
pub mod tab_bar;

pub use compose_box::{ComposeBox, ComposeEvent};
pub use message_view::{MessageView, format_message};
pub use selectable_list::{ListEntry, ListEvent, SelectableList};
pub use tab_bar::{TAB_BAR_HEIGHT, TabBar};
