pub mod event;
pub mod gateway;
pub mod revolt;
pub mod service;
pub mod types;

pub use event::ClientEvent;
pub use revolt::RevoltClient;
pub use service::{ChatClient, ClientError};
pub use types::{
    Channel, ChannelId, ChannelType, FetchMessages, Message, MessageId, ReadySnapshot, Server,
    ServerId, SortOrder, SystemMessage, User, UserId,
};
