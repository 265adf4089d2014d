use super::service::ClientError;
use super::types::{Channel, ChannelId, Message, Server, ServerId, User, UserId};

/// Results of chat service work that happened off the UI thread.
///
/// Produced by the gateway subscription and by effect execution, consumed by
/// modes and tabs through `Event::Client`.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// The ready cache in `SessionState` was (re)populated.
    ReadyCacheUpdated,
    /// The gateway reported a new message.
    MessageArrived { channel_id: ChannelId },
    ServerFetched {
        server_id: ServerId,
        result: Result<Server, ClientError>,
    },
    /// Per-channel resolution results, in the server's channel order.
    ChannelsResolved {
        server_id: ServerId,
        channels: Vec<(ChannelId, Result<Channel, ClientError>)>,
    },
    UserFetched {
        user_id: UserId,
        result: Result<User, ClientError>,
    },
    MessageSent {
        channel_id: ChannelId,
        result: Result<Message, ClientError>,
    },
}
