use std::fmt;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// Declares a transparent string identifier newtype.
macro_rules! id_type {
    ($($(#[$meta:meta])* $name:ident),+ $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
            #[serde(transparent)]
            pub struct $name(pub String);

            impl $name {
                pub fn as_str(&self) -> &str {
                    &self.0
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }

            impl From<&str> for $name {
                fn from(value: &str) -> Self {
                    Self(value.to_string())
                }
            }

            impl From<String> for $name {
                fn from(value: String) -> Self {
                    Self(value)
                }
            }
        )+
    };
}

id_type! {
    ServerId,
    ChannelId,
    UserId,
    /// Message ids are ULIDs: lexical order is creation order.
    MessageId,
}

impl MessageId {
    /// Creation time encoded in the first ten ULID characters, if well-formed.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        const CROCKFORD: &[u8] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

        let head = self.0.get(..10)?;
        let mut millis: u64 = 0;
        for byte in head.bytes() {
            let digit = CROCKFORD
                .iter()
                .position(|&c| c == byte.to_ascii_uppercase())?;
            millis = (millis << 5) | digit as u64;
        }
        DateTime::<Utc>::from_timestamp_millis(i64::try_from(millis).ok()?)
    }
}

/// A community ("server") the user belongs to.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Server {
    #[serde(rename = "_id")]
    pub id: ServerId,
    pub owner: UserId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub channels: Vec<ChannelId>,
    #[serde(default)]
    pub discoverable: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelType {
    TextChannel,
    VoiceChannel,
    SavedMessages,
    DirectMessage,
    Group,
    #[serde(other)]
    Other,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Channel {
    #[serde(rename = "_id")]
    pub id: ChannelId,
    pub channel_type: ChannelType,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub server: Option<ServerId>,
}

impl Channel {
    pub fn is_text(&self) -> bool {
        self.channel_type == ChannelType::TextChannel
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl User {
    /// Display name when set, otherwise the username.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }
}

/// Event payload carried by system messages.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SystemMessage {
    Text { content: String },
    UserAdded { id: UserId, by: UserId },
    UserRemove { id: UserId, by: UserId },
    UserJoined { id: UserId },
    UserLeft { id: UserId },
    UserKicked { id: UserId },
    UserBanned { id: UserId },
    ChannelRenamed { name: String, by: UserId },
    ChannelDescriptionChanged { by: UserId },
    ChannelIconChanged { by: UserId },
    ChannelOwnershipChanged { from: UserId, to: UserId },
    #[serde(other)]
    Unknown,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Message {
    #[serde(rename = "_id")]
    pub id: MessageId,
    pub channel: ChannelId,
    pub author: UserId,
    #[serde(default)]
    pub content: Option<String>,
    /// Present only on system/event messages; plain messages omit it.
    #[serde(default)]
    pub system: Option<SystemMessage>,
}

impl Message {
    pub fn content(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }

    /// Local time derived from the message id.
    pub fn sent_at(&self) -> Option<DateTime<Local>> {
        self.id.timestamp().map(|t| t.with_timezone(&Local))
    }
}

/// Initial snapshot delivered once the gateway session is authenticated.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ReadySnapshot {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub servers: Vec<Server>,
    #[serde(default)]
    pub channels: Vec<Channel>,
}

#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Latest,
    Oldest,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Latest => "Latest",
            SortOrder::Oldest => "Oldest",
        }
    }
}

/// Query for a page of channel messages.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchMessages {
    pub limit: u32,
    pub sort: SortOrder,
    /// Only return messages newer than this id.
    pub after: Option<MessageId>,
}

impl FetchMessages {
    pub fn latest(limit: u32) -> Self {
        Self {
            limit,
            sort: SortOrder::Latest,
            after: None,
        }
    }

    pub fn after(limit: u32, cursor: MessageId) -> Self {
        Self {
            limit,
            sort: SortOrder::Latest,
            after: Some(cursor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_id_timestamp_decodes_ulid() {
        // 01ARYZ6S41 encodes 1469918176385 ms.
        let id = MessageId::from("01ARYZ6S41TSV4RRFFQ69G5FAV");
        let ts = id.timestamp().unwrap();
        assert_eq!(ts.timestamp_millis(), 1_469_918_176_385);
    }

    #[test]
    fn test_message_id_timestamp_rejects_garbage() {
        assert!(MessageId::from("short").timestamp().is_none());
        assert!(MessageId::from("!!!!!!!!!!!!!!!!").timestamp().is_none());
    }

    #[test]
    fn test_message_ids_order_by_creation() {
        let older = MessageId::from("01HZZZZZZZZZZZZZZZZZZZZZZZ");
        let newer = MessageId::from("01J00000000000000000000000");
        assert!(newer > older);
    }

    #[test]
    fn test_plain_message_deserializes_without_system() {
        let json = r#"{"_id":"01J0","channel":"c1","author":"u1","content":"hi"}"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.content(), "hi");
        assert!(msg.system.is_none());
    }

    #[test]
    fn test_system_message_kinds() {
        let json = r#"{"_id":"01J0","channel":"c1","author":"00000000000000000000000000",
            "system":{"type":"channel_renamed","name":"general","by":"u2"}}"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(
            msg.system,
            Some(SystemMessage::ChannelRenamed {
                name: "general".into(),
                by: UserId::from("u2"),
            })
        );
    }

    #[test]
    fn test_unknown_system_kind_falls_back() {
        let json = r#"{"_id":"01J0","channel":"c1","author":"u1",
            "system":{"type":"message_pinned","id":"x","by":"u2"}}"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.system, Some(SystemMessage::Unknown));
    }

    #[test]
    fn test_unknown_channel_type_is_other() {
        let json = r#"{"_id":"c9","channel_type":"Forum","name":"x"}"#;
        let ch: Channel = serde_json::from_str(json).unwrap();
        assert_eq!(ch.channel_type, ChannelType::Other);
        assert!(!ch.is_text());
    }

    #[test]
    fn test_user_label_prefers_display_name() {
        let mut user = User {
            id: UserId::from("u1"),
            username: "alice".into(),
            display_name: None,
        };
        assert_eq!(user.label(), "alice");
        user.display_name = Some("Alice A.".into());
        assert_eq!(user.label(), "Alice A.");
    }
}
