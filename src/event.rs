use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    BotReady,
    Message,
    MemberJoin,
    MemberLeave,
}

impl EventType {
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::BotReady => "bot_ready",
            EventType::Message => "message",
            EventType::MemberJoin => "member_join",
            EventType::MemberLeave => "member_leave",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of the bot and the size of its cache when the gateway session
/// came up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadySnapshot {
    pub bot_name: String,
    pub bot_id: String,
    pub guild_count: u64,
    pub user_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageData {
    pub message_id: String,
    pub content: String,
    pub author: Author,
    pub channel: ChannelRef,
    pub guild: GuildRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Author {
    pub id: String,
    pub username: String,
    pub discriminator: String,
    pub avatar: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelRef {
    pub id: String,
    pub name: Option<String>,
}

/// Both fields are null for direct messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuildRef {
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberData {
    pub user_id: String,
    pub username: String,
    pub guild_id: String,
    pub guild_name: Option<String>,
    pub member_count: Option<u64>,
}

/// A gateway notification reduced to the attributes that get persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEvent {
    BotReady(ReadySnapshot),
    Message(MessageData),
    MemberJoin(MemberData),
    MemberLeave(MemberData),
}

impl GatewayEvent {
    pub fn event_type(&self) -> EventType {
        match self {
            GatewayEvent::BotReady(_) => EventType::BotReady,
            GatewayEvent::Message(_) => EventType::Message,
            GatewayEvent::MemberJoin(_) => EventType::MemberJoin,
            GatewayEvent::MemberLeave(_) => EventType::MemberLeave,
        }
    }

    pub fn data(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            GatewayEvent::BotReady(snapshot) => serde_json::to_value(snapshot),
            GatewayEvent::Message(message) => serde_json::to_value(message),
            GatewayEvent::MemberJoin(member) | GatewayEvent::MemberLeave(member) => {
                serde_json::to_value(member)
            }
        }
    }
}
