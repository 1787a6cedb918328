use crate::error::StoreError;
use crate::event::{EventType, ReadySnapshot};
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// The singleton `current` stats document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatsDocument {
    #[serde(deserialize_with = "counter")]
    pub total_messages: i64,
    #[serde(deserialize_with = "counter")]
    pub total_members_joined: i64,
    #[serde(deserialize_with = "counter")]
    pub total_members_left: i64,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "bot_status"
    )]
    pub bot_status: Option<BotStatus>,
}

/// Counters written by other clients may come back as doubles or nulls;
/// anything that is not a number counts as zero.
fn counter<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_i64().unwrap_or_else(|| n.as_f64().unwrap_or(0.0) as i64),
        _ => 0,
    })
}

/// A status that does not decode is treated as never written; the next
/// ready event replaces it.
fn bot_status<'de, D>(deserializer: D) -> Result<Option<BotStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotStatus {
    #[serde(flatten)]
    pub snapshot: ReadySnapshot,
    /// RFC 3339, taken from the local clock.
    pub last_update: String,
}

/// Persistence for the event log and the stats document.
#[async_trait]
pub trait Store: Send + Sync {
    /// Append one event record; the store assigns `timestamp` and `createdAt`.
    async fn append_event(
        &self,
        event_type: EventType,
        data: serde_json::Value,
    ) -> Result<(), StoreError>;

    /// `None` when the stats document has never been written.
    async fn load_stats(&self) -> Result<Option<StatsDocument>, StoreError>;

    /// Merge-write: fields of `stats` overwrite stored ones, a missing
    /// `bot_status` leaves the stored one untouched.
    async fn merge_stats(&self, stats: &StatsDocument) -> Result<(), StoreError>;
}

#[async_trait]
impl<S: Store + ?Sized> Store for Arc<S> {
    async fn append_event(
        &self,
        event_type: EventType,
        data: serde_json::Value,
    ) -> Result<(), StoreError> {
        (**self).append_event(event_type, data).await
    }

    async fn load_stats(&self) -> Result<Option<StatsDocument>, StoreError> {
        (**self).load_stats().await
    }

    async fn merge_stats(&self, stats: &StatsDocument) -> Result<(), StoreError> {
        (**self).merge_stats(stats).await
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_fields_default_to_zero() {
        let stats: StatsDocument = serde_json::from_value(json!({ "totalMessages": 3 })).unwrap();
        assert_eq!(
            stats,
            StatsDocument {
                total_messages: 3,
                ..StatsDocument::default()
            }
        );
    }

    #[test]
    fn counters_accept_doubles_and_nulls() {
        let stats: StatsDocument = serde_json::from_value(json!({
            "totalMessages": 41.0,
            "totalMembersJoined": null,
            "totalMembersLeft": "7",
        }))
        .unwrap();

        assert_eq!(stats.total_messages, 41);
        assert_eq!(stats.total_members_joined, 0);
        assert_eq!(stats.total_members_left, 0);
    }

    #[test]
    fn partial_bot_status_reads_as_absent() {
        let stats: StatsDocument = serde_json::from_value(json!({
            "totalMessages": 5,
            "botStatus": {
                "botName": "statbot#0001",
                "lastUpdate": "2026-10-16T12:00:00.000Z",
            },
        }))
        .unwrap();

        assert_eq!(stats.total_messages, 5);
        assert!(stats.bot_status.is_none());
    }

    #[test]
    fn bot_status_is_flattened() {
        let stats = StatsDocument {
            bot_status: Some(BotStatus {
                snapshot: ReadySnapshot {
                    bot_name: "statbot#0001".to_string(),
                    bot_id: "99".to_string(),
                    guild_count: 2,
                    user_count: 17,
                },
                last_update: "2026-10-16T12:00:00+00:00".to_string(),
            }),
            ..StatsDocument::default()
        };

        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(
            value["botStatus"],
            json!({
                "botName": "statbot#0001",
                "botId": "99",
                "guildCount": 2,
                "userCount": 17,
                "lastUpdate": "2026-10-16T12:00:00+00:00",
            })
        );

        let back: StatsDocument = serde_json::from_value(value).unwrap();
        assert_eq!(back, stats);
    }

    #[test]
    fn absent_bot_status_is_not_serialized() {
        let value = serde_json::to_value(StatsDocument::default()).unwrap();
        assert!(value.get("botStatus").is_none());
    }
}
