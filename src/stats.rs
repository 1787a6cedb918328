//! Event log writer and rolling counters.
//!
//! Every event goes through a single `Writer` task, so the read-modify-write
//! on the stats document for one event completes before the next one starts.
//! This only serializes writers within one process.

use crate::error::StoreError;
use crate::event::GatewayEvent;
use crate::store::{BotStatus, StatsDocument, Store};
use chrono::{DateTime, SecondsFormat, Utc};
use tokio::sync::mpsc as channel;

const EVENT_BUFFERING: usize = 64;

/// Fold one event into the stats document.
pub fn apply(
    mut stats: StatsDocument,
    event: &GatewayEvent,
    now: DateTime<Utc>,
) -> StatsDocument {
    match event {
        GatewayEvent::BotReady(snapshot) => {
            stats.bot_status = Some(BotStatus {
                snapshot: snapshot.clone(),
                last_update: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            });
        }
        GatewayEvent::Message(_) => stats.total_messages += 1,
        GatewayEvent::MemberJoin(_) => stats.total_members_joined += 1,
        GatewayEvent::MemberLeave(_) => stats.total_members_left += 1,
    }

    stats
}

pub struct Writer<S: Store> {
    store: S,
    events: channel::Receiver<GatewayEvent>,
}

impl<S: Store> Writer<S> {
    pub fn init(store: S) -> (Writer<S>, channel::Sender<GatewayEvent>) {
        let (sender, reciever) = channel::channel(EVENT_BUFFERING);
        let writer = Writer {
            store,
            events: reciever,
        };
        (writer, sender)
    }

    /// Persist events until every sender is dropped.
    pub async fn listen(self) {
        let Writer { store, mut events } = self;

        while let Some(event) = events.recv().await {
            record(&store, &event).await;
        }

        tracing::info!("event channel closed, writer stopping");
    }
}

/// Store failures are logged and the event is dropped.
pub async fn record<S: Store>(store: &S, event: &GatewayEvent) {
    let event_type = event.event_type();

    match save(store, event).await {
        Ok(()) => tracing::info!(%event_type, "event stored"),
        Err(e) => tracing::error!(%event_type, "failed to store event: {}", e),
    }
}

async fn save<S: Store>(store: &S, event: &GatewayEvent) -> Result<(), StoreError> {
    store.append_event(event.event_type(), event.data()?).await?;

    let current = store.load_stats().await?.unwrap_or_default();
    let updated = apply(current, event, Utc::now());

    store.merge_stats(&updated).await
}
