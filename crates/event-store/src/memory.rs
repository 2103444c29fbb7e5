use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    AggregateId, EventEnvelope, EventStoreError, Result, Version,
    store::{AppendOptions, EventStore, validate_events_for_append},
};

/// In-memory event store.
///
/// Holds one ordered stream per aggregate. Cloning shares the underlying
/// streams, so a clone can be handed to several services.
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    streams: Arc<RwLock<HashMap<AggregateId, Vec<EventEnvelope>>>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of events across all streams.
    pub async fn event_count(&self) -> usize {
        self.streams.read().await.values().map(Vec::len).sum()
    }

    /// Removes every stream.
    pub async fn clear(&self) {
        self.streams.write().await.clear();
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, events: Vec<EventEnvelope>, options: AppendOptions) -> Result<Version> {
        validate_events_for_append(&events)?;

        let aggregate_id = events[0].aggregate_id.clone();
        let first_new_version = events[0].version;

        let mut streams = self.streams.write().await;
        let stream = streams.entry(aggregate_id.clone()).or_default();
        let current_version = stream.last().map_or(Version::initial(), |e| e.version);

        if let Some(expected) = options.expected_version
            && current_version != expected
        {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected,
                actual: current_version,
            });
        }

        // The batch must continue the stream exactly where it ends.
        if first_new_version != current_version.next() {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected: options.expected_version.unwrap_or(current_version),
                actual: current_version,
            });
        }

        let appended = events.len();
        stream.extend(events);
        let new_version = stream.last().map_or(Version::initial(), |e| e.version);

        tracing::debug!(%aggregate_id, appended, %new_version, "events appended");
        Ok(new_version)
    }

    async fn get_events_for_aggregate(
        &self,
        aggregate_id: &AggregateId,
    ) -> Result<Vec<EventEnvelope>> {
        let streams = self.streams.read().await;
        Ok(streams.get(aggregate_id).cloned().unwrap_or_default())
    }

    async fn get_aggregate_version(&self, aggregate_id: &AggregateId) -> Result<Option<Version>> {
        let streams = self.streams.read().await;
        Ok(streams
            .get(aggregate_id)
            .and_then(|stream| stream.last())
            .map(|e| e.version))
    }
}
