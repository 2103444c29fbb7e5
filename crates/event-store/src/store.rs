use async_trait::async_trait;

use crate::{AggregateId, EventEnvelope, EventStoreError, Result, Version};

/// Options for appending events to a stream.
#[derive(Debug, Clone, Default)]
pub struct AppendOptions {
    /// Version the stream must be at for the append to succeed.
    /// `None` skips the check.
    pub expected_version: Option<Version>,
}

impl AppendOptions {
    /// Options with no version check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Expects the stream to be at exactly `version`.
    pub fn expect_version(version: Version) -> Self {
        Self {
            expected_version: Some(version),
        }
    }

    /// Expects the stream to be empty.
    pub fn expect_new() -> Self {
        Self::expect_version(Version::initial())
    }
}

/// Append-only event storage keyed by aggregate identifier.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends a batch of events to one aggregate's stream.
    ///
    /// The batch is atomic. If `options.expected_version` is set and does not
    /// match the stream's current version, fails with `ConcurrencyConflict`.
    /// Returns the stream version after the append.
    async fn append(&self, events: Vec<EventEnvelope>, options: AppendOptions) -> Result<Version>;

    /// Returns every event of an aggregate, oldest first.
    async fn get_events_for_aggregate(&self, aggregate_id: &AggregateId)
    -> Result<Vec<EventEnvelope>>;

    /// Returns the current stream version, or `None` for an unknown aggregate.
    async fn get_aggregate_version(&self, aggregate_id: &AggregateId) -> Result<Option<Version>>;
}

/// Convenience methods available on every [`EventStore`].
#[async_trait]
pub trait EventStoreExt: EventStore {
    async fn append_event(&self, event: EventEnvelope, options: AppendOptions) -> Result<Version> {
        self.append(vec![event], options).await
    }

    /// Returns true if the aggregate has at least one event.
    async fn aggregate_exists(&self, aggregate_id: &AggregateId) -> Result<bool> {
        Ok(self.get_aggregate_version(aggregate_id).await?.is_some())
    }
}

impl<T: EventStore + ?Sized> EventStoreExt for T {}

/// Checks that a batch targets a single stream with consecutive versions.
pub fn validate_events_for_append(events: &[EventEnvelope]) -> Result<()> {
    let Some(first) = events.first() else {
        return Err(EventStoreError::InvalidAppend(
            "cannot append an empty event list".to_string(),
        ));
    };

    let mut expected_version = first.version;
    for event in events.iter().skip(1) {
        if event.aggregate_id != first.aggregate_id {
            return Err(EventStoreError::InvalidAppend(
                "all events must belong to the same aggregate".to_string(),
            ));
        }
        if event.aggregate_type != first.aggregate_type {
            return Err(EventStoreError::InvalidAppend(
                "all events must have the same aggregate type".to_string(),
            ));
        }
        expected_version = expected_version.next();
        if event.version != expected_version {
            return Err(EventStoreError::InvalidAppend(format!(
                "event versions must be sequential: expected {}, got {}",
                expected_version, event.version
            )));
        }
    }

    Ok(())
}
