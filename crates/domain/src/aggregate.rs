//! Core aggregate and domain event traits.

use common::AggregateId;
use event_store::Version;
use serde::{Serialize, de::DeserializeOwned};

/// Trait for domain events.
///
/// Domain events represent facts that have happened in the domain.
/// They are immutable and named in past tense.
pub trait DomainEvent: Serialize + DeserializeOwned + Send + Sync + Clone {
    /// Returns the event type name stored alongside the payload.
    fn event_type(&self) -> &'static str;
}

/// Trait for aggregates in an event-sourced system.
///
/// An aggregate's state is derived solely from its own event history:
/// - commands are decided against the current state and yield events
/// - events are folded into the state with [`Aggregate::apply`]
pub trait Aggregate: Default + Send + Sync + Sized {
    /// The type of events this aggregate produces and consumes.
    type Event: DomainEvent;

    /// The type of errors its decisions can produce.
    type Error: std::error::Error + Send + Sync;

    /// Returns the aggregate type name.
    fn aggregate_type() -> &'static str;

    /// Returns the aggregate's identifier, or `None` before creation.
    fn id(&self) -> Option<&AggregateId>;

    /// Returns the number of events folded into this instance.
    fn version(&self) -> Version;

    fn set_version(&mut self, version: Version);

    /// Returns true once the aggregate has reached a terminal state.
    ///
    /// The runtime rejects every command addressed to a deleted aggregate.
    fn is_deleted(&self) -> bool {
        false
    }

    /// Folds an event into the aggregate.
    ///
    /// Must be pure, deterministic and infallible: events are facts.
    fn apply(&mut self, event: Self::Event);

    /// Applies multiple events in sequence.
    fn apply_events(&mut self, events: impl IntoIterator<Item = Self::Event>) {
        for event in events {
            self.apply(event);
        }
    }

    /// Rebuilds an aggregate by folding a full event history onto the
    /// default (not yet created) state.
    fn replay(events: impl IntoIterator<Item = Self::Event>) -> Self {
        let mut aggregate = Self::default();
        let mut version = Version::initial();
        for event in events {
            aggregate.apply(event);
            version = version.next();
        }
        aggregate.set_version(version);
        aggregate
    }
}
