//! Event stream storage consumed by the warehouse runtime.
//!
//! The store is an ordered, append-only log of [`EventEnvelope`]s keyed by
//! aggregate identifier, with optimistic concurrency on append.

pub mod error;
pub mod event;
pub mod memory;
pub mod store;

pub use common::AggregateId;
pub use error::{EventStoreError, Result};
pub use event::{EventEnvelope, EventEnvelopeBuilder, EventId, Version};
pub use memory::InMemoryEventStore;
pub use store::{AppendOptions, EventStore, EventStoreExt};
