//! Shared types for the warehouse event-sourcing system.

mod types;

pub use types::AggregateId;
