//! Domain error types.

use common::AggregateId;
use event_store::EventStoreError;
use thiserror::Error;

use crate::warehouse::{ShippingError, WarehouseError};

/// Errors surfaced by the command runtime.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the event store.
    #[error("Event store error: {0}")]
    EventStore(#[from] EventStoreError),

    /// The warehouse rejected the command.
    #[error("Warehouse error: {0}")]
    Warehouse(#[from] WarehouseError),

    /// The command requires an aggregate that was never created.
    #[error("Aggregate not found: {aggregate_type} with id {aggregate_id}")]
    AggregateNotFound {
        aggregate_type: &'static str,
        aggregate_id: AggregateId,
    },

    /// The command addresses an aggregate in a terminal state.
    #[error("Aggregate deleted: {aggregate_type} with id {aggregate_id}")]
    AggregateDeleted {
        aggregate_type: &'static str,
        aggregate_id: AggregateId,
    },

    /// The shipping collaborator failed.
    ///
    /// `committed_events` is the number of stock-depletion events that were
    /// already persisted when the failure happened. No compensating event is
    /// written.
    #[error(
        "Shipping failed for {aggregate_id} ({committed_events} events already committed): {source}"
    )]
    Shipping {
        aggregate_id: AggregateId,
        committed_events: usize,
        #[source]
        source: ShippingError,
    },

    /// The carrier accepted a shipment but its stock depletion could not be
    /// committed. The goods are on their way while the stream still holds
    /// them.
    #[error("Shipment for {aggregate_id} accepted by the carrier but not recorded: {source}")]
    ShipmentNotRecorded {
        aggregate_id: AggregateId,
        #[source]
        source: Box<DomainError>,
    },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    /// Returns true for failures of the surrounding infrastructure rather
    /// than business-rule or lifecycle rejections.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            DomainError::EventStore(_)
                | DomainError::Shipping { .. }
                | DomainError::ShipmentNotRecorded { .. }
                | DomainError::Serialization(_)
        )
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::EventStore(EventStoreError::ConcurrencyConflict { .. }) => {
                "concurrency_conflict"
            }
            DomainError::EventStore(_) => "event_store",
            DomainError::Warehouse(WarehouseError::ValidationFailed(_)) => "validation_failed",
            DomainError::Warehouse(WarehouseError::OutOfStock(_)) => "out_of_stock",
            DomainError::Warehouse(WarehouseError::InvalidPhase { .. }) => "invalid_phase",
            DomainError::AggregateNotFound { .. } => "aggregate_not_found",
            DomainError::AggregateDeleted { .. } => "aggregate_deleted",
            DomainError::Shipping { .. } => "shipping_failed",
            DomainError::ShipmentNotRecorded { .. } => "shipment_not_recorded",
            DomainError::Serialization(_) => "serialization",
        }
    }
}
