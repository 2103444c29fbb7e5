//! Warehouse aggregate and related types.

mod aggregate;
mod commands;
mod events;
mod service;
mod shipping;
mod state;
mod value_objects;

pub use aggregate::Warehouse;
pub use commands::*;
pub use events::{ProductMovementData, WarehouseClosedData, WarehouseEvent, WarehouseOpenedData};
pub use service::WarehouseService;
pub use shipping::{InMemoryShippingService, Shipment, ShippingError, ShippingService};
pub use state::WarehousePhase;
pub use value_objects::{ArticleNumber, DeliveryAddress, ProductQuantities};

use thiserror::Error;

/// Errors a warehouse decision can produce.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WarehouseError {
    /// The command carries values the warehouse cannot accept.
    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),

    /// A requested amount exceeds what is on hand.
    #[error(transparent)]
    OutOfStock(#[from] OutOfStock),

    /// The warehouse is not in a phase that allows the command.
    #[error("Invalid phase: cannot {action} while {phase}")]
    InvalidPhase {
        phase: WarehousePhase,
        action: &'static str,
    },
}

/// Business-rule violations reported as validation failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error(
        "Warehouse must be completely empty to be closed, {units_in_stock} units still in stock"
    )]
    NotEmpty { units_in_stock: i64 },

    #[error("Arriving amount for product {article_number} must be greater than 0, got {amount}")]
    NonPositiveArrival {
        article_number: ArticleNumber,
        amount: i64,
    },

    #[error(
        "Arriving amount {amount} for product {article_number} exceeds the capacity left on top of {on_hand} units"
    )]
    StockOverflow {
        article_number: ArticleNumber,
        on_hand: i64,
        amount: i64,
    },

    #[error("Requested amount for product {article_number} must be greater than 0, got {amount}")]
    NonPositiveRequest {
        article_number: ArticleNumber,
        amount: i64,
    },
}

/// The first article in a request whose amount exceeds the stock on hand.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error(
    "Product {article_number} out of stock! requested amount {requested_amount}, available amount {available_amount}"
)]
pub struct OutOfStock {
    pub article_number: ArticleNumber,
    pub requested_amount: i64,
    pub available_amount: i64,
}
