//! Domain layer for the warehouse event-sourcing system.
//!
//! This crate provides the core domain abstractions including:
//! - Aggregate trait for event-sourced entities
//! - DomainEvent trait for domain events
//! - Command trait and CommandHandler for command processing
//! - Warehouse aggregate with its stock rules and shipping workflow

pub mod aggregate;
pub mod command;
pub mod config;
pub mod error;
pub mod telemetry;
pub mod warehouse;

pub use aggregate::{Aggregate, DomainEvent};
pub use command::{Command, CommandHandler, CommandResult, CreationPolicy, Decision};
pub use config::{ConfigError, LogFormat, ShipmentPolicy, WarehouseConfig};
pub use error::DomainError;
pub use warehouse::{
    ArticleNumber, CloseWarehouse, DeliveryAddress, InMemoryShippingService, OpenWarehouse,
    OutOfStock, ProductQuantities, ShipProducts, Shipment, ShippingError, ShippingService,
    StoreProducts, TakeProducts, ValidationError, Warehouse, WarehouseCommand, WarehouseError,
    WarehouseEvent, WarehousePhase, WarehouseService,
};
