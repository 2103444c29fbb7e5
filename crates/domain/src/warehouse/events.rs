//! Warehouse domain events.

use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

use super::ArticleNumber;

/// Events recorded on a warehouse stream.
///
/// Events carry only what the fold needs; timestamps live on the envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum WarehouseEvent {
    WarehouseOpened(WarehouseOpenedData),

    WarehouseClosed(WarehouseClosedData),

    /// Units of an article were added to stock.
    ProductArrived(ProductMovementData),

    /// Units of an article were removed from stock.
    ProductTaken(ProductMovementData),
}

impl DomainEvent for WarehouseEvent {
    fn event_type(&self) -> &'static str {
        match self {
            WarehouseEvent::WarehouseOpened(_) => "WarehouseOpened",
            WarehouseEvent::WarehouseClosed(_) => "WarehouseClosed",
            WarehouseEvent::ProductArrived(_) => "ProductArrived",
            WarehouseEvent::ProductTaken(_) => "ProductTaken",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseOpenedData {
    pub warehouse_id: AggregateId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseClosedData {
    pub warehouse_id: AggregateId,
}

/// Data for ProductArrived and ProductTaken events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductMovementData {
    pub warehouse_id: AggregateId,
    pub article_number: ArticleNumber,

    /// Units moved; always positive.
    pub amount: i64,
}

impl WarehouseEvent {
    pub fn warehouse_opened(warehouse_id: AggregateId) -> Self {
        WarehouseEvent::WarehouseOpened(WarehouseOpenedData { warehouse_id })
    }

    pub fn warehouse_closed(warehouse_id: AggregateId) -> Self {
        WarehouseEvent::WarehouseClosed(WarehouseClosedData { warehouse_id })
    }

    pub fn product_arrived(
        warehouse_id: AggregateId,
        article_number: impl Into<ArticleNumber>,
        amount: i64,
    ) -> Self {
        WarehouseEvent::ProductArrived(ProductMovementData {
            warehouse_id,
            article_number: article_number.into(),
            amount,
        })
    }

    pub fn product_taken(
        warehouse_id: AggregateId,
        article_number: impl Into<ArticleNumber>,
        amount: i64,
    ) -> Self {
        WarehouseEvent::ProductTaken(ProductMovementData {
            warehouse_id,
            article_number: article_number.into(),
            amount,
        })
    }

    /// Returns the warehouse the event belongs to.
    pub fn warehouse_id(&self) -> &AggregateId {
        match self {
            WarehouseEvent::WarehouseOpened(data) => &data.warehouse_id,
            WarehouseEvent::WarehouseClosed(data) => &data.warehouse_id,
            WarehouseEvent::ProductArrived(data) | WarehouseEvent::ProductTaken(data) => {
                &data.warehouse_id
            }
        }
    }
}
