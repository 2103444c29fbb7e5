//! Shipping collaborator trait and in-memory implementation.

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use thiserror::Error;

use super::{DeliveryAddress, ProductQuantities};

/// Errors reported by a shipping collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShippingError {
    /// The carrier could not be reached.
    #[error("Shipping unavailable: {0}")]
    Unavailable(String),

    /// The carrier refused the shipment.
    #[error("Shipment rejected: {0}")]
    Rejected(String),
}

/// Hands products over to a carrier.
///
/// Called at most once per ship command, and only after the warehouse has
/// confirmed that every requested amount is in stock.
#[async_trait]
pub trait ShippingService: Send + Sync {
    async fn ship_products(
        &self,
        delivery_address: &DeliveryAddress,
        products: &ProductQuantities,
    ) -> Result<(), ShippingError>;
}

#[async_trait]
impl<T: ShippingService + ?Sized> ShippingService for Arc<T> {
    async fn ship_products(
        &self,
        delivery_address: &DeliveryAddress,
        products: &ProductQuantities,
    ) -> Result<(), ShippingError> {
        (**self).ship_products(delivery_address, products).await
    }
}

/// A shipment accepted by [`InMemoryShippingService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shipment {
    pub delivery_address: DeliveryAddress,
    pub products: ProductQuantities,
}

#[derive(Debug, Default)]
struct InMemoryShippingState {
    shipments: Vec<Shipment>,
    calls: usize,
    failure: Option<ShippingError>,
}

/// In-memory shipping service for testing.
///
/// Clones share state, so a test can keep a handle after passing one to
/// the service under test.
#[derive(Debug, Clone, Default)]
pub struct InMemoryShippingService {
    state: Arc<RwLock<InMemoryShippingState>>,
}

impl InMemoryShippingService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following call fail with `failure`, or succeed again on `None`.
    pub fn set_failure(&self, failure: Option<ShippingError>) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .failure = failure;
    }

    /// Returns the number of accepted shipments.
    pub fn shipment_count(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .shipments
            .len()
    }

    /// Returns the number of calls, failed ones included.
    pub fn call_count(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .calls
    }

    pub fn shipments(&self) -> Vec<Shipment> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .shipments
            .clone()
    }
}

#[async_trait]
impl ShippingService for InMemoryShippingService {
    async fn ship_products(
        &self,
        delivery_address: &DeliveryAddress,
        products: &ProductQuantities,
    ) -> Result<(), ShippingError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.calls += 1;

        if let Some(failure) = &state.failure {
            return Err(failure.clone());
        }

        state.shipments.push(Shipment {
            delivery_address: delivery_address.clone(),
            products: products.clone(),
        });
        Ok(())
    }
}
