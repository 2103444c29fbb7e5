//! Warehouse service providing a simplified API for warehouse operations.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, PoisonError};
use std::time::Instant;

use common::AggregateId;
use event_store::EventStore;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::command::{CommandHandler, CommandResult, CreationPolicy};
use crate::config::{ShipmentPolicy, WarehouseConfig};
use crate::error::DomainError;

use super::{
    CloseWarehouse, OpenWarehouse, ShipProducts, ShippingService, StoreProducts, TakeProducts,
    Warehouse, WarehouseCommand, WarehouseError, WarehouseEvent,
};

type LockRegistry = std::sync::Mutex<HashMap<AggregateId, Arc<Mutex<()>>>>;

/// Service for managing warehouses.
///
/// Commands addressed to the same warehouse are serialized: each one holds
/// that warehouse's lock from loading the stream until its events are
/// committed. Commands for different warehouses run concurrently. A
/// warehouse's lock lives in the registry only while a command holds or
/// awaits it.
pub struct WarehouseService<S: EventStore, Sh: ShippingService> {
    handler: CommandHandler<S, Warehouse>,
    shipping: Sh,
    policy: ShipmentPolicy,
    locks: LockRegistry,
}

impl<S: EventStore, Sh: ShippingService> WarehouseService<S, Sh> {
    /// Creates a service with the default shipment policy.
    pub fn new(store: S, shipping: Sh) -> Self {
        Self::with_policy(store, shipping, ShipmentPolicy::default())
    }

    pub fn with_config(store: S, shipping: Sh, config: &WarehouseConfig) -> Self {
        Self::with_policy(store, shipping, config.shipment_policy)
    }

    pub fn with_policy(store: S, shipping: Sh, policy: ShipmentPolicy) -> Self {
        Self {
            handler: CommandHandler::new(store),
            shipping,
            policy,
            locks: LockRegistry::default(),
        }
    }

    /// Returns a reference to the underlying command handler.
    pub fn handler(&self) -> &CommandHandler<S, Warehouse> {
        &self.handler
    }

    /// Returns the order in which ship commands call the carrier and commit.
    pub fn policy(&self) -> ShipmentPolicy {
        self.policy
    }

    /// Opens a warehouse. Opening an existing warehouse records nothing.
    #[tracing::instrument(skip(self))]
    pub async fn open_warehouse(
        &self,
        cmd: OpenWarehouse,
    ) -> Result<CommandResult<Warehouse>, DomainError> {
        self.execute(
            "OpenWarehouse",
            &cmd.warehouse_id,
            CreationPolicy::CreateIfMissing,
            |warehouse| warehouse.open(&cmd),
        )
        .await
    }

    /// Closes an empty warehouse.
    #[tracing::instrument(skip(self))]
    pub async fn close_warehouse(
        &self,
        cmd: CloseWarehouse,
    ) -> Result<CommandResult<Warehouse>, DomainError> {
        self.execute(
            "CloseWarehouse",
            &cmd.warehouse_id,
            CreationPolicy::Existing,
            |warehouse| warehouse.close(&cmd),
        )
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn store_products(
        &self,
        cmd: StoreProducts,
    ) -> Result<CommandResult<Warehouse>, DomainError> {
        self.execute(
            "StoreProducts",
            &cmd.warehouse_id,
            CreationPolicy::Existing,
            |warehouse| warehouse.store_products(&cmd),
        )
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn take_products(
        &self,
        cmd: TakeProducts,
    ) -> Result<CommandResult<Warehouse>, DomainError> {
        self.execute(
            "TakeProducts",
            &cmd.warehouse_id,
            CreationPolicy::Existing,
            |warehouse| warehouse.take_products(&cmd),
        )
        .await
    }

    /// Removes products from stock and hands them to the shipping collaborator.
    ///
    /// The collaborator is called exactly once, and only if every requested
    /// amount is in stock. The shipment policy decides whether it is called
    /// before or after the depletion is committed; a failure is reported as
    /// [`DomainError::Shipping`] with the number of events already committed.
    /// If the carrier accepted but the depletion cannot be committed, the
    /// error is [`DomainError::ShipmentNotRecorded`].
    #[tracing::instrument(skip(self))]
    pub async fn ship_products(
        &self,
        cmd: ShipProducts,
    ) -> Result<CommandResult<Warehouse>, DomainError> {
        let warehouse_id = &cmd.warehouse_id;
        let _lease = self.lock(warehouse_id).await;

        self.observe("ShipProducts", warehouse_id, async {
            let decision = self
                .handler
                .decide(warehouse_id, CreationPolicy::Existing, |warehouse| {
                    warehouse.ship_products(&cmd)
                })
                .await?;

            match self.policy {
                ShipmentPolicy::ConfirmBeforeCommit => {
                    self.ship(&cmd, 0).await?;
                    self.handler
                        .commit(decision)
                        .await
                        .map_err(|source| {
                            metrics::counter!("warehouse_shipments_unrecorded_total").increment(1);
                            tracing::error!(
                                %warehouse_id,
                                error = %source,
                                "shipment handed to carrier but depletion not recorded"
                            );
                            DomainError::ShipmentNotRecorded {
                                aggregate_id: warehouse_id.clone(),
                                source: Box::new(source),
                            }
                        })
                }
                ShipmentPolicy::CommitThenShip => {
                    let result = self.handler.commit(decision).await?;
                    self.ship(&cmd, result.events.len()).await?;
                    Ok(result)
                }
            }
        })
        .await
    }

    /// Routes any warehouse command to its operation.
    pub async fn handle(
        &self,
        command: WarehouseCommand,
    ) -> Result<CommandResult<Warehouse>, DomainError> {
        match command {
            WarehouseCommand::Open(cmd) => self.open_warehouse(cmd).await,
            WarehouseCommand::Close(cmd) => self.close_warehouse(cmd).await,
            WarehouseCommand::Store(cmd) => self.store_products(cmd).await,
            WarehouseCommand::Take(cmd) => self.take_products(cmd).await,
            WarehouseCommand::Ship(cmd) => self.ship_products(cmd).await,
        }
    }

    /// Loads a warehouse by ID.
    ///
    /// Returns None if the warehouse was never opened.
    #[tracing::instrument(skip(self))]
    pub async fn get_warehouse(
        &self,
        warehouse_id: &AggregateId,
    ) -> Result<Option<Warehouse>, DomainError> {
        self.handler.load_existing(warehouse_id).await
    }

    async fn execute<F>(
        &self,
        command: &'static str,
        warehouse_id: &AggregateId,
        creation: CreationPolicy,
        decide: F,
    ) -> Result<CommandResult<Warehouse>, DomainError>
    where
        F: FnOnce(&Warehouse) -> Result<Vec<WarehouseEvent>, WarehouseError>,
    {
        let _lease = self.lock(warehouse_id).await;
        self.observe(
            command,
            warehouse_id,
            self.handler.execute(warehouse_id, creation, decide),
        )
        .await
    }

    async fn ship(&self, cmd: &ShipProducts, committed_events: usize) -> Result<(), DomainError> {
        self.shipping
            .ship_products(&cmd.delivery_address, &cmd.products)
            .await
            .map_err(|source| {
                metrics::counter!("warehouse_shipments_failed_total").increment(1);
                if committed_events > 0 {
                    metrics::counter!("warehouse_events_appended_total")
                        .increment(committed_events as u64);
                }
                tracing::warn!(
                    warehouse_id = %cmd.warehouse_id,
                    committed_events,
                    error = %source,
                    "shipment failed"
                );
                DomainError::Shipping {
                    aggregate_id: cmd.warehouse_id.clone(),
                    committed_events,
                    source,
                }
            })
    }

    async fn lock(&self, warehouse_id: &AggregateId) -> WarehouseLease<'_> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(warehouse_id.clone()).or_default())
        };
        let guard = Arc::clone(&lock).lock_owned().await;

        WarehouseLease {
            locks: &self.locks,
            warehouse_id: warehouse_id.clone(),
            lock: Some(lock),
            guard: Some(guard),
        }
    }

    async fn observe(
        &self,
        command: &'static str,
        warehouse_id: &AggregateId,
        outcome: impl Future<Output = Result<CommandResult<Warehouse>, DomainError>>,
    ) -> Result<CommandResult<Warehouse>, DomainError> {
        metrics::counter!("warehouse_commands_total", "command" => command).increment(1);
        let started = Instant::now();

        let result = outcome.await;

        metrics::histogram!("warehouse_command_duration_seconds", "command" => command)
            .record(started.elapsed().as_secs_f64());

        match &result {
            Ok(committed) => {
                if !committed.events.is_empty() {
                    metrics::counter!("warehouse_events_appended_total")
                        .increment(committed.events.len() as u64);
                }
                tracing::info!(
                    %warehouse_id,
                    command,
                    events = committed.events.len(),
                    version = committed.new_version.as_i64(),
                    "command committed"
                );
            }
            Err(e) => {
                metrics::counter!(
                    "warehouse_commands_rejected_total",
                    "command" => command,
                    "reason" => e.kind()
                )
                .increment(1);
                if e.is_infrastructure() {
                    tracing::warn!(%warehouse_id, command, error = %e, "command failed");
                } else {
                    tracing::info!(%warehouse_id, command, reason = e.kind(), "command rejected");
                }
            }
        }

        result
    }
}

/// Exclusive access to one warehouse for the duration of a command.
///
/// Dropping the lease releases the lock and removes the registry entry
/// unless another command is waiting for it.
struct WarehouseLease<'a> {
    locks: &'a LockRegistry,
    warehouse_id: AggregateId,
    lock: Option<Arc<Mutex<()>>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for WarehouseLease<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());

        // Clones are only taken under the registry lock, so a count of two
        // (registry and lease) means nobody else holds or awaits this lock.
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(lock) = self.lock.take() {
            if Arc::strong_count(&lock) == 2 {
                locks.remove(&self.warehouse_id);
            }
        }
    }
}
