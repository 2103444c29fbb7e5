//! Warehouse commands.

use common::AggregateId;

use crate::command::Command;

use super::{DeliveryAddress, ProductQuantities, Warehouse};

/// Ensures a warehouse exists. Opening an existing warehouse is a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenWarehouse {
    pub warehouse_id: AggregateId,
}

impl OpenWarehouse {
    pub fn new(warehouse_id: impl Into<AggregateId>) -> Self {
        Self {
            warehouse_id: warehouse_id.into(),
        }
    }
}

/// Closes an empty warehouse for good.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseWarehouse {
    pub warehouse_id: AggregateId,
}

impl CloseWarehouse {
    pub fn new(warehouse_id: impl Into<AggregateId>) -> Self {
        Self {
            warehouse_id: warehouse_id.into(),
        }
    }
}

/// Records arriving products.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreProducts {
    pub warehouse_id: AggregateId,

    /// Arriving amount per article.
    pub products: ProductQuantities,
}

impl StoreProducts {
    pub fn new(warehouse_id: impl Into<AggregateId>, products: impl Into<ProductQuantities>) -> Self {
        Self {
            warehouse_id: warehouse_id.into(),
            products: products.into(),
        }
    }
}

/// Removes products from stock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TakeProducts {
    pub warehouse_id: AggregateId,

    /// Requested amount per article.
    pub products: ProductQuantities,
}

impl TakeProducts {
    pub fn new(warehouse_id: impl Into<AggregateId>, products: impl Into<ProductQuantities>) -> Self {
        Self {
            warehouse_id: warehouse_id.into(),
            products: products.into(),
        }
    }
}

/// Removes products from stock and ships them to an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipProducts {
    pub warehouse_id: AggregateId,

    /// Requested amount per article.
    pub products: ProductQuantities,

    pub delivery_address: DeliveryAddress,
}

impl ShipProducts {
    pub fn new(
        warehouse_id: impl Into<AggregateId>,
        products: impl Into<ProductQuantities>,
        delivery_address: DeliveryAddress,
    ) -> Self {
        Self {
            warehouse_id: warehouse_id.into(),
            products: products.into(),
            delivery_address,
        }
    }
}

/// The closed set of commands a warehouse decides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarehouseCommand {
    Open(OpenWarehouse),
    Close(CloseWarehouse),
    Store(StoreProducts),
    Take(TakeProducts),
    Ship(ShipProducts),
}

impl WarehouseCommand {
    /// Returns the command name used in logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            WarehouseCommand::Open(_) => "OpenWarehouse",
            WarehouseCommand::Close(_) => "CloseWarehouse",
            WarehouseCommand::Store(_) => "StoreProducts",
            WarehouseCommand::Take(_) => "TakeProducts",
            WarehouseCommand::Ship(_) => "ShipProducts",
        }
    }
}

macro_rules! warehouse_command {
    ($($command:ident => $variant:ident),* $(,)?) => {
        $(
            impl Command for $command {
                type Aggregate = Warehouse;

                fn aggregate_id(&self) -> &AggregateId {
                    &self.warehouse_id
                }
            }

            impl From<$command> for WarehouseCommand {
                fn from(command: $command) -> Self {
                    WarehouseCommand::$variant(command)
                }
            }
        )*
    };
}

warehouse_command! {
    OpenWarehouse => Open,
    CloseWarehouse => Close,
    StoreProducts => Store,
    TakeProducts => Take,
    ShipProducts => Ship,
}

impl Command for WarehouseCommand {
    type Aggregate = Warehouse;

    fn aggregate_id(&self) -> &AggregateId {
        match self {
            WarehouseCommand::Open(cmd) => cmd.aggregate_id(),
            WarehouseCommand::Close(cmd) => cmd.aggregate_id(),
            WarehouseCommand::Store(cmd) => cmd.aggregate_id(),
            WarehouseCommand::Take(cmd) => cmd.aggregate_id(),
            WarehouseCommand::Ship(cmd) => cmd.aggregate_id(),
        }
    }
}
