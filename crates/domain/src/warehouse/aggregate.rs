//! Warehouse aggregate implementation.

use std::collections::BTreeMap;

use common::AggregateId;
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;

use super::{
    ArticleNumber, CloseWarehouse, OpenWarehouse, OutOfStock, ProductQuantities, ShipProducts,
    StoreProducts, TakeProducts, ValidationError, WarehouseCommand, WarehouseError,
    WarehouseEvent, WarehousePhase,
    events::{ProductMovementData, WarehouseOpenedData},
};

/// Warehouse aggregate root.
///
/// Tracks units on hand per article. Stock never goes negative: every
/// decision that removes units checks availability first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    id: Option<AggregateId>,

    #[serde(default)]
    version: Version,

    phase: WarehousePhase,

    /// Units on hand per article. A missing key means zero.
    stock: BTreeMap<ArticleNumber, i64>,
}

impl Aggregate for Warehouse {
    type Event = WarehouseEvent;
    type Error = WarehouseError;

    fn aggregate_type() -> &'static str {
        "Warehouse"
    }

    fn id(&self) -> Option<&AggregateId> {
        self.id.as_ref()
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn is_deleted(&self) -> bool {
        self.phase.is_terminal()
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            WarehouseEvent::WarehouseOpened(data) => self.apply_opened(data),
            WarehouseEvent::WarehouseClosed(_) => {
                self.phase = WarehousePhase::Closed;
            }
            WarehouseEvent::ProductArrived(data) => self.apply_arrived(data),
            WarehouseEvent::ProductTaken(data) => self.apply_taken(data),
        }
    }
}

// Query methods
impl Warehouse {
    pub fn phase(&self) -> WarehousePhase {
        self.phase
    }

    pub fn is_open(&self) -> bool {
        self.phase == WarehousePhase::Open
    }

    pub fn is_closed(&self) -> bool {
        self.phase == WarehousePhase::Closed
    }

    /// Returns the units on hand for an article (zero if never stored).
    pub fn stock_of(&self, article_number: &ArticleNumber) -> i64 {
        self.stock.get(article_number).copied().unwrap_or(0)
    }

    /// Returns the full stock ledger, including articles at zero.
    pub fn stock(&self) -> &BTreeMap<ArticleNumber, i64> {
        &self.stock
    }

    /// Returns the units on hand across all articles, saturating at `i64::MAX`.
    pub fn total_units(&self) -> i64 {
        self.stock
            .values()
            .fold(0_i64, |total, amount| total.saturating_add(*amount))
    }

    /// Returns true if no article has units on hand.
    pub fn is_empty(&self) -> bool {
        self.stock.values().all(|amount| *amount == 0)
    }
}

// Decision methods (return events, never mutate)
impl Warehouse {
    /// Decides any warehouse command.
    pub fn decide(&self, command: &WarehouseCommand) -> Result<Vec<WarehouseEvent>, WarehouseError> {
        match command {
            WarehouseCommand::Open(cmd) => self.open(cmd),
            WarehouseCommand::Close(cmd) => self.close(cmd),
            WarehouseCommand::Store(cmd) => self.store_products(cmd),
            WarehouseCommand::Take(cmd) => self.take_products(cmd),
            WarehouseCommand::Ship(cmd) => self.ship_products(cmd),
        }
    }

    /// Opens the warehouse if it does not exist yet; otherwise decides nothing.
    pub fn open(&self, cmd: &OpenWarehouse) -> Result<Vec<WarehouseEvent>, WarehouseError> {
        match self.phase {
            WarehousePhase::Nonexistent => Ok(vec![WarehouseEvent::warehouse_opened(
                cmd.warehouse_id.clone(),
            )]),
            WarehousePhase::Open | WarehousePhase::Closed => Ok(vec![]),
        }
    }

    /// Closes the warehouse. Every article must be at zero.
    pub fn close(&self, cmd: &CloseWarehouse) -> Result<Vec<WarehouseEvent>, WarehouseError> {
        self.ensure_phase(self.phase.can_close(), "close")?;

        if !self.is_empty() {
            return Err(ValidationError::NotEmpty {
                units_in_stock: self.total_units(),
            }
            .into());
        }

        Ok(vec![WarehouseEvent::warehouse_closed(
            cmd.warehouse_id.clone(),
        )])
    }

    /// Records arriving products, one event per article in input order.
    ///
    /// A single non-positive amount rejects the whole batch.
    pub fn store_products(
        &self,
        cmd: &StoreProducts,
    ) -> Result<Vec<WarehouseEvent>, WarehouseError> {
        self.ensure_phase(self.phase.accepts_stock_changes(), "store products")?;

        // Projected units on hand after earlier items of the same batch.
        let mut projected: BTreeMap<&ArticleNumber, i64> = BTreeMap::new();
        cmd.products
            .iter()
            .map(|(article_number, amount)| {
                if amount <= 0 {
                    return Err(ValidationError::NonPositiveArrival {
                        article_number: article_number.clone(),
                        amount,
                    }
                    .into());
                }

                let on_hand = projected
                    .get(article_number)
                    .copied()
                    .unwrap_or_else(|| self.stock_of(article_number));
                let Some(new_amount) = on_hand.checked_add(amount) else {
                    return Err(ValidationError::StockOverflow {
                        article_number: article_number.clone(),
                        on_hand,
                        amount,
                    }
                    .into());
                };
                projected.insert(article_number, new_amount);

                Ok(WarehouseEvent::product_arrived(
                    cmd.warehouse_id.clone(),
                    article_number.clone(),
                    amount,
                ))
            })
            .collect()
    }

    /// Removes products from stock, one event per article in input order.
    pub fn take_products(&self, cmd: &TakeProducts) -> Result<Vec<WarehouseEvent>, WarehouseError> {
        self.take(&cmd.warehouse_id, &cmd.products, "take products")
    }

    /// Decides the stock depletion of a shipment.
    ///
    /// The decision is the same as [`Warehouse::take_products`]; handing the
    /// products to the carrier is up to the caller once this succeeds.
    pub fn ship_products(&self, cmd: &ShipProducts) -> Result<Vec<WarehouseEvent>, WarehouseError> {
        self.take(&cmd.warehouse_id, &cmd.products, "ship products")
    }

    fn take(
        &self,
        warehouse_id: &AggregateId,
        products: &ProductQuantities,
        action: &'static str,
    ) -> Result<Vec<WarehouseEvent>, WarehouseError> {
        self.ensure_phase(self.phase.accepts_stock_changes(), action)?;

        // Units already claimed by earlier items of the same request.
        let mut claimed: BTreeMap<&ArticleNumber, i64> = BTreeMap::new();
        products
            .iter()
            .map(|(article_number, requested_amount)| {
                if requested_amount <= 0 {
                    return Err(ValidationError::NonPositiveRequest {
                        article_number: article_number.clone(),
                        amount: requested_amount,
                    }
                    .into());
                }

                let already_claimed = claimed.get(article_number).copied().unwrap_or(0);
                let available_amount = self.stock_of(article_number) - already_claimed;
                if requested_amount > available_amount {
                    return Err(OutOfStock {
                        article_number: article_number.clone(),
                        requested_amount,
                        available_amount,
                    }
                    .into());
                }
                claimed.insert(article_number, already_claimed + requested_amount);

                Ok(WarehouseEvent::product_taken(
                    warehouse_id.clone(),
                    article_number.clone(),
                    requested_amount,
                ))
            })
            .collect()
    }

    fn ensure_phase(&self, allowed: bool, action: &'static str) -> Result<(), WarehouseError> {
        if allowed {
            Ok(())
        } else {
            Err(WarehouseError::InvalidPhase {
                phase: self.phase,
                action,
            })
        }
    }
}

// Apply event helpers
impl Warehouse {
    fn apply_opened(&mut self, data: WarehouseOpenedData) {
        self.id = Some(data.warehouse_id);
        self.phase = WarehousePhase::Open;
        self.stock.clear();
    }

    // Decisions never emit a movement that leaves the range; saturation keeps
    // the fold total for streams written by anything else.
    fn apply_arrived(&mut self, data: ProductMovementData) {
        let on_hand = self.stock.entry(data.article_number).or_insert(0);
        *on_hand = on_hand.saturating_add(data.amount);
    }

    fn apply_taken(&mut self, data: ProductMovementData) {
        let on_hand = self.stock.entry(data.article_number).or_insert(0);
        *on_hand = on_hand.saturating_sub(data.amount).max(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{Aggregate, DomainEvent};
    use crate::warehouse::DeliveryAddress;

    const WAREHOUSE_01: &str = "warehouse01";

    fn warehouse01() -> AggregateId {
        AggregateId::new(WAREHOUSE_01)
    }

    fn opened() -> Warehouse {
        Warehouse::replay(vec![WarehouseEvent::warehouse_opened(warehouse01())])
    }

    fn with_stock(items: &[(&str, i64)]) -> Warehouse {
        let mut events = vec![WarehouseEvent::warehouse_opened(warehouse01())];
        events.extend(
            items
                .iter()
                .map(|(article, amount)| WarehouseEvent::product_arrived(warehouse01(), *article, *amount)),
        );
        Warehouse::replay(events)
    }

    #[test]
    fn test_open_new_warehouse() {
        let warehouse = Warehouse::default();
        let events = warehouse.open(&OpenWarehouse::new(WAREHOUSE_01)).unwrap();

        assert_eq!(events, vec![WarehouseEvent::warehouse_opened(warehouse01())]);
    }

    #[test]
    fn test_open_existing_warehouse_is_noop() {
        let warehouse = opened();
        let events = warehouse.open(&OpenWarehouse::new(WAREHOUSE_01)).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_opened_state() {
        let warehouse = opened();
        assert_eq!(warehouse.id(), Some(&warehouse01()));
        assert_eq!(warehouse.phase(), WarehousePhase::Open);
        assert!(warehouse.stock().is_empty());
        assert_eq!(warehouse.version(), Version::first());
    }

    #[test]
    fn test_close_empty_warehouse() {
        let mut warehouse = opened();
        let events = warehouse.close(&CloseWarehouse::new(WAREHOUSE_01)).unwrap();
        assert_eq!(events, vec![WarehouseEvent::warehouse_closed(warehouse01())]);

        warehouse.apply_events(events);
        assert!(warehouse.is_closed());
        assert!(warehouse.is_deleted());
    }

    #[test]
    fn test_close_with_stock_fails() {
        let warehouse = with_stock(&[("001", 7)]);
        let result = warehouse.close(&CloseWarehouse::new(WAREHOUSE_01));

        assert_eq!(
            result,
            Err(WarehouseError::ValidationFailed(ValidationError::NotEmpty {
                units_in_stock: 7
            }))
        );
    }

    #[test]
    fn test_close_after_everything_taken() {
        let mut warehouse = with_stock(&[("001", 7)]);
        warehouse.apply_events(
            warehouse
                .take_products(&TakeProducts::new(WAREHOUSE_01, [("001", 7)]))
                .unwrap(),
        );

        // The article key stays in the ledger at zero.
        assert_eq!(warehouse.stock().get(&ArticleNumber::new("001")), Some(&0));
        assert!(warehouse.close(&CloseWarehouse::new(WAREHOUSE_01)).is_ok());
    }

    #[test]
    fn test_close_nonexistent_warehouse_fails() {
        let result = Warehouse::default().close(&CloseWarehouse::new(WAREHOUSE_01));
        assert!(matches!(
            result,
            Err(WarehouseError::InvalidPhase {
                phase: WarehousePhase::Nonexistent,
                ..
            })
        ));
    }

    #[test]
    fn test_store_products_in_input_order() {
        let warehouse = opened();
        let events = warehouse
            .store_products(&StoreProducts::new(WAREHOUSE_01, [("001", 7), ("002", 13)]))
            .unwrap();

        assert_eq!(
            events,
            vec![
                WarehouseEvent::product_arrived(warehouse01(), "001", 7),
                WarehouseEvent::product_arrived(warehouse01(), "002", 13),
            ]
        );
    }

    #[test]
    fn test_store_products_accumulates_stock() {
        let mut warehouse = with_stock(&[("001", 7)]);
        warehouse.apply_events(
            warehouse
                .store_products(&StoreProducts::new(WAREHOUSE_01, [("001", 5)]))
                .unwrap(),
        );
        assert_eq!(warehouse.stock_of(&ArticleNumber::new("001")), 12);
    }

    #[test]
    fn test_store_products_rejects_whole_batch_on_non_positive_amount() {
        let warehouse = opened();

        for bad in [0, -3] {
            let result = warehouse.store_products(&StoreProducts::new(
                WAREHOUSE_01,
                [("001", 7), ("002", bad), ("003", 1)],
            ));

            assert_eq!(
                result,
                Err(WarehouseError::ValidationFailed(
                    ValidationError::NonPositiveArrival {
                        article_number: ArticleNumber::new("002"),
                        amount: bad,
                    }
                ))
            );
        }
    }

    #[test]
    fn test_store_products_rejects_amount_beyond_capacity() {
        let warehouse = with_stock(&[("001", i64::MAX)]);
        let result = warehouse.store_products(&StoreProducts::new(WAREHOUSE_01, [("001", 1)]));

        assert_eq!(
            result,
            Err(WarehouseError::ValidationFailed(ValidationError::StockOverflow {
                article_number: ArticleNumber::new("001"),
                on_hand: i64::MAX,
                amount: 1,
            }))
        );
    }

    #[test]
    fn test_store_products_checks_capacity_across_the_batch() {
        let warehouse = with_stock(&[("001", i64::MAX - 10)]);
        let result = warehouse.store_products(&StoreProducts::new(
            WAREHOUSE_01,
            [("002", i64::MAX), ("001", 10), ("003", 1)],
        ));
        assert!(result.is_ok());

        let result = warehouse.store_products(&StoreProducts::new(WAREHOUSE_01, [("001", 11)]));
        assert!(matches!(
            result,
            Err(WarehouseError::ValidationFailed(ValidationError::StockOverflow {
                on_hand,
                amount: 11,
                ..
            })) if on_hand == i64::MAX - 10
        ));
    }

    #[test]
    fn test_fold_saturates_on_out_of_range_movements() {
        let mut warehouse = with_stock(&[("001", i64::MAX)]);
        warehouse.apply(WarehouseEvent::product_arrived(warehouse01(), "001", 1));
        warehouse.apply(WarehouseEvent::product_taken(warehouse01(), "002", 5));

        assert_eq!(warehouse.stock_of(&ArticleNumber::new("001")), i64::MAX);
        assert_eq!(warehouse.stock_of(&ArticleNumber::new("002")), 0);
    }

    #[test]
    fn test_close_with_stock_beyond_i64_reports_saturated_total() {
        let warehouse = with_stock(&[("001", i64::MAX), ("002", 1)]);

        assert_eq!(warehouse.total_units(), i64::MAX);
        assert_eq!(
            warehouse.close(&CloseWarehouse::new(WAREHOUSE_01)),
            Err(WarehouseError::ValidationFailed(ValidationError::NotEmpty {
                units_in_stock: i64::MAX
            }))
        );
    }

    #[test]
    fn test_store_products_on_closed_warehouse_fails() {
        let mut warehouse = opened();
        warehouse.apply(WarehouseEvent::warehouse_closed(warehouse01()));

        let result = warehouse.store_products(&StoreProducts::new(WAREHOUSE_01, [("001", 7)]));
        assert!(matches!(
            result,
            Err(WarehouseError::InvalidPhase {
                phase: WarehousePhase::Closed,
                ..
            })
        ));
    }

    #[test]
    fn test_take_available_products() {
        let warehouse = with_stock(&[("001", 3)]);
        let events = warehouse
            .take_products(&TakeProducts::new(WAREHOUSE_01, [("001", 3)]))
            .unwrap();

        assert_eq!(events, vec![WarehouseEvent::product_taken(warehouse01(), "001", 3)]);
    }

    #[test]
    fn test_take_product_not_in_warehouse() {
        let warehouse = with_stock(&[("001", 3)]);
        let result = warehouse.take_products(&TakeProducts::new(WAREHOUSE_01, [("002", 3)]));

        assert_eq!(
            result,
            Err(WarehouseError::OutOfStock(OutOfStock {
                article_number: ArticleNumber::new("002"),
                requested_amount: 3,
                available_amount: 0,
            }))
        );
    }

    #[test]
    fn test_take_more_than_available() {
        let warehouse = with_stock(&[("001", 3)]);
        let result = warehouse.take_products(&TakeProducts::new(WAREHOUSE_01, [("001", 4)]));

        assert_eq!(
            result,
            Err(WarehouseError::OutOfStock(OutOfStock {
                article_number: ArticleNumber::new("001"),
                requested_amount: 4,
                available_amount: 3,
            }))
        );
    }

    #[test]
    fn test_take_reports_first_violation_and_emits_nothing() {
        let warehouse = with_stock(&[("001", 3), ("002", 1), ("003", 0)]);
        let result = warehouse.take_products(&TakeProducts::new(
            WAREHOUSE_01,
            [("001", 3), ("002", 2), ("003", 5)],
        ));

        let Err(WarehouseError::OutOfStock(out_of_stock)) = result else {
            panic!("expected OutOfStock, got {result:?}");
        };
        assert_eq!(out_of_stock.article_number, ArticleNumber::new("002"));
        assert_eq!(out_of_stock.requested_amount, 2);
        assert_eq!(out_of_stock.available_amount, 1);
    }

    #[test]
    fn test_take_rejects_non_positive_request() {
        let warehouse = with_stock(&[("001", 3)]);
        let result = warehouse.take_products(&TakeProducts::new(WAREHOUSE_01, [("001", 0)]));

        assert!(matches!(
            result,
            Err(WarehouseError::ValidationFailed(
                ValidationError::NonPositiveRequest { amount: 0, .. }
            ))
        ));
    }

    #[test]
    fn test_take_with_repeated_article_in_payload_never_overdraws() {
        let mut warehouse = with_stock(&[("001", 4)]);
        let products: ProductQuantities =
            serde_json::from_str(r#"[["001",3],["001",3]]"#).unwrap();

        let events = warehouse
            .take_products(&TakeProducts::new(WAREHOUSE_01, products))
            .unwrap();
        assert_eq!(events, vec![WarehouseEvent::product_taken(warehouse01(), "001", 3)]);

        warehouse.apply_events(events);
        assert_eq!(warehouse.stock_of(&ArticleNumber::new("001")), 1);
    }

    #[test]
    fn test_ship_decides_like_take() {
        let warehouse = with_stock(&[("001", 3)]);
        let address = DeliveryAddress::new("street 1", "12345 Town");

        let shipped = warehouse
            .ship_products(&ShipProducts::new(WAREHOUSE_01, [("001", 3)], address.clone()))
            .unwrap();
        let taken = warehouse
            .take_products(&TakeProducts::new(WAREHOUSE_01, [("001", 3)]))
            .unwrap();
        assert_eq!(shipped, taken);

        let result = Warehouse::replay(vec![WarehouseEvent::warehouse_opened(warehouse01())])
            .ship_products(&ShipProducts::new(WAREHOUSE_01, [("A", 1)], address));
        assert_eq!(
            result,
            Err(WarehouseError::OutOfStock(OutOfStock {
                article_number: ArticleNumber::new("A"),
                requested_amount: 1,
                available_amount: 0,
            }))
        );
    }

    #[test]
    fn test_closed_warehouse_never_emits_events() {
        let mut warehouse = opened();
        warehouse.apply(WarehouseEvent::warehouse_closed(warehouse01()));
        let address = DeliveryAddress::new("street 1", "12345 Town");

        let commands: Vec<WarehouseCommand> = vec![
            OpenWarehouse::new(WAREHOUSE_01).into(),
            CloseWarehouse::new(WAREHOUSE_01).into(),
            StoreProducts::new(WAREHOUSE_01, [("001", 1)]).into(),
            TakeProducts::new(WAREHOUSE_01, [("001", 1)]).into(),
            ShipProducts::new(WAREHOUSE_01, [("001", 1)], address).into(),
        ];

        for command in &commands {
            let emitted = warehouse.decide(command).unwrap_or_default();
            assert!(emitted.is_empty(), "{} emitted events", command.name());
        }
    }

    #[test]
    fn test_decide_dispatches_every_command() {
        let warehouse = with_stock(&[("001", 2)]);

        let events = warehouse
            .decide(&WarehouseCommand::from(StoreProducts::new(WAREHOUSE_01, [("002", 1)])))
            .unwrap();
        assert_eq!(events[0].event_type(), "ProductArrived");

        let events = warehouse
            .decide(&WarehouseCommand::from(TakeProducts::new(WAREHOUSE_01, [("001", 1)])))
            .unwrap();
        assert_eq!(events[0].event_type(), "ProductTaken");
    }

    #[test]
    fn test_warehouse_scenario() {
        let mut warehouse = Warehouse::default();
        let w1 = "W1";

        warehouse.apply_events(warehouse.open(&OpenWarehouse::new(w1)).unwrap());
        warehouse.apply_events(
            warehouse
                .store_products(&StoreProducts::new(w1, [("A", 7), ("B", 13)]))
                .unwrap(),
        );
        assert_eq!(warehouse.stock_of(&ArticleNumber::new("A")), 7);
        assert_eq!(warehouse.stock_of(&ArticleNumber::new("B")), 13);

        let events = warehouse
            .take_products(&TakeProducts::new(w1, [("A", 3)]))
            .unwrap();
        assert_eq!(
            events,
            vec![WarehouseEvent::product_taken(AggregateId::new(w1), "A", 3)]
        );
        warehouse.apply_events(events);
        assert_eq!(warehouse.stock_of(&ArticleNumber::new("A")), 4);
        assert_eq!(warehouse.stock_of(&ArticleNumber::new("B")), 13);

        assert!(matches!(
            warehouse.close(&CloseWarehouse::new(w1)),
            Err(WarehouseError::ValidationFailed(_))
        ));

        warehouse.apply_events(
            warehouse
                .take_products(&TakeProducts::new(w1, [("B", 13)]))
                .unwrap(),
        );
        // A is still at 4, so closing must still fail.
        assert!(warehouse.close(&CloseWarehouse::new(w1)).is_err());

        warehouse.apply_events(
            warehouse
                .take_products(&TakeProducts::new(w1, [("A", 4)]))
                .unwrap(),
        );
        let events = warehouse.close(&CloseWarehouse::new(w1)).unwrap();
        assert_eq!(
            events,
            vec![WarehouseEvent::warehouse_closed(AggregateId::new(w1))]
        );
        warehouse.apply_events(events);
        assert!(warehouse.is_deleted());
    }

    #[test]
    fn test_serialization() {
        let warehouse = with_stock(&[("001", 7), ("002", 13)]);

        let json = serde_json::to_string(&warehouse).unwrap();
        let deserialized: Warehouse = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized, warehouse);
        assert_eq!(deserialized.total_units(), 20);
    }
}
