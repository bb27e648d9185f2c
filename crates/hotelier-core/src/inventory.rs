//! # Inventory Stock Ledger
//!
//! Every stock-affecting action is a [`StockMovement`]; the item's `stock` is
//! a cached total updated in the same call, so the two never diverge.
//!
//! ## Sign Convention
//! ```text
//! ┌──────────────┬───────────────┬──────────────────────────────────────────┐
//! │ Kind         │ Quantity sign │ Produced by                              │
//! ├──────────────┼───────────────┼──────────────────────────────────────────┤
//! │ Restock      │      +        │ restock(item, qty)                       │
//! │ Consumption  │      −        │ consume(item, qty)                       │
//! │ Adjustment   │      ±        │ adjust(item, delta), add_item(opening)   │
//! └──────────────┴───────────────┴──────────────────────────────────────────┘
//! ```
//!
//! ## Negative Stock
//! What happens when a movement would take stock below zero is a policy
//! choice, see [`NegativeStockPolicy`]. Stock is never silently clamped.

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use ts_rs::TS;
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{InventoryItem, MovementKind, StockMovement};
use crate::validation::{validate_adjustment, validate_label, validate_quantity};

/// What to do when a movement would leave stock below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum NegativeStockPolicy {
    /// Record the movement, keep the negative stock, raise a
    /// [`StockAlert::Negative`].
    #[default]
    Flag,
    /// Refuse the movement with `InsufficientStock`.
    Reject,
}

impl FromStr for NegativeStockPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flag" => Ok(NegativeStockPolicy::Flag),
            "reject" => Ok(NegativeStockPolicy::Reject),
            other => Err(ValidationError::InvalidFormat {
                field: "negative_stock_policy".to_string(),
                reason: format!("expected 'flag' or 'reject', got '{}'", other),
            }),
        }
    }
}

/// A stock condition that needs attention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StockAlert {
    /// Below par level.
    Low {
        item_id: String,
        name: String,
        stock: i64,
        par_level: i64,
    },
    /// Below zero; more was consumed than was ever recorded.
    Negative {
        item_id: String,
        name: String,
        stock: i64,
    },
}

/// In-memory stock ledger for one hotel.
pub struct InventoryLedger {
    hotel_id: String,
    items: Vec<InventoryItem>,
    movements: Vec<StockMovement>,
    policy: NegativeStockPolicy,
    clock: Arc<dyn Clock>,
}

impl InventoryLedger {
    pub fn new(hotel_id: impl Into<String>, policy: NegativeStockPolicy, clock: Arc<dyn Clock>) -> Self {
        Self::from_parts(hotel_id, Vec::new(), Vec::new(), policy, clock)
    }

    /// Builds a ledger from records loaded upstream.
    pub fn from_parts(
        hotel_id: impl Into<String>,
        items: Vec<InventoryItem>,
        movements: Vec<StockMovement>,
        policy: NegativeStockPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        InventoryLedger {
            hotel_id: hotel_id.into(),
            items,
            movements,
            policy,
            clock,
        }
    }

    pub fn policy(&self) -> NegativeStockPolicy {
        self.policy
    }

    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    pub fn item(&self, item_id: &str) -> Option<&InventoryItem> {
        self.items.iter().find(|i| i.id == item_id)
    }

    pub fn movements(&self) -> &[StockMovement] {
        &self.movements
    }

    /// Registers a new item. Opening stock is recorded as an `Adjustment`
    /// so the movement sum matches the cached stock from the start.
    pub fn add_item(
        &mut self,
        name: &str,
        unit: &str,
        par_level: i64,
        opening_stock: i64,
    ) -> CoreResult<(InventoryItem, Option<StockMovement>)> {
        validate_label("item name", name)?;
        if par_level < 0 {
            return Err(ValidationError::Negative {
                field: "par level".to_string(),
            }
            .into());
        }
        if opening_stock < 0 {
            return Err(ValidationError::Negative {
                field: "opening stock".to_string(),
            }
            .into());
        }

        let item = InventoryItem {
            id: Uuid::new_v4().to_string(),
            hotel_id: self.hotel_id.clone(),
            name: name.trim().to_string(),
            stock: 0,
            par_level,
            unit: unit.to_string(),
        };
        let item_id = item.id.clone();
        self.items.push(item);

        let opening = if opening_stock > 0 {
            Some(self.record(&item_id, MovementKind::Adjustment, opening_stock, "Opening stock")?)
        } else {
            None
        };

        let item = self
            .item(&item_id)
            .cloned()
            .ok_or(CoreError::ItemNotFound(item_id))?;
        Ok((item, opening))
    }

    /// Inserts or replaces an item by id (upstream changes).
    pub fn upsert_item(&mut self, item: InventoryItem) {
        match self.items.iter_mut().find(|i| i.id == item.id) {
            Some(existing) => *existing = item,
            None => self.items.push(item),
        }
    }

    pub fn remove_item(&mut self, item_id: &str) -> Option<InventoryItem> {
        let idx = self.items.iter().position(|i| i.id == item_id)?;
        Some(self.items.remove(idx))
    }

    /// Inserts or replaces a movement by id without touching cached stock
    /// (upstream already applied it).
    pub fn upsert_movement(&mut self, movement: StockMovement) {
        match self.movements.iter_mut().find(|m| m.id == movement.id) {
            Some(existing) => *existing = movement,
            None => self.movements.push(movement),
        }
    }

    pub fn remove_movement(&mut self, movement_id: &str) -> Option<StockMovement> {
        let idx = self.movements.iter().position(|m| m.id == movement_id)?;
        Some(self.movements.remove(idx))
    }

    /// Adds stock (positive quantity).
    pub fn restock(&mut self, item_id: &str, qty: i64, note: &str) -> CoreResult<StockMovement> {
        validate_quantity(qty)?;
        self.record(item_id, MovementKind::Restock, qty, note)
    }

    /// Uses up stock (recorded as a negative quantity).
    pub fn consume(&mut self, item_id: &str, qty: i64, note: &str) -> CoreResult<StockMovement> {
        validate_quantity(qty)?;
        self.record(item_id, MovementKind::Consumption, -qty, note)
    }

    /// Corrects stock by a signed delta (stock counts, breakage).
    pub fn adjust(&mut self, item_id: &str, delta: i64, note: &str) -> CoreResult<StockMovement> {
        validate_adjustment(delta)?;
        self.record(item_id, MovementKind::Adjustment, delta, note)
    }

    fn record(
        &mut self,
        item_id: &str,
        kind: MovementKind,
        quantity: i64,
        note: &str,
    ) -> CoreResult<StockMovement> {
        let policy = self.policy;
        let now = self.clock.now();
        let item = self
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| CoreError::ItemNotFound(item_id.to_string()))?;

        let new_stock = item.stock + quantity;
        if new_stock < 0 {
            match policy {
                NegativeStockPolicy::Reject => {
                    return Err(CoreError::InsufficientStock {
                        item: item.name.clone(),
                        available: item.stock,
                        requested: -quantity,
                    });
                }
                NegativeStockPolicy::Flag => {
                    warn!(
                        item_id = %item.id,
                        item = %item.name,
                        stock = new_stock,
                        "Stock went negative"
                    );
                }
            }
        }

        let movement = StockMovement {
            id: Uuid::new_v4().to_string(),
            item_id: item.id.clone(),
            kind,
            quantity,
            note: note.to_string(),
            created_at: now,
        };
        item.stock = new_stock;

        debug!(item_id = %item_id, kind = kind.as_str(), quantity, stock = new_stock, "Stock movement recorded");
        self.movements.push(movement.clone());
        Ok(movement)
    }

    /// Items strictly below par level.
    pub fn low_stock(&self) -> Vec<&InventoryItem> {
        self.items.iter().filter(|i| i.is_low_stock()).collect()
    }

    /// One alert per item needing attention; `Negative` wins over `Low`.
    pub fn alerts(&self) -> Vec<StockAlert> {
        self.items
            .iter()
            .filter_map(|i| {
                if i.stock < 0 {
                    Some(StockAlert::Negative {
                        item_id: i.id.clone(),
                        name: i.name.clone(),
                        stock: i.stock,
                    })
                } else if i.is_low_stock() {
                    Some(StockAlert::Low {
                        item_id: i.id.clone(),
                        name: i.name.clone(),
                        stock: i.stock,
                        par_level: i.par_level,
                    })
                } else {
                    None
                }
            })
            .collect()
    }

    /// Movements newest first, optionally for a single item. Movements with
    /// the same timestamp keep reverse insertion order.
    pub fn movement_log(&self, item_id: Option<&str>) -> Vec<&StockMovement> {
        let mut log: Vec<&StockMovement> = self
            .movements
            .iter()
            .rev()
            .filter(|m| item_id.map_or(true, |id| m.item_id == id))
            .collect();
        log.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        log
    }

    /// Sum of every movement recorded for the item.
    pub fn running_total(&self, item_id: &str) -> i64 {
        self.movements
            .iter()
            .filter(|m| m.item_id == item_id)
            .map(|m| m.quantity)
            .sum()
    }

    /// Whether the cached stock equals the movement sum.
    pub fn is_consistent(&self, item_id: &str) -> bool {
        self.item(item_id)
            .map_or(false, |i| i.stock == self.running_total(item_id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::NaiveDate;

    fn clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock::on(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()))
    }

    fn ledger(policy: NegativeStockPolicy) -> InventoryLedger {
        InventoryLedger::new("h", policy, clock())
    }

    #[test]
    fn test_opening_stock_is_a_movement() {
        let mut inv = ledger(NegativeStockPolicy::Flag);
        let (item, opening) = inv.add_item("Towels", "pcs", 20, 50).unwrap();

        assert_eq!(item.stock, 50);
        let opening = opening.unwrap();
        assert_eq!(opening.kind, MovementKind::Adjustment);
        assert_eq!(opening.quantity, 50);
        assert!(inv.is_consistent(&item.id));
    }

    #[test]
    fn test_sign_convention() {
        let mut inv = ledger(NegativeStockPolicy::Flag);
        let (item, _) = inv.add_item("Soap", "bars", 5, 10).unwrap();

        assert_eq!(inv.restock(&item.id, 4, "delivery").unwrap().quantity, 4);
        assert_eq!(inv.consume(&item.id, 3, "room 101").unwrap().quantity, -3);
        assert_eq!(inv.adjust(&item.id, -2, "count").unwrap().quantity, -2);

        assert_eq!(inv.item(&item.id).unwrap().stock, 9);
        assert_eq!(inv.running_total(&item.id), 9);
        assert!(inv.is_consistent(&item.id));

        assert!(inv.restock(&item.id, 0, "").is_err());
        assert!(inv.consume(&item.id, -1, "").is_err());
        assert!(inv.adjust(&item.id, 0, "").is_err());
    }

    #[test]
    fn test_low_stock_boundary() {
        let mut inv = ledger(NegativeStockPolicy::Flag);
        let (item, _) = inv.add_item("Shampoo", "bottles", 10, 10).unwrap();
        assert!(inv.low_stock().is_empty());

        inv.consume(&item.id, 1, "").unwrap();
        assert_eq!(inv.low_stock().len(), 1);
        assert!(matches!(inv.alerts()[0], StockAlert::Low { stock: 9, .. }));
    }

    #[test]
    fn test_negative_stock_flagged() {
        let mut inv = ledger(NegativeStockPolicy::Flag);
        let (item, _) = inv.add_item("Water", "bottles", 0, 2).unwrap();

        inv.consume(&item.id, 5, "minibar").unwrap();
        assert_eq!(inv.item(&item.id).unwrap().stock, -3);
        assert!(matches!(inv.alerts()[0], StockAlert::Negative { stock: -3, .. }));
        assert!(inv.is_consistent(&item.id));
    }

    #[test]
    fn test_negative_stock_rejected() {
        let mut inv = ledger(NegativeStockPolicy::Reject);
        let (item, _) = inv.add_item("Water", "bottles", 0, 2).unwrap();

        let err = inv.consume(&item.id, 5, "minibar").unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock {
                available: 2,
                requested: 5,
                ..
            }
        ));
        assert_eq!(inv.item(&item.id).unwrap().stock, 2);
        assert_eq!(inv.movements().len(), 1);
    }

    #[test]
    fn test_movement_log_newest_first() {
        let base = clock().now();
        let mut inv = ledger(NegativeStockPolicy::Flag);
        for (id, minutes) in [("old", 0), ("new", 20), ("mid", 10)] {
            inv.upsert_movement(StockMovement {
                id: id.to_string(),
                item_id: "i-1".to_string(),
                kind: MovementKind::Restock,
                quantity: 1,
                note: String::new(),
                created_at: base + chrono::Duration::minutes(minutes),
            });
        }

        let order: Vec<&str> = inv.movement_log(None).iter().map(|m| m.id.as_str()).collect();
        assert_eq!(order, vec!["new", "mid", "old"]);
        assert!(inv.movement_log(Some("other")).is_empty());
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("Reject".parse::<NegativeStockPolicy>().unwrap(), NegativeStockPolicy::Reject);
        assert_eq!("flag".parse::<NegativeStockPolicy>().unwrap(), NegativeStockPolicy::Flag);
        assert!("clamp".parse::<NegativeStockPolicy>().is_err());
    }
}
