//! Stores, products and production plans as they currently stand.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A physical location; the scoping unit for budgets and schedules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    pub id: Uuid,
    pub name: String,
}

impl Store {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }
}

/// A sellable product with its current unit price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub store_id: Uuid,
    pub name: String,
    pub unit_price: i64,
}

impl Product {
    pub fn new(store_id: Uuid, name: impl Into<String>, unit_price: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            store_id,
            name: name.into(),
            unit_price,
        }
    }
}

/// One line of a plan, priced at the product's current unit price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanLineItem {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: i64,
}

impl PlanLineItem {
    /// `quantity * unit_price`, pinned at `i64::MAX` for oversized lines.
    pub fn subtotal(&self) -> i64 {
        self.quantity.saturating_mul(self.unit_price)
    }
}

/// A production plan: the mutable source that schedules point at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub id: Uuid,
    pub store_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub items: Vec<PlanLineItem>,
}

impl Plan {
    pub fn new(store_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            store_id,
            name: name.into(),
            items: Vec::new(),
        }
    }

    pub fn with_item(mut self, product: &Product, quantity: i64) -> Self {
        self.items.push(PlanLineItem {
            product_id: product.id,
            product_name: product.name.clone(),
            quantity,
            unit_price: product.unit_price,
        });
        self
    }

    /// Sum of line subtotals at current prices.
    pub fn total(&self) -> i64 {
        self.items
            .iter()
            .fold(0i64, |total, item| total.saturating_add(item.subtotal()))
    }
}

/// Requested plan composition: product and quantity, priced later by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanItemDraft {
    pub product_id: Uuid,
    pub quantity: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_total_sums_current_subtotals() {
        let store = Store::new("Main");
        let bread = Product::new(store.id, "Bread", 300);
        let cake = Product::new(store.id, "Cake", 1_200);
        let plan = Plan::new(store.id, "Weekend")
            .with_item(&bread, 40)
            .with_item(&cake, 10);

        assert_eq!(plan.items[0].subtotal(), 12_000);
        assert_eq!(plan.total(), 24_000);
        assert_eq!(Plan::new(store.id, "Empty").total(), 0);
    }

    #[test]
    fn oversized_lines_saturate() {
        let store = Store::new("Main");
        let premium = Product::new(store.id, "Premium", 5_000_000_000_000_000);
        let plan = Plan::new(store.id, "Bulk")
            .with_item(&premium, 10_000)
            .with_item(&premium, 1);

        assert_eq!(plan.items[0].subtotal(), i64::MAX);
        assert_eq!(plan.total(), i64::MAX);
    }
}
