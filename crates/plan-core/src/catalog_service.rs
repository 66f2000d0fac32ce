//! Stores, products and plans: the mutable sources schedules are captured from.

use tracing::info;
use uuid::Uuid;

use plan_domain::{Plan, PlanItemDraft, Product, Store};

use crate::{storage::PlanningStorage, CoreError};

pub struct CatalogService;

impl CatalogService {
    pub fn add_store(storage: &dyn PlanningStorage, name: &str) -> Result<Store, CoreError> {
        let store = Store::new(Self::validate_name(name)?);
        storage.insert_store(&store)?;
        info!(store = %store.id, name = %store.name, "store registered");
        Ok(store)
    }

    pub fn store_by_name(storage: &dyn PlanningStorage, name: &str) -> Result<Store, CoreError> {
        storage
            .find_store_by_name(name.trim())?
            .ok_or_else(|| CoreError::NotFound(format!("store `{}`", name.trim())))
    }

    pub fn add_product(
        storage: &dyn PlanningStorage,
        store_id: Uuid,
        name: &str,
        unit_price: i64,
    ) -> Result<Product, CoreError> {
        Self::validate_price(unit_price)?;
        let product = Product::new(store_id, Self::validate_name(name)?, unit_price);
        storage.insert_product(&product)?;
        info!(product = %product.id, price = unit_price, "product added");
        Ok(product)
    }

    pub fn product_by_name(
        storage: &dyn PlanningStorage,
        store_id: Uuid,
        name: &str,
    ) -> Result<Product, CoreError> {
        storage
            .find_product_by_name(store_id, name.trim())?
            .ok_or_else(|| CoreError::NotFound(format!("product `{}`", name.trim())))
    }

    /// Changes the current price. Captured snapshots keep the price they saw.
    pub fn set_product_price(
        storage: &dyn PlanningStorage,
        product_id: Uuid,
        unit_price: i64,
    ) -> Result<(), CoreError> {
        Self::validate_price(unit_price)?;
        storage.update_product_price(product_id, unit_price)?;
        info!(product = %product_id, price = unit_price, "product price changed");
        Ok(())
    }

    pub fn remove_product(storage: &dyn PlanningStorage, product_id: Uuid) -> Result<(), CoreError> {
        storage.delete_product(product_id)?;
        info!(product = %product_id, "product removed");
        Ok(())
    }

    pub fn add_plan(
        storage: &dyn PlanningStorage,
        store_id: Uuid,
        name: &str,
        items: &[PlanItemDraft],
    ) -> Result<Plan, CoreError> {
        Self::validate_items(items)?;
        let plan = Plan::new(store_id, Self::validate_name(name)?);
        storage.insert_plan(&plan)?;
        if !items.is_empty() {
            storage.replace_plan_items(plan.id, items)?;
        }
        info!(plan = %plan.id, items = items.len(), "plan created");
        storage
            .load_plan(plan.id)?
            .ok_or_else(|| CoreError::Storage(format!("plan {} vanished after insert", plan.id)))
    }

    pub fn plan_by_name(
        storage: &dyn PlanningStorage,
        store_id: Uuid,
        name: &str,
    ) -> Result<Plan, CoreError> {
        storage
            .find_plan_by_name(store_id, name.trim())?
            .ok_or_else(|| CoreError::NotFound(format!("plan `{}`", name.trim())))
    }

    pub fn replace_plan_items(
        storage: &dyn PlanningStorage,
        plan_id: Uuid,
        items: &[PlanItemDraft],
    ) -> Result<Plan, CoreError> {
        Self::validate_items(items)?;
        storage.replace_plan_items(plan_id, items)?;
        info!(plan = %plan_id, items = items.len(), "plan items replaced");
        storage
            .load_plan(plan_id)?
            .ok_or_else(|| CoreError::NotFound(format!("plan {plan_id}")))
    }

    /// Deletes the plan. Schedules created from it fall back to their snapshots.
    pub fn remove_plan(storage: &dyn PlanningStorage, plan_id: Uuid) -> Result<(), CoreError> {
        storage.delete_plan(plan_id)?;
        info!(plan = %plan_id, "plan removed");
        Ok(())
    }

    fn validate_name(name: &str) -> Result<String, CoreError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(CoreError::InvalidInput("name cannot be empty".into()));
        }
        Ok(trimmed.to_string())
    }

    fn validate_price(unit_price: i64) -> Result<(), CoreError> {
        if unit_price < 0 {
            return Err(CoreError::InvalidInput(format!(
                "unit price must be non-negative, got {unit_price}"
            )));
        }
        Ok(())
    }

    fn validate_items(items: &[PlanItemDraft]) -> Result<(), CoreError> {
        match items.iter().find(|item| item.quantity <= 0) {
            Some(item) => Err(CoreError::InvalidInput(format!(
                "quantity for product {} must be positive",
                item.product_id
            ))),
            None => Ok(()),
        }
    }
}
