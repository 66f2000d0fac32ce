//! plan-storage-sqlite
//!
//! SQLite-backed [`PlanningStorage`]. Uniqueness, cascades and the
//! write-once snapshot rule live in the schema so that concurrent handles
//! on the same database file are arbitrated by SQLite itself.

use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    sync::{Mutex, MutexGuard},
    time::Duration,
};

use chrono::{DateTime, NaiveDate, Utc};
use plan_core::{storage::PlanningStorage, CoreError};
use plan_domain::{
    BudgetMonth, DailyTarget, MonthlyBudget, Plan, PlanItemDraft, PlanLineItem, Product, Schedule,
    ScheduleStatus, SnapshotDocument, Store,
};
use rusqlite::{
    ffi, params, types::Type, Connection, OptionalExtension, Row, TransactionBehavior,
};
use rust_decimal::Decimal;
use tracing::{debug, info};
use uuid::Uuid;

const SCHEMA_SQL: &str = include_str!("schema.sql");
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEDULE_COLUMNS: &str = "id, store_id, plan_id, scheduled_date, status, actual_revenue, \
     snapshot_json, created_at";
const BUDGET_COLUMNS: &str =
    "id, store_id, budget_month, target_amount, discount_rate, updated_at";

/// A single SQLite connection shared behind a mutex.
///
/// Open one handle per thread or process; handles on the same file see each
/// other's commits and conflict through the schema constraints.
#[derive(Debug)]
pub struct SqliteStorage {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl SqliteStorage {
    pub fn open(path: &Path) -> Result<Self, CoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                CoreError::Storage(format!("cannot create {}: {err}", parent.display()))
            })?;
        }
        let conn = Connection::open(path).map_err(storage_error)?;
        conn.busy_timeout(BUSY_TIMEOUT).map_err(storage_error)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))
            .map_err(storage_error)?;
        let storage = Self::prepare(conn, Some(path.to_path_buf()))?;
        info!(path = %path.display(), "planning database opened");
        Ok(storage)
    }

    pub fn open_in_memory() -> Result<Self, CoreError> {
        let conn = Connection::open_in_memory().map_err(storage_error)?;
        Self::prepare(conn, None)
    }

    /// Location of the database file; `None` for in-memory databases.
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn prepare(conn: Connection, db_path: Option<PathBuf>) -> Result<Self, CoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(storage_error)?;
        conn.execute_batch(SCHEMA_SQL).map_err(storage_error)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, CoreError> {
        self.conn
            .lock()
            .map_err(|_| CoreError::Storage("database mutex poisoned".to_string()))
    }
}

impl PlanningStorage for SqliteStorage {
    fn insert_store(&self, store: &Store) -> Result<(), CoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO stores (id, name) VALUES (?1, ?2)",
            params![store.id.to_string(), store.name],
        )
        .map_err(storage_error)?;
        Ok(())
    }

    fn find_store_by_name(&self, name: &str) -> Result<Option<Store>, CoreError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, name FROM stores WHERE name = ?1",
            [name],
            |row| {
                Ok(Store {
                    id: uuid_at(row, 0)?,
                    name: row.get(1)?,
                })
            },
        )
        .optional()
        .map_err(storage_error)
    }

    fn insert_product(&self, product: &Product) -> Result<(), CoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO products (id, store_id, name, unit_price) VALUES (?1, ?2, ?3, ?4)",
            params![
                product.id.to_string(),
                product.store_id.to_string(),
                product.name,
                product.unit_price
            ],
        )
        .map_err(storage_error)?;
        Ok(())
    }

    fn find_product_by_name(
        &self,
        store_id: Uuid,
        name: &str,
    ) -> Result<Option<Product>, CoreError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, store_id, name, unit_price FROM products WHERE store_id = ?1 AND name = ?2",
            params![store_id.to_string(), name],
            |row| {
                Ok(Product {
                    id: uuid_at(row, 0)?,
                    store_id: uuid_at(row, 1)?,
                    name: row.get(2)?,
                    unit_price: row.get(3)?,
                })
            },
        )
        .optional()
        .map_err(storage_error)
    }

    fn update_product_price(&self, product_id: Uuid, unit_price: i64) -> Result<(), CoreError> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE products SET unit_price = ?1 WHERE id = ?2",
                params![unit_price, product_id.to_string()],
            )
            .map_err(storage_error)?;
        require_changed(changed, || format!("product {product_id}"))
    }

    fn delete_product(&self, product_id: Uuid) -> Result<(), CoreError> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "DELETE FROM products WHERE id = ?1",
                [product_id.to_string()],
            )
            .map_err(storage_error)?;
        require_changed(changed, || format!("product {product_id}"))
    }

    fn insert_plan(&self, plan: &Plan) -> Result<(), CoreError> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(storage_error)?;
        tx.execute(
            "INSERT INTO plans (id, store_id, name) VALUES (?1, ?2, ?3)",
            params![plan.id.to_string(), plan.store_id.to_string(), plan.name],
        )
        .map_err(storage_error)?;
        for (position, item) in plan.items.iter().enumerate() {
            let draft = PlanItemDraft {
                product_id: item.product_id,
                quantity: item.quantity,
            };
            insert_plan_item(&tx, plan.id, plan.store_id, position, &draft)?;
        }
        tx.commit().map_err(storage_error)
    }

    fn replace_plan_items(&self, plan_id: Uuid, items: &[PlanItemDraft]) -> Result<(), CoreError> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(storage_error)?;
        let store_id = tx
            .query_row(
                "SELECT store_id FROM plans WHERE id = ?1",
                [plan_id.to_string()],
                |row| uuid_at(row, 0),
            )
            .optional()
            .map_err(storage_error)?
            .ok_or_else(|| CoreError::NotFound(format!("plan {plan_id}")))?;
        tx.execute(
            "DELETE FROM plan_items WHERE plan_id = ?1",
            [plan_id.to_string()],
        )
        .map_err(storage_error)?;
        for (position, item) in items.iter().enumerate() {
            insert_plan_item(&tx, plan_id, store_id, position, item)?;
        }
        tx.commit().map_err(storage_error)
    }

    fn delete_plan(&self, plan_id: Uuid) -> Result<(), CoreError> {
        let conn = self.lock()?;
        let changed = conn
            .execute("DELETE FROM plans WHERE id = ?1", [plan_id.to_string()])
            .map_err(storage_error)?;
        require_changed(changed, || format!("plan {plan_id}"))
    }

    fn load_plan(&self, plan_id: Uuid) -> Result<Option<Plan>, CoreError> {
        let conn = self.lock()?;
        read_plan(&conn, plan_id)
    }

    fn find_plan_by_name(&self, store_id: Uuid, name: &str) -> Result<Option<Plan>, CoreError> {
        let conn = self.lock()?;
        let plan_id = conn
            .query_row(
                "SELECT id FROM plans WHERE store_id = ?1 AND name = ?2",
                params![store_id.to_string(), name],
                |row| uuid_at(row, 0),
            )
            .optional()
            .map_err(storage_error)?;
        match plan_id {
            Some(plan_id) => read_plan(&conn, plan_id),
            None => Ok(None),
        }
    }

    fn load_budget(
        &self,
        store_id: Uuid,
        month: BudgetMonth,
    ) -> Result<Option<MonthlyBudget>, CoreError> {
        let conn = self.lock()?;
        read_budget(&conn, store_id, month)
    }

    fn upsert_budget(&self, budget: &MonthlyBudget) -> Result<MonthlyBudget, CoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO monthly_budgets (id, store_id, budget_month, target_amount, discount_rate, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(store_id, budget_month) DO UPDATE SET
               target_amount = excluded.target_amount,
               discount_rate = excluded.discount_rate,
               updated_at = excluded.updated_at",
            params![
                budget.id.to_string(),
                budget.store_id.to_string(),
                budget.budget_month.to_string(),
                budget.target_amount,
                budget.discount_rate.map(|rate| rate.to_string()),
                budget.updated_at,
            ],
        )
        .map_err(storage_error)?;
        read_budget(&conn, budget.store_id, budget.budget_month)?.ok_or_else(|| {
            CoreError::Storage(format!("budget for {} vanished after upsert", budget.budget_month))
        })
    }

    fn delete_budget(&self, store_id: Uuid, month: BudgetMonth) -> Result<(), CoreError> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(storage_error)?;
        let budget_id = tx
            .query_row(
                "SELECT id FROM monthly_budgets WHERE store_id = ?1 AND budget_month = ?2",
                params![store_id.to_string(), month.to_string()],
                |row| uuid_at(row, 0),
            )
            .optional()
            .map_err(storage_error)?
            .ok_or_else(|| CoreError::NotFound(format!("no budget for {month}")))?;
        let posted: i64 = tx
            .query_row(
                "SELECT COUNT(*) FROM plan_schedules
                 WHERE store_id = ?1 AND scheduled_date BETWEEN ?2 AND ?3 AND actual_revenue > 0",
                params![store_id.to_string(), month.first_day(), month.last_day()],
                |row| row.get(0),
            )
            .map_err(storage_error)?;
        if posted > 0 {
            return Err(CoreError::Conflict(format!(
                "{month} has {posted} posted actual(s); budget cannot be deleted"
            )));
        }
        let schedules = tx
            .execute(
                "DELETE FROM plan_schedules WHERE store_id = ?1 AND scheduled_date BETWEEN ?2 AND ?3",
                params![store_id.to_string(), month.first_day(), month.last_day()],
            )
            .map_err(storage_error)?;
        tx.execute(
            "DELETE FROM monthly_budgets WHERE id = ?1",
            [budget_id.to_string()],
        )
        .map_err(storage_error)?;
        tx.commit().map_err(storage_error)?;
        debug!(store = %store_id, %month, schedules, "budget and month schedules removed");
        Ok(())
    }

    fn load_daily_targets(&self, budget_id: Uuid) -> Result<Vec<DailyTarget>, CoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, budget_id, target_date, target_amount FROM daily_targets
                 WHERE budget_id = ?1 ORDER BY target_date",
            )
            .map_err(storage_error)?;
        let rows = stmt
            .query_map([budget_id.to_string()], |row| {
                Ok(DailyTarget {
                    id: uuid_at(row, 0)?,
                    budget_id: uuid_at(row, 1)?,
                    target_date: row.get(2)?,
                    target_amount: row.get(3)?,
                })
            })
            .map_err(storage_error)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(storage_error)
    }

    fn upsert_daily_targets(&self, targets: &[DailyTarget]) -> Result<(), CoreError> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(storage_error)?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO daily_targets (id, budget_id, target_date, target_amount)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(budget_id, target_date) DO UPDATE SET
                       target_amount = excluded.target_amount",
                )
                .map_err(storage_error)?;
            for target in targets {
                stmt.execute(params![
                    target.id.to_string(),
                    target.budget_id.to_string(),
                    target.target_date,
                    target.target_amount,
                ])
                .map_err(storage_error)?;
            }
        }
        tx.commit().map_err(storage_error)
    }

    fn clear_daily_targets(&self, budget_id: Uuid) -> Result<usize, CoreError> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM daily_targets WHERE budget_id = ?1",
            [budget_id.to_string()],
        )
        .map_err(storage_error)
    }

    fn insert_schedule(&self, schedule: &Schedule) -> Result<(), CoreError> {
        let snapshot_json = schedule
            .snapshot
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|err| CoreError::Storage(format!("cannot encode snapshot: {err}")))?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO plan_schedules (
               id, store_id, plan_id, scheduled_date, status, actual_revenue, snapshot_json, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                schedule.id.to_string(),
                schedule.store_id.to_string(),
                schedule.plan_id.map(|id| id.to_string()),
                schedule.scheduled_date,
                schedule.status.as_str(),
                schedule.actual_revenue,
                snapshot_json,
                schedule.created_at,
            ],
        )
        .map_err(storage_error)?;
        Ok(())
    }

    fn load_schedule(&self, schedule_id: Uuid) -> Result<Option<Schedule>, CoreError> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("SELECT {SCHEDULE_COLUMNS} FROM plan_schedules WHERE id = ?1"),
            [schedule_id.to_string()],
            schedule_from_row,
        )
        .optional()
        .map_err(storage_error)
    }

    fn schedule_on(&self, store_id: Uuid, date: NaiveDate) -> Result<Option<Schedule>, CoreError> {
        let conn = self.lock()?;
        conn.query_row(
            &format!(
                "SELECT {SCHEDULE_COLUMNS} FROM plan_schedules WHERE store_id = ?1 AND scheduled_date = ?2"
            ),
            params![store_id.to_string(), date],
            schedule_from_row,
        )
        .optional()
        .map_err(storage_error)
    }

    fn schedules_between(
        &self,
        store_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Schedule>, CoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {SCHEDULE_COLUMNS} FROM plan_schedules
                 WHERE store_id = ?1 AND scheduled_date BETWEEN ?2 AND ?3
                 ORDER BY scheduled_date"
            ))
            .map_err(storage_error)?;
        let rows = stmt
            .query_map(params![store_id.to_string(), start, end], schedule_from_row)
            .map_err(storage_error)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(storage_error)
    }

    fn update_actual(
        &self,
        schedule_id: Uuid,
        actual_revenue: Option<i64>,
        status: ScheduleStatus,
    ) -> Result<(), CoreError> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE plan_schedules SET actual_revenue = ?1, status = ?2 WHERE id = ?3",
                params![actual_revenue, status.as_str(), schedule_id.to_string()],
            )
            .map_err(storage_error)?;
        require_changed(changed, || format!("schedule {schedule_id}"))
    }

    fn write_snapshot(
        &self,
        schedule_id: Uuid,
        snapshot: &SnapshotDocument,
    ) -> Result<(), CoreError> {
        let json = serde_json::to_string(snapshot)
            .map_err(|err| CoreError::Storage(format!("cannot encode snapshot: {err}")))?;
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE plan_schedules SET snapshot_json = ?1 WHERE id = ?2",
                params![json, schedule_id.to_string()],
            )
            .map_err(storage_error)?;
        require_changed(changed, || format!("schedule {schedule_id}"))
    }

    fn delete_schedule(&self, schedule_id: Uuid) -> Result<(), CoreError> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "DELETE FROM plan_schedules WHERE id = ?1",
                [schedule_id.to_string()],
            )
            .map_err(storage_error)?;
        require_changed(changed, || format!("schedule {schedule_id}"))
    }
}

/// Maps SQLite failures onto the engine's error kinds.
///
/// Unique and trigger violations are conflicts; the other constraint
/// failures are rejected input. Anything else means the store itself failed.
pub fn storage_error(err: rusqlite::Error) -> CoreError {
    if let rusqlite::Error::SqliteFailure(failure, message) = &err {
        let detail = message.clone().unwrap_or_else(|| failure.to_string());
        match failure.extended_code {
            ffi::SQLITE_CONSTRAINT_UNIQUE
            | ffi::SQLITE_CONSTRAINT_PRIMARYKEY
            | ffi::SQLITE_CONSTRAINT_TRIGGER => return CoreError::Conflict(detail),
            ffi::SQLITE_CONSTRAINT_NOTNULL
            | ffi::SQLITE_CONSTRAINT_CHECK
            | ffi::SQLITE_CONSTRAINT_FOREIGNKEY => return CoreError::InvalidInput(detail),
            _ => {}
        }
    }
    CoreError::Storage(err.to_string())
}

fn require_changed(changed: usize, what: impl FnOnce() -> String) -> Result<(), CoreError> {
    if changed == 0 {
        return Err(CoreError::NotFound(what()));
    }
    Ok(())
}

fn insert_plan_item(
    conn: &Connection,
    plan_id: Uuid,
    store_id: Uuid,
    position: usize,
    item: &PlanItemDraft,
) -> Result<(), CoreError> {
    let product_id = item.product_id;
    let owner = conn
        .query_row(
            "SELECT store_id FROM products WHERE id = ?1",
            [product_id.to_string()],
            |row| uuid_at(row, 0),
        )
        .optional()
        .map_err(storage_error)?
        .ok_or_else(|| CoreError::NotFound(format!("product {product_id}")))?;
    if owner != store_id {
        return Err(CoreError::InvalidInput(format!(
            "product {product_id} belongs to another store"
        )));
    }
    conn.execute(
        "INSERT INTO plan_items (plan_id, product_id, quantity, position) VALUES (?1, ?2, ?3, ?4)",
        params![
            plan_id.to_string(),
            product_id.to_string(),
            item.quantity,
            position as i64
        ],
    )
    .map_err(storage_error)?;
    Ok(())
}

fn read_plan(conn: &Connection, plan_id: Uuid) -> Result<Option<Plan>, CoreError> {
    let Some(mut plan) = conn
        .query_row(
            "SELECT id, store_id, name FROM plans WHERE id = ?1",
            [plan_id.to_string()],
            |row| {
                Ok(Plan {
                    id: uuid_at(row, 0)?,
                    store_id: uuid_at(row, 1)?,
                    name: row.get(2)?,
                    items: Vec::new(),
                })
            },
        )
        .optional()
        .map_err(storage_error)?
    else {
        return Ok(None);
    };
    let mut stmt = conn
        .prepare(
            "SELECT pi.product_id, pr.name, pi.quantity, pr.unit_price
             FROM plan_items pi JOIN products pr ON pr.id = pi.product_id
             WHERE pi.plan_id = ?1 ORDER BY pi.position",
        )
        .map_err(storage_error)?;
    let items = stmt
        .query_map([plan_id.to_string()], |row| {
            Ok(PlanLineItem {
                product_id: uuid_at(row, 0)?,
                product_name: row.get(1)?,
                quantity: row.get(2)?,
                unit_price: row.get(3)?,
            })
        })
        .map_err(storage_error)?;
    plan.items = items.collect::<Result<Vec<_>, _>>().map_err(storage_error)?;
    Ok(Some(plan))
}

fn read_budget(
    conn: &Connection,
    store_id: Uuid,
    month: BudgetMonth,
) -> Result<Option<MonthlyBudget>, CoreError> {
    conn.query_row(
        &format!(
            "SELECT {BUDGET_COLUMNS} FROM monthly_budgets WHERE store_id = ?1 AND budget_month = ?2"
        ),
        params![store_id.to_string(), month.to_string()],
        |row| {
            let raw_month: String = row.get(2)?;
            let raw_rate: Option<String> = row.get(4)?;
            Ok(MonthlyBudget {
                id: uuid_at(row, 0)?,
                store_id: uuid_at(row, 1)?,
                budget_month: BudgetMonth::parse(&raw_month).map_err(|err| conversion(2, err))?,
                target_amount: row.get(3)?,
                discount_rate: raw_rate
                    .map(|raw| Decimal::from_str(&raw).map_err(|err| conversion(4, err)))
                    .transpose()?,
                updated_at: row.get::<_, DateTime<Utc>>(5)?,
            })
        },
    )
    .optional()
    .map_err(storage_error)
}

fn schedule_from_row(row: &Row<'_>) -> rusqlite::Result<Schedule> {
    let plan_id: Option<String> = row.get(2)?;
    let status: String = row.get(4)?;
    let snapshot_json: Option<String> = row.get(6)?;
    Ok(Schedule {
        id: uuid_at(row, 0)?,
        store_id: uuid_at(row, 1)?,
        plan_id: plan_id
            .map(|raw| Uuid::parse_str(&raw).map_err(|err| conversion(2, err)))
            .transpose()?,
        scheduled_date: row.get(3)?,
        status: ScheduleStatus::parse(&status).ok_or_else(|| {
            conversion(4, std::io::Error::other(format!("unknown status `{status}`")))
        })?,
        actual_revenue: row.get(5)?,
        snapshot: snapshot_json
            .map(|raw| {
                serde_json::from_str::<SnapshotDocument>(&raw).map_err(|err| conversion(6, err))
            })
            .transpose()?,
        created_at: row.get(7)?,
    })
}

fn uuid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw).map_err(|err| conversion(idx, err))
}

fn conversion<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violation_maps_to_conflict() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        storage.insert_store(&Store::new("Central")).unwrap();
        let err = storage.insert_store(&Store::new("Central")).unwrap_err();
        assert!(err.is_conflict(), "{err}");
    }

    #[test]
    fn check_violation_maps_to_invalid_input() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let store = Store::new("Central");
        storage.insert_store(&store).unwrap();
        let err = storage
            .insert_product(&Product::new(store.id, "Bad", -1))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)), "{err}");
    }

    #[test]
    fn missing_store_is_rejected_by_foreign_key() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let err = storage
            .insert_product(&Product::new(Uuid::new_v4(), "Orphan", 100))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)), "{err}");
    }
}
