use std::{
    sync::{Arc, Barrier},
    thread,
};

use chrono::NaiveDate;
use plan_core::{
    BudgetService, CalendarService, CatalogService, CoreError, FixedClock, ForecastService,
    PlanningStorage, ScheduleService, SnapshotService,
};
use plan_domain::{BudgetMonth, Plan, PlanItemDraft, RecordSource, Store};
use plan_storage_sqlite::SqliteStorage;
use tempfile::tempdir;

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, day).expect("valid date")
}

fn march() -> BudgetMonth {
    BudgetMonth::new(2025, 3).expect("valid month")
}

fn clock() -> FixedClock {
    FixedClock::new(date(1))
}

struct Seeded {
    store: Store,
    plan: Plan,
}

/// One store with a two-line plan worth 40,000.
fn seed(storage: &dyn PlanningStorage) -> Seeded {
    let store = CatalogService::add_store(storage, "Central").expect("store");
    let bread = CatalogService::add_product(storage, store.id, "Bread", 250).expect("bread");
    let cake = CatalogService::add_product(storage, store.id, "Cake", 1_500).expect("cake");
    let plan = CatalogService::add_plan(
        storage,
        store.id,
        "Regular",
        &[
            PlanItemDraft {
                product_id: bread.id,
                quantity: 100,
            },
            PlanItemDraft {
                product_id: cake.id,
                quantity: 10,
            },
        ],
    )
    .expect("plan");
    Seeded { store, plan }
}

#[test]
fn plans_load_with_current_prices() {
    let storage = SqliteStorage::open_in_memory().expect("storage");
    let seeded = seed(&storage);
    assert_eq!(seeded.plan.items.len(), 2);
    assert_eq!(seeded.plan.total(), 40_000);

    let found = CatalogService::plan_by_name(&storage, seeded.store.id, " Regular ")
        .expect("plan by name");
    assert_eq!(found, seeded.plan);
}

#[test]
fn second_assignment_on_same_day_conflicts() {
    let storage = SqliteStorage::open_in_memory().expect("storage");
    let seeded = seed(&storage);
    ScheduleService::assign_plan(&storage, &clock(), seeded.store.id, seeded.plan.id, date(10))
        .expect("first assignment");

    let err =
        ScheduleService::assign_plan(&storage, &clock(), seeded.store.id, seeded.plan.id, date(10))
            .expect_err("second assignment");
    assert!(err.is_conflict(), "{err}");
    assert_eq!(
        storage
            .schedules_between(seeded.store.id, date(1), date(31))
            .expect("schedules")
            .len(),
        1
    );
}

#[test]
fn captured_snapshot_survives_price_change_and_plan_deletion() {
    let storage = SqliteStorage::open_in_memory().expect("storage");
    let seeded = seed(&storage);
    let schedule =
        ScheduleService::assign_plan(&storage, &clock(), seeded.store.id, seeded.plan.id, date(12))
            .expect("assign");
    let captured = schedule.snapshot.clone().expect("snapshot");

    let bread = CatalogService::product_by_name(&storage, seeded.store.id, "Bread").expect("bread");
    CatalogService::set_product_price(&storage, bread.id, 400).expect("reprice");

    let book = storage
        .load_month_book(seeded.store.id, march())
        .expect("book");
    assert_eq!(
        ForecastService::forecast(&book, date(5)).planned_amount,
        55_000,
        "open schedules project from the live plan"
    );

    CatalogService::remove_plan(&storage, seeded.plan.id).expect("remove plan");
    let stored = storage
        .load_schedule(schedule.id)
        .expect("load")
        .expect("schedule kept");
    assert!(stored.plan_id.is_none());
    assert_eq!(stored.snapshot.as_ref(), Some(&captured));

    let book = storage
        .load_month_book(seeded.store.id, march())
        .expect("book");
    let record = SnapshotService::reconstruct(&stored, book.plan_for(&stored));
    assert_eq!(record.source(), RecordSource::Frozen);
    assert_eq!(record.total(), 40_000);

    let days = CalendarService::build(&book, date(5));
    assert_eq!(days[11].schedules[0].lines, captured.lines);
    assert_eq!(days[11].planned, 40_000);
}

#[test]
fn locked_snapshot_is_never_overwritten() {
    let storage = SqliteStorage::open_in_memory().expect("storage");
    let seeded = seed(&storage);
    let schedule =
        ScheduleService::assign_plan(&storage, &clock(), seeded.store.id, seeded.plan.id, date(3))
            .expect("assign");
    let original = schedule.snapshot.clone().expect("snapshot");

    let err = SnapshotService::capture_for_schedule(&storage, &clock(), schedule.id)
        .expect_err("recapture");
    assert!(err.is_conflict());

    let mut forged = original.clone();
    forged.total = 1;
    let err = storage
        .write_snapshot(schedule.id, &forged)
        .expect_err("direct overwrite");
    assert!(err.is_conflict(), "{err}");

    let stored = storage.load_schedule(schedule.id).expect("load").expect("row");
    assert_eq!(stored.snapshot, Some(original));
}

#[test]
fn empty_snapshot_can_be_recaptured() {
    let storage = SqliteStorage::open_in_memory().expect("storage");
    let seeded = seed(&storage);
    let draft = CatalogService::add_plan(&storage, seeded.store.id, "Draft", &[]).expect("plan");
    let schedule =
        ScheduleService::assign_plan(&storage, &clock(), seeded.store.id, draft.id, date(4))
            .expect("assign empty plan");
    assert!(schedule.snapshot.as_ref().expect("snapshot").is_empty());

    let bread = CatalogService::product_by_name(&storage, seeded.store.id, "Bread").expect("bread");
    CatalogService::replace_plan_items(
        &storage,
        draft.id,
        &[PlanItemDraft {
            product_id: bread.id,
            quantity: 8,
        }],
    )
    .expect("fill plan");

    let snapshot = SnapshotService::capture_for_schedule(&storage, &clock(), schedule.id)
        .expect("recapture");
    assert_eq!(snapshot.total, 2_000);
}

#[test]
fn posting_actual_completes_and_zero_reopens() {
    let storage = SqliteStorage::open_in_memory().expect("storage");
    let seeded = seed(&storage);
    ScheduleService::assign_plan(&storage, &clock(), seeded.store.id, seeded.plan.id, date(6))
        .expect("assign");

    let posted = ScheduleService::post_actual(&storage, seeded.store.id, date(6), 38_000)
        .expect("post");
    assert!(posted.has_posted_actual());
    assert!(matches!(
        ScheduleService::unassign(&storage, seeded.store.id, date(6)),
        Err(CoreError::Conflict(_))
    ));

    ScheduleService::post_actual(&storage, seeded.store.id, date(6), 0).expect("clear");
    let reopened = storage
        .schedule_on(seeded.store.id, date(6))
        .expect("load")
        .expect("row");
    assert_eq!(reopened.actual_revenue, None);
    ScheduleService::unassign(&storage, seeded.store.id, date(6)).expect("unassign");
    assert!(matches!(
        ScheduleService::post_actual(&storage, seeded.store.id, date(6), 1),
        Err(CoreError::NotFound(_))
    ));
}

#[test]
fn budget_upsert_keeps_identity() {
    let storage = SqliteStorage::open_in_memory().expect("storage");
    let seeded = seed(&storage);
    let first = BudgetService::set_monthly_budget(&storage, seeded.store.id, march(), 300_000, None)
        .expect("create");
    let second = BudgetService::set_monthly_budget(
        &storage,
        seeded.store.id,
        march(),
        320_000,
        Some("12.5".parse().expect("rate")),
    )
    .expect("update");
    assert_eq!(first.id, second.id);
    assert_eq!(second.target_amount, 320_000);
    assert_eq!(second.discount_rate.map(|rate| rate.to_string()), Some("12.5".into()));
}

#[test]
fn invalid_daily_targets_write_nothing() {
    let storage = SqliteStorage::open_in_memory().expect("storage");
    let seeded = seed(&storage);
    let budget = BudgetService::set_monthly_budget(&storage, seeded.store.id, march(), 310_000, None)
        .expect("budget");

    let outside = NaiveDate::from_ymd_opt(2025, 4, 1).expect("date");
    let err = BudgetService::set_daily_targets(
        &storage,
        seeded.store.id,
        march(),
        &[(date(1), 20_000), (outside, 5_000)],
    )
    .expect_err("outside month");
    assert!(matches!(err, CoreError::InvalidInput(_)));
    assert!(storage.load_daily_targets(budget.id).expect("targets").is_empty());

    let summary = BudgetService::set_daily_targets(
        &storage,
        seeded.store.id,
        march(),
        &[(date(1), 20_000), (date(2), 5_000)],
    )
    .expect("targets");
    assert_eq!(summary.allocated, 25_000);
    assert_eq!(summary.shortfall(), 285_000);

    let summary =
        BudgetService::set_daily_targets(&storage, seeded.store.id, march(), &[(date(2), 7_000)])
            .expect("upsert");
    assert_eq!(summary.overridden_days, 2);
    assert_eq!(summary.allocated, 27_000);

    assert_eq!(
        BudgetService::clear_daily_targets(&storage, seeded.store.id, march()).expect("clear"),
        2
    );
}

#[test]
fn budget_deletion_cascades_unless_actuals_posted() {
    let storage = SqliteStorage::open_in_memory().expect("storage");
    let seeded = seed(&storage);
    BudgetService::set_monthly_budget(&storage, seeded.store.id, march(), 300_000, None)
        .expect("budget");
    BudgetService::set_daily_targets(&storage, seeded.store.id, march(), &[(date(9), 9_000)])
        .expect("targets");
    ScheduleService::assign_plan(&storage, &clock(), seeded.store.id, seeded.plan.id, date(9))
        .expect("assign");
    ScheduleService::post_actual(&storage, seeded.store.id, date(9), 10_000).expect("post");

    let err = BudgetService::delete_monthly_budget(&storage, seeded.store.id, march())
        .expect_err("posted actual blocks deletion");
    assert!(err.is_conflict());

    ScheduleService::post_actual(&storage, seeded.store.id, date(9), 0).expect("clear");
    BudgetService::delete_monthly_budget(&storage, seeded.store.id, march()).expect("delete");

    let book = storage
        .load_month_book(seeded.store.id, march())
        .expect("book");
    assert!(book.budget.is_none());
    assert!(book.daily_targets.is_empty());
    assert!(book.schedules.is_empty());

    assert!(matches!(
        BudgetService::delete_monthly_budget(&storage, seeded.store.id, march()),
        Err(CoreError::NotFound(_))
    ));
}

#[test]
fn concurrent_assignments_on_one_day_have_one_winner() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("planning.db");
    let setup = SqliteStorage::open(&path).expect("open");
    let seeded = seed(&setup);
    let rival = CatalogService::add_plan(&setup, seeded.store.id, "Rival", &[]).expect("rival");
    drop(setup);

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = [seeded.plan.id, rival.id]
        .into_iter()
        .map(|plan_id| {
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            let store_id = seeded.store.id;
            thread::spawn(move || {
                let storage = SqliteStorage::open(&path).expect("open handle");
                barrier.wait();
                ScheduleService::assign_plan(&storage, &clock(), store_id, plan_id, date(20))
                    .map(|schedule| schedule.plan_id)
            })
        })
        .collect();

    let outcomes: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("thread"))
        .collect();
    let winners: Vec<_> = outcomes.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1, "{outcomes:?}");
    assert!(outcomes
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(CoreError::is_conflict));

    let reader = SqliteStorage::open(&path).expect("reader");
    let stored = reader
        .schedule_on(seeded.store.id, date(20))
        .expect("load")
        .expect("one schedule");
    assert_eq!(&stored.plan_id, winners[0]);
}
