mod common;

use std::sync::{Arc, Barrier};
use std::thread;

use rust_decimal::Decimal;

use budget_forecast::plan_core::FixedClock;
use budget_forecast::plan_domain::{BudgetMonth, HistoricalRecord, PlanItemDraft};
use budget_forecast::{BudgetError, PlanningEngine};

use common::{date, setup_test_engine};

fn march() -> BudgetMonth {
    BudgetMonth::new(2025, 3).unwrap()
}

#[test]
fn forecast_projects_posted_and_open_schedules() {
    let (engine, _) = setup_test_engine(date(2025, 3, 15));
    let store = engine.add_store("Central").unwrap();
    let bread = engine.add_product(store.id, "Bread", 1_000).unwrap();
    let plan = engine
        .add_plan(
            store.id,
            "Regular",
            &[PlanItemDraft {
                product_id: bread.id,
                quantity: 40,
            }],
        )
        .unwrap();
    engine
        .set_monthly_budget(store.id, march(), 300_000, None)
        .unwrap();

    for day in [3, 5, 20] {
        engine.assign_plan(store.id, plan.id, date(2025, 3, day)).unwrap();
    }
    engine.post_actual(store.id, date(2025, 3, 3), 50_000).unwrap();
    engine.post_actual(store.id, date(2025, 3, 5), 70_000).unwrap();

    let result = engine.forecast(store.id, 2025, 3).unwrap();
    assert_eq!(result.actual_amount, 120_000);
    assert_eq!(result.planned_amount, 40_000);
    assert_eq!(result.forecast_amount, 160_000);
    assert_eq!(result.forecast_diff, -140_000);
    assert_eq!(result.forecast_achievement_rate, Decimal::new(533, 1));
    assert_eq!(result.remaining_days, 17);
    assert_eq!(result.daily_required, 8_235);
}

#[test]
fn month_without_budget_builds_empty_days() {
    let (engine, _) = setup_test_engine(date(2025, 2, 10));
    let store = engine.add_store("Harbor").unwrap();

    let records = engine.build(store.id, 2025, 2).unwrap();
    assert_eq!(records.len(), 28);
    assert!(records
        .iter()
        .all(|record| record.target == 0 && record.achievement_rate.is_none()));

    let rate = engine.daily_achievement_rate(store.id, 2025, 2).unwrap();
    assert_eq!(rate, Decimal::ZERO);
}

#[test]
fn concurrent_assignments_leave_one_schedule() {
    let (engine, db_path) = setup_test_engine(date(2025, 3, 1));
    let store = engine.add_store("Central").unwrap();
    let product = engine.add_product(store.id, "Bread", 250).unwrap();
    let plan = engine
        .add_plan(
            store.id,
            "Morning",
            &[PlanItemDraft {
                product_id: product.id,
                quantity: 10,
            }],
        )
        .unwrap();
    drop(engine);

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = (0..2)
        .map(|_| {
            let barrier = Arc::clone(&barrier);
            let db_path = db_path.clone();
            thread::spawn(move || {
                let engine =
                    PlanningEngine::open(&db_path, Box::new(FixedClock::new(date(2025, 3, 1))))
                        .unwrap();
                barrier.wait();
                engine.assign_plan(store.id, plan.id, date(2025, 3, 12))
            })
        })
        .collect();

    let outcomes: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();
    assert_eq!(outcomes.iter().filter(|outcome| outcome.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .any(|outcome| matches!(outcome, Err(BudgetError::Conflict(_)))));

    let engine =
        PlanningEngine::open(&db_path, Box::new(FixedClock::new(date(2025, 3, 1)))).unwrap();
    let schedule = engine.schedule_on(store.id, date(2025, 3, 12)).unwrap();
    assert!(schedule.is_some());
}

#[test]
fn reconstruct_reads_frozen_snapshot_after_plan_changes() {
    let (engine, _) = setup_test_engine(date(2025, 3, 10));
    let store = engine.add_store("Central").unwrap();
    let cake = engine.add_product(store.id, "Cake", 1_500).unwrap();
    let plan = engine
        .add_plan(
            store.id,
            "Party",
            &[PlanItemDraft {
                product_id: cake.id,
                quantity: 4,
            }],
        )
        .unwrap();
    let preview = engine.capture(&plan);
    assert_eq!(preview.total, 6_000);
    assert_eq!(preview.captured_at.date_naive(), date(2025, 3, 10));

    let schedule = engine.assign_plan(store.id, plan.id, date(2025, 3, 12)).unwrap();
    assert_eq!(schedule.snapshot.as_ref().map(|doc| doc.total), Some(6_000));

    engine.set_product_price(cake.id, 2_000).unwrap();
    engine.remove_plan(plan.id).unwrap();

    match engine.reconstruct(schedule.id).unwrap() {
        HistoricalRecord::FrozenSnapshot(snapshot) => {
            assert_eq!(snapshot.total, 6_000);
            assert_eq!(snapshot.lines[0].unit_price, 1_500);
        }
        other => panic!("expected frozen snapshot, got {other:?}"),
    }
    let err = engine.capture_snapshot(schedule.id).unwrap_err();
    assert!(err.is_conflict());
}

#[test]
fn invalid_month_is_rejected() {
    let (engine, _) = setup_test_engine(date(2025, 3, 10));
    let store = engine.add_store("Central").unwrap();

    assert!(matches!(
        engine.forecast(store.id, 2025, 13),
        Err(BudgetError::InvalidInput(_))
    ));
    assert!(matches!(
        engine.build(store.id, 2025, 0),
        Err(BudgetError::InvalidInput(_))
    ));
}

#[test]
fn unknown_store_name_is_not_found() {
    let (engine, _) = setup_test_engine(date(2025, 3, 10));
    assert!(matches!(engine.store("Nowhere"), Err(BudgetError::NotFound(_))));
}
