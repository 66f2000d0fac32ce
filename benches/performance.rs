use chrono::{Datelike, Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use budget_forecast::plan_core::{CalendarService, ForecastService, SnapshotService};
use budget_forecast::plan_domain::{
    BudgetMonth, DailyTarget, MonthBook, MonthlyBudget, Plan, Product, Schedule, Store,
};

fn build_book() -> MonthBook {
    let store = Store::new("Bench");
    let month = BudgetMonth::new(2025, 3).expect("valid month");
    let bread = Product::new(store.id, "Bread", 250);
    let cake = Product::new(store.id, "Cake", 1_500);
    let plan = Plan::new(store.id, "Weekday")
        .with_item(&bread, 100)
        .with_item(&cake, 10);
    let captured_at = month
        .first_day()
        .and_hms_opt(0, 0, 0)
        .expect("midnight")
        .and_utc();

    let mut book = MonthBook::empty(store.id, month);
    let budget = MonthlyBudget::new(store.id, month, 3_100_000);
    book.daily_targets = (0..10)
        .map(|offset| DailyTarget::new(budget.id, month.first_day() + Duration::days(offset), 120_000))
        .collect();
    book.budget = Some(budget);
    book.schedules = month
        .days()
        .map(|date: NaiveDate| {
            let mut schedule = Schedule::new(
                store.id,
                plan.id,
                date,
                SnapshotService::capture(&plan, captured_at),
            );
            if date.day() < 15 {
                schedule.actual_revenue = Some(38_000);
            }
            schedule
        })
        .collect();
    book.plans.insert(plan.id, plan);
    book
}

fn bench_month(c: &mut Criterion) {
    let book = build_book();
    let today = NaiveDate::from_ymd_opt(2025, 3, 15).expect("valid date");

    c.bench_function("forecast_full_month", |b| {
        b.iter(|| ForecastService::forecast(black_box(&book), today))
    });
    c.bench_function("month_report_full_month", |b| {
        b.iter(|| CalendarService::month_report(black_box(&book), today))
    });
}

criterion_group!(benches, bench_month);
criterion_main!(benches);
