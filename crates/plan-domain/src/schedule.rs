//! Calendar assignments of plans and the immutable snapshots they carry.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::{Plan, PlanLineItem};

/// Lifecycle of a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    #[default]
    Scheduled,
    Completed,
}

impl ScheduleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleStatus::Scheduled => "scheduled",
            ScheduleStatus::Completed => "completed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "scheduled" => Some(ScheduleStatus::Scheduled),
            "completed" => Some(ScheduleStatus::Completed),
            _ => None,
        }
    }
}

/// One frozen line of a plan as it looked at capture time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotLine {
    pub product_id: Uuid,
    #[serde(default)]
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: i64,
    pub subtotal: i64,
}

impl From<&PlanLineItem> for SnapshotLine {
    fn from(item: &PlanLineItem) -> Self {
        Self {
            product_id: item.product_id,
            product_name: item.product_name.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            subtotal: item.subtotal(),
        }
    }
}

/// Write-once copy of a plan's composition and prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotDocument {
    #[serde(default)]
    pub lines: Vec<SnapshotLine>,
    pub total: i64,
    pub captured_at: DateTime<Utc>,
}

impl SnapshotDocument {
    /// An empty plan still yields a valid document with a zero total.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Assignment of a plan to one calendar day of one store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: Uuid,
    pub store_id: Uuid,
    /// `None` once the originating plan has been deleted.
    pub plan_id: Option<Uuid>,
    pub scheduled_date: NaiveDate,
    pub status: ScheduleStatus,
    /// `None` or zero means nothing has been posted yet.
    pub actual_revenue: Option<i64>,
    pub snapshot: Option<SnapshotDocument>,
    pub created_at: DateTime<Utc>,
}

impl Schedule {
    pub fn new(
        store_id: Uuid,
        plan_id: Uuid,
        scheduled_date: NaiveDate,
        snapshot: SnapshotDocument,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            store_id,
            plan_id: Some(plan_id),
            scheduled_date,
            status: ScheduleStatus::Scheduled,
            actual_revenue: None,
            created_at: snapshot.captured_at,
            snapshot: Some(snapshot),
        }
    }

    /// The posted actual, if one exists and is non-zero.
    pub fn posted_actual(&self) -> Option<i64> {
        self.actual_revenue.filter(|amount| *amount > 0)
    }

    pub fn has_posted_actual(&self) -> bool {
        self.posted_actual().is_some()
    }

    /// True when a snapshot with at least one line is stored; such a snapshot is never replaced.
    pub fn has_locked_snapshot(&self) -> bool {
        self.snapshot
            .as_ref()
            .map(|snapshot| !snapshot.is_empty())
            .unwrap_or(false)
    }
}

/// Which state a historical read was answered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordSource {
    Frozen,
    Live,
    Unavailable,
}

/// The legible state of a schedule's composition, chosen at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum HistoricalRecord {
    /// A snapshot was stored; it is authoritative regardless of the plan.
    FrozenSnapshot(SnapshotDocument),
    /// No snapshot; the plan still resolves and is read as it is now.
    LiveFromSource(Plan),
    /// No snapshot and the plan is gone.
    Unavailable,
}

impl HistoricalRecord {
    pub fn source(&self) -> RecordSource {
        match self {
            HistoricalRecord::FrozenSnapshot(_) => RecordSource::Frozen,
            HistoricalRecord::LiveFromSource(_) => RecordSource::Live,
            HistoricalRecord::Unavailable => RecordSource::Unavailable,
        }
    }

    pub fn lines(&self) -> Vec<SnapshotLine> {
        match self {
            HistoricalRecord::FrozenSnapshot(doc) => doc.lines.clone(),
            HistoricalRecord::LiveFromSource(plan) => {
                plan.items.iter().map(SnapshotLine::from).collect()
            }
            HistoricalRecord::Unavailable => Vec::new(),
        }
    }

    pub fn total(&self) -> i64 {
        match self {
            HistoricalRecord::FrozenSnapshot(doc) => doc.total,
            HistoricalRecord::LiveFromSource(plan) => plan.total(),
            HistoricalRecord::Unavailable => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(total: i64, lines: Vec<SnapshotLine>) -> SnapshotDocument {
        SnapshotDocument {
            lines,
            total,
            captured_at: Utc::now(),
        }
    }

    #[test]
    fn zero_actual_counts_as_unposted() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 2).unwrap();
        let mut schedule = Schedule::new(Uuid::new_v4(), Uuid::new_v4(), date, snapshot(0, vec![]));
        assert!(!schedule.has_posted_actual());
        schedule.actual_revenue = Some(0);
        assert!(!schedule.has_posted_actual());
        schedule.actual_revenue = Some(15_000);
        assert_eq!(schedule.posted_actual(), Some(15_000));
    }

    #[test]
    fn empty_snapshot_is_not_locked() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 2).unwrap();
        let empty = Schedule::new(Uuid::new_v4(), Uuid::new_v4(), date, snapshot(0, vec![]));
        assert!(!empty.has_locked_snapshot());

        let line = SnapshotLine {
            product_id: Uuid::new_v4(),
            product_name: "Bread".into(),
            quantity: 2,
            unit_price: 300,
            subtotal: 600,
        };
        let full = Schedule::new(Uuid::new_v4(), Uuid::new_v4(), date, snapshot(600, vec![line]));
        assert!(full.has_locked_snapshot());
    }

    #[test]
    fn record_serializes_with_kind_tag() {
        let record = HistoricalRecord::Unavailable;
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"kind":"unavailable"}"#);
        assert_eq!(record.total(), 0);
        assert!(record.lines().is_empty());
    }
}
