//! Captures write-once plan snapshots and resolves a schedule's historical state.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use plan_domain::{HistoricalRecord, Plan, Schedule, SnapshotDocument, SnapshotLine};

use crate::{amounts::saturating_sum, storage::PlanningStorage, time::Clock, CoreError};

pub struct SnapshotService;

impl SnapshotService {
    /// Freezes the plan's current lines. An empty plan yields an empty document with a zero total.
    pub fn capture(plan: &Plan, captured_at: DateTime<Utc>) -> SnapshotDocument {
        let lines: Vec<SnapshotLine> = plan.items.iter().map(SnapshotLine::from).collect();
        let total = saturating_sum(lines.iter().map(|line| line.subtotal));
        SnapshotDocument {
            lines,
            total,
            captured_at,
        }
    }

    /// Picks the authoritative state for a schedule.
    ///
    /// A stored snapshot always wins; the live plan is only read for schedules
    /// that never had one.
    pub fn reconstruct(schedule: &Schedule, plan: Option<&Plan>) -> HistoricalRecord {
        if let Some(snapshot) = schedule.snapshot.as_ref() {
            if schedule.plan_id.is_none() {
                debug!(schedule = %schedule.id, "plan deleted; reading frozen snapshot");
            }
            return HistoricalRecord::FrozenSnapshot(snapshot.clone());
        }
        match plan {
            Some(plan) if schedule.plan_id == Some(plan.id) => {
                HistoricalRecord::LiveFromSource(plan.clone())
            }
            _ => {
                warn!(
                    schedule = %schedule.id,
                    date = %schedule.scheduled_date,
                    "schedule has neither snapshot nor resolvable plan"
                );
                HistoricalRecord::Unavailable
            }
        }
    }

    /// Captures a snapshot for an existing schedule that lacks one.
    ///
    /// A schedule whose snapshot already has lines is left untouched and the
    /// attempt is rejected with `Conflict`.
    pub fn capture_for_schedule(
        storage: &dyn PlanningStorage,
        clock: &dyn Clock,
        schedule_id: Uuid,
    ) -> Result<SnapshotDocument, CoreError> {
        let schedule = storage
            .load_schedule(schedule_id)?
            .ok_or_else(|| CoreError::NotFound(format!("schedule {schedule_id}")))?;
        if schedule.has_locked_snapshot() {
            warn!(schedule = %schedule_id, "snapshot already captured; keeping the original");
            return Err(CoreError::Conflict(format!(
                "schedule {schedule_id} already has a snapshot"
            )));
        }
        let plan_id = schedule.plan_id.ok_or_else(|| {
            CoreError::NotFound(format!("plan for schedule {schedule_id} no longer exists"))
        })?;
        let plan = storage
            .load_plan(plan_id)?
            .ok_or_else(|| CoreError::NotFound(format!("plan {plan_id}")))?;
        let snapshot = Self::capture(&plan, clock.now());
        storage.write_snapshot(schedule_id, &snapshot)?;
        info!(
            schedule = %schedule_id,
            lines = snapshot.lines.len(),
            total = snapshot.total,
            "snapshot captured"
        );
        Ok(snapshot)
    }
}
