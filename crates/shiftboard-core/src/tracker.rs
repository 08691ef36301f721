//! Store-backed operations: block metrics, shift status and andon response.
//!
//! These functions only read from the store, except [`respond`], which
//! delegates its single batch write to
//! [`ProductionStore::respond_andons`].

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  metrics::{self, BlockMetrics},
  production::Kpi,
  schedule::{ResolvedSchedule, Schedule, Window},
  store::{AndonQuery, CycleQuery, ProductionStore},
  time::TemporalValue,
};

/// Selects [`ResolvedSchedule::current_block`] instead of a fixed block.
pub const AUTO_BLOCK: usize = 0;

fn store_err<E>(e: E) -> Error
where
  E: std::error::Error + Send + Sync + 'static,
{
  Error::Store(Box::new(e))
}

// ─── Plan lookup ─────────────────────────────────────────────────────────────

/// A KPI together with its schedule resolved for the KPI's date.
#[derive(Debug, Clone)]
pub struct ResolvedPlan {
  pub kpi:      Kpi,
  pub schedule: Schedule,
  pub resolved: ResolvedSchedule,
}

/// Look up the KPI for `(area, shift, date)` and resolve its schedule.
pub async fn load_plan<S: ProductionStore>(
  store: &S,
  area: &str,
  shift: &str,
  date: impl Into<TemporalValue>,
) -> Result<ResolvedPlan> {
  let d: NaiveDate = date.into().into_date()?;

  let kpi = store
    .find_kpi(area, shift, d)
    .await
    .map_err(store_err)?
    .ok_or_else(|| Error::KpiNotFound {
      area:  area.to_owned(),
      shift: shift.to_owned(),
      date:  d,
    })?;

  let schedule = store
    .get_schedule(kpi.schedule_id)
    .await
    .map_err(store_err)?
    .ok_or(Error::ScheduleNotFound(kpi.schedule_id))?;

  let resolved = schedule.resolve(kpi.d);
  if !resolved.is_monotonic() {
    tracing::warn!(
      area,
      shift,
      schedule = %schedule.name,
      "schedule windows resolve out of order; check midnight rollover"
    );
  }

  Ok(ResolvedPlan { kpi, schedule, resolved })
}

// ─── Block metrics ───────────────────────────────────────────────────────────

/// Per-sequence metrics for one block of the `(area, shift, date)` plan.
///
/// `block` is 1-based; [`AUTO_BLOCK`] picks the block in progress at `now`.
pub async fn block_metrics<S: ProductionStore>(
  store: &S,
  area: &str,
  shift: &str,
  date: impl Into<TemporalValue>,
  block: usize,
  now: NaiveDateTime,
) -> Result<BlockMetrics> {
  let plan = load_plan(store, area, shift, date).await?;

  let block = if block == AUTO_BLOCK {
    plan.resolved.current_block(now)
  } else {
    block
  };
  let window = plan.resolved.window(block)?;

  let cycles = store
    .list_cycles(&CycleQuery::for_kpi(plan.kpi.kpi_id))
    .await
    .map_err(store_err)?;
  let andons = store
    .list_andons(&AndonQuery::for_kpi(plan.kpi.kpi_id))
    .await
    .map_err(store_err)?;

  tracing::debug!(
    kpi_id = %plan.kpi.kpi_id,
    block,
    cycles = cycles.len(),
    andons = andons.len(),
    "aggregating block metrics"
  );

  metrics::compute(&plan.kpi, window, &cycles, &andons)
}

// ─── Shift status ────────────────────────────────────────────────────────────

/// Where a shift stands at a given instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftStatus {
  pub kpi_id:         Uuid,
  pub current_block:  usize,
  pub windows:        Vec<Window>,
  /// Seconds across all blocks.
  pub available_time: i64,
  /// In-block seconds worked so far, breaks excluded.
  pub elapsed:        i64,
}

impl ShiftStatus {
  pub fn of(plan: &ResolvedPlan, now: NaiveDateTime) -> Self {
    Self {
      kpi_id:         plan.kpi.kpi_id,
      current_block:  plan.resolved.current_block(now),
      windows:        plan.resolved.windows().collect(),
      available_time: plan.resolved.available_time().num_seconds(),
      elapsed:        plan.resolved.elapsed(now).num_seconds(),
    }
  }
}

pub async fn shift_status<S: ProductionStore>(
  store: &S,
  area: &str,
  shift: &str,
  date: impl Into<TemporalValue>,
  now: NaiveDateTime,
) -> Result<ShiftStatus> {
  let plan = load_plan(store, area, shift, date).await?;
  Ok(ShiftStatus::of(&plan, now))
}

// ─── Response ────────────────────────────────────────────────────────────────

/// Mark every open andon for `(kpi_id, sequence)` responded at `at`.
/// Returns how many were open; repeating the call is a no-op.
pub async fn respond<S: ProductionStore>(
  store: &S,
  kpi_id: Uuid,
  sequence: i64,
  at: NaiveDateTime,
) -> Result<u64> {
  let updated = store
    .respond_andons(kpi_id, sequence, at)
    .await
    .map_err(store_err)?;
  tracing::info!(%kpi_id, sequence, updated, "andons responded");
  Ok(updated)
}
