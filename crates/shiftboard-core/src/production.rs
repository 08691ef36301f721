//! Shift plans and the production events recorded against them.
//!
//! Cycle events are append-only. Andon events are appended when an alert is
//! raised; the only mutation ever applied to them is marking them responded.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── KPI ─────────────────────────────────────────────────────────────────────

/// The plan for one `(area, shift, date)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kpi {
  pub kpi_id:          Uuid,
  pub area:            String,
  pub shift:           String,
  /// The shift date; a shift running past midnight keeps the date it started.
  pub d:               NaiveDate,
  pub demand:          i64,
  /// Planned seconds per cycle.
  pub plan_cycle_time: i64,
  pub schedule_id:     Uuid,
}

/// Input to [`crate::store::ProductionStore::upsert_kpi`].
#[derive(Debug, Clone)]
pub struct NewKpi {
  pub area:            String,
  pub shift:           String,
  pub d:               NaiveDate,
  pub demand:          i64,
  pub plan_cycle_time: i64,
  pub schedule_id:     Uuid,
}

// ─── Cycles ──────────────────────────────────────────────────────────────────

/// One completed production cycle at a sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cycle {
  pub cycle_id:   Uuid,
  pub kpi_id:     Uuid,
  pub d:          NaiveDateTime,
  pub sequence:   i64,
  /// Measured seconds for this cycle.
  pub cycle_time: i64,
  /// Units produced per cycle at this sequence at the time.
  pub parts_per:  i64,
  pub delivered:  i64,
  /// Timing code reported by the station.
  pub code:       i64,
}

/// Input to [`crate::store::ProductionStore::record_cycle`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewCycle {
  pub kpi_id:     Uuid,
  pub d:          NaiveDateTime,
  pub sequence:   i64,
  pub cycle_time: i64,
  pub parts_per:  i64,
  #[serde(default)]
  pub delivered:  i64,
  #[serde(default)]
  pub code:       i64,
}

// ─── Andons ──────────────────────────────────────────────────────────────────

/// An alert raised at a sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Andon {
  pub andon_id:   Uuid,
  pub kpi_id:     Uuid,
  pub d:          NaiveDateTime,
  pub sequence:   i64,
  /// Free-form; conventionally `Safety`, `Quality` or `Delivery`.
  pub andon_type: String,
  pub responded:  bool,
  pub response_d: Option<NaiveDateTime>,
}

/// Input to [`crate::store::ProductionStore::record_andon`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewAndon {
  pub kpi_id:     Uuid,
  pub d:          NaiveDateTime,
  pub sequence:   i64,
  pub andon_type: String,
}
