//! The `ProductionStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `shiftboard-store-sqlite`). The tracker and the HTTP layer depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  production::{Andon, Cycle, Kpi, NewAndon, NewCycle, NewKpi},
  schedule::{NewSchedule, Schedule, Shift},
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Parameters for [`ProductionStore::list_cycles`].
#[derive(Debug, Clone, Deserialize)]
pub struct CycleQuery {
  pub kpi_id:   Uuid,
  pub sequence: Option<i64>,
  /// Inclusive lower bound on `d`.
  pub from:     Option<NaiveDateTime>,
  /// Exclusive upper bound on `d`.
  pub until:    Option<NaiveDateTime>,
}

impl CycleQuery {
  pub fn for_kpi(kpi_id: Uuid) -> Self {
    Self { kpi_id, sequence: None, from: None, until: None }
  }
}

/// Parameters for [`ProductionStore::list_andons`].
#[derive(Debug, Clone, Deserialize)]
pub struct AndonQuery {
  pub kpi_id:    Uuid,
  pub sequence:  Option<i64>,
  /// Inclusive lower bound on `d`.
  pub from:      Option<NaiveDateTime>,
  /// Exclusive upper bound on `d`.
  pub until:     Option<NaiveDateTime>,
  pub responded: Option<bool>,
}

impl AndonQuery {
  pub fn for_kpi(kpi_id: Uuid) -> Self {
    Self { kpi_id, sequence: None, from: None, until: None, responded: None }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a shiftboard store backend.
///
/// Cycle events are append-only. Andon events are only ever touched by
/// [`ProductionStore::respond_andons`].
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait ProductionStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Shifts ────────────────────────────────────────────────────────────

  /// Create or replace the shift named `shift.name`.
  fn put_shift(
    &self,
    shift: Shift,
  ) -> impl Future<Output = Result<Shift, Self::Error>> + Send + '_;

  fn get_shift<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<Shift>, Self::Error>> + Send + 'a;

  fn list_shifts(
    &self,
  ) -> impl Future<Output = Result<Vec<Shift>, Self::Error>> + Send + '_;

  // ── Schedules ─────────────────────────────────────────────────────────

  /// Insert a schedule, or overwrite the slots of the one already keyed by
  /// `(area, shift, name)`. Fails if the shift does not exist.
  fn upsert_schedule(
    &self,
    input: NewSchedule,
  ) -> impl Future<Output = Result<Schedule, Self::Error>> + Send + '_;

  fn get_schedule(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Schedule>, Self::Error>> + Send + '_;

  fn find_schedule<'a>(
    &'a self,
    area: &'a str,
    shift: &'a str,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<Schedule>, Self::Error>> + Send + 'a;

  // ── KPIs ──────────────────────────────────────────────────────────────

  /// Insert a KPI, or overwrite the plan of the one already keyed by
  /// `(area, shift, d)`.
  fn upsert_kpi(
    &self,
    input: NewKpi,
  ) -> impl Future<Output = Result<Kpi, Self::Error>> + Send + '_;

  fn get_kpi(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Kpi>, Self::Error>> + Send + '_;

  fn find_kpi<'a>(
    &'a self,
    area: &'a str,
    shift: &'a str,
    d: NaiveDate,
  ) -> impl Future<Output = Result<Option<Kpi>, Self::Error>> + Send + 'a;

  // ── Cycles ────────────────────────────────────────────────────────────

  fn record_cycle(
    &self,
    input: NewCycle,
  ) -> impl Future<Output = Result<Cycle, Self::Error>> + Send + '_;

  fn get_cycle(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Cycle>, Self::Error>> + Send + '_;

  fn list_cycles<'a>(
    &'a self,
    query: &'a CycleQuery,
  ) -> impl Future<Output = Result<Vec<Cycle>, Self::Error>> + Send + 'a;

  // ── Andons ────────────────────────────────────────────────────────────

  /// Record a newly raised, unresponded andon.
  fn record_andon(
    &self,
    input: NewAndon,
  ) -> impl Future<Output = Result<Andon, Self::Error>> + Send + '_;

  fn get_andon(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Andon>, Self::Error>> + Send + '_;

  fn list_andons<'a>(
    &'a self,
    query: &'a AndonQuery,
  ) -> impl Future<Output = Result<Vec<Andon>, Self::Error>> + Send + 'a;

  /// Mark every unresponded andon for `(kpi_id, sequence)` as responded at
  /// `at`, as a single atomic batch. Returns the number of andons changed;
  /// andons that were already responded keep their original `response_d`.
  fn respond_andons(
    &self,
    kpi_id: Uuid,
    sequence: i64,
    at: NaiveDateTime,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;
}
