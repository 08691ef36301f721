//! [`SqliteStore`], the SQLite implementation of [`ProductionStore`].

use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use shiftboard_core::{
  production::{Andon, Cycle, Kpi, NewAndon, NewCycle, NewKpi},
  schedule::{NewSchedule, Schedule, Shift},
  store::{AndonQuery, CycleQuery, ProductionStore},
};

use crate::{
  encode::{
    ANDON_COLUMNS, CYCLE_COLUMNS, KPI_COLUMNS, RawAndon, RawCycle, RawKpi,
    RawSchedule, SCHEDULE_COLUMNS, encode_date, encode_dt, encode_slots,
    encode_uuid,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A shiftboard store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn kpi_exists(&self, kpi_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(kpi_id);
    let exists = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM kpis WHERE kpi_id = ?1",
              rusqlite::params![id_str],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    Ok(exists)
  }
}

// ─── ProductionStore impl ────────────────────────────────────────────────────

impl ProductionStore for SqliteStore {
  type Error = Error;

  // ── Shifts ────────────────────────────────────────────────────────────────

  async fn put_shift(&self, shift: Shift) -> Result<Shift> {
    let name     = shift.name.clone();
    let rollover = shift.rollover_through_hour;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO shifts (name, rollover_through_hour) VALUES (?1, ?2)
           ON CONFLICT (name) DO UPDATE
             SET rollover_through_hour = excluded.rollover_through_hour",
          rusqlite::params![name, rollover],
        )?;
        Ok(())
      })
      .await?;

    Ok(shift)
  }

  async fn get_shift(&self, name: &str) -> Result<Option<Shift>> {
    let name = name.to_owned();

    let shift = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT name, rollover_through_hour FROM shifts WHERE name = ?1",
              rusqlite::params![name],
              |row| {
                Ok(Shift {
                  name:                  row.get(0)?,
                  rollover_through_hour: row.get(1)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    Ok(shift)
  }

  async fn list_shifts(&self) -> Result<Vec<Shift>> {
    let shifts = self
      .conn
      .call(|conn| {
        let mut stmt = conn
          .prepare("SELECT name, rollover_through_hour FROM shifts ORDER BY name")?;
        let rows = stmt
          .query_map([], |row| {
            Ok(Shift {
              name:                  row.get(0)?,
              rollover_through_hour: row.get(1)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(shifts)
  }

  // ── Schedules ─────────────────────────────────────────────────────────────

  async fn upsert_schedule(&self, input: NewSchedule) -> Result<Schedule> {
    let id_str    = encode_uuid(Uuid::new_v4());
    let shift     = input.shift.clone();
    let area      = input.area;
    let name      = input.name;
    let [s1, e1, s2, e2, s3, e3, s4, e4] = encode_slots(&input.slots);

    let raw: Option<RawSchedule> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let shift_exists = tx
          .query_row(
            "SELECT 1 FROM shifts WHERE name = ?1",
            rusqlite::params![shift],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !shift_exists {
          return Ok(None);
        }

        tx.execute(
          "INSERT INTO schedules (
             schedule_id, area, shift, name,
             start1, end1, start2, end2, start3, end3, start4, end4
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
           ON CONFLICT (area, shift, name) DO UPDATE SET
             start1 = excluded.start1, end1 = excluded.end1,
             start2 = excluded.start2, end2 = excluded.end2,
             start3 = excluded.start3, end3 = excluded.end3,
             start4 = excluded.start4, end4 = excluded.end4",
          rusqlite::params![id_str, area, shift, name, s1, e1, s2, e2, s3, e3, s4, e4],
        )?;

        let raw = tx.query_row(
          &format!(
            "SELECT {SCHEDULE_COLUMNS}
             FROM schedules s JOIN shifts sh ON sh.name = s.shift
             WHERE s.area = ?1 AND s.shift = ?2 AND s.name = ?3"
          ),
          rusqlite::params![area, shift, name],
          RawSchedule::from_row,
        )?;

        tx.commit()?;
        Ok(Some(raw))
      })
      .await?;

    raw
      .ok_or(Error::ShiftNotFound(input.shift))?
      .into_schedule()
  }

  async fn get_schedule(&self, id: Uuid) -> Result<Option<Schedule>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawSchedule> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {SCHEDULE_COLUMNS}
                 FROM schedules s JOIN shifts sh ON sh.name = s.shift
                 WHERE s.schedule_id = ?1"
              ),
              rusqlite::params![id_str],
              RawSchedule::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSchedule::into_schedule).transpose()
  }

  async fn find_schedule(
    &self,
    area:  &str,
    shift: &str,
    name:  &str,
  ) -> Result<Option<Schedule>> {
    let (area, shift, name) = (area.to_owned(), shift.to_owned(), name.to_owned());

    let raw: Option<RawSchedule> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {SCHEDULE_COLUMNS}
                 FROM schedules s JOIN shifts sh ON sh.name = s.shift
                 WHERE s.area = ?1 AND s.shift = ?2 AND s.name = ?3"
              ),
              rusqlite::params![area, shift, name],
              RawSchedule::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSchedule::into_schedule).transpose()
  }

  // ── KPIs ──────────────────────────────────────────────────────────────────

  async fn upsert_kpi(&self, input: NewKpi) -> Result<Kpi> {
    let schedule_id = input.schedule_id;
    if self.get_schedule(schedule_id).await?.is_none() {
      return Err(Error::ScheduleNotFound(schedule_id));
    }

    let id_str          = encode_uuid(Uuid::new_v4());
    let d_str           = encode_date(input.d);
    let schedule_id_str = encode_uuid(schedule_id);
    let area            = input.area;
    let shift           = input.shift;
    let demand          = input.demand;
    let plan_cycle_time = input.plan_cycle_time;

    let raw: RawKpi = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO kpis (kpi_id, area, shift, d, demand, plan_cycle_time, schedule_id)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
           ON CONFLICT (area, shift, d) DO UPDATE SET
             demand          = excluded.demand,
             plan_cycle_time = excluded.plan_cycle_time,
             schedule_id     = excluded.schedule_id",
          rusqlite::params![
            id_str,
            area,
            shift,
            d_str,
            demand,
            plan_cycle_time,
            schedule_id_str,
          ],
        )?;
        let raw = tx.query_row(
          &format!("SELECT {KPI_COLUMNS} FROM kpis WHERE area = ?1 AND shift = ?2 AND d = ?3"),
          rusqlite::params![area, shift, d_str],
          RawKpi::from_row,
        )?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.into_kpi()
  }

  async fn get_kpi(&self, id: Uuid) -> Result<Option<Kpi>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawKpi> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {KPI_COLUMNS} FROM kpis WHERE kpi_id = ?1"),
              rusqlite::params![id_str],
              RawKpi::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawKpi::into_kpi).transpose()
  }

  async fn find_kpi(
    &self,
    area:  &str,
    shift: &str,
    d:     NaiveDate,
  ) -> Result<Option<Kpi>> {
    let (area, shift) = (area.to_owned(), shift.to_owned());
    let d_str = encode_date(d);

    let raw: Option<RawKpi> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {KPI_COLUMNS} FROM kpis WHERE area = ?1 AND shift = ?2 AND d = ?3"
              ),
              rusqlite::params![area, shift, d_str],
              RawKpi::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawKpi::into_kpi).transpose()
  }

  // ── Cycles (append-only) ────────────────────────────────────────────────

  async fn record_cycle(&self, input: NewCycle) -> Result<Cycle> {
    if !self.kpi_exists(input.kpi_id).await? {
      return Err(Error::KpiNotFound(input.kpi_id));
    }

    let cycle = Cycle {
      cycle_id:   Uuid::new_v4(),
      kpi_id:     input.kpi_id,
      d:          input.d,
      sequence:   input.sequence,
      cycle_time: input.cycle_time,
      parts_per:  input.parts_per,
      delivered:  input.delivered,
      code:       input.code,
    };

    let id_str     = encode_uuid(cycle.cycle_id);
    let kpi_id_str = encode_uuid(cycle.kpi_id);
    let d_str      = encode_dt(cycle.d);
    let (sequence, cycle_time, parts_per, delivered, code) =
      (cycle.sequence, cycle.cycle_time, cycle.parts_per, cycle.delivered, cycle.code);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO cycles (
             cycle_id, kpi_id, d, sequence, cycle_time, parts_per, delivered, code
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            id_str, kpi_id_str, d_str, sequence, cycle_time, parts_per, delivered, code,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(cycle)
  }

  async fn get_cycle(&self, id: Uuid) -> Result<Option<Cycle>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawCycle> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {CYCLE_COLUMNS} FROM cycles WHERE cycle_id = ?1"),
              rusqlite::params![id_str],
              RawCycle::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCycle::into_cycle).transpose()
  }

  async fn list_cycles(&self, query: &CycleQuery) -> Result<Vec<Cycle>> {
    let kpi_id_str = encode_uuid(query.kpi_id);
    let sequence   = query.sequence;
    let from_str   = query.from.map(encode_dt);
    let until_str  = query.until.map(encode_dt);

    let raws: Vec<RawCycle> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CYCLE_COLUMNS} FROM cycles
           WHERE kpi_id = ?1
             AND (?2 IS NULL OR sequence = ?2)
             AND (?3 IS NULL OR d >= ?3)
             AND (?4 IS NULL OR d <  ?4)
           ORDER BY d"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![kpi_id_str, sequence, from_str, until_str],
            RawCycle::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCycle::into_cycle).collect()
  }

  // ── Andons ────────────────────────────────────────────────────────────────

  async fn record_andon(&self, input: NewAndon) -> Result<Andon> {
    if !self.kpi_exists(input.kpi_id).await? {
      return Err(Error::KpiNotFound(input.kpi_id));
    }

    let andon = Andon {
      andon_id:   Uuid::new_v4(),
      kpi_id:     input.kpi_id,
      d:          input.d,
      sequence:   input.sequence,
      andon_type: input.andon_type,
      responded:  false,
      response_d: None,
    };

    let id_str     = encode_uuid(andon.andon_id);
    let kpi_id_str = encode_uuid(andon.kpi_id);
    let d_str      = encode_dt(andon.d);
    let sequence   = andon.sequence;
    let andon_type = andon.andon_type.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO andons (andon_id, kpi_id, d, sequence, andon_type)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, kpi_id_str, d_str, sequence, andon_type],
        )?;
        Ok(())
      })
      .await?;

    Ok(andon)
  }

  async fn get_andon(&self, id: Uuid) -> Result<Option<Andon>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawAndon> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {ANDON_COLUMNS} FROM andons WHERE andon_id = ?1"),
              rusqlite::params![id_str],
              RawAndon::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAndon::into_andon).transpose()
  }

  async fn list_andons(&self, query: &AndonQuery) -> Result<Vec<Andon>> {
    let kpi_id_str = encode_uuid(query.kpi_id);
    let sequence   = query.sequence;
    let from_str   = query.from.map(encode_dt);
    let until_str  = query.until.map(encode_dt);
    let responded  = query.responded;

    let raws: Vec<RawAndon> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ANDON_COLUMNS} FROM andons
           WHERE kpi_id = ?1
             AND (?2 IS NULL OR sequence  = ?2)
             AND (?3 IS NULL OR d        >= ?3)
             AND (?4 IS NULL OR d        <  ?4)
             AND (?5 IS NULL OR responded = ?5)
           ORDER BY d"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![kpi_id_str, sequence, from_str, until_str, responded],
            RawAndon::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAndon::into_andon).collect()
  }

  async fn respond_andons(
    &self,
    kpi_id:   Uuid,
    sequence: i64,
    at:       NaiveDateTime,
  ) -> Result<u64> {
    let kpi_id_str = encode_uuid(kpi_id);
    let at_str     = encode_dt(at);

    // Only open rows are touched; an earlier response_d is never overwritten.
    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE andons SET responded = 1, response_d = ?3
           WHERE kpi_id = ?1 AND sequence = ?2 AND responded = 0",
          rusqlite::params![kpi_id_str, sequence, at_str],
        )?)
      })
      .await?;

    tracing::debug!(%kpi_id, sequence, updated, "andons marked responded");
    Ok(updated as u64)
  }
}
