//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Dates are `YYYY-MM-DD`, clock times `HH:MM:SS`, and timestamps fixed-width
//! `YYYY-MM-DD HH:MM:SS.ffffff` so text comparison matches time order. UUIDs
//! are stored as hyphenated lowercase strings.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use shiftboard_core::{
  production::{Andon, Cycle, Kpi},
  schedule::{Schedule, Shift, Slot, SlotTimes},
};
use uuid::Uuid;

use crate::{Error, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";
const DT_WRITE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";
const DT_READ_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT)
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── NaiveTime ───────────────────────────────────────────────────────────────

pub fn encode_time(t: NaiveTime) -> String { t.format(TIME_FORMAT).to_string() }

pub fn decode_time(s: &str) -> Result<NaiveTime> {
  NaiveTime::parse_from_str(s, TIME_FORMAT)
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── NaiveDateTime ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: NaiveDateTime) -> String {
  dt.format(DT_WRITE_FORMAT).to_string()
}

pub fn decode_dt(s: &str) -> Result<NaiveDateTime> {
  NaiveDateTime::parse_from_str(s, DT_READ_FORMAT)
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Slots ───────────────────────────────────────────────────────────────────

/// Slot values in [`Slot::ALL`] order, ready to bind as SQL parameters.
pub fn encode_slots(slots: &SlotTimes) -> [Option<String>; 8] {
  Slot::ALL.map(|slot| slots.get(slot).map(encode_time))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawSchedule::from_row`]; expects `schedules s`
/// joined with `shifts sh`.
pub const SCHEDULE_COLUMNS: &str = "s.schedule_id, s.area, s.shift, s.name,
  s.start1, s.end1, s.start2, s.end2, s.start3, s.end3, s.start4, s.end4,
  sh.rollover_through_hour";

/// Raw values read from a `schedules` row joined with its shift.
pub struct RawSchedule {
  pub schedule_id:           String,
  pub area:                  String,
  pub shift:                 String,
  pub name:                  String,
  pub slots:                 [Option<String>; 8],
  pub rollover_through_hour: Option<u32>,
}

impl RawSchedule {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      schedule_id:           row.get(0)?,
      area:                  row.get(1)?,
      shift:                 row.get(2)?,
      name:                  row.get(3)?,
      slots:                 [
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
        row.get(10)?,
        row.get(11)?,
      ],
      rollover_through_hour: row.get(12)?,
    })
  }

  pub fn into_schedule(self) -> Result<Schedule> {
    let mut slots = SlotTimes::default();
    for (slot, raw) in Slot::ALL.into_iter().zip(self.slots) {
      slots.set(slot, raw.as_deref().map(decode_time).transpose()?);
    }

    Ok(Schedule {
      schedule_id: decode_uuid(&self.schedule_id)?,
      area: self.area,
      shift: Shift {
        name:                  self.shift,
        rollover_through_hour: self.rollover_through_hour,
      },
      name: self.name,
      slots,
    })
  }
}

pub const KPI_COLUMNS: &str =
  "kpi_id, area, shift, d, demand, plan_cycle_time, schedule_id";

/// Raw values read from a `kpis` row.
pub struct RawKpi {
  pub kpi_id:          String,
  pub area:            String,
  pub shift:           String,
  pub d:               String,
  pub demand:          i64,
  pub plan_cycle_time: i64,
  pub schedule_id:     String,
}

impl RawKpi {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      kpi_id:          row.get(0)?,
      area:            row.get(1)?,
      shift:           row.get(2)?,
      d:               row.get(3)?,
      demand:          row.get(4)?,
      plan_cycle_time: row.get(5)?,
      schedule_id:     row.get(6)?,
    })
  }

  pub fn into_kpi(self) -> Result<Kpi> {
    Ok(Kpi {
      kpi_id:          decode_uuid(&self.kpi_id)?,
      area:            self.area,
      shift:           self.shift,
      d:               decode_date(&self.d)?,
      demand:          self.demand,
      plan_cycle_time: self.plan_cycle_time,
      schedule_id:     decode_uuid(&self.schedule_id)?,
    })
  }
}

pub const CYCLE_COLUMNS: &str =
  "cycle_id, kpi_id, d, sequence, cycle_time, parts_per, delivered, code";

/// Raw values read from a `cycles` row.
pub struct RawCycle {
  pub cycle_id:   String,
  pub kpi_id:     String,
  pub d:          String,
  pub sequence:   i64,
  pub cycle_time: i64,
  pub parts_per:  i64,
  pub delivered:  i64,
  pub code:       i64,
}

impl RawCycle {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      cycle_id:   row.get(0)?,
      kpi_id:     row.get(1)?,
      d:          row.get(2)?,
      sequence:   row.get(3)?,
      cycle_time: row.get(4)?,
      parts_per:  row.get(5)?,
      delivered:  row.get(6)?,
      code:       row.get(7)?,
    })
  }

  pub fn into_cycle(self) -> Result<Cycle> {
    Ok(Cycle {
      cycle_id:   decode_uuid(&self.cycle_id)?,
      kpi_id:     decode_uuid(&self.kpi_id)?,
      d:          decode_dt(&self.d)?,
      sequence:   self.sequence,
      cycle_time: self.cycle_time,
      parts_per:  self.parts_per,
      delivered:  self.delivered,
      code:       self.code,
    })
  }
}

pub const ANDON_COLUMNS: &str =
  "andon_id, kpi_id, d, sequence, andon_type, responded, response_d";

/// Raw values read from an `andons` row.
pub struct RawAndon {
  pub andon_id:   String,
  pub kpi_id:     String,
  pub d:          String,
  pub sequence:   i64,
  pub andon_type: String,
  pub responded:  bool,
  pub response_d: Option<String>,
}

impl RawAndon {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      andon_id:   row.get(0)?,
      kpi_id:     row.get(1)?,
      d:          row.get(2)?,
      sequence:   row.get(3)?,
      andon_type: row.get(4)?,
      responded:  row.get(5)?,
      response_d: row.get(6)?,
    })
  }

  pub fn into_andon(self) -> Result<Andon> {
    Ok(Andon {
      andon_id:   decode_uuid(&self.andon_id)?,
      kpi_id:     decode_uuid(&self.kpi_id)?,
      d:          decode_dt(&self.d)?,
      sequence:   self.sequence,
      andon_type: self.andon_type,
      responded:  self.responded,
      response_d: self.response_d.as_deref().map(decode_dt).transpose()?,
    })
  }
}
