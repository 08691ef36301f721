//! Shift schedules and their resolution into concrete time windows.
//!
//! A [`Schedule`] stores only clock times: up to four `(start, end)` pairs.
//! Resolving it against a shift date anchors every present slot to a calendar
//! date, producing a [`ResolvedSchedule`] of alternating start/end instants
//! from which block windows, available time, the current block and the
//! break-excluded elapsed time are derived.

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, time};

// ─── Shift ───────────────────────────────────────────────────────────────────

/// A named shift and its midnight-rollover rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
  pub name:                  String,
  /// Slots whose clock hour is at or below this value belong to the day
  /// after the shift date. `None` means the shift never rolls over.
  pub rollover_through_hour: Option<u32>,
}

impl Shift {
  pub fn new(name: impl Into<String>) -> Self {
    Self { name: name.into(), rollover_through_hour: None }
  }

  pub fn with_rollover_through(mut self, hour: u32) -> Self {
    self.rollover_through_hour = Some(hour);
    self
  }

  /// The evening shift whose late blocks run past midnight until 03:59.
  pub fn swing() -> Self { Self::new("Swing").with_rollover_through(3) }

  /// The calendar date a slot at `t` belongs to for a shift keyed by `date`.
  pub fn anchor(&self, date: NaiveDate, t: NaiveTime) -> NaiveDateTime {
    match self.rollover_through_hour {
      Some(hour) if t.hour() <= hour => (date + Days::new(1)).and_time(t),
      _ => date.and_time(t),
    }
  }
}

// ─── Slots ───────────────────────────────────────────────────────────────────

/// The eight clock-time slots of a schedule, in resolution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
  Start1,
  End1,
  Start2,
  End2,
  Start3,
  End3,
  Start4,
  End4,
}

impl Slot {
  pub const ALL: [Slot; 8] = [
    Slot::Start1,
    Slot::End1,
    Slot::Start2,
    Slot::End2,
    Slot::Start3,
    Slot::End3,
    Slot::Start4,
    Slot::End4,
  ];

  /// The `(start, end)` slot pairs, block 1 first.
  pub const PAIRS: [(Slot, Slot); 4] = [
    (Slot::Start1, Slot::End1),
    (Slot::Start2, Slot::End2),
    (Slot::Start3, Slot::End3),
    (Slot::Start4, Slot::End4),
  ];

  pub fn name(self) -> &'static str {
    match self {
      Slot::Start1 => "start1",
      Slot::End1 => "end1",
      Slot::Start2 => "start2",
      Slot::End2 => "end2",
      Slot::Start3 => "start3",
      Slot::End3 => "end3",
      Slot::Start4 => "start4",
      Slot::End4 => "end4",
    }
  }
}

/// The clock times of a schedule. Pairs are used in order 1..4; a pair is
/// absent when both of its slots are `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotTimes {
  pub start1: Option<NaiveTime>,
  pub end1:   Option<NaiveTime>,
  pub start2: Option<NaiveTime>,
  pub end2:   Option<NaiveTime>,
  pub start3: Option<NaiveTime>,
  pub end3:   Option<NaiveTime>,
  pub start4: Option<NaiveTime>,
  pub end4:   Option<NaiveTime>,
}

impl SlotTimes {
  pub fn get(&self, slot: Slot) -> Option<NaiveTime> {
    match slot {
      Slot::Start1 => self.start1,
      Slot::End1 => self.end1,
      Slot::Start2 => self.start2,
      Slot::End2 => self.end2,
      Slot::Start3 => self.start3,
      Slot::End3 => self.end3,
      Slot::Start4 => self.start4,
      Slot::End4 => self.end4,
    }
  }

  pub fn set(&mut self, slot: Slot, value: Option<NaiveTime>) {
    let field = match slot {
      Slot::Start1 => &mut self.start1,
      Slot::End1 => &mut self.end1,
      Slot::Start2 => &mut self.start2,
      Slot::End2 => &mut self.end2,
      Slot::Start3 => &mut self.start3,
      Slot::End3 => &mut self.end3,
      Slot::Start4 => &mut self.start4,
      Slot::End4 => &mut self.end4,
    };
    *field = value;
  }

  /// Builder form of [`SlotTimes::set`] for one `(start, end)` pair.
  pub fn with_block(mut self, block: usize, start: NaiveTime, end: NaiveTime) -> Self {
    if let Some((s, e)) = block.checked_sub(1).and_then(|i| Slot::PAIRS.get(i)) {
      self.set(*s, Some(start));
      self.set(*e, Some(end));
    }
    self
  }
}

// ─── Schedule ────────────────────────────────────────────────────────────────

/// A named block template for one `(area, shift)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
  pub schedule_id: Uuid,
  pub area:        String,
  pub shift:       Shift,
  pub name:        String,
  #[serde(flatten)]
  pub slots:       SlotTimes,
}

/// Input to [`crate::store::ProductionStore::upsert_schedule`]. The shift is
/// referenced by name and must already exist.
#[derive(Debug, Clone)]
pub struct NewSchedule {
  pub area:  String,
  pub shift: String,
  pub name:  String,
  pub slots: SlotTimes,
}

impl Schedule {
  /// Anchor every present slot to `anchor_date`, in slot order.
  pub fn resolve(&self, anchor_date: NaiveDate) -> ResolvedSchedule {
    let mut instants = Vec::with_capacity(8);
    for (block, (start, end)) in Slot::PAIRS.iter().enumerate() {
      match (self.slots.get(*start), self.slots.get(*end)) {
        (Some(s), Some(e)) => {
          instants.push(self.shift.anchor(anchor_date, s));
          instants.push(self.shift.anchor(anchor_date, e));
        }
        (None, None) => {}
        _ => tracing::warn!(
          schedule = %self.name,
          block = block + 1,
          "ignoring half-configured block"
        ),
      }
    }
    ResolvedSchedule { instants }
  }

  /// Total in-block time in whole seconds, resolved against today.
  pub fn available_time(&self) -> i64 { self.available_time_at(time::today()) }

  pub fn available_time_at(&self, anchor_date: NaiveDate) -> i64 {
    self.resolve(anchor_date).available_time().num_seconds()
  }

  /// [`ResolvedSchedule::current_block`] for `anchor_date` (today when
  /// `None`) at the current plant time.
  pub fn current_block(&self, anchor_date: Option<NaiveDate>) -> usize {
    let date = anchor_date.unwrap_or_else(time::today);
    self.current_block_at(date, time::now())
  }

  pub fn current_block_at(&self, anchor_date: NaiveDate, now: NaiveDateTime) -> usize {
    self.resolve(anchor_date).current_block(now)
  }
}

// ─── Windows ─────────────────────────────────────────────────────────────────

/// One block's absolute bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
  pub start: NaiveDateTime,
  pub end:   NaiveDateTime,
}

impl Window {
  pub fn duration(&self) -> TimeDelta { self.end - self.start }

  /// `start <= at < end`
  pub fn contains_half_open(&self, at: NaiveDateTime) -> bool {
    self.start <= at && at < self.end
  }

  /// `start < at < end`
  pub fn contains_open(&self, at: NaiveDateTime) -> bool {
    self.start < at && at < self.end
  }
}

/// A schedule anchored to a shift date: alternating start/end instants,
/// block 1 first. Always even-length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSchedule {
  instants: Vec<NaiveDateTime>,
}

impl ResolvedSchedule {
  pub fn instants(&self) -> &[NaiveDateTime] { &self.instants }

  pub fn block_count(&self) -> usize { self.instants.len() / 2 }

  pub fn windows(&self) -> impl Iterator<Item = Window> + '_ {
    self
      .instants
      .chunks_exact(2)
      .map(|pair| Window { start: pair[0], end: pair[1] })
  }

  /// The window for 1-based `block`.
  pub fn window(&self, block: usize) -> Result<Window> {
    block
      .checked_sub(1)
      .and_then(|i| self.windows().nth(i))
      .ok_or(Error::InvalidBlock { block, available: self.block_count() })
  }

  /// Only the slot-hour rollover rule corrects for midnight, so a schedule
  /// that crosses midnight any other way resolves out of order.
  pub fn is_monotonic(&self) -> bool {
    self.instants.windows(2).all(|w| w[0] <= w[1])
  }

  /// Sum of every block's duration.
  pub fn available_time(&self) -> TimeDelta {
    self.windows().map(|w| w.duration()).sum()
  }

  /// How many blocks have started strictly before `now`, floored at 1.
  pub fn current_block(&self, now: NaiveDateTime) -> usize {
    self.windows().filter(|w| w.start < now).count().max(1)
  }

  /// In-block time worked by `at`. Breaks between blocks are excluded; a
  /// break in progress is excluded up to `at`.
  pub fn elapsed(&self, at: NaiveDateTime) -> TimeDelta {
    let (Some(first), Some(last)) = (self.instants.first(), self.instants.last())
    else {
      return TimeDelta::zero();
    };
    if at >= *last {
      return self.available_time();
    }
    if at < *first {
      return TimeDelta::zero();
    }

    let mut worked = at - *first;
    for pair in self.instants[1..].chunks_exact(2) {
      let (break_start, break_end) = (pair[0], pair[1]);
      if break_start >= at {
        break;
      }
      worked -= if at >= break_end {
        break_end - break_start
      } else {
        at - break_start
      };
    }
    worked
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn hm(h: u32, m: u32) -> NaiveTime { NaiveTime::from_hms_opt(h, m, 0).unwrap() }

  fn jan(d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2024, 1, d).unwrap() }

  fn at(d: u32, h: u32, m: u32) -> NaiveDateTime { jan(d).and_time(hm(h, m)) }

  fn schedule(shift: Shift, slots: SlotTimes) -> Schedule {
    Schedule {
      schedule_id: Uuid::new_v4(),
      area: "Talladega".into(),
      shift,
      name: "Regular".into(),
      slots,
    }
  }

  fn day_shift() -> Schedule {
    schedule(
      Shift::new("Day"),
      SlotTimes::default()
        .with_block(1, hm(7, 0), hm(9, 0))
        .with_block(2, hm(9, 0), hm(11, 0))
        .with_block(3, hm(11, 0), hm(13, 0))
        .with_block(4, hm(13, 0), hm(15, 0)),
    )
  }

  // ── resolve ─────────────────────────────────────────────────────────────

  #[test]
  fn resolve_keeps_slot_order_and_skips_absent_pairs() {
    let s = schedule(
      Shift::new("Day"),
      SlotTimes::default()
        .with_block(1, hm(7, 0), hm(9, 0))
        .with_block(2, hm(9, 15), hm(11, 0)),
    );
    let r = s.resolve(jan(10));
    assert_eq!(
      r.instants(),
      &[at(10, 7, 0), at(10, 9, 0), at(10, 9, 15), at(10, 11, 0)]
    );
    assert_eq!(r.block_count(), 2);
  }

  #[test]
  fn resolve_drops_half_configured_pair() {
    let mut slots = SlotTimes::default().with_block(1, hm(7, 0), hm(9, 0));
    slots.set(Slot::Start2, Some(hm(9, 15)));
    let r = schedule(Shift::new("Day"), slots).resolve(jan(10));
    assert_eq!(r.instants().len(), 2);
  }

  #[test]
  fn swing_rolls_early_hours_to_next_day() {
    let slots = SlotTimes::default()
      .with_block(1, hm(15, 15), hm(17, 0))
      .with_block(4, hm(23, 0), hm(2, 0));
    let swing = schedule(Shift::swing(), slots).resolve(jan(10));
    assert_eq!(swing.instants()[3], at(11, 2, 0));
    assert_eq!(swing.instants()[2], at(10, 23, 0));
    assert!(swing.is_monotonic());

    let plain = schedule(Shift::new("Day"), slots).resolve(jan(10));
    assert_eq!(plain.instants()[3], at(10, 2, 0));
    assert!(!plain.is_monotonic());
  }

  #[test]
  fn rollover_threshold_is_inclusive() {
    let shift = Shift::new("Late").with_rollover_through(3);
    assert_eq!(shift.anchor(jan(10), hm(3, 59)), at(11, 3, 59));
    assert_eq!(shift.anchor(jan(10), hm(4, 0)), at(10, 4, 0));
  }

  #[test]
  fn slot_accessors_round_trip_every_slot() {
    let mut slots = SlotTimes::default();
    for (i, slot) in Slot::ALL.iter().enumerate() {
      slots.set(*slot, Some(hm(i as u32, 0)));
    }
    for (i, slot) in Slot::ALL.iter().enumerate() {
      assert_eq!(slots.get(*slot), Some(hm(i as u32, 0)), "{}", slot.name());
    }
  }

  // ── available time ──────────────────────────────────────────────────────

  #[test]
  fn available_time_single_pair() {
    let s = schedule(
      Shift::new("Day"),
      SlotTimes::default().with_block(1, hm(8, 0), hm(16, 0)),
    );
    assert_eq!(s.available_time(), 28_800);
  }

  #[test]
  fn available_time_sums_pairs_across_midnight() {
    let s = schedule(
      Shift::swing(),
      SlotTimes::default()
        .with_block(1, hm(22, 0), hm(23, 30))
        .with_block(2, hm(23, 45), hm(1, 0)),
    );
    assert_eq!(s.available_time(), 90 * 60 + 75 * 60);
  }

  // ── current block ───────────────────────────────────────────────────────

  #[test]
  fn current_block_counts_started_blocks() {
    let r = day_shift().resolve(jan(10));
    assert_eq!(r.current_block(at(10, 10, 30)), 2);
    assert_eq!(r.current_block(at(10, 13, 30)), 4);
  }

  #[test]
  fn current_block_floors_at_one() {
    let r = day_shift().resolve(jan(10));
    assert_eq!(r.current_block(at(10, 6, 0)), 1);
    assert_eq!(r.current_block(at(10, 7, 0)), 1);
  }

  #[test]
  fn current_block_at_resolves_against_anchor_date() {
    let s = day_shift();
    assert_eq!(s.current_block_at(jan(10), at(10, 11, 30)), 3);
    assert_eq!(s.current_block_at(jan(11), at(10, 11, 30)), 1);
    assert_eq!(s.available_time_at(jan(10)), 8 * 3600);
  }

  #[test]
  fn window_out_of_range_is_rejected() {
    let r = day_shift().resolve(jan(10));
    assert_eq!(r.window(2).unwrap(), Window { start: at(10, 9, 0), end: at(10, 11, 0) });
    assert!(matches!(
      r.window(5),
      Err(Error::InvalidBlock { block: 5, available: 4 })
    ));
    assert!(matches!(r.window(0), Err(Error::InvalidBlock { .. })));
  }

  // ── elapsed ─────────────────────────────────────────────────────────────

  fn with_break() -> ResolvedSchedule {
    schedule(
      Shift::new("Day"),
      SlotTimes::default()
        .with_block(1, hm(7, 0), hm(9, 0))
        .with_block(2, hm(9, 15), hm(11, 0)),
    )
    .resolve(jan(10))
  }

  #[test]
  fn elapsed_inside_first_block() {
    assert_eq!(with_break().elapsed(at(10, 8, 50)), TimeDelta::minutes(110));
  }

  #[test]
  fn elapsed_during_break_excludes_break_so_far() {
    assert_eq!(with_break().elapsed(at(10, 9, 10)), TimeDelta::hours(2));
  }

  #[test]
  fn elapsed_after_break_excludes_whole_break() {
    assert_eq!(with_break().elapsed(at(10, 9, 20)), TimeDelta::minutes(125));
  }

  #[test]
  fn elapsed_is_clamped_outside_the_shift() {
    let r = with_break();
    assert_eq!(r.elapsed(at(10, 6, 59)), TimeDelta::zero());
    assert_eq!(r.elapsed(at(10, 11, 0)), r.available_time());
    assert_eq!(r.elapsed(at(10, 18, 0)), TimeDelta::minutes(225));
  }

  #[test]
  fn elapsed_of_empty_schedule_is_zero() {
    let r = schedule(Shift::new("Day"), SlotTimes::default()).resolve(jan(10));
    assert_eq!(r.elapsed(at(10, 12, 0)), TimeDelta::zero());
  }
}
