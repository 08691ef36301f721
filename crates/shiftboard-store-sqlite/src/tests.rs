//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use shiftboard_core::{
  metrics::AndonPriority,
  production::{Kpi, NewAndon, NewCycle, NewKpi},
  schedule::{NewSchedule, Schedule, Shift, SlotTimes},
  store::{AndonQuery, CycleQuery, ProductionStore},
  tracker,
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn hm(h: u32, m: u32) -> NaiveTime { NaiveTime::from_hms_opt(h, m, 0).unwrap() }

fn jan(d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2024, 1, d).unwrap() }

fn at(d: u32, h: u32, m: u32) -> NaiveDateTime { jan(d).and_time(hm(h, m)) }

fn swing_slots() -> SlotTimes {
  SlotTimes::default()
    .with_block(1, hm(15, 15), hm(17, 0))
    .with_block(2, hm(17, 0), hm(19, 0))
    .with_block(3, hm(19, 30), hm(21, 0))
    .with_block(4, hm(21, 0), hm(23, 15))
}

async fn seed_schedule(s: &SqliteStore, shift: Shift, slots: SlotTimes) -> Schedule {
  let name = shift.name.clone();
  s.put_shift(shift).await.unwrap();
  s.upsert_schedule(NewSchedule {
    area:  "Talladega".into(),
    shift: name,
    name:  "Regular".into(),
    slots,
  })
  .await
  .unwrap()
}

async fn seed_kpi(s: &SqliteStore, schedule: &Schedule, d: NaiveDate) -> Kpi {
  s.upsert_kpi(NewKpi {
    area:            schedule.area.clone(),
    shift:           schedule.shift.name.clone(),
    d,
    demand:          400,
    plan_cycle_time: 54,
    schedule_id:     schedule.schedule_id,
  })
  .await
  .unwrap()
}

fn new_cycle(kpi: &Kpi, sequence: i64, d: NaiveDateTime, parts_per: i64) -> NewCycle {
  NewCycle {
    kpi_id: kpi.kpi_id,
    d,
    sequence,
    cycle_time: 52,
    parts_per,
    delivered: 1,
    code: 0,
  }
}

fn new_andon(kpi: &Kpi, sequence: i64, d: NaiveDateTime, kind: &str) -> NewAndon {
  NewAndon { kpi_id: kpi.kpi_id, d, sequence, andon_type: kind.into() }
}

// ─── Shifts ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn put_and_get_shift() {
  let s = store().await;
  s.put_shift(Shift::swing()).await.unwrap();

  let fetched = s.get_shift("Swing").await.unwrap().unwrap();
  assert_eq!(fetched, Shift::swing());
  assert!(s.get_shift("Grave").await.unwrap().is_none());
}

#[tokio::test]
async fn put_shift_replaces_rollover() {
  let s = store().await;
  s.put_shift(Shift::new("Grave")).await.unwrap();
  s.put_shift(Shift::new("Grave").with_rollover_through(7)).await.unwrap();

  let all = s.list_shifts().await.unwrap();
  assert_eq!(all.len(), 1);
  assert_eq!(all[0].rollover_through_hour, Some(7));
}

// ─── Schedules ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn schedule_roundtrip_carries_shift_rule() {
  let s = store().await;
  let schedule = seed_schedule(&s, Shift::swing(), swing_slots()).await;

  let fetched = s.get_schedule(schedule.schedule_id).await.unwrap().unwrap();
  assert_eq!(fetched, schedule);
  assert_eq!(fetched.shift.rollover_through_hour, Some(3));
  assert_eq!(fetched.slots.end4, Some(hm(23, 15)));

  let found = s
    .find_schedule("Talladega", "Swing", "Regular")
    .await
    .unwrap()
    .unwrap();
  assert_eq!(found.schedule_id, schedule.schedule_id);
}

#[tokio::test]
async fn upsert_schedule_keeps_identity() {
  let s = store().await;
  let first = seed_schedule(&s, Shift::new("Day"), SlotTimes::default()
    .with_block(1, hm(7, 15), hm(9, 0)))
  .await;

  let second = s
    .upsert_schedule(NewSchedule {
      area:  "Talladega".into(),
      shift: "Day".into(),
      name:  "Regular".into(),
      slots: SlotTimes::default().with_block(1, hm(7, 0), hm(9, 0)),
    })
    .await
    .unwrap();

  assert_eq!(second.schedule_id, first.schedule_id);
  assert_eq!(second.slots.start1, Some(hm(7, 0)));
}

#[tokio::test]
async fn upsert_schedule_requires_shift() {
  let s = store().await;
  let err = s
    .upsert_schedule(NewSchedule {
      area:  "Talladega".into(),
      shift: "Weekend".into(),
      name:  "Regular".into(),
      slots: SlotTimes::default(),
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::ShiftNotFound(ref n) if n == "Weekend"));
}

// ─── KPIs ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_kpi_updates_plan_in_place() {
  let s = store().await;
  let schedule = seed_schedule(&s, Shift::swing(), swing_slots()).await;
  let first = seed_kpi(&s, &schedule, jan(10)).await;

  let second = s
    .upsert_kpi(NewKpi {
      area:            "Talladega".into(),
      shift:           "Swing".into(),
      d:               jan(10),
      demand:          500,
      plan_cycle_time: 50,
      schedule_id:     schedule.schedule_id,
    })
    .await
    .unwrap();

  assert_eq!(second.kpi_id, first.kpi_id);
  assert_eq!(second.plan_cycle_time, 50);

  let found = s.find_kpi("Talladega", "Swing", jan(10)).await.unwrap().unwrap();
  assert_eq!(found, second);
  assert_eq!(s.get_kpi(first.kpi_id).await.unwrap(), Some(second));
  assert!(s.find_kpi("Talladega", "Swing", jan(11)).await.unwrap().is_none());
}

#[tokio::test]
async fn upsert_kpi_requires_schedule() {
  let s = store().await;
  let missing = Uuid::new_v4();
  let err = s
    .upsert_kpi(NewKpi {
      area:            "Talladega".into(),
      shift:           "Day".into(),
      d:               jan(10),
      demand:          0,
      plan_cycle_time: 54,
      schedule_id:     missing,
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::ScheduleNotFound(id) if id == missing));
}

// ─── Cycles ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn record_cycle_requires_kpi() {
  let s = store().await;
  let ghost = Kpi {
    kpi_id:          Uuid::new_v4(),
    area:            "Talladega".into(),
    shift:           "Day".into(),
    d:               jan(10),
    demand:          0,
    plan_cycle_time: 54,
    schedule_id:     Uuid::new_v4(),
  };
  let err = s
    .record_cycle(new_cycle(&ghost, 1, at(10, 8, 0), 1))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::KpiNotFound(_)));
}

#[tokio::test]
async fn list_cycles_filters_half_open() {
  let s = store().await;
  let schedule = seed_schedule(&s, Shift::swing(), swing_slots()).await;
  let kpi = seed_kpi(&s, &schedule, jan(10)).await;

  let recorded = s.record_cycle(new_cycle(&kpi, 1, at(10, 17, 0), 2)).await.unwrap();
  s.record_cycle(new_cycle(&kpi, 1, at(10, 18, 0), 2)).await.unwrap();
  s.record_cycle(new_cycle(&kpi, 1, at(10, 19, 0), 2)).await.unwrap();
  s.record_cycle(new_cycle(&kpi, 2, at(10, 18, 0), 1)).await.unwrap();

  assert_eq!(s.get_cycle(recorded.cycle_id).await.unwrap(), Some(recorded));

  let all = s.list_cycles(&CycleQuery::for_kpi(kpi.kpi_id)).await.unwrap();
  assert_eq!(all.len(), 4);

  let block_two = s
    .list_cycles(&CycleQuery {
      kpi_id:   kpi.kpi_id,
      sequence: Some(1),
      from:     Some(at(10, 17, 0)),
      until:    Some(at(10, 19, 0)),
    })
    .await
    .unwrap();
  assert_eq!(block_two.len(), 2);
  assert!(block_two.windows(2).all(|w| w[0].d <= w[1].d));
}

// ─── Andons ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn andons_start_unresponded() {
  let s = store().await;
  let schedule = seed_schedule(&s, Shift::swing(), swing_slots()).await;
  let kpi = seed_kpi(&s, &schedule, jan(10)).await;

  let andon = s.record_andon(new_andon(&kpi, 3, at(10, 16, 0), "Quality")).await.unwrap();
  assert!(!andon.responded);
  assert_eq!(s.get_andon(andon.andon_id).await.unwrap(), Some(andon));
}

#[tokio::test]
async fn respond_is_idempotent() {
  let s = store().await;
  let schedule = seed_schedule(&s, Shift::swing(), swing_slots()).await;
  let kpi = seed_kpi(&s, &schedule, jan(10)).await;

  s.record_andon(new_andon(&kpi, 3, at(10, 16, 0), "Quality")).await.unwrap();
  s.record_andon(new_andon(&kpi, 3, at(10, 16, 5), "Safety")).await.unwrap();
  s.record_andon(new_andon(&kpi, 4, at(10, 16, 5), "Safety")).await.unwrap();

  assert_eq!(s.respond_andons(kpi.kpi_id, 3, at(10, 16, 10)).await.unwrap(), 2);
  assert_eq!(s.respond_andons(kpi.kpi_id, 3, at(10, 16, 30)).await.unwrap(), 0);

  let seq3 = s
    .list_andons(&AndonQuery { sequence: Some(3), ..AndonQuery::for_kpi(kpi.kpi_id) })
    .await
    .unwrap();
  assert_eq!(seq3.len(), 2);
  assert!(seq3.iter().all(|a| a.responded && a.response_d == Some(at(10, 16, 10))));

  let open = s
    .list_andons(&AndonQuery { responded: Some(false), ..AndonQuery::for_kpi(kpi.kpi_id) })
    .await
    .unwrap();
  assert_eq!(open.len(), 1);
  assert_eq!(open[0].sequence, 4);
}

#[tokio::test]
async fn concurrent_responses_converge() {
  let s = store().await;
  let schedule = seed_schedule(&s, Shift::swing(), swing_slots()).await;
  let kpi = seed_kpi(&s, &schedule, jan(10)).await;

  for minute in 0..5 {
    s.record_andon(new_andon(&kpi, 6, at(10, 16, minute), "Delivery")).await.unwrap();
  }

  let (a, b) = tokio::join!(
    s.respond_andons(kpi.kpi_id, 6, at(10, 16, 20)),
    s.respond_andons(kpi.kpi_id, 6, at(10, 16, 21)),
  );
  assert_eq!(a.unwrap() + b.unwrap(), 5);

  let open = s
    .list_andons(&AndonQuery { responded: Some(false), ..AndonQuery::for_kpi(kpi.kpi_id) })
    .await
    .unwrap();
  assert!(open.is_empty());
}

// ─── Tracker over SQLite ─────────────────────────────────────────────────────

#[tokio::test]
async fn block_metrics_across_midnight() {
  let s = store().await;
  let slots = SlotTimes::default()
    .with_block(1, hm(22, 0), hm(23, 30))
    .with_block(2, hm(23, 45), hm(2, 0));
  let schedule = seed_schedule(&s, Shift::swing(), slots).await;
  let kpi = seed_kpi(&s, &schedule, jan(10)).await;

  s.record_cycle(new_cycle(&kpi, 1, at(10, 23, 0), 1)).await.unwrap();
  s.record_cycle(new_cycle(&kpi, 1, at(11, 0, 30), 1)).await.unwrap();
  s.record_cycle(new_cycle(&kpi, 1, at(11, 1, 30), 1)).await.unwrap();
  s.record_andon(new_andon(&kpi, 1, at(11, 1, 0), "Bogus")).await.unwrap();

  let m = tracker::block_metrics(&s, "Talladega", "Swing", "2024-01-10", 0, at(11, 1, 45))
    .await
    .unwrap();

  let seq = &m[&1];
  assert_eq!(seq.cycles, 2);
  // 23:45 to 02:00 is 8100 seconds at 54 seconds per part.
  assert_eq!(seq.expected, 150);
  assert_eq!(seq.andons, 1);
  assert!(!seq.responded);
  assert_eq!(seq.andon_type, Some(AndonPriority::NoType));
}
