//! Per-sequence block metrics.
//!
//! [`compute`] is pure: it takes one KPI, the block window and every cycle
//! and andon event recorded for that KPI, and produces the table shown on the
//! floor display. Fetching those records is [`crate::tracker`]'s job.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  production::{Andon, Cycle, Kpi},
  schedule::Window,
};

/// Metrics keyed by sequence. Serialises with string keys.
pub type BlockMetrics = BTreeMap<i64, SequenceMetrics>;

// ─── Andon priority ──────────────────────────────────────────────────────────

/// The most urgent category among a sequence's open andons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AndonPriority {
  Safety,
  Quality,
  Delivery,
  /// Open andons exist but none carries a recognised category.
  NoType,
}

impl AndonPriority {
  fn of(andon_type: &str) -> Self {
    match andon_type {
      "Safety" => Self::Safety,
      "Quality" => Self::Quality,
      "Delivery" => Self::Delivery,
      _ => Self::NoType,
    }
  }

  /// `None` when `types` is empty.
  pub fn highest<'a>(types: impl IntoIterator<Item = &'a str>) -> Option<Self> {
    types.into_iter().map(Self::of).min()
  }
}

// ─── SequenceMetrics ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceMetrics {
  /// Cycles with `start <= d < end`.
  #[serde(rename = "Cycles")]
  pub cycles:     u64,
  #[serde(rename = "Expected")]
  pub expected:   i64,
  /// Andons with `start < d < end`.
  #[serde(rename = "Andons")]
  pub andons:     u64,
  #[serde(rename = "Responded")]
  pub responded:  bool,
  /// `None` whenever `responded` is `true`.
  #[serde(rename = "Andon_Type")]
  pub andon_type: Option<AndonPriority>,
}

// ─── Aggregation ─────────────────────────────────────────────────────────────

/// Aggregate `cycles` and `andons` (all belonging to `kpi`) against `window`.
///
/// Every sequence that has ever posted a cycle for the KPI gets an entry,
/// even when it has posted nothing inside the window yet.
pub fn compute(
  kpi: &Kpi,
  window: Window,
  cycles: &[Cycle],
  andons: &[Andon],
) -> Result<BlockMetrics> {
  let available = window.duration().num_seconds();
  let sequences: BTreeSet<i64> = cycles.iter().map(|c| c.sequence).collect();

  sequences
    .into_iter()
    .map(|sequence| {
      let metrics = sequence_metrics(kpi, window, available, sequence, cycles, andons)?;
      Ok((sequence, metrics))
    })
    .collect()
}

fn sequence_metrics(
  kpi: &Kpi,
  window: Window,
  available: i64,
  sequence: i64,
  cycles: &[Cycle],
  andons: &[Andon],
) -> Result<SequenceMetrics> {
  let seq_cycles: Vec<&Cycle> =
    cycles.iter().filter(|c| c.sequence == sequence).collect();
  let in_window: Vec<&Cycle> = seq_cycles
    .iter()
    .copied()
    .filter(|c| window.contains_half_open(c.d))
    .collect();

  // Before anything posts in this block, fall back to the latest cycle
  // regardless of window.
  let latest = latest_by_d(&in_window)
    .or_else(|| latest_by_d(&seq_cycles))
    .ok_or(Error::MissingPartsPer(sequence))?;

  let capacity = kpi.plan_cycle_time * latest.parts_per;
  if capacity <= 0 {
    return Err(Error::ZeroCycleCapacity { sequence });
  }
  let expected = available.div_euclid(capacity);

  let seq_andons: Vec<&Andon> =
    andons.iter().filter(|a| a.sequence == sequence).collect();
  let andons_in_window = seq_andons
    .iter()
    .filter(|a| window.contains_open(a.d))
    .count() as u64;

  let responded = seq_andons
    .iter()
    .copied()
    .max_by_key(|a| a.d)
    .is_none_or(|a| a.responded);

  let andon_type = if responded {
    None
  } else {
    AndonPriority::highest(
      seq_andons
        .iter()
        .filter(|a| !a.responded)
        .map(|a| a.andon_type.as_str()),
    )
  };

  Ok(SequenceMetrics {
    cycles: in_window.len() as u64,
    expected,
    andons: andons_in_window,
    responded,
    andon_type,
  })
}

fn latest_by_d<'a>(cycles: &[&'a Cycle]) -> Option<&'a Cycle> {
  cycles.iter().copied().max_by_key(|c| c.d)
}

#[cfg(test)]
mod tests {
  use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
  use uuid::Uuid;

  use super::*;

  fn at(h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 10)
      .unwrap()
      .and_time(NaiveTime::from_hms_opt(h, m, 0).unwrap())
  }

  fn kpi() -> Kpi {
    Kpi {
      kpi_id:          Uuid::new_v4(),
      area:            "Talladega".into(),
      shift:           "Day".into(),
      d:               NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
      demand:          400,
      plan_cycle_time: 60,
      schedule_id:     Uuid::new_v4(),
    }
  }

  /// 09:00–11:00, two hours.
  fn block_two() -> Window { Window { start: at(9, 0), end: at(11, 0) } }

  fn cycle(kpi: &Kpi, sequence: i64, d: NaiveDateTime, parts_per: i64) -> Cycle {
    Cycle {
      cycle_id: Uuid::new_v4(),
      kpi_id: kpi.kpi_id,
      d,
      sequence,
      cycle_time: 58,
      parts_per,
      delivered: 0,
      code: 0,
    }
  }

  fn andon(kpi: &Kpi, sequence: i64, d: NaiveDateTime, kind: &str, responded: bool) -> Andon {
    Andon {
      andon_id: Uuid::new_v4(),
      kpi_id: kpi.kpi_id,
      d,
      sequence,
      andon_type: kind.into(),
      responded,
      response_d: responded.then_some(d),
    }
  }

  #[test]
  fn counts_cycles_half_open() {
    let k = kpi();
    let cycles = vec![
      cycle(&k, 1, at(8, 59), 1),
      cycle(&k, 1, at(9, 0), 1),
      cycle(&k, 1, at(10, 0), 1),
      cycle(&k, 1, at(11, 0), 1),
    ];
    let m = compute(&k, block_two(), &cycles, &[]).unwrap();
    assert_eq!(m[&1].cycles, 2);
    assert_eq!(m[&1].expected, 120);
  }

  #[test]
  fn parts_per_comes_from_latest_cycle_in_window() {
    let k = kpi();
    let cycles = vec![
      cycle(&k, 1, at(9, 10), 1),
      cycle(&k, 1, at(10, 40), 4),
      cycle(&k, 1, at(11, 30), 2),
    ];
    let m = compute(&k, block_two(), &cycles, &[]).unwrap();
    assert_eq!(m[&1].expected, 7200 / (60 * 4));
  }

  #[test]
  fn parts_per_falls_back_to_history_when_window_is_empty() {
    let k = kpi();
    let cycles = vec![cycle(&k, 3, at(7, 30), 2)];
    let m = compute(&k, block_two(), &cycles, &[]).unwrap();
    assert_eq!(m[&3].cycles, 0);
    assert_eq!(m[&3].expected, 60);
  }

  #[test]
  fn every_sequence_with_history_is_reported() {
    let k = kpi();
    let cycles = vec![cycle(&k, 2, at(7, 0), 1), cycle(&k, 5, at(9, 30), 1)];
    let m = compute(&k, block_two(), &cycles, &[]).unwrap();
    assert_eq!(m.keys().copied().collect::<Vec<_>>(), vec![2, 5]);
  }

  #[test]
  fn andons_are_counted_open_on_both_ends() {
    let k = kpi();
    let cycles = vec![cycle(&k, 1, at(9, 5), 1)];
    let andons = vec![
      andon(&k, 1, at(9, 0), "Quality", true),
      andon(&k, 1, at(9, 30), "Quality", true),
      andon(&k, 1, at(11, 0), "Quality", true),
    ];
    let m = compute(&k, block_two(), &cycles, &andons).unwrap();
    assert_eq!(m[&1].andons, 1);
  }

  #[test]
  fn responded_without_any_andons() {
    let k = kpi();
    let m = compute(&k, block_two(), &[cycle(&k, 1, at(9, 5), 1)], &[]).unwrap();
    assert!(m[&1].responded);
    assert_eq!(m[&1].andon_type, None);
  }

  #[test]
  fn responded_follows_latest_andon() {
    let k = kpi();
    let cycles = vec![cycle(&k, 1, at(9, 5), 1)];
    let andons = vec![
      andon(&k, 1, at(9, 10), "Safety", false),
      andon(&k, 1, at(9, 40), "Delivery", true),
    ];
    let m = compute(&k, block_two(), &cycles, &andons).unwrap();
    assert!(m[&1].responded);
    assert_eq!(m[&1].andon_type, None);
  }

  #[test]
  fn open_andon_type_follows_priority() {
    let k = kpi();
    let cycles = vec![
      cycle(&k, 1, at(9, 5), 1),
      cycle(&k, 2, at(9, 5), 1),
      cycle(&k, 3, at(9, 5), 1),
    ];
    let andons = vec![
      andon(&k, 1, at(9, 10), "Delivery", false),
      andon(&k, 1, at(9, 20), "Safety", false),
      andon(&k, 2, at(9, 20), "Quality", false),
      andon(&k, 3, at(9, 20), "Bogus", false),
    ];
    let m = compute(&k, block_two(), &cycles, &andons).unwrap();
    assert_eq!(m[&1].andon_type, Some(AndonPriority::Safety));
    assert_eq!(m[&2].andon_type, Some(AndonPriority::Quality));
    assert_eq!(m[&3].andon_type, Some(AndonPriority::NoType));
    assert!(!m[&1].responded);
  }

  #[test]
  fn open_andons_outside_window_still_set_the_type() {
    let k = kpi();
    let cycles = vec![cycle(&k, 1, at(9, 5), 1)];
    let andons = vec![andon(&k, 1, at(7, 15), "Delivery", false)];
    let m = compute(&k, block_two(), &cycles, &andons).unwrap();
    assert_eq!(m[&1].andons, 0);
    assert!(!m[&1].responded);
    assert_eq!(m[&1].andon_type, Some(AndonPriority::Delivery));
  }

  #[test]
  fn zero_capacity_is_rejected() {
    let k = kpi();
    let cycles = vec![cycle(&k, 4, at(9, 5), 0)];
    assert!(matches!(
      compute(&k, block_two(), &cycles, &[]),
      Err(Error::ZeroCycleCapacity { sequence: 4 })
    ));
  }

  #[test]
  fn serialises_with_display_field_names() {
    let k = kpi();
    let m = compute(&k, block_two(), &[cycle(&k, 1, at(9, 5), 1)], &[]).unwrap();
    let json = serde_json::to_value(&m).unwrap();
    assert_eq!(
      json,
      serde_json::json!({
        "1": {
          "Cycles": 1,
          "Expected": 120,
          "Andons": 0,
          "Responded": true,
          "Andon_Type": null,
        }
      })
    );
  }
}
