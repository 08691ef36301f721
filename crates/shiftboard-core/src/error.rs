//! Error types for `shiftboard-core`.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// No shift-plan record matches the `(area, shift, date)` selector.
  #[error("no matching plan for {area}/{shift} on {date}")]
  KpiNotFound {
    area:  String,
    shift: String,
    date:  NaiveDate,
  },

  #[error("schedule not found: {0}")]
  ScheduleNotFound(uuid::Uuid),

  /// The requested block has no resolved window.
  #[error("block {block} is out of range; schedule defines {available} block(s)")]
  InvalidBlock { block: usize, available: usize },

  #[error("malformed input: {0:?}")]
  MalformedInput(String),

  /// A sequence was derived from cycle events yet none could be found for it.
  #[error("no cycle event recorded for sequence {0}")]
  MissingPartsPer(i64),

  #[error("plan cycle time times parts-per is not positive for sequence {sequence}")]
  ZeroCycleCapacity { sequence: i64 },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
