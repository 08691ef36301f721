//! Error type for `shiftboard-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] shiftboard_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("shift not found: {0:?}")]
  ShiftNotFound(String),

  #[error("schedule not found: {0}")]
  ScheduleNotFound(uuid::Uuid),

  #[error("kpi not found: {0}")]
  KpiNotFound(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
