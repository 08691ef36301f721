//! Handlers for `/schedules` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/schedules` | Body: [`ScheduleBody`]; returns 201 + stored schedule |
//! | `GET`  | `/schedules/{id}` | 404 if not found |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use shiftboard_core::{
  schedule::{NewSchedule, Schedule, Slot, SlotTimes},
  store::ProductionStore,
  time::{self, TemporalValue},
};
use uuid::Uuid;

use crate::error::ApiError;

// ─── Upsert ──────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /schedules`.
///
/// Slot values may be `h:mm AM/PM`, `HH:MM:SS` or a full
/// `YYYY-MM-DD HH:MM:SS` whose date is ignored.
#[derive(Debug, Deserialize)]
pub struct ScheduleBody {
  pub area:   String,
  pub shift:  String,
  pub name:   String,
  pub start1: Option<TemporalValue>,
  pub end1:   Option<TemporalValue>,
  pub start2: Option<TemporalValue>,
  pub end2:   Option<TemporalValue>,
  pub start3: Option<TemporalValue>,
  pub end3:   Option<TemporalValue>,
  pub start4: Option<TemporalValue>,
  pub end4:   Option<TemporalValue>,
}

impl ScheduleBody {
  fn into_new_schedule(self) -> Result<NewSchedule, ApiError> {
    let raw = [
      self.start1, self.end1, self.start2, self.end2, self.start3, self.end3,
      self.start4, self.end4,
    ];

    let mut slots = SlotTimes::default();
    for (slot, value) in Slot::ALL.into_iter().zip(raw) {
      let time = value
        .map(|v| time::datetime_from_value(v).into_time())
        .transpose()
        .map_err(|e| ApiError::BadRequest(format!("{}: {e}", slot.name())))?;
      slots.set(slot, time);
    }

    Ok(NewSchedule {
      area: self.area,
      shift: self.shift,
      name: self.name,
      slots,
    })
  }
}

/// `POST /schedules`: creates or overwrites the schedule keyed by
/// `(area, shift, name)`.
pub async fn upsert<S: ProductionStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<ScheduleBody>,
) -> Result<impl IntoResponse, ApiError> {
  let input = body.into_new_schedule()?;

  if store
    .get_shift(&input.shift)
    .await
    .map_err(ApiError::store)?
    .is_none()
  {
    return Err(ApiError::BadRequest(format!(
      "unknown shift {:?}",
      input.shift
    )));
  }

  let schedule = store.upsert_schedule(input).await.map_err(ApiError::store)?;
  tracing::info!(
    schedule_id = %schedule.schedule_id,
    area = %schedule.area,
    shift = %schedule.shift.name,
    "schedule stored"
  );
  Ok((StatusCode::CREATED, Json(schedule)))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /schedules/{id}`
pub async fn get_one<S: ProductionStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Schedule>, ApiError> {
  let schedule = store
    .get_schedule(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("schedule {id} not found")))?;
  Ok(Json(schedule))
}
