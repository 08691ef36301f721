//! Handlers for `/kpi` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/kpi` | Body: [`KpiBody`]; returns 201 + stored KPI; 400 unless `plan_cycle_time > 0` |
//! | `GET`  | `/kpi/{id}` | 404 if not found |
//! | `GET`  | `/kpi/{area}/{shift}/{d}` | 404 if no plan for that date |
//! | `GET`  | `/kpi/{area}/{shift}/{d}/status` | [`ShiftStatus`]; optional `?at=` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use shiftboard_core::{
  production::{Kpi, NewKpi},
  store::ProductionStore,
  time::TemporalValue,
  tracker::{self, ShiftStatus},
};
use uuid::Uuid;

use crate::{AtParams, error::ApiError};

// ─── Upsert ──────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /kpi`. The schedule is named, not referenced
/// by id, and must exist for the same `(area, shift)`.
#[derive(Debug, Deserialize)]
pub struct KpiBody {
  pub area:            String,
  pub shift:           String,
  pub d:               TemporalValue,
  #[serde(default)]
  pub demand:          i64,
  pub plan_cycle_time: i64,
  pub schedule:        String,
}

/// `POST /kpi`: creates or overwrites the plan for `(area, shift, d)`.
pub async fn upsert<S: ProductionStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<KpiBody>,
) -> Result<impl IntoResponse, ApiError> {
  let d = body.d.into_date()?;
  if body.plan_cycle_time <= 0 {
    return Err(ApiError::BadRequest(format!(
      "plan_cycle_time must be positive, got {}",
      body.plan_cycle_time
    )));
  }

  let schedule = store
    .find_schedule(&body.area, &body.shift, &body.schedule)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| {
      ApiError::BadRequest(format!(
        "unknown schedule {:?} for {}/{}",
        body.schedule, body.area, body.shift
      ))
    })?;

  let kpi = store
    .upsert_kpi(NewKpi {
      area: body.area,
      shift: body.shift,
      d,
      demand: body.demand,
      plan_cycle_time: body.plan_cycle_time,
      schedule_id: schedule.schedule_id,
    })
    .await
    .map_err(ApiError::store)?;
  tracing::info!(kpi_id = %kpi.kpi_id, d = %kpi.d, "kpi stored");
  Ok((StatusCode::CREATED, Json(kpi)))
}

// ─── Lookup ──────────────────────────────────────────────────────────────────

/// `GET /kpi/{id}`
pub async fn get_one<S: ProductionStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Kpi>, ApiError> {
  let kpi = store
    .get_kpi(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("kpi {id} not found")))?;
  Ok(Json(kpi))
}

/// `GET /kpi/{area}/{shift}/{d}`
pub async fn find<S: ProductionStore>(
  State(store): State<Arc<S>>,
  Path((area, shift, d)): Path<(String, String, String)>,
) -> Result<Json<Kpi>, ApiError> {
  let date = TemporalValue::from(d).into_date()?;
  let kpi = store
    .find_kpi(&area, &shift, date)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| {
      ApiError::NotFound(format!("no plan for {area}/{shift} on {date}"))
    })?;
  Ok(Json(kpi))
}

/// `GET /kpi/{area}/{shift}/{d}/status[?at=<datetime>]`
pub async fn status<S: ProductionStore>(
  State(store): State<Arc<S>>,
  Path((area, shift, d)): Path<(String, String, String)>,
  Query(params): Query<AtParams>,
) -> Result<Json<ShiftStatus>, ApiError> {
  let status =
    tracker::shift_status(store.as_ref(), &area, &shift, d, params.instant())
      .await?;
  Ok(Json(status))
}
