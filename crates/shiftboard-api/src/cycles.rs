//! Handlers for `/cycles` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/cycles` | Body: [`CycleBody`]; returns 201 + stored cycle; 400 unless `parts_per > 0` |
//! | `GET`  | `/cycles` | `?kpi_id` required; optional `sequence`, `from`, `until` |
//! | `GET`  | `/cycles/{id}` | 404 if not found |
//! | `GET`  | `/cycles/block_tracker/{area}/{shift}/{d}/{block}` | Block metrics; `block` 0 picks the current block |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use shiftboard_core::{
  metrics::BlockMetrics,
  production::{Cycle, NewCycle},
  store::{CycleQuery, ProductionStore},
  time::{self, TemporalValue},
  tracker,
};
use uuid::Uuid;

use crate::{AtParams, error::ApiError};

// ─── Create ──────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /cycles`. `d` defaults to now.
#[derive(Debug, Deserialize)]
pub struct CycleBody {
  pub kpi_id:     Uuid,
  pub d:          Option<TemporalValue>,
  pub sequence:   i64,
  pub cycle_time: i64,
  pub parts_per:  i64,
  #[serde(default)]
  pub delivered:  i64,
  #[serde(default)]
  pub code:       i64,
}

/// `POST /cycles`
pub async fn create<S: ProductionStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<CycleBody>,
) -> Result<impl IntoResponse, ApiError> {
  let d = match body.d {
    Some(v) => v.into_datetime()?,
    None => time::now(),
  };
  if body.parts_per <= 0 {
    return Err(ApiError::BadRequest(format!(
      "parts_per must be positive, got {}",
      body.parts_per
    )));
  }

  if store.get_kpi(body.kpi_id).await.map_err(ApiError::store)?.is_none() {
    return Err(ApiError::BadRequest(format!("unknown kpi {}", body.kpi_id)));
  }

  let cycle = store
    .record_cycle(NewCycle {
      kpi_id: body.kpi_id,
      d,
      sequence: body.sequence,
      cycle_time: body.cycle_time,
      parts_per: body.parts_per,
      delivered: body.delivered,
      code: body.code,
    })
    .await
    .map_err(ApiError::store)?;
  tracing::debug!(cycle_id = %cycle.cycle_id, sequence = cycle.sequence, "cycle recorded");
  Ok((StatusCode::CREATED, Json(cycle)))
}

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /cycles?kpi_id=<id>[&sequence=..][&from=..][&until=..]`
pub async fn list<S: ProductionStore>(
  State(store): State<Arc<S>>,
  Query(query): Query<CycleQuery>,
) -> Result<Json<Vec<Cycle>>, ApiError> {
  let cycles = store.list_cycles(&query).await.map_err(ApiError::store)?;
  Ok(Json(cycles))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /cycles/{id}`
pub async fn get_one<S: ProductionStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Cycle>, ApiError> {
  let cycle = store
    .get_cycle(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("cycle {id} not found")))?;
  Ok(Json(cycle))
}

// ─── Block tracker ───────────────────────────────────────────────────────────

/// `GET /cycles/block_tracker/{area}/{shift}/{d}/{block}[?at=<datetime>]`
pub async fn block_tracker<S: ProductionStore>(
  State(store): State<Arc<S>>,
  Path((area, shift, d, block)): Path<(String, String, String, usize)>,
  Query(params): Query<AtParams>,
) -> Result<Json<BlockMetrics>, ApiError> {
  let metrics = tracker::block_metrics(
    store.as_ref(),
    &area,
    &shift,
    d,
    block,
    params.instant(),
  )
  .await?;
  Ok(Json(metrics))
}
