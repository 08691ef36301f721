//! Handlers for `/andon` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/andon` | Body: [`AndonBody`]; returns 201 + stored andon |
//! | `GET`  | `/andon` | `?kpi_id` required; optional `sequence`, `from`, `until`, `responded` |
//! | `GET`  | `/andon/{id}` | 404 if not found |
//! | `POST` | `/andon/respond` | Body: [`RespondBody`]; returns `{"updated": n}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use shiftboard_core::{
  production::{Andon, NewAndon},
  store::{AndonQuery, ProductionStore},
  time::{self, TemporalValue},
  tracker,
};
use uuid::Uuid;

use crate::error::ApiError;

// ─── Create ──────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /andon`. `d` defaults to now.
#[derive(Debug, Deserialize)]
pub struct AndonBody {
  pub kpi_id:     Uuid,
  pub d:          Option<TemporalValue>,
  pub sequence:   i64,
  pub andon_type: String,
}

/// `POST /andon`
pub async fn create<S: ProductionStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<AndonBody>,
) -> Result<impl IntoResponse, ApiError> {
  let d = match body.d {
    Some(v) => v.into_datetime()?,
    None => time::now(),
  };

  if store.get_kpi(body.kpi_id).await.map_err(ApiError::store)?.is_none() {
    return Err(ApiError::BadRequest(format!("unknown kpi {}", body.kpi_id)));
  }

  let andon = store
    .record_andon(NewAndon {
      kpi_id: body.kpi_id,
      d,
      sequence: body.sequence,
      andon_type: body.andon_type,
    })
    .await
    .map_err(ApiError::store)?;
  tracing::info!(
    andon_id = %andon.andon_id,
    sequence = andon.sequence,
    andon_type = %andon.andon_type,
    "andon raised"
  );
  Ok((StatusCode::CREATED, Json(andon)))
}

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /andon?kpi_id=<id>[&sequence=..][&responded=false]`
pub async fn list<S: ProductionStore>(
  State(store): State<Arc<S>>,
  Query(query): Query<AndonQuery>,
) -> Result<Json<Vec<Andon>>, ApiError> {
  let andons = store.list_andons(&query).await.map_err(ApiError::store)?;
  Ok(Json(andons))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /andon/{id}`
pub async fn get_one<S: ProductionStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Andon>, ApiError> {
  let andon = store
    .get_andon(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("andon {id} not found")))?;
  Ok(Json(andon))
}

// ─── Respond ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RespondBody {
  pub kpi_id:     Uuid,
  pub sequence:   i64,
  /// Defaults to now.
  pub response_d: Option<TemporalValue>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RespondReply {
  pub updated: u64,
}

/// `POST /andon/respond`: marks every open andon at the sequence responded.
pub async fn respond<S: ProductionStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<RespondBody>,
) -> Result<Json<RespondReply>, ApiError> {
  let at = match body.response_d {
    Some(v) => v.into_datetime()?,
    None => time::now(),
  };
  let updated =
    tracker::respond(store.as_ref(), body.kpi_id, body.sequence, at).await?;
  Ok(Json(RespondReply { updated }))
}
