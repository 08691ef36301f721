//! Handlers for `/shifts` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/shifts` | Every shift with its rollover rule |
//! | `POST` | `/shifts` | Body: [`Shift`]; creates or replaces by name; rollover hour 0-23 |

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use shiftboard_core::{schedule::Shift, store::ProductionStore};

use crate::error::ApiError;

/// `GET /shifts`
pub async fn list<S: ProductionStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Shift>>, ApiError> {
  let shifts = store.list_shifts().await.map_err(ApiError::store)?;
  Ok(Json(shifts))
}

/// `POST /shifts`, body: `{"name":"Swing","rollover_through_hour":3}`
pub async fn put<S: ProductionStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<Shift>,
) -> Result<impl IntoResponse, ApiError> {
  if body.name.trim().is_empty() {
    return Err(ApiError::BadRequest("shift name must not be empty".into()));
  }
  if let Some(hour) = body.rollover_through_hour.filter(|h| *h > 23) {
    return Err(ApiError::BadRequest(format!(
      "rollover_through_hour must be 0-23, got {hour}"
    )));
  }
  let shift = store.put_shift(body).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(shift)))
}
