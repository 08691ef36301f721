//! JSON REST API for shiftboard.
//!
//! Exposes an axum [`Router`] backed by any
//! [`shiftboard_core::store::ProductionStore`]. Auth, TLS, and transport
//! concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", shiftboard_api::api_router(store.clone()))
//! ```

pub mod andons;
pub mod cycles;
pub mod error;
pub mod kpi;
pub mod schedules;
pub mod shifts;


use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use chrono::NaiveDateTime;
use serde::Deserialize;
use shiftboard_core::store::ProductionStore;

pub use error::ApiError;

/// Optional `?at=` override for endpoints that read the plant clock.
#[derive(Debug, Default, Deserialize)]
pub struct AtParams {
  pub at: Option<NaiveDateTime>,
}

impl AtParams {
  pub fn instant(&self) -> NaiveDateTime {
    self.at.unwrap_or_else(shiftboard_core::time::now)
  }
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: ProductionStore + 'static,
{
  Router::new()
    // Shifts
    .route("/shifts", get(shifts::list::<S>).post(shifts::put::<S>))
    // Schedules
    .route("/schedules", post(schedules::upsert::<S>))
    .route("/schedules/{id}", get(schedules::get_one::<S>))
    // KPIs
    .route("/kpi", post(kpi::upsert::<S>))
    .route("/kpi/{id}", get(kpi::get_one::<S>))
    .route("/kpi/{area}/{shift}/{d}", get(kpi::find::<S>))
    .route("/kpi/{area}/{shift}/{d}/status", get(kpi::status::<S>))
    // Cycles
    .route("/cycles", get(cycles::list::<S>).post(cycles::create::<S>))
    .route("/cycles/{id}", get(cycles::get_one::<S>))
    .route(
      "/cycles/block_tracker/{area}/{shift}/{d}/{block}",
      get(cycles::block_tracker::<S>),
    )
    // Andons
    .route("/andon", get(andons::list::<S>).post(andons::create::<S>))
    .route("/andon/respond", post(andons::respond::<S>))
    .route("/andon/{id}", get(andons::get_one::<S>))
    .with_state(store)
}
