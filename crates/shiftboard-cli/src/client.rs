//! Async HTTP client wrapping the shiftboard JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDate, NaiveDateTime};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;
use shiftboard_core::{metrics::BlockMetrics, production::Kpi, tracker::ShiftStatus};
use uuid::Uuid;

/// The `(area, shift, date)` a board or command is about.
#[derive(Debug, Clone)]
pub struct Selector {
  pub area:  String,
  pub shift: String,
  pub date:  NaiveDate,
}

impl Selector {
  fn path(&self) -> String {
    format!("/{}/{}/{}", self.area, self.shift, self.date)
  }
}

#[derive(Deserialize)]
struct ErrorBody {
  error: String,
}

#[derive(Deserialize)]
struct RespondReply {
  updated: u64,
}

/// Async HTTP client for the shiftboard JSON REST API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client:   Client,
  base_url: String,
}

impl ApiClient {
  pub fn new(base_url: impl Into<String>) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(10))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, base_url: base_url.into() })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.base_url.trim_end_matches('/'), path)
  }

  /// Decode a success body, or turn the server's `{"error": ..}` into an
  /// error naming `what`.
  async fn decode<T: DeserializeOwned>(resp: Response, what: &str) -> Result<T> {
    let status = resp.status();
    if status.is_success() {
      return resp.json().await.with_context(|| format!("deserialising {what}"));
    }
    let detail = resp
      .json::<ErrorBody>()
      .await
      .map(|b| b.error)
      .unwrap_or_default();
    Err(anyhow!("{what} → {status}: {detail}"))
  }

  // ── KPIs ──────────────────────────────────────────────────────────────────

  /// `GET /api/kpi/{area}/{shift}/{d}`; `None` when no plan exists.
  pub async fn find_kpi(&self, sel: &Selector) -> Result<Option<Kpi>> {
    let resp = self
      .client
      .get(self.url(&format!("/kpi{}", sel.path())))
      .send()
      .await
      .context("GET /kpi failed")?;
    if resp.status() == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    Self::decode(resp, "kpi").await.map(Some)
  }

  /// `POST /api/kpi`
  pub async fn upsert_kpi(
    &self,
    sel: &Selector,
    schedule: &str,
    demand: i64,
    plan_cycle_time: i64,
  ) -> Result<Kpi> {
    let resp = self
      .client
      .post(self.url("/kpi"))
      .json(&json!({
        "area": sel.area,
        "shift": sel.shift,
        "d": sel.date,
        "demand": demand,
        "plan_cycle_time": plan_cycle_time,
        "schedule": schedule,
      }))
      .send()
      .await
      .context("POST /kpi failed")?;
    Self::decode(resp, "kpi").await
  }

  /// `GET /api/kpi/{area}/{shift}/{d}/status`
  pub async fn shift_status(&self, sel: &Selector) -> Result<ShiftStatus> {
    let resp = self
      .client
      .get(self.url(&format!("/kpi{}/status", sel.path())))
      .send()
      .await
      .context("GET /kpi/.../status failed")?;
    Self::decode(resp, "shift status").await
  }

  // ── Cycles ────────────────────────────────────────────────────────────────

  /// `GET /api/cycles/block_tracker/{area}/{shift}/{d}/{block}`
  pub async fn block_metrics(&self, sel: &Selector, block: usize) -> Result<BlockMetrics> {
    let resp = self
      .client
      .get(self.url(&format!("/cycles/block_tracker{}/{block}", sel.path())))
      .send()
      .await
      .context("GET /cycles/block_tracker failed")?;
    Self::decode(resp, "block metrics").await
  }

  // ── Andons ────────────────────────────────────────────────────────────────

  /// `POST /api/andon/respond`; returns how many andons were open.
  pub async fn respond(
    &self,
    kpi_id: Uuid,
    sequence: i64,
    at: Option<NaiveDateTime>,
  ) -> Result<u64> {
    let resp = self
      .client
      .post(self.url("/andon/respond"))
      .json(&json!({ "kpi_id": kpi_id, "sequence": sequence, "response_d": at }))
      .send()
      .await
      .context("POST /andon/respond failed")?;
    Self::decode::<RespondReply>(resp, "andon response")
      .await
      .map(|r| r.updated)
  }
}
