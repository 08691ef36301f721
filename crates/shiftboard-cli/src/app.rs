//! Board state: the latest metrics for one shift and how to display them.

use std::collections::BTreeMap;

use chrono::{Local, NaiveDateTime};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use shiftboard_core::{
  metrics::{AndonPriority, BlockMetrics, SequenceMetrics},
  tracker::{AUTO_BLOCK, ShiftStatus},
};

use crate::client::{ApiClient, Selector};

// ─── Rows ─────────────────────────────────────────────────────────────────────

/// What the andon cell of a row shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AndonState {
  Normal,
  Open(AndonPriority),
}

/// One display row per sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardRow {
  pub label:    String,
  pub cycles:   u64,
  pub expected: i64,
  pub andons:   u64,
  pub andon:    AndonState,
}

impl BoardRow {
  fn new(label: String, m: &SequenceMetrics) -> Self {
    let andon = match (m.responded, m.andon_type) {
      (true, _) => AndonState::Normal,
      (false, kind) => AndonState::Open(kind.unwrap_or(AndonPriority::NoType)),
    };
    Self {
      label,
      cycles: m.cycles,
      expected: m.expected,
      andons: m.andons,
      andon,
    }
  }

  /// Progress toward the block target, clamped to `0.0..=1.0`.
  pub fn ratio(&self) -> f64 {
    if self.expected <= 0 {
      return 0.0;
    }
    (self.cycles as f64 / self.expected as f64).clamp(0.0, 1.0)
  }
}

/// Pair metrics with station labels; unlabelled sequences show their number.
pub fn rows(metrics: &BlockMetrics, labels: &BTreeMap<i64, String>) -> Vec<BoardRow> {
  metrics
    .iter()
    .map(|(seq, m)| {
      let label = labels
        .get(seq)
        .cloned()
        .unwrap_or_else(|| format!("Sequence {seq}"));
      BoardRow::new(label, m)
    })
    .collect()
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level board state.
pub struct App {
  pub selector:     Selector,
  pub labels:       BTreeMap<i64, String>,
  pub rows:         Vec<BoardRow>,
  pub status:       Option<ShiftStatus>,
  pub refreshed_at: Option<NaiveDateTime>,
  /// One-line status message shown in the status bar.
  pub status_msg:   String,
  client:           ApiClient,
}

impl App {
  pub fn new(client: ApiClient, selector: Selector, labels: BTreeMap<i64, String>) -> Self {
    Self {
      selector,
      labels,
      rows: Vec::new(),
      status: None,
      refreshed_at: None,
      status_msg: String::new(),
      client,
    }
  }

  /// Re-fetch status and metrics for the block in progress. Failures are
  /// shown in the status bar and leave the previous rows on screen.
  pub async fn refresh(&mut self) {
    match self.fetch().await {
      Ok((status, metrics)) => {
        self.rows = rows(&metrics, &self.labels);
        self.status = Some(status);
        self.refreshed_at = Some(Local::now().naive_local());
        self.status_msg.clear();
      }
      Err(e) => {
        tracing::debug!(error = %e, "board refresh failed");
        self.status_msg = format!("{e:#}");
      }
    }
  }

  async fn fetch(&self) -> anyhow::Result<(ShiftStatus, BlockMetrics)> {
    let status = self.client.shift_status(&self.selector).await?;
    let metrics = self.client.block_metrics(&self.selector, AUTO_BLOCK).await?;
    Ok((status, metrics))
  }

  /// Map a key press to a board action.
  pub fn handle_key(&self, key: KeyEvent) -> KeyOutcome {
    match key.code {
      KeyCode::Char('q') | KeyCode::Esc => KeyOutcome::Quit,
      KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
        KeyOutcome::Quit
      }
      KeyCode::Char('r') => KeyOutcome::Refresh,
      _ => KeyOutcome::Ignore,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
  Quit,
  Refresh,
  Ignore,
}
