//! `shiftboard`: floor board and command-line client for a shiftboard
//! server.
//!
//! # Usage
//!
//! ```text
//! shiftboard --url http://localhost:5280 board --shift Swing
//! shiftboard metrics --shift Day --date 2024-01-10 --block 2
//! shiftboard respond --shift Day --sequence 3
//! ```

mod app;
mod client;
mod ui;

use std::{collections::BTreeMap, io, path::PathBuf, time::Duration};

use anyhow::{Context, Result, anyhow};
use app::{App, KeyOutcome};
use chrono::NaiveDate;
use clap::{Args as ClapArgs, Parser, Subcommand};
use client::{ApiClient, Selector};
use crossterm::{
  event::{self, Event},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use serde::Deserialize;
use shiftboard_core::time;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const DEFAULT_URL: &str = "http://localhost:5280";
const DEFAULT_AREA: &str = "Talladega";
/// Used by `plan` when the previous day has no plan to copy.
const DEFAULT_PLAN_CYCLE_TIME: i64 = 54;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "shiftboard", about = "Floor board and client for shiftboard")]
struct Args {
  /// Path to a TOML config file (url, area, refresh_secs, labels).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the shiftboard server.
  #[arg(long, env = "SHIFTBOARD_URL")]
  url: Option<String>,

  #[command(subcommand)]
  command: Command,
}

/// Which shift plan a command is about.
#[derive(ClapArgs, Debug)]
struct Target {
  /// Production area (defaults to the config file's `area`).
  #[arg(long)]
  area: Option<String>,

  #[arg(long)]
  shift: String,

  /// Shift date, `YYYY-MM-DD`; defaults to today.
  #[arg(long)]
  date: Option<NaiveDate>,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Full-screen board of the block in progress.
  Board {
    #[command(flatten)]
    target: Target,
  },
  /// Print the shift's current block, windows and time worked.
  Status {
    #[command(flatten)]
    target: Target,
  },
  /// Print per-sequence metrics for a block (0 picks the current block).
  Metrics {
    #[command(flatten)]
    target: Target,
    #[arg(long, default_value_t = 0)]
    block:  usize,
  },
  /// Mark every open andon at a sequence as responded.
  Respond {
    #[command(flatten)]
    target:   Target,
    #[arg(long)]
    sequence: i64,
  },
  /// Create the day's plan, carrying the plan cycle time over from the
  /// previous day.
  Plan {
    #[command(flatten)]
    target:   Target,
    #[arg(long, default_value = "Regular")]
    schedule: String,
    #[arg(long, default_value_t = 0)]
    demand:   i64,
  },
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default, Debug)]
struct ConfigFile {
  #[serde(default)]
  url:          String,
  #[serde(default)]
  area:         String,
  refresh_secs: Option<u64>,
  /// Station names keyed by sequence number.
  #[serde(default)]
  labels:       BTreeMap<String, String>,
}

impl ConfigFile {
  fn labels(&self) -> Result<BTreeMap<i64, String>> {
    self
      .labels
      .iter()
      .map(|(k, v)| {
        let seq = k
          .parse()
          .with_context(|| format!("label key {k:?} is not a sequence number"))?;
        Ok((seq, v.clone()))
      })
      .collect()
  }
}

fn selector(target: Target, file_cfg: &ConfigFile) -> Selector {
  Selector {
    area:  target
      .area
      .or_else(|| (!file_cfg.area.is_empty()).then(|| file_cfg.area.clone()))
      .unwrap_or_else(|| DEFAULT_AREA.to_string()),
    shift: target.shift,
    date:  target.date.unwrap_or_else(time::today),
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  // Load config file if provided.
  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let base_url = args
    .url
    .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
    .unwrap_or_else(|| DEFAULT_URL.to_string());
  let client = ApiClient::new(base_url)?;

  match args.command {
    Command::Board { target } => {
      let sel = selector(target, &file_cfg);
      let refresh = Duration::from_secs(file_cfg.refresh_secs.unwrap_or(5).max(1));
      let app = App::new(client, sel, file_cfg.labels()?);
      run_board(app, refresh).await
    }
    Command::Status { target } => {
      let sel = selector(target, &file_cfg);
      let status = client.shift_status(&sel).await?;
      println!("{} {} {}  block {}", sel.area, sel.shift, sel.date, status.current_block);
      for (i, w) in status.windows.iter().enumerate() {
        println!("  block {}  {}  →  {}", i + 1, w.start, w.end);
      }
      println!(
        "  worked {} of {} min",
        status.elapsed / 60,
        status.available_time / 60
      );
      Ok(())
    }
    Command::Metrics { target, block } => {
      let sel = selector(target, &file_cfg);
      let labels = file_cfg.labels()?;
      let metrics = client.block_metrics(&sel, block).await?;
      println!("{:<16} {:>7} {:>9} {:>7}  andon", "sequence", "cycles", "expected", "andons");
      for row in app::rows(&metrics, &labels) {
        let andon = match row.andon {
          app::AndonState::Normal => "-".to_string(),
          app::AndonState::Open(kind) => format!("{kind:?}"),
        };
        println!(
          "{:<16} {:>7} {:>9} {:>7}  {andon}",
          row.label, row.cycles, row.expected, row.andons
        );
      }
      Ok(())
    }
    Command::Respond { target, sequence } => {
      let sel = selector(target, &file_cfg);
      let kpi = client
        .find_kpi(&sel)
        .await?
        .ok_or_else(|| anyhow!("no plan for {} {} on {}", sel.area, sel.shift, sel.date))?;
      let updated = client.respond(kpi.kpi_id, sequence, None).await?;
      println!("{updated} andon(s) responded at sequence {sequence}");
      Ok(())
    }
    Command::Plan { target, schedule, demand } => {
      let sel = selector(target, &file_cfg);
      let previous = Selector {
        date: sel.date.pred_opt().context("date out of range")?,
        ..sel.clone()
      };
      let plan_cycle_time = client
        .find_kpi(&previous)
        .await?
        .map(|k| k.plan_cycle_time)
        .unwrap_or(DEFAULT_PLAN_CYCLE_TIME);
      let kpi = client.upsert_kpi(&sel, &schedule, demand, plan_cycle_time).await?;
      println!(
        "plan {} for {} {} on {} at {}s per cycle",
        kpi.kpi_id, kpi.area, kpi.shift, kpi.d, kpi.plan_cycle_time
      );
      Ok(())
    }
  }
}

// ─── Board loop ───────────────────────────────────────────────────────────────

async fn run_board(mut app: App, refresh: Duration) -> Result<()> {
  app.refresh().await;

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  let run_result = run_event_loop(&mut terminal, &mut app, refresh).await;

  // Restore terminal regardless of result.
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  run_result
}

async fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App,
  refresh: Duration,
) -> Result<()> {
  let mut ticker = tokio::time::interval(refresh);
  ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
  // The first tick completes immediately; the board was just loaded.
  ticker.tick().await;

  loop {
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(100))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    if let Some(Event::Key(key)) = maybe_event {
      match app.handle_key(key) {
        KeyOutcome::Quit => break,
        KeyOutcome::Refresh => app.refresh().await,
        KeyOutcome::Ignore => {}
      }
    }

    if tokio::time::timeout(Duration::ZERO, ticker.tick()).await.is_ok() {
      app.refresh().await;
    }
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn config_file_labels_parse() {
    let cfg: ConfigFile = toml::from_str(
      r#"
        url = "http://floor:5280"
        refresh_secs = 10

        [labels]
        1 = "Assembly"
        2 = "Press"
      "#,
    )
    .unwrap();
    let labels = cfg.labels().unwrap();
    assert_eq!(labels[&1], "Assembly");
    assert_eq!(labels[&2], "Press");
    assert_eq!(cfg.refresh_secs, Some(10));
  }

  #[test]
  fn bad_label_key_is_an_error() {
    let cfg: ConfigFile = toml::from_str("[labels]\nfront = \"Press\"").unwrap();
    assert!(cfg.labels().is_err());
  }

  #[test]
  fn selector_prefers_flag_over_file() {
    let file = ConfigFile { area: "Leeds".into(), ..Default::default() };
    let target = Target {
      area:  None,
      shift: "Day".into(),
      date:  NaiveDate::from_ymd_opt(2024, 1, 10),
    };
    assert_eq!(selector(target, &file).area, "Leeds");

    let target = Target {
      area:  Some("Talladega".into()),
      shift: "Day".into(),
      date:  None,
    };
    let sel = selector(target, &file);
    assert_eq!(sel.area, "Talladega");
    assert_eq!(sel.date, time::today());
  }

  #[test]
  fn args_parse_subcommands() {
    let args = Args::try_parse_from([
      "shiftboard", "--url", "http://x", "metrics", "--shift", "Swing", "--block", "2",
    ])
    .unwrap();
    assert!(matches!(args.command, Command::Metrics { block: 2, .. }));
  }
}
