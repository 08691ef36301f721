//! TUI rendering for the floor board.

use chrono::Local;
use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Gauge, Paragraph},
};
use shiftboard_core::metrics::AndonPriority;

use crate::app::{AndonState, App, BoardRow};

const ROW_HEIGHT: u16 = 3;

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw(f: &mut Frame, app: &App) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // board
      Constraint::Length(1), // status bar
    ])
    .split(f.area());

  draw_header(f, rows[0], app);
  draw_board(f, rows[1], app);
  draw_status(f, rows[2], app);
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
  let block = app
    .status
    .as_ref()
    .map(|s| format!("Block {}", s.current_block))
    .unwrap_or_else(|| "Block ?".to_string());
  let text = format!(
    " {} Shift    {}    {}    {} ",
    app.selector.shift,
    Local::now().format("%I:%M %p"),
    block,
    app.selector.area,
  );

  f.render_widget(
    Paragraph::new(Line::from(Span::styled(
      text,
      Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center)
    .style(Style::default().bg(Color::DarkGray)),
    area,
  );
}

// ─── Board ────────────────────────────────────────────────────────────────────

fn draw_board(f: &mut Frame, area: Rect, app: &App) {
  if app.rows.is_empty() {
    f.render_widget(
      Paragraph::new("No cycles recorded for this shift yet.")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center),
      area,
    );
    return;
  }

  let constraints = app
    .rows
    .iter()
    .map(|_| Constraint::Length(ROW_HEIGHT))
    .chain(std::iter::once(Constraint::Min(0)));
  let slots = Layout::default()
    .direction(Direction::Vertical)
    .constraints(constraints)
    .split(area);

  for (row, slot) in app.rows.iter().zip(slots.iter()) {
    draw_row(f, *slot, row);
  }
}

fn draw_row(f: &mut Frame, area: Rect, row: &BoardRow) {
  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(75), Constraint::Percentage(25)])
    .split(area);

  let gauge = Gauge::default()
    .block(Block::default().borders(Borders::ALL))
    .gauge_style(Style::default().fg(Color::Red).bg(Color::Blue))
    .ratio(row.ratio())
    .label(format!("{}  {}/{}", row.label, row.cycles, row.expected));
  f.render_widget(gauge, cols[0]);

  let (text, bg) = match row.andon {
    AndonState::Normal => ("Normal", Color::Green),
    AndonState::Open(kind) => ("ANDON", andon_color(kind)),
  };
  let fg = if bg == Color::White { Color::Black } else { Color::White };
  f.render_widget(
    Paragraph::new(text)
      .alignment(Alignment::Center)
      .block(Block::default().borders(Borders::ALL))
      .style(Style::default().fg(fg).bg(bg).add_modifier(Modifier::BOLD)),
    cols[1],
  );
}

fn andon_color(kind: AndonPriority) -> Color {
  match kind {
    AndonPriority::Safety => Color::Red,
    AndonPriority::Quality => Color::White,
    AndonPriority::Delivery | AndonPriority::NoType => Color::Blue,
  }
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
  let detail = if !app.status_msg.is_empty() {
    app.status_msg.clone()
  } else if let Some(status) = &app.status {
    let worked = status.elapsed / 60;
    let total = status.available_time / 60;
    let at = app
      .refreshed_at
      .map(|t| t.format("%H:%M:%S").to_string())
      .unwrap_or_default();
    format!("{worked}/{total} min worked  updated {at}  r refresh  q quit")
  } else {
    "loading…  q quit".to_string()
  };

  let mode_span = Span::styled(
    format!(" {} ", app.selector.date),
    Style::default()
      .fg(Color::Black)
      .bg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  );
  let hint_span = Span::styled(format!("  {detail}"), Style::default().fg(Color::DarkGray));

  f.render_widget(
    Paragraph::new(Line::from(vec![mode_span, hint_span]))
      .style(Style::default().bg(Color::Black)),
    area,
  );
}
