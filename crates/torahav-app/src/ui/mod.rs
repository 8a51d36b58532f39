//! TUI rendering — orchestrates all panes.

pub mod insight_feed;
pub mod source_detail;
pub mod source_list;

use chrono::Local;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Paragraph},
};
use torahav_core::gateway::Gateway;

use crate::app::{App, Screen};

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw<G: Gateway + 'static>(f: &mut Frame, app: &App<G>) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(f.area());

  draw_header(f, rows[0], app);
  draw_body(f, rows[1], app);
  draw_status(f, rows[2], app);
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header<G: Gateway + 'static>(f: &mut Frame, area: Rect, app: &App<G>) {
  let date = Local::now().format("%Y-%m-%d").to_string();
  let who = match app.session.current() {
    Some(session) => session.user.email.unwrap_or_else(|| session.user.id.to_string()),
    None => "signed out".to_owned(),
  };

  let left = Span::styled(
    " תורה אב  [Tab] sources/insights  [q] quit",
    Style::default()
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  );
  let right = Span::styled(format!("{who}  {date} "), Style::default().fg(Color::Gray));

  let left_width = left.content.chars().count() as u16;
  let right_width = right.content.chars().count() as u16;
  let pad = area
    .width
    .saturating_sub(left_width)
    .saturating_sub(right_width);

  let line = Line::from(vec![left, Span::raw(" ".repeat(pad as usize)), right]);

  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(line), inner);
}

// ─── Body ─────────────────────────────────────────────────────────────────────

fn draw_body<G: Gateway + 'static>(f: &mut Frame, area: Rect, app: &App<G>) {
  match app.screen {
    Screen::Insights => insight_feed::draw(f, area, app),
    Screen::Sources | Screen::SourceDetail => {
      let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(area);
      source_list::draw(f, cols[0], app);
      match app.screen {
        Screen::SourceDetail => source_detail::draw(f, cols[1], app),
        _ => source_list::draw_preview(f, cols[1], app),
      }
    }
  }
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status<G: Gateway + 'static>(f: &mut Frame, area: Rect, app: &App<G>) {
  let (mode_label, hints) = match app.screen {
    _ if app.filter_active => ("SEARCH", "Type to filter  Esc cancel  Enter select"),
    _ if app.composing => ("WRITE", "Type your insight  Alt-Enter newline  Enter post  Esc cancel"),
    Screen::Sources => (
      "SOURCES",
      "↑↓/jk navigate  / search  c category  Enter open  a add  r reload",
    ),
    Screen::SourceDetail => (
      "SOURCE",
      "↑↓/jk select  Space like  i write insight  r reload  Esc back",
    ),
    Screen::Insights => ("INSIGHTS", "↑↓/jk navigate  Space like  Enter open source  r reload"),
  };

  let status = if app.status_msg.is_empty() {
    hints.to_string()
  } else {
    app.status_msg.clone()
  };

  let mode_span = Span::styled(
    format!(" {mode_label} "),
    Style::default()
      .fg(Color::Black)
      .bg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  );
  let hint_span = Span::styled(format!("  {status}"), Style::default().fg(Color::Gray));

  f.render_widget(
    Paragraph::new(Line::from(vec![mode_span, hint_span])).style(Style::default().bg(Color::Black)),
    area,
  );
}

/// A greyed-out one-liner for empty and loading panes.
fn placeholder(text: &str) -> Paragraph<'_> {
  Paragraph::new(text).style(Style::default().fg(Color::DarkGray))
}

/// An error banner line.
fn error_line(message: &str) -> Line<'_> {
  Line::from(Span::styled(message, Style::default().fg(Color::Red)))
}

/// `♥ N` in red when liked, `♡ N` otherwise.
fn like_badge(liked: bool, likes: u32) -> Span<'static> {
  if liked {
    Span::styled(format!("♥ {likes}"), Style::default().fg(Color::Red))
  } else {
    Span::styled(format!("♡ {likes}"), Style::default().fg(Color::Gray))
  }
}
