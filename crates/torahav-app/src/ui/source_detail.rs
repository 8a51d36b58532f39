//! Source detail pane — the text, the insights on it, and the composer.

use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use torahav_core::gateway::Gateway;

use super::{error_line, like_badge, placeholder};
use crate::app::App;

/// Render the open source into `area`.
pub fn draw<G: Gateway + 'static>(f: &mut Frame, area: Rect, app: &App<G>) {
  let Some(detail) = app.detail.as_ref() else {
    return;
  };

  let title = detail
    .source
    .as_ref()
    .map_or_else(|| " … ".to_owned(), |s| format!(" {} · {} ", s.title, s.category));
  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Cyan));
  let inner = block.inner(area);
  f.render_widget(block, area);

  if detail.state.loading {
    f.render_widget(placeholder("Loading…"), inner);
    return;
  }
  let Some(source) = detail.source.as_ref() else {
    let message = detail.state.error.as_deref().unwrap_or_default();
    f.render_widget(Paragraph::new(error_line(message)), inner);
    return;
  };

  let composer_height = if app.composing { 5 } else { 0 };
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Percentage(40),          // text
      Constraint::Min(3),                  // insights
      Constraint::Length(composer_height), // composer
    ])
    .split(inner);

  // Text.
  let text: Vec<Line> = source.paragraphs().map(|p| Line::from(p.to_owned())).collect();
  f.render_widget(Paragraph::new(text).wrap(Wrap { trim: false }), rows[0]);

  // Insights.
  let heading = format!(" חידושים ({}) ", detail.insights().len());
  let insights_block = Block::default()
    .title(heading)
    .borders(Borders::TOP)
    .border_style(Style::default().fg(Color::DarkGray));
  let list_area = insights_block.inner(rows[1]);
  f.render_widget(insights_block, rows[1]);

  if detail.insights().is_empty() {
    f.render_widget(placeholder("No insights yet. Press i to write the first."), list_area);
  } else {
    let items: Vec<ListItem> = detail
      .insights()
      .iter()
      .map(|insight| {
        let header = Line::from(vec![
          like_badge(detail.list.is_liked(insight.id), insight.likes),
          Span::styled(
            format!("  {}", insight.author_label()),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
          ),
          Span::styled(
            format!("  {}", insight.created_at.format("%Y-%m-%d")),
            Style::default().fg(Color::DarkGray),
          ),
        ]);
        let mut lines = vec![header];
        lines.extend(insight.content.lines().map(|l| Line::from(format!("  {l}"))));
        ListItem::new(lines)
      })
      .collect();

    let mut state = ListState::default();
    state.select(Some(app.detail_cursor));
    f.render_stateful_widget(
      List::new(items).highlight_style(Style::default().bg(Color::Blue).fg(Color::White)),
      list_area,
      &mut state,
    );
  }

  // Composer.
  if app.composing {
    let composer = Block::default()
      .title(if detail.submitting { " Posting… " } else { " New insight " })
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow));
    f.render_widget(
      Paragraph::new(format!("{}_", detail.draft))
        .block(composer)
        .wrap(Wrap { trim: false }),
      rows[2],
    );
  }
}
