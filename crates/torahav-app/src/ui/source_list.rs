//! Source list pane — left panel, plus the preview shown beside it.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use torahav_core::gateway::Gateway;

use super::{error_line, placeholder};
use crate::app::{App, Screen};

/// Render the source list into `area`.
pub fn draw<G: Gateway + 'static>(f: &mut Frame, area: Rect, app: &App<G>) {
  let list = &app.sources;
  let filtered = list.filtered();
  let category = list.category.map_or("הכל", |c| c.as_str());

  let title = if app.filter_active || !list.query.is_empty() {
    format!(" מקורות · {category} ({}/{}) ", filtered.len(), list.sources.len())
  } else {
    format!(" מקורות · {category} ({}) ", list.sources.len())
  };

  let border = if app.screen == Screen::Sources {
    Color::Cyan
  } else {
    Color::DarkGray
  };
  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(border));

  let mut inner_area = block.inner(area);
  f.render_widget(block, area);

  if list.state.loading && list.sources.is_empty() {
    f.render_widget(placeholder("Loading…"), inner_area);
    return;
  }
  if let Some(message) = &list.state.error {
    f.render_widget(Paragraph::new(error_line(message)).wrap(Wrap { trim: true }), inner_area);
    return;
  }

  // Filter bar on the last inner row.
  if (app.filter_active || !list.query.is_empty()) && inner_area.height > 2 {
    let filter_area = Rect {
      x:      inner_area.x,
      y:      inner_area.y + inner_area.height - 1,
      width:  inner_area.width,
      height: 1,
    };
    inner_area.height = inner_area.height.saturating_sub(1);

    let filter_text = if app.filter_active {
      format!("/{}_", list.query)
    } else {
      format!("/{}", list.query)
    };
    f.render_widget(
      Paragraph::new(filter_text).style(Style::default().fg(Color::Yellow)),
      filter_area,
    );
  }

  let items: Vec<ListItem> = filtered
    .iter()
    .map(|source| {
      ListItem::new(Line::from(vec![
        Span::raw(source.title.clone()),
        Span::styled(format!("  {}", source.category), Style::default().fg(Color::DarkGray)),
      ]))
    })
    .collect();

  let mut state = ListState::default();
  state.select(if filtered.is_empty() {
    None
  } else {
    Some(app.list_cursor)
  });

  f.render_stateful_widget(
    List::new(items).highlight_style(
      Style::default()
        .bg(Color::Blue)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD),
    ),
    inner_area,
    &mut state,
  );
}

/// The right-hand pane while browsing the list: the first lines of the
/// source under the cursor.
pub fn draw_preview<G: Gateway + 'static>(f: &mut Frame, area: Rect, app: &App<G>) {
  let block = Block::default()
    .title(" תצוגה מקדימה ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);

  let Some(source) = app.cursor_source() else {
    f.render_widget(placeholder("Select a source and press Enter."), inner);
    return;
  };

  let mut lines = vec![
    Line::from(Span::styled(
      source.title.clone(),
      Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )),
    Line::from(Span::styled(
      source.category.to_string(),
      Style::default().fg(Color::DarkGray),
    )),
    Line::from(""),
  ];
  lines.extend(source.paragraphs().map(|p| Line::from(p.to_owned())));

  f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}
