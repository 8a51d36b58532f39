//! Insights feed — full-width list of the newest insights.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use torahav_core::gateway::Gateway;

use super::{error_line, like_badge, placeholder};
use crate::{app::App, controllers::insights::EXCERPT_CHARS};

pub fn draw<G: Gateway + 'static>(f: &mut Frame, area: Rect, app: &App<G>) {
  let feed = &app.feed;
  let block = Block::default()
    .title(" חידושים אחרונים ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Cyan));
  let inner = block.inner(area);
  f.render_widget(block, area);

  if feed.state.loading {
    f.render_widget(placeholder("Loading…"), inner);
    return;
  }
  if let Some(message) = &feed.state.error {
    f.render_widget(Paragraph::new(error_line(message)), inner);
    return;
  }
  if feed.insights().is_empty() {
    f.render_widget(placeholder("No insights yet."), inner);
    return;
  }

  let items: Vec<ListItem> = feed
    .insights()
    .iter()
    .map(|insight| {
      let source = insight
        .source
        .as_ref()
        .map(|s| format!("{} · {}", s.title, s.category))
        .unwrap_or_default();
      let header = Line::from(vec![
        like_badge(feed.list.is_liked(insight.id), insight.likes),
        Span::styled(
          format!("  {}", insight.author_label()),
          Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("  על {source}"), Style::default().fg(Color::Yellow)),
        Span::styled(
          format!("  {}", insight.created_at.format("%Y-%m-%d")),
          Style::default().fg(Color::DarkGray),
        ),
      ]);
      let mut lines = vec![header];
      lines.extend(
        insight
          .excerpt(EXCERPT_CHARS)
          .lines()
          .map(|l| Line::from(format!("  {l}"))),
      );
      lines.push(Line::from(""));
      ListItem::new(lines)
    })
    .collect();

  let mut state = ListState::default();
  state.select(Some(app.feed_cursor));
  f.render_stateful_widget(
    List::new(items).highlight_style(Style::default().bg(Color::Blue).fg(Color::White)),
    inner,
    &mut state,
  );
}
