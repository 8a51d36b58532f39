//! Application state machine and event dispatcher for `torahav browse`.
//!
//! Key handling never awaits: every gateway call is spawned on the runtime
//! and its result comes back as an [`AppEvent`] on the channel the event
//! loop drains between frames.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc::UnboundedSender;
use torahav_core::{
  gateway::Gateway,
  likes::{PendingLike, ToggleDecision},
  model::{Category, Insight, Source},
  route::Route,
};
use tracing::debug;
use uuid::Uuid;

use crate::{
  controllers::{
    InsightsFeed, Outcome, SourceDetail, SourcesList,
    insights::FeedData,
    likes,
    source_detail::{DetailData, Submission},
  },
  session::SessionStore,
};

// ─── Screen ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
  /// The sources list, with the selected source previewed on the right.
  Sources,
  /// One source with its insights.
  SourceDetail,
  /// The recent-insights feed.
  Insights,
}

/// Which page a like toggle belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeTarget {
  Detail(Uuid),
  Feed,
}

/// Results of spawned gateway calls.
#[derive(Debug)]
pub enum AppEvent<E> {
  SourcesLoaded {
    category: Option<Category>,
    result:   Result<Vec<Source>, E>,
  },
  DetailLoaded {
    source_id: Uuid,
    result:    Result<DetailData, E>,
  },
  FeedLoaded(Result<FeedData, E>),
  LikeSettled {
    target:    LikeTarget,
    pending:   PendingLike,
    succeeded: bool,
  },
  InsightPosted {
    source_id: Uuid,
    result:    Result<Insight, E>,
  },
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App<G: Gateway + 'static> {
  /// Current screen / keyboard focus.
  pub screen: Screen,

  pub session: Arc<SessionStore<G>>,

  pub sources: SourcesList<G>,

  /// The open source page, if any. Results for any other source are dropped.
  pub detail: Option<SourceDetail<G>>,

  pub feed: InsightsFeed<G>,

  /// Whether the user is typing a title filter.
  pub filter_active: bool,

  /// Whether the user is typing an insight.
  pub composing: bool,

  /// Cursor within the *filtered* source list.
  pub list_cursor: usize,

  /// Cursor within the open source's insights.
  pub detail_cursor: usize,

  /// Cursor within the feed.
  pub feed_cursor: usize,

  /// One-line status message shown in the status bar.
  pub status_msg: String,

  events: UnboundedSender<AppEvent<G::Error>>,
}

impl<G: Gateway + 'static> App<G> {
  pub fn new(session: Arc<SessionStore<G>>, events: UnboundedSender<AppEvent<G::Error>>) -> Self {
    Self {
      screen: Screen::Sources,
      sources: SourcesList::new(Arc::clone(&session)),
      detail: None,
      feed: InsightsFeed::new(Arc::clone(&session)),
      session,
      filter_active: false,
      composing: false,
      list_cursor: 0,
      detail_cursor: 0,
      feed_cursor: 0,
      status_msg: String::new(),
      events,
    }
  }

  fn gateway(&self) -> Arc<G> { Arc::clone(self.session.gateway()) }

  // ── Spawned loads ─────────────────────────────────────────────────────────

  pub fn load_sources(&mut self) {
    let category = self.sources.begin_load();
    let gateway = self.gateway();
    let events = self.events.clone();
    tokio::spawn(async move {
      let result = SourcesList::fetch(gateway, category).await;
      events.send(AppEvent::SourcesLoaded { category, result }).ok();
    });
  }

  fn load_detail(&mut self) {
    let Some(detail) = self.detail.as_mut() else {
      return;
    };
    if !detail.begin_load() {
      self.status_msg = "Reload after the like completes".into();
      return;
    }
    let source_id = detail.source_id;
    let session = Arc::clone(&self.session);
    let events = self.events.clone();
    tokio::spawn(async move {
      let result = SourceDetail::fetch(session, source_id).await;
      events.send(AppEvent::DetailLoaded { source_id, result }).ok();
    });
  }

  fn load_feed(&mut self) {
    if !self.feed.begin_load() {
      self.status_msg = "Reload after the like completes".into();
      return;
    }
    let session = Arc::clone(&self.session);
    let events = self.events.clone();
    tokio::spawn(async move {
      let result = InsightsFeed::fetch(session).await;
      events.send(AppEvent::FeedLoaded(result)).ok();
    });
  }

  // ── Results ───────────────────────────────────────────────────────────────

  pub fn handle_event(&mut self, event: AppEvent<G::Error>) {
    match event {
      AppEvent::SourcesLoaded { category, result } => {
        if self.sources.apply(category, result) {
          self.list_cursor = 0;
        } else {
          debug!(?category, "dropping sources for a previous filter");
        }
      }
      AppEvent::DetailLoaded { source_id, result } => match self.open_detail_for(source_id) {
        Some(detail) => {
          detail.apply(result);
          self.detail_cursor = 0;
        }
        None => debug!(%source_id, "dropping load for a closed source page"),
      },
      AppEvent::FeedLoaded(result) => {
        self.feed.apply(result);
        self.feed_cursor = 0;
      }
      AppEvent::LikeSettled { target, pending, succeeded } => {
        let outcome = match target {
          LikeTarget::Feed => self.feed.settle_like(&pending, succeeded),
          LikeTarget::Detail(source_id) => match self.open_detail_for(source_id) {
            Some(detail) => detail.settle_like(&pending, succeeded),
            None => Outcome::Stay,
          },
        };
        self.apply_outcome(outcome);
      }
      AppEvent::InsightPosted { source_id, result } => {
        let outcome = match self.open_detail_for(source_id) {
          Some(detail) => detail.finish_submit(result),
          None => Outcome::Stay,
        };
        self.apply_outcome(outcome);
      }
    }
  }

  fn open_detail_for(&mut self, source_id: Uuid) -> Option<&mut SourceDetail<G>> {
    self.detail.as_mut().filter(|d| d.source_id == source_id)
  }

  fn apply_outcome(&mut self, outcome: Outcome) {
    match outcome {
      Outcome::Stay => {}
      Outcome::Alert(message) => self.status_msg = message,
      Outcome::Navigate(route) => self.navigate(route),
    }
  }

  fn navigate(&mut self, route: Route) {
    match route {
      Route::Home | Route::Sources => self.show_sources(),
      Route::Insights => self.open_feed(),
      Route::SourceDetail(id) => self.open_detail(id),
      Route::Login => self.status_msg = "Sign in first: torahav login".into(),
      other => self.status_msg = format!("{other} is only available from the command line"),
    }
  }

  // ── Screens ───────────────────────────────────────────────────────────────

  fn show_sources(&mut self) {
    self.screen = Screen::Sources;
    self.detail = None;
    self.composing = false;
  }

  fn open_detail(&mut self, source_id: Uuid) {
    self.detail = Some(SourceDetail::new(Arc::clone(&self.session), source_id));
    self.detail_cursor = 0;
    self.composing = false;
    self.screen = Screen::SourceDetail;
    self.load_detail();
  }

  fn open_feed(&mut self) {
    self.screen = Screen::Insights;
    self.detail = None;
    self.composing = false;
    self.load_feed();
  }

  // ── Cursors ───────────────────────────────────────────────────────────────

  /// The source under the list cursor in the filtered view, if any.
  pub fn cursor_source(&self) -> Option<&Source> {
    self.sources.filtered().get(self.list_cursor).copied()
  }

  pub fn cursor_detail_insight(&self) -> Option<&Insight> {
    self.detail.as_ref()?.insights().get(self.detail_cursor)
  }

  pub fn cursor_feed_insight(&self) -> Option<&Insight> {
    self.feed.insights().get(self.feed_cursor)
  }

  // ── Actions ───────────────────────────────────────────────────────────────

  fn toggle_like(&mut self, target: LikeTarget, insight_id: Uuid) {
    let decision = match target {
      LikeTarget::Feed => self.feed.request_like(insight_id),
      LikeTarget::Detail(source_id) => match self.open_detail_for(source_id) {
        Some(detail) => detail.request_like(insight_id),
        None => return,
      },
    };
    match decision {
      ToggleDecision::Ignored => {}
      ToggleDecision::LoginRequired => self.navigate(Route::Login),
      ToggleDecision::Issue(pending) => {
        let gateway = self.gateway();
        let events = self.events.clone();
        tokio::spawn(async move {
          let succeeded = likes::perform(&*gateway, pending).await;
          events.send(AppEvent::LikeSettled { target, pending, succeeded }).ok();
        });
      }
    }
  }

  fn submit_insight(&mut self) {
    let Some(detail) = self.detail.as_mut() else {
      return;
    };
    let source_id = detail.source_id;
    match detail.begin_submit() {
      Submission::Skip => {}
      Submission::LoginRequired => self.navigate(Route::Login),
      Submission::Send(input) => {
        let gateway = self.gateway();
        let events = self.events.clone();
        tokio::spawn(async move {
          let result = SourceDetail::send(gateway, input).await;
          events.send(AppEvent::InsightPosted { source_id, result }).ok();
        });
      }
    }
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub fn handle_key(&mut self, key: KeyEvent) -> bool {
    // Global: Ctrl-C quits from anywhere.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return false;
    }

    if self.filter_active {
      self.handle_filter_key(key);
      return true;
    }
    if self.composing {
      self.handle_compose_key(key);
      return true;
    }

    // Any other key clears a stale message.
    self.status_msg.clear();

    match key.code {
      KeyCode::Char('q') => return false,
      KeyCode::Tab => {
        match self.screen {
          Screen::Insights => self.show_sources(),
          _ => self.open_feed(),
        }
        return true;
      }
      _ => {}
    }

    match self.screen {
      Screen::Sources => self.handle_list_key(key),
      Screen::SourceDetail => self.handle_detail_key(key),
      Screen::Insights => self.handle_feed_key(key),
    }
    true
  }

  fn handle_filter_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.filter_active = false;
        self.sources.query.clear();
        self.list_cursor = 0;
      }
      KeyCode::Enter => {
        self.filter_active = false;
        self.list_cursor = 0;
        // Open straight away if exactly one source matches.
        let only = match self.sources.filtered().as_slice() {
          [single] => Some(single.id),
          _ => None,
        };
        if let Some(id) = only {
          self.open_detail(id);
        }
      }
      KeyCode::Backspace => {
        self.sources.query.pop();
        self.list_cursor = 0;
      }
      KeyCode::Char(c) => {
        self.sources.query.push(c);
        self.list_cursor = 0;
      }
      _ => {}
    }
  }

  fn handle_compose_key(&mut self, key: KeyEvent) {
    let Some(detail) = self.detail.as_mut() else {
      self.composing = false;
      return;
    };
    match key.code {
      KeyCode::Esc => self.composing = false,
      KeyCode::Enter if key.modifiers.contains(KeyModifiers::ALT) => detail.draft.push('\n'),
      KeyCode::Enter => {
        self.composing = false;
        self.submit_insight();
      }
      KeyCode::Backspace => {
        detail.draft.pop();
      }
      KeyCode::Char(c) => detail.draft.push(c),
      _ => {}
    }
  }

  fn handle_list_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Down | KeyCode::Char('j') => {
        let len = self.sources.filtered().len();
        if len > 0 && self.list_cursor + 1 < len {
          self.list_cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.list_cursor = self.list_cursor.saturating_sub(1);
      }
      KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
        if let Some(id) = self.cursor_source().map(|s| s.id) {
          self.open_detail(id);
        }
      }
      KeyCode::Char('/') => {
        self.filter_active = true;
        self.sources.query.clear();
        self.list_cursor = 0;
      }
      KeyCode::Char('c') => {
        self.sources.category = Category::cycle(self.sources.category);
        self.load_sources();
      }
      KeyCode::Char('a') => {
        self.status_msg = if self.sources.can_add() {
          "Add a source with: torahav new-source".into()
        } else {
          "Sign in first: torahav login".into()
        };
      }
      KeyCode::Char('r') => self.load_sources(),
      _ => {}
    }
  }

  fn handle_detail_key(&mut self, key: KeyEvent) {
    let Some(source_id) = self.detail.as_ref().map(|d| d.source_id) else {
      self.show_sources();
      return;
    };
    match key.code {
      KeyCode::Esc | KeyCode::Left | KeyCode::Char('h') => self.show_sources(),
      KeyCode::Down | KeyCode::Char('j') => {
        let len = self.detail.as_ref().map_or(0, |d| d.insights().len());
        if len > 0 && self.detail_cursor + 1 < len {
          self.detail_cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.detail_cursor = self.detail_cursor.saturating_sub(1);
      }
      KeyCode::Char(' ') => {
        if let Some(id) = self.cursor_detail_insight().map(|i| i.id) {
          self.toggle_like(LikeTarget::Detail(source_id), id);
        }
      }
      KeyCode::Char('i') => {
        if self.session.is_authenticated() {
          self.composing = true;
        } else {
          self.navigate(Route::Login);
        }
      }
      KeyCode::Char('r') => self.load_detail(),
      _ => {}
    }
  }

  fn handle_feed_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Down | KeyCode::Char('j') => {
        let len = self.feed.insights().len();
        if len > 0 && self.feed_cursor + 1 < len {
          self.feed_cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.feed_cursor = self.feed_cursor.saturating_sub(1);
      }
      KeyCode::Char(' ') => {
        if let Some(id) = self.cursor_feed_insight().map(|i| i.id) {
          self.toggle_like(LikeTarget::Feed, id);
        }
      }
      KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
        if let Some(id) = self.cursor_feed_insight().map(|i| i.source_id) {
          self.open_detail(id);
        }
      }
      KeyCode::Char('r') => self.load_feed(),
      _ => {}
    }
  }
}

#[cfg(test)]
mod tests {
  use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
  use tokio::sync::mpsc::{self, UnboundedReceiver};
  use torahav_gateway::MemoryGateway;

  use super::*;

  type Events = UnboundedReceiver<AppEvent<<MemoryGateway as Gateway>::Error>>;

  async fn app(gw: &Arc<MemoryGateway>) -> (App<MemoryGateway>, Events) {
    let session = Arc::new(SessionStore::attach(Arc::clone(gw)).await);
    let (tx, rx) = mpsc::unbounded_channel();
    (App::new(session, tx), rx)
  }

  fn key(code: KeyCode) -> KeyEvent { KeyEvent::new(code, KeyModifiers::NONE) }

  #[tokio::test]
  async fn opening_a_source_loads_it() {
    let gw = Arc::new(MemoryGateway::new());
    let source = gw.seed_source("בראשית", "א\nב", Category::Tanakh);
    let (mut app, mut rx) = app(&gw).await;

    app.navigate(Route::SourceDetail(source.id));
    assert_eq!(app.screen, Screen::SourceDetail);
    let event = rx.recv().await.unwrap();
    app.handle_event(event);

    let detail = app.detail.as_ref().unwrap();
    assert_eq!(detail.source.as_ref().map(|s| s.id), Some(source.id));
    assert!(!detail.state.loading);
  }

  #[tokio::test]
  async fn load_for_a_closed_source_is_dropped() {
    let gw = Arc::new(MemoryGateway::new());
    let first = gw.seed_source("א", "text", Category::Tanakh);
    let second = gw.seed_source("ב", "text", Category::Mishnah);
    let (mut app, mut rx) = app(&gw).await;

    app.open_detail(first.id);
    let stale = rx.recv().await.unwrap();
    app.open_detail(second.id);
    app.handle_event(stale);

    let detail = app.detail.as_ref().unwrap();
    assert_eq!(detail.source_id, second.id);
    assert!(detail.source.is_none());
    assert!(detail.state.loading);
  }

  #[tokio::test]
  async fn liking_signed_out_asks_for_login() {
    let gw = Arc::new(MemoryGateway::new());
    let author = gw.seed_user("a@example.com", "password1", "a");
    let source = gw.seed_source("א", "text", Category::Tanakh);
    gw.seed_insight(author.id, source.id, "insight");
    let (mut app, mut rx) = app(&gw).await;

    app.open_detail(source.id);
    let event = rx.recv().await.unwrap();
    app.handle_event(event);
    app.handle_key(key(KeyCode::Char(' ')));

    assert!(app.status_msg.contains("torahav login"));
    assert_eq!(gw.count_calls(|c| matches!(c, torahav_gateway::memory::Call::InsertLike { .. })), 0);
  }

  #[tokio::test]
  async fn q_quits_but_is_typed_while_composing() {
    let gw = Arc::new(MemoryGateway::new());
    let (mut app, _rx) = app(&gw).await;
    app.detail = Some(SourceDetail::new(Arc::clone(&app.session), Uuid::new_v4()));
    app.screen = Screen::SourceDetail;
    app.composing = true;

    assert!(app.handle_key(key(KeyCode::Char('q'))));
    assert_eq!(app.detail.as_ref().unwrap().draft, "q");

    app.handle_key(key(KeyCode::Esc));
    assert!(!app.handle_key(key(KeyCode::Char('q'))));
  }

  #[tokio::test]
  async fn tab_switches_to_the_feed() {
    let gw = Arc::new(MemoryGateway::new());
    let (mut app, mut rx) = app(&gw).await;

    app.handle_key(key(KeyCode::Tab));
    assert_eq!(app.screen, Screen::Insights);
    assert!(matches!(rx.recv().await.unwrap(), AppEvent::FeedLoaded(Ok(_))));

    app.handle_key(key(KeyCode::Tab));
    assert_eq!(app.screen, Screen::Sources);
  }

  #[tokio::test]
  async fn sources_for_a_previous_filter_keep_the_cursor() {
    let gw = Arc::new(MemoryGateway::new());
    let (mut app, _rx) = app(&gw).await;
    app.sources.category = Some(Category::Musar);
    app.list_cursor = 2;

    app.handle_event(AppEvent::SourcesLoaded { category: None, result: Ok(Vec::new()) });
    assert_eq!(app.list_cursor, 2);

    app.handle_event(AppEvent::SourcesLoaded {
      category: Some(Category::Musar),
      result:   Ok(Vec::new()),
    });
    assert_eq!(app.list_cursor, 0);
  }

  #[tokio::test]
  async fn feed_reload_waits_for_the_like() {
    let gw = Arc::new(MemoryGateway::new());
    gw.seed_user("v@example.com", "password1", "v");
    let author = gw.seed_user("a@example.com", "password1", "a");
    let source = gw.seed_source("א", "text", Category::Tanakh);
    let insight = gw.seed_insight(author.id, source.id, "insight");
    gw.seed_likes(insight, 2);
    gw.sign_in_with_password("v@example.com".into(), "password1".into())
      .await
      .unwrap();
    let (mut app, mut rx) = app(&gw).await;

    app.handle_key(key(KeyCode::Tab));
    let loaded = rx.recv().await.unwrap();
    app.handle_event(loaded);

    app.handle_key(key(KeyCode::Char(' ')));
    app.handle_key(key(KeyCode::Char('r')));
    assert!(app.status_msg.contains("like"));
    let settled = rx.recv().await.unwrap();
    assert!(matches!(settled, AppEvent::LikeSettled { succeeded: true, .. }));
    app.handle_event(settled);

    assert_eq!(app.feed.insights()[0].likes, 3);
    assert_eq!(
      gw.count_calls(|c| matches!(c, torahav_gateway::memory::Call::ListRecentInsights { .. })),
      1
    );
  }
}
