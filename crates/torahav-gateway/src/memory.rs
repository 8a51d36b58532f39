//! [`MemoryGateway`] — an in-process [`Gateway`].
//!
//! Mirrors the observable behaviour of the hosted service closely enough for
//! controller tests: unconfirmed sign-ups, row-level checks on writes, the
//! unique `(user_id, insight_id)` like key with a maintained like count, and
//! upsert-aware avatar storage. Every call is appended to a call log, and a
//! one-shot failure can be armed for any call.

use std::{
  collections::{HashMap, HashSet},
  sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use chrono::{DateTime, Duration, Utc};
use torahav_core::{
  gateway::Gateway,
  mapper,
  model::{
    Blob, Category, Insight, Like, NewInsight, NewSource, Profile, ProfileUpdate,
    Source,
  },
  row::{InsightRow, ProfileRow, SourceEmbed, SourceRow},
  session::{AuthEvent, AuthListener, AuthListeners, AuthUser, Session, Subscription},
};
use uuid::Uuid;

use crate::{Error, Result};

const PUBLIC_BASE: &str = "https://memory.invalid/storage/v1/object/public/avatars";

// ─── Call log ────────────────────────────────────────────────────────────────

/// One recorded gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
  GetSession,
  SignIn { email: String },
  SignUp { email: String, password: String, redirect_to: String },
  SignOut,
  ExchangeCode { code: String },
  /// A listener registered through `on_auth_state_change` was released.
  Unsubscribe,
  ListSources { category: Option<Category> },
  GetSource { id: Uuid },
  CreateSource { title: String },
  ListInsightsForSource { source_id: Uuid },
  ListRecentInsights { limit: usize },
  CreateInsight { content: String, source_id: Uuid },
  GetProfile { user_id: Uuid },
  UpdateProfile { user_id: Uuid, update: ProfileUpdate },
  LikedInsightIds { user_id: Uuid },
  InsertLike { user_id: Uuid, insight_id: Uuid },
  DeleteLike { user_id: Uuid, insight_id: Uuid },
  UploadAvatar { path: String, upsert: bool },
}

type CallMatcher = Box<dyn Fn(&Call) -> bool + Send + Sync>;

// ─── State ───────────────────────────────────────────────────────────────────

struct Account {
  id:        Uuid,
  email:     String,
  password:  String,
  confirmed: bool,
}

#[derive(Default)]
struct MemoryState {
  accounts:      Vec<Account>,
  profiles:      HashMap<Uuid, ProfileRow>,
  sources:       Vec<SourceRow>,
  insights:      Vec<InsightRow>,
  likes:         HashSet<Like>,
  blobs:         HashMap<String, Blob>,
  pending_codes: HashMap<String, Uuid>,
  session:       Option<Session>,
  auto_confirm:  bool,
  calls:         Vec<Call>,
  failures:      Vec<(CallMatcher, String)>,
  last_tick:     Option<DateTime<Utc>>,
}

impl MemoryState {
  /// A strictly increasing clock so that "newest first" is deterministic.
  fn tick(&mut self) -> DateTime<Utc> {
    let now = Utc::now();
    let next = match self.last_tick {
      Some(last) if now <= last => last + Duration::microseconds(1),
      _ => now,
    };
    self.last_tick = Some(next);
    next
  }

  fn session_user(&self) -> Option<Uuid> { self.session.as_ref().map(Session::user_id) }

  /// Row-level check: writes need a session, and owner-scoped writes need
  /// the session to belong to `owner`.
  fn authorize(&self, table: &str, owner: Option<Uuid>) -> Result<Uuid> {
    let denied = || {
      Error::api(
        403,
        format!("new row violates row-level security policy for table \"{table}\""),
      )
    };
    let user = self.session_user().ok_or_else(denied)?;
    match owner {
      Some(owner) if owner != user => Err(denied()),
      _ => Ok(user),
    }
  }

  fn new_session(&self, account_id: Uuid, email: &str) -> Session {
    Session {
      access_token:  Uuid::new_v4().to_string(),
      refresh_token: Uuid::new_v4().to_string(),
      expires_at:    Some(Utc::now().timestamp() + 3600),
      user:          AuthUser { id: account_id, email: Some(email.to_owned()) },
    }
  }

  fn email_of(&self, user_id: Uuid) -> Option<&str> {
    self
      .accounts
      .iter()
      .find(|a| a.id == user_id)
      .map(|a| a.email.as_str())
  }

  fn embed(&self, row: &InsightRow, with_source: bool) -> InsightRow {
    let mut row = row.clone();
    row.profiles = self.profiles.get(&row.user_id).cloned();
    if with_source {
      row.sources = self
        .sources
        .iter()
        .find(|s| s.id == row.source_id)
        .map(|s| SourceEmbed {
          id:       s.id,
          title:    s.title.clone(),
          category: s.category.clone(),
        });
    }
    row
  }

  fn adjust_likes(&mut self, insight_id: Uuid, delta: i64) {
    if let Some(row) = self.insights.iter_mut().find(|i| i.id == insight_id) {
      row.likes = Some((row.likes.unwrap_or(0) + delta).max(0));
    }
  }
}

fn username_from(email: &str) -> String {
  email.split('@').next().unwrap_or(email).to_owned()
}

// ─── Gateway ─────────────────────────────────────────────────────────────────

/// An in-memory gateway.
///
/// Cloning is cheap; clones share the same state and listeners.
#[derive(Clone, Default)]
pub struct MemoryGateway {
  state:     Arc<Mutex<MemoryState>>,
  listeners: AuthListeners,
}

impl MemoryGateway {
  pub fn new() -> Self { Self::default() }

  /// Confirm new accounts immediately, so sign-up returns a session.
  pub fn with_auto_confirm(self) -> Self {
    self.lock().auto_confirm = true;
    self
  }

  fn lock(&self) -> MutexGuard<'_, MemoryState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Log `call`, then fail it if an armed failure matches.
  fn record(&self, call: Call) -> Result<MutexGuard<'_, MemoryState>> {
    let mut state = self.lock();
    let armed = state.failures.iter().position(|(matches, _)| matches(&call));
    state.calls.push(call);
    if let Some(index) = armed {
      let (_, message) = state.failures.remove(index);
      return Err(Error::api(500, message));
    }
    Ok(state)
  }

  // ── Test controls ─────────────────────────────────────────────────────

  /// Make the next call matching `matches` fail with `message`.
  pub fn fail_next(
    &self,
    matches: impl Fn(&Call) -> bool + Send + Sync + 'static,
    message: impl Into<String>,
  ) {
    self.lock().failures.push((Box::new(matches), message.into()));
  }

  pub fn calls(&self) -> Vec<Call> { self.lock().calls.clone() }

  pub fn count_calls(&self, matches: impl Fn(&Call) -> bool) -> usize {
    self.lock().calls.iter().filter(|c| matches(c)).count()
  }

  pub fn clear_calls(&self) { self.lock().calls.clear(); }

  pub fn listener_count(&self) -> usize { self.listeners.len() }

  // ── Seeding ───────────────────────────────────────────────────────────

  /// A confirmed account with a profile whose display name is `username`.
  pub fn seed_user(&self, email: &str, password: &str, username: &str) -> Profile {
    let mut state = self.lock();
    let id = Uuid::new_v4();
    state.accounts.push(Account {
      id,
      email: email.to_owned(),
      password: password.to_owned(),
      confirmed: true,
    });
    let row = ProfileRow {
      id,
      username:     username.to_owned(),
      display_name: Some(username.to_owned()),
      bio:          None,
      avatar_url:   None,
    };
    state.profiles.insert(id, row.clone());
    mapper::profile(row, Some(email))
  }

  pub fn seed_source(&self, title: &str, content: &str, category: Category) -> Source {
    let mut state = self.lock();
    let row = SourceRow {
      id:         Uuid::new_v4(),
      title:      title.to_owned(),
      content:    content.to_owned(),
      category:   category.as_str().to_owned(),
      created_at: state.tick(),
    };
    state.sources.push(row.clone());
    Source {
      id: row.id,
      title: row.title,
      content: row.content,
      category,
      created_at: row.created_at,
    }
  }

  pub fn seed_insight(&self, author: Uuid, source_id: Uuid, content: &str) -> Uuid {
    let mut state = self.lock();
    let row = InsightRow {
      id: Uuid::new_v4(),
      content: content.to_owned(),
      user_id: author,
      source_id,
      created_at: state.tick(),
      likes: Some(0),
      profiles: None,
      sources: None,
    };
    let id = row.id;
    state.insights.push(row);
    id
  }

  /// Record a like by `user_id`, keeping the count in step.
  pub fn seed_like(&self, user_id: Uuid, insight_id: Uuid) {
    let mut state = self.lock();
    if state.likes.insert(Like { user_id, insight_id }) {
      state.adjust_likes(insight_id, 1);
    }
  }

  /// `n` likes from otherwise unknown users.
  pub fn seed_likes(&self, insight_id: Uuid, n: usize) {
    for _ in 0..n {
      self.seed_like(Uuid::new_v4(), insight_id);
    }
  }

  // ── Inspection ────────────────────────────────────────────────────────

  pub fn like_count(&self, insight_id: Uuid) -> Option<u32> {
    self
      .lock()
      .insights
      .iter()
      .find(|i| i.id == insight_id)
      .and_then(|i| u32::try_from(i.likes.unwrap_or(0)).ok())
  }

  pub fn has_like(&self, user_id: Uuid, insight_id: Uuid) -> bool {
    self.lock().likes.contains(&Like { user_id, insight_id })
  }

  pub fn blob(&self, path: &str) -> Option<Blob> { self.lock().blobs.get(path).cloned() }

  pub fn profile_row(&self, user_id: Uuid) -> Option<ProfileRow> {
    self.lock().profiles.get(&user_id).cloned()
  }

  /// The code a verification email for `email` would carry.
  pub fn confirmation_code(&self, email: &str) -> Option<String> {
    let state = self.lock();
    let id = state.accounts.iter().find(|a| a.email == email)?.id;
    state
      .pending_codes
      .iter()
      .find(|(_, uid)| **uid == id)
      .map(|(code, _)| code.clone())
  }
}

impl Gateway for MemoryGateway {
  type Error = Error;

  // ── Auth ──────────────────────────────────────────────────────────────

  async fn get_session(&self) -> Result<Option<Session>> {
    Ok(self.record(Call::GetSession)?.session.clone())
  }

  async fn sign_in_with_password(&self, email: String, password: String) -> Result<Session> {
    let session = {
      let mut state = self.record(Call::SignIn { email: email.clone() })?;
      let account = state
        .accounts
        .iter()
        .find(|a| a.email == email && a.password == password)
        .ok_or_else(|| Error::api(400, "Invalid login credentials"))?;
      if !account.confirmed {
        return Err(Error::api(400, "Email not confirmed"));
      }
      let session = state.new_session(account.id, &account.email);
      state.session = Some(session.clone());
      session
    };
    self.listeners.emit(AuthEvent::SignedIn, Some(&session));
    Ok(session)
  }

  async fn sign_up(
    &self,
    email: String,
    password: String,
    redirect_to: String,
  ) -> Result<Option<Session>> {
    let session = {
      let mut state = self.record(Call::SignUp {
        email: email.clone(),
        password: password.clone(),
        redirect_to,
      })?;
      if state.accounts.iter().any(|a| a.email == email) {
        return Err(Error::api(422, "User already registered"));
      }
      let id = Uuid::new_v4();
      let confirmed = state.auto_confirm;
      state.accounts.push(Account { id, email: email.clone(), password, confirmed });
      let username = username_from(&email);
      state.profiles.insert(id, ProfileRow {
        id,
        username: username.clone(),
        display_name: Some(username),
        bio: None,
        avatar_url: None,
      });
      if !confirmed {
        state.pending_codes.insert(Uuid::new_v4().simple().to_string(), id);
        return Ok(None);
      }
      let session = state.new_session(id, &email);
      state.session = Some(session.clone());
      session
    };
    self.listeners.emit(AuthEvent::SignedIn, Some(&session));
    Ok(Some(session))
  }

  async fn sign_out(&self) -> Result<()> {
    self.record(Call::SignOut)?.session = None;
    self.listeners.emit(AuthEvent::SignedOut, None);
    Ok(())
  }

  async fn exchange_code_for_session(&self, code: String) -> Result<Session> {
    let session = {
      let mut state = self.record(Call::ExchangeCode { code: code.clone() })?;
      let id = state
        .pending_codes
        .remove(&code)
        .ok_or_else(|| Error::api(400, "invalid flow state, no valid flow state found"))?;
      let account = state
        .accounts
        .iter_mut()
        .find(|a| a.id == id)
        .ok_or_else(|| Error::api(404, "User not found"))?;
      account.confirmed = true;
      let email = account.email.clone();
      let session = state.new_session(id, &email);
      state.session = Some(session.clone());
      session
    };
    self.listeners.emit(AuthEvent::SignedIn, Some(&session));
    Ok(session)
  }

  fn on_auth_state_change(&self, listener: AuthListener) -> Subscription {
    let state = Arc::clone(&self.state);
    self.listeners.subscribe_with(listener, move || {
      state
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .calls
        .push(Call::Unsubscribe);
    })
  }

  // ── Sources ───────────────────────────────────────────────────────────

  async fn list_sources(&self, category: Option<Category>) -> Result<Vec<Source>> {
    let state = self.record(Call::ListSources { category })?;
    let mut rows: Vec<SourceRow> = state
      .sources
      .iter()
      .filter(|s| category.is_none_or(|c| s.category == c.as_str()))
      .cloned()
      .collect();
    rows.sort_by(|a, b| a.title.cmp(&b.title));
    Ok(rows.into_iter().map(mapper::source).collect::<std::result::Result<Vec<_>, _>>()?)
  }

  async fn get_source(&self, id: Uuid) -> Result<Option<Source>> {
    let state = self.record(Call::GetSource { id })?;
    let row = state.sources.iter().find(|s| s.id == id).cloned();
    Ok(row.map(mapper::source).transpose()?)
  }

  async fn create_source(&self, input: NewSource) -> Result<Source> {
    let mut state = self.record(Call::CreateSource { title: input.title.clone() })?;
    state.authorize("sources", None)?;
    let row = SourceRow {
      id:         Uuid::new_v4(),
      title:      input.title,
      content:    input.content,
      category:   input.category.as_str().to_owned(),
      created_at: state.tick(),
    };
    state.sources.push(row.clone());
    Ok(mapper::source(row)?)
  }

  // ── Insights ──────────────────────────────────────────────────────────

  async fn list_insights_for_source(&self, source_id: Uuid) -> Result<Vec<Insight>> {
    let state = self.record(Call::ListInsightsForSource { source_id })?;
    let mut rows: Vec<InsightRow> = state
      .insights
      .iter()
      .filter(|i| i.source_id == source_id)
      .map(|i| state.embed(i, false))
      .collect();
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(rows.into_iter().map(mapper::insight).collect::<std::result::Result<Vec<_>, _>>()?)
  }

  async fn list_recent_insights(&self, limit: usize) -> Result<Vec<Insight>> {
    let state = self.record(Call::ListRecentInsights { limit })?;
    let mut rows: Vec<InsightRow> = state.insights.iter().map(|i| state.embed(i, true)).collect();
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    rows.truncate(limit);
    Ok(rows.into_iter().map(mapper::insight).collect::<std::result::Result<Vec<_>, _>>()?)
  }

  async fn create_insight(&self, input: NewInsight) -> Result<Insight> {
    let mut state = self.record(Call::CreateInsight {
      content:   input.content.clone(),
      source_id: input.source_id,
    })?;
    state.authorize("insights", Some(input.user_id))?;
    if !state.sources.iter().any(|s| s.id == input.source_id) {
      return Err(Error::api(
        409,
        "insert or update on table \"insights\" violates foreign key constraint",
      ));
    }
    let row = InsightRow {
      id:         Uuid::new_v4(),
      content:    input.content,
      user_id:    input.user_id,
      source_id:  input.source_id,
      created_at: state.tick(),
      likes:      Some(0),
      profiles:   None,
      sources:    None,
    };
    state.insights.push(row.clone());
    let embedded = state.embed(&row, false);
    Ok(mapper::insight(embedded)?)
  }

  // ── Profiles ──────────────────────────────────────────────────────────

  async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>> {
    let state = self.record(Call::GetProfile { user_id })?;
    let email = (state.session_user() == Some(user_id))
      .then(|| state.email_of(user_id))
      .flatten();
    Ok(state
      .profiles
      .get(&user_id)
      .cloned()
      .map(|row| mapper::profile(row, email)))
  }

  async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> Result<()> {
    let mut state = self.record(Call::UpdateProfile { user_id, update: update.clone() })?;
    state.authorize("profiles", Some(user_id))?;
    if let Some(row) = state.profiles.get_mut(&user_id) {
      row.display_name = Some(update.display_name);
      row.bio = Some(update.bio);
      row.avatar_url = update.avatar_url;
    }
    Ok(())
  }

  // ── Likes ─────────────────────────────────────────────────────────────

  async fn liked_insight_ids(&self, user_id: Uuid, insight_ids: Vec<Uuid>) -> Result<Vec<Uuid>> {
    let state = self.record(Call::LikedInsightIds { user_id })?;
    Ok(insight_ids
      .into_iter()
      .filter(|id| state.likes.contains(&Like { user_id, insight_id: *id }))
      .collect())
  }

  async fn insert_like(&self, user_id: Uuid, insight_id: Uuid) -> Result<()> {
    let mut state = self.record(Call::InsertLike { user_id, insight_id })?;
    state.authorize("likes", Some(user_id))?;
    if !state.insights.iter().any(|i| i.id == insight_id) {
      return Err(Error::api(
        409,
        "insert or update on table \"likes\" violates foreign key constraint",
      ));
    }
    if !state.likes.insert(Like { user_id, insight_id }) {
      return Err(Error::api(
        409,
        "duplicate key value violates unique constraint \"likes_pkey\"",
      ));
    }
    state.adjust_likes(insight_id, 1);
    Ok(())
  }

  async fn delete_like(&self, user_id: Uuid, insight_id: Uuid) -> Result<()> {
    let mut state = self.record(Call::DeleteLike { user_id, insight_id })?;
    state.authorize("likes", Some(user_id))?;
    if state.likes.remove(&Like { user_id, insight_id }) {
      state.adjust_likes(insight_id, -1);
    }
    Ok(())
  }

  // ── Storage ───────────────────────────────────────────────────────────

  async fn upload_avatar(&self, path: String, blob: Blob, upsert: bool) -> Result<()> {
    let mut state = self.record(Call::UploadAvatar { path: path.clone(), upsert })?;
    state.authorize("objects", None)?;
    if !upsert && state.blobs.contains_key(&path) {
      return Err(Error::api(400, "The resource already exists"));
    }
    state.blobs.insert(path, blob);
    Ok(())
  }

  fn avatar_public_url(&self, path: &str) -> String {
    format!("{PUBLIC_BASE}/{}", path.trim_start_matches('/'))
  }
}
