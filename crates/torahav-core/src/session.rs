//! Sessions, auth-state events and listener subscriptions.

use std::{
  fmt,
  sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Session ─────────────────────────────────────────────────────────────────

/// The identity half of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
  pub id:    Uuid,
  #[serde(default)]
  pub email: Option<String>,
}

/// An authenticated-identity context, as issued by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
  pub access_token:  String,
  pub refresh_token: String,
  /// Unix seconds.
  #[serde(default)]
  pub expires_at:    Option<i64>,
  pub user:          AuthUser,
}

impl Session {
  pub fn user_id(&self) -> Uuid { self.user.id }

  /// Whether the access token expires within `margin` of `now`. Sessions
  /// without an expiry never do.
  pub fn expires_within(&self, now: DateTime<Utc>, margin: Duration) -> bool {
    self
      .expires_at
      .is_some_and(|at| at <= (now + margin).timestamp())
  }
}

// ─── Events ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEvent {
  InitialSession,
  SignedIn,
  SignedOut,
  TokenRefreshed,
  UserUpdated,
}

/// Callback invoked with every auth-state change and the session that
/// resulted from it.
pub type AuthListener = Arc<dyn Fn(AuthEvent, Option<&Session>) + Send + Sync>;

// ─── Subscription ────────────────────────────────────────────────────────────

/// Handle to a registered [`AuthListener`].
///
/// The release action runs exactly once: on [`Subscription::unsubscribe`] or
/// on drop, whichever comes first.
pub struct Subscription {
  release: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
  pub fn new(release: impl FnOnce() + Send + Sync + 'static) -> Self {
    Self { release: Some(Box::new(release)) }
  }

  pub fn unsubscribe(mut self) { self.release(); }

  fn release(&mut self) {
    if let Some(release) = self.release.take() {
      release();
    }
  }
}

impl Drop for Subscription {
  fn drop(&mut self) { self.release(); }
}

impl fmt::Debug for Subscription {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Subscription")
      .field("active", &self.release.is_some())
      .finish()
  }
}

// ─── Listener registry ───────────────────────────────────────────────────────

#[derive(Default)]
struct ListenerTable {
  next_id:   u64,
  listeners: Vec<(u64, AuthListener)>,
}

/// Registry of auth listeners shared by gateway implementations.
///
/// Cloning is cheap; clones share the same table.
#[derive(Clone, Default)]
pub struct AuthListeners {
  table: Arc<Mutex<ListenerTable>>,
}

impl AuthListeners {
  pub fn new() -> Self { Self::default() }

  /// Register `listener`. Releasing the returned subscription removes it;
  /// `on_release` runs afterwards, once.
  pub fn subscribe_with(
    &self,
    listener: AuthListener,
    on_release: impl FnOnce() + Send + Sync + 'static,
  ) -> Subscription {
    let id = {
      let mut table = self.lock();
      let id = table.next_id;
      table.next_id += 1;
      table.listeners.push((id, listener));
      id
    };
    let weak: Weak<Mutex<ListenerTable>> = Arc::downgrade(&self.table);
    Subscription::new(move || {
      if let Some(table) = weak.upgrade() {
        table
          .lock()
          .unwrap_or_else(PoisonError::into_inner)
          .listeners
          .retain(|(lid, _)| *lid != id);
      }
      on_release();
    })
  }

  pub fn subscribe(&self, listener: AuthListener) -> Subscription {
    self.subscribe_with(listener, || {})
  }

  /// Notify every registered listener. Listeners are called outside the
  /// table lock so they may subscribe or unsubscribe themselves.
  pub fn emit(&self, event: AuthEvent, session: Option<&Session>) {
    let listeners: Vec<AuthListener> = self
      .lock()
      .listeners
      .iter()
      .map(|(_, l)| Arc::clone(l))
      .collect();
    for listener in listeners {
      listener(event, session);
    }
  }

  pub fn len(&self) -> usize { self.lock().listeners.len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  fn lock(&self) -> MutexGuard<'_, ListenerTable> {
    self.table.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use super::*;

  fn session(expires_at: Option<i64>) -> Session {
    Session {
      access_token:  "at".into(),
      refresh_token: "rt".into(),
      expires_at,
      user:          AuthUser { id: Uuid::new_v4(), email: None },
    }
  }

  #[test]
  fn expiry_margin() {
    let now = Utc::now();
    let soon = session(Some(now.timestamp() + 30));
    let later = session(Some(now.timestamp() + 3600));
    assert!(soon.expires_within(now, Duration::seconds(60)));
    assert!(!later.expires_within(now, Duration::seconds(60)));
    assert!(!session(None).expires_within(now, Duration::seconds(60)));
  }

  #[test]
  fn emit_reaches_all_listeners() {
    let listeners = AuthListeners::new();
    let hits = Arc::new(AtomicUsize::new(0));
    let h1 = Arc::clone(&hits);
    let h2 = Arc::clone(&hits);
    let _a = listeners.subscribe(Arc::new(move |_: AuthEvent, _: Option<&Session>| {
      h1.fetch_add(1, Ordering::SeqCst);
    }));
    let _b = listeners.subscribe(Arc::new(move |_: AuthEvent, _: Option<&Session>| {
      h2.fetch_add(1, Ordering::SeqCst);
    }));
    listeners.emit(AuthEvent::SignedOut, None);
    assert_eq!(hits.load(Ordering::SeqCst), 2);
  }

  #[test]
  fn release_runs_once_across_unsubscribe_and_drop() {
    let listeners = AuthListeners::new();
    let released = Arc::new(AtomicUsize::new(0));
    let r = Arc::clone(&released);
    let sub = listeners.subscribe_with(Arc::new(|_: AuthEvent, _: Option<&Session>| {}), move || {
      r.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(listeners.len(), 1);
    sub.unsubscribe();
    assert_eq!(listeners.len(), 0);
    assert_eq!(released.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn dropping_subscription_deregisters() {
    let listeners = AuthListeners::new();
    {
      let _sub = listeners.subscribe(Arc::new(|_: AuthEvent, _: Option<&Session>| {}));
      assert!(!listeners.is_empty());
    }
    assert!(listeners.is_empty());
  }
}
