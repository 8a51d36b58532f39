//! The Session State Holder.
//!
//! One [`SessionStore`] is attached per running client and shared with every
//! controller. It subscribes to the gateway's auth events before asking for
//! the current session, and publishes the held value on a `watch` channel.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use torahav_core::{
  gateway::Gateway,
  model::Profile,
  session::{AuthEvent, Session, Subscription},
};
use tracing::{debug, error};
use uuid::Uuid;

pub struct SessionStore<G: Gateway> {
  gateway:      Arc<G>,
  current:      watch::Receiver<Option<Session>>,
  subscription: Mutex<Option<Subscription>>,
}

impl<G: Gateway> SessionStore<G> {
  /// Subscribe to auth events, then load the current session. A failure to
  /// load is logged and treated as signed out.
  pub async fn attach(gateway: Arc<G>) -> Self {
    let (tx, current) = watch::channel(None);
    let tx = Arc::new(tx);

    let sink = Arc::clone(&tx);
    let subscription =
      gateway.on_auth_state_change(Arc::new(move |event: AuthEvent, session: Option<&Session>| {
        debug!(?event, "auth state changed");
        sink.send_replace(session.cloned());
      }));

    match gateway.get_session().await {
      Ok(session) => {
        tx.send_replace(session);
      }
      Err(e) => error!("failed to load session: {e}"),
    }

    Self {
      gateway,
      current,
      subscription: Mutex::new(Some(subscription)),
    }
  }

  pub fn gateway(&self) -> &Arc<G> { &self.gateway }

  pub fn current(&self) -> Option<Session> { self.current.borrow().clone() }

  pub fn is_authenticated(&self) -> bool { self.current.borrow().is_some() }

  pub fn user_id(&self) -> Option<Uuid> { self.current.borrow().as_ref().map(Session::user_id) }

  /// A receiver that observes every change to the held session.
  pub fn watch(&self) -> watch::Receiver<Option<Session>> { self.current.clone() }

  /// The signed-in user's profile row, with the session's email filled in.
  pub async fn profile(&self) -> Result<Option<Profile>, G::Error> {
    let Some(session) = self.current() else {
      return Ok(None);
    };
    let profile = self.gateway.get_profile(session.user_id()).await?;
    Ok(profile.map(|mut p| {
      if let Some(email) = session.user.email {
        p.email = email;
      }
      p
    }))
  }

  /// Release the auth subscription. Later calls do nothing.
  pub fn close(&self) {
    let subscription = self
      .subscription
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .take();
    if let Some(subscription) = subscription {
      subscription.unsubscribe();
    }
  }
}

#[cfg(test)]
mod tests {
  use torahav_gateway::{MemoryGateway, memory::Call};

  use super::*;

  fn unsubscribes(gw: &MemoryGateway) -> usize {
    gw.count_calls(|c| *c == Call::Unsubscribe)
  }

  #[tokio::test]
  async fn attach_subscribes_then_loads() {
    let gw = Arc::new(MemoryGateway::new());
    let store = SessionStore::attach(Arc::clone(&gw)).await;
    assert_eq!(gw.listener_count(), 1);
    assert_eq!(gw.calls(), vec![Call::GetSession]);
    assert!(!store.is_authenticated());
  }

  #[tokio::test]
  async fn follows_sign_in_and_sign_out() {
    let gw = Arc::new(MemoryGateway::new());
    let profile = gw.seed_user("rivka@example.com", "correct-horse", "rivka");
    let store = SessionStore::attach(Arc::clone(&gw)).await;
    let mut changes = store.watch();
    changes.borrow_and_update();

    gw.sign_in_with_password("rivka@example.com".into(), "correct-horse".into())
      .await
      .unwrap();
    assert!(changes.has_changed().unwrap());
    assert_eq!(store.user_id(), Some(profile.id));

    let loaded = store.profile().await.unwrap().unwrap();
    assert_eq!(loaded.email, "rivka@example.com");

    gw.sign_out().await.unwrap();
    assert!(!store.is_authenticated());
    assert!(store.profile().await.unwrap().is_none());
  }

  #[tokio::test]
  async fn picks_up_an_existing_session() {
    let gw = Arc::new(MemoryGateway::new());
    gw.seed_user("rivka@example.com", "correct-horse", "rivka");
    gw.sign_in_with_password("rivka@example.com".into(), "correct-horse".into())
      .await
      .unwrap();

    let store = SessionStore::attach(Arc::clone(&gw)).await;
    assert!(store.is_authenticated());
  }

  #[tokio::test]
  async fn close_releases_the_subscription_once() {
    let gw = Arc::new(MemoryGateway::new());
    let store = SessionStore::attach(Arc::clone(&gw)).await;

    store.close();
    store.close();
    drop(store);

    assert_eq!(unsubscribes(&gw), 1);
    assert_eq!(gw.listener_count(), 0);
  }

  #[tokio::test]
  async fn dropping_releases_the_subscription_once() {
    let gw = Arc::new(MemoryGateway::new());
    drop(SessionStore::attach(Arc::clone(&gw)).await);
    assert_eq!(unsubscribes(&gw), 1);
    assert_eq!(gw.listener_count(), 0);
  }

  #[tokio::test]
  async fn failed_load_counts_as_signed_out() {
    let gw = Arc::new(MemoryGateway::new());
    gw.fail_next(|c| *c == Call::GetSession, "unavailable");
    let store = SessionStore::attach(Arc::clone(&gw)).await;
    assert!(!store.is_authenticated());
    assert_eq!(gw.listener_count(), 1);
  }
}
