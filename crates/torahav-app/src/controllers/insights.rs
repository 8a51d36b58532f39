//! The recent-insights feed.

use std::sync::Arc;

use torahav_core::{
  gateway::Gateway,
  likes::{PendingLike, ToggleDecision},
  model::Insight,
};
use tracing::error;
use uuid::Uuid;

use super::{LoadState, Outcome, likes::{self, InsightList}};
use crate::{messages, session::SessionStore};

/// How many insights the feed shows.
pub const FEED_LIMIT: usize = 20;
/// Characters of each insight shown in the feed.
pub const EXCERPT_CHARS: usize = 300;

#[derive(Debug, Clone)]
pub struct FeedData {
  pub insights: Vec<Insight>,
  pub liked:    Vec<Uuid>,
}

pub struct InsightsFeed<G: Gateway> {
  session:   Arc<SessionStore<G>>,
  pub list:  InsightList,
  pub state: LoadState,
}

impl<G: Gateway> InsightsFeed<G> {
  pub fn new(session: Arc<SessionStore<G>>) -> Self {
    Self {
      session,
      list: InsightList::default(),
      state: LoadState::default(),
    }
  }

  pub fn insights(&self) -> &[Insight] { &self.list.insights }

  /// Start a reload. Refused while a like call is unsettled, so its result
  /// is never applied on top of counts that may already include it.
  pub fn begin_load(&mut self) -> bool {
    if self.list.book.in_flight() {
      return false;
    }
    self.state.begin();
    true
  }

  pub async fn fetch(session: Arc<SessionStore<G>>) -> Result<FeedData, G::Error> {
    let gateway = Arc::clone(session.gateway());
    let insights = gateway.list_recent_insights(FEED_LIMIT).await?;
    let liked = likes::liked_among(&*gateway, session.user_id(), &insights).await;
    Ok(FeedData { insights, liked })
  }

  pub fn apply(&mut self, result: Result<FeedData, G::Error>) {
    match result {
      Ok(data) => {
        self.list.replace(data.insights, data.liked);
        self.state.finish(None);
      }
      Err(e) => {
        error!("failed to load insights: {e}");
        self.state.finish(Some(messages::INSIGHTS_LOAD_FAILED));
      }
    }
  }

  pub async fn load(&mut self) {
    if !self.begin_load() {
      return;
    }
    let result = Self::fetch(Arc::clone(&self.session)).await;
    self.apply(result);
  }

  pub fn request_like(&mut self, insight_id: Uuid) -> ToggleDecision {
    self.list.request(self.session.user_id(), insight_id)
  }

  pub fn settle_like(&mut self, pending: &PendingLike, succeeded: bool) -> Outcome {
    self.list.settle(pending, succeeded)
  }

  pub async fn toggle_like(&mut self, insight_id: Uuid) -> Outcome {
    let gateway = Arc::clone(self.session.gateway());
    let viewer = self.session.user_id();
    self.list.toggle(&*gateway, viewer, insight_id).await
  }
}
