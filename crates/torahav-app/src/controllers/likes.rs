//! Likes on a list of insights.
//!
//! [`InsightList`] pairs the rendered insights with the viewer's
//! [`LikeBook`]. A toggle is admitted by [`InsightList::request`], sent with
//! [`perform`], and folded back with [`InsightList::settle`].

use torahav_core::{
  gateway::Gateway,
  likes::{LikeAction, LikeBook, PendingLike, ToggleDecision},
  model::Insight,
  route::Route,
};
use tracing::{debug, error};
use uuid::Uuid;

use super::Outcome;
use crate::messages;

#[derive(Debug, Clone, Default)]
pub struct InsightList {
  pub insights: Vec<Insight>,
  pub book:     LikeBook,
}

impl InsightList {
  pub fn new(insights: Vec<Insight>, liked: impl IntoIterator<Item = Uuid>) -> Self {
    Self { insights, book: LikeBook::with_liked(liked) }
  }

  /// Take freshly loaded insights. A like call still in flight keeps the
  /// page's single-flight guard and is settled against the new list.
  pub fn replace(&mut self, insights: Vec<Insight>, liked: impl IntoIterator<Item = Uuid>) {
    self.insights = insights;
    self.book.reset_liked(liked);
  }

  pub fn is_liked(&self, insight_id: Uuid) -> bool { self.book.is_liked(insight_id) }

  pub fn request(&mut self, viewer: Option<Uuid>, insight_id: Uuid) -> ToggleDecision {
    self.book.request_toggle(viewer, insight_id)
  }

  pub fn settle(&mut self, pending: &PendingLike, succeeded: bool) -> Outcome {
    if !self.book.settle(pending, succeeded, &mut self.insights) {
      debug!(insight_id = %pending.insight_id, "dropping like result from an earlier page");
      return Outcome::Stay;
    }
    if succeeded {
      Outcome::Stay
    } else {
      Outcome::Alert(messages::LIKE_FAILED.to_owned())
    }
  }

  /// Request, perform and settle a toggle in one go.
  pub async fn toggle<G: Gateway>(
    &mut self,
    gateway: &G,
    viewer: Option<Uuid>,
    insight_id: Uuid,
  ) -> Outcome {
    match self.request(viewer, insight_id) {
      ToggleDecision::Ignored => Outcome::Stay,
      ToggleDecision::LoginRequired => Outcome::Navigate(Route::Login),
      ToggleDecision::Issue(pending) => {
        let succeeded = perform(gateway, pending).await;
        self.settle(&pending, succeeded)
      }
    }
  }
}

/// Send an admitted toggle. Failures are logged and reported as `false`.
pub async fn perform<G: Gateway>(gateway: &G, pending: PendingLike) -> bool {
  let PendingLike { user_id, insight_id, action } = pending;
  let result = match action {
    LikeAction::Like => gateway.insert_like(user_id, insight_id).await,
    LikeAction::Unlike => gateway.delete_like(user_id, insight_id).await,
  };
  match result {
    Ok(()) => true,
    Err(e) => {
      error!(%insight_id, ?action, "like toggle failed: {e}");
      false
    }
  }
}

/// The viewer's liked subset of `insights`. Failures are logged and yield
/// an empty set.
pub async fn liked_among<G: Gateway>(
  gateway: &G,
  viewer: Option<Uuid>,
  insights: &[Insight],
) -> Vec<Uuid> {
  let Some(user_id) = viewer else {
    return Vec::new();
  };
  if insights.is_empty() {
    return Vec::new();
  }
  let ids = insights.iter().map(|i| i.id).collect();
  match gateway.liked_insight_ids(user_id, ids).await {
    Ok(liked) => liked,
    Err(e) => {
      error!("failed to load liked insights: {e}");
      Vec::new()
    }
  }
}
