//! The source detail page: the text, its insights, posting and likes.

use std::sync::Arc;

use torahav_core::{
  gateway::Gateway,
  likes::{PendingLike, ToggleDecision},
  model::{Insight, NewInsight, Profile, Source},
  route::Route,
  validation,
};
use tracing::{error, warn};
use uuid::Uuid;

use super::{LoadState, Outcome, likes::{self, InsightList}};
use crate::{messages, session::SessionStore};

/// Everything the page fetches on open.
#[derive(Debug, Clone)]
pub struct DetailData {
  pub viewer:   Option<Profile>,
  pub source:   Option<Source>,
  pub insights: Vec<Insight>,
  pub liked:    Vec<Uuid>,
}

/// The result of admitting an insight submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
  /// Blank content, or a submission is already running.
  Skip,
  LoginRequired,
  Send(NewInsight),
}

pub struct SourceDetail<G: Gateway> {
  session:        Arc<SessionStore<G>>,
  pub source_id:  Uuid,
  pub viewer:     Option<Profile>,
  pub source:     Option<Source>,
  pub list:       InsightList,
  pub state:      LoadState,
  /// The insight being composed.
  pub draft:      String,
  pub submitting: bool,
}

impl<G: Gateway> SourceDetail<G> {
  pub fn new(session: Arc<SessionStore<G>>, source_id: Uuid) -> Self {
    Self {
      session,
      source_id,
      viewer: None,
      source: None,
      list: InsightList::default(),
      state: LoadState::default(),
      draft: String::new(),
      submitting: false,
    }
  }

  pub fn insights(&self) -> &[Insight] { &self.list.insights }

  // ── Loading ───────────────────────────────────────────────────────────

  /// Start a reload. Refused while a like call is unsettled, so its result
  /// is never applied on top of counts that may already include it.
  pub fn begin_load(&mut self) -> bool {
    if self.list.book.in_flight() {
      return false;
    }
    self.state.begin();
    true
  }

  /// Fetch the viewer's profile, the source, its insights and the viewer's
  /// likes among them. A missing viewer profile is not an error.
  pub async fn fetch(
    session: Arc<SessionStore<G>>,
    source_id: Uuid,
  ) -> Result<DetailData, G::Error> {
    let gateway = Arc::clone(session.gateway());
    let viewer = match session.profile().await {
      Ok(viewer) => viewer,
      Err(e) => {
        warn!("failed to load viewer profile: {e}");
        None
      }
    };

    let Some(source) = gateway.get_source(source_id).await? else {
      return Ok(DetailData { viewer, source: None, insights: Vec::new(), liked: Vec::new() });
    };
    let insights = gateway.list_insights_for_source(source_id).await?;
    let liked = likes::liked_among(&*gateway, session.user_id(), &insights).await;

    Ok(DetailData { viewer, source: Some(source), insights, liked })
  }

  pub fn apply(&mut self, result: Result<DetailData, G::Error>) {
    match result {
      Ok(DetailData { source: None, viewer, .. }) => {
        self.viewer = viewer;
        self.state.finish(Some(messages::SOURCE_NOT_FOUND));
      }
      Ok(data) => {
        self.viewer = data.viewer;
        self.source = data.source;
        self.list.replace(data.insights, data.liked);
        self.state.finish(None);
      }
      Err(e) => {
        error!(source_id = %self.source_id, "failed to load source: {e}");
        self.state.finish(Some(messages::SOURCE_LOAD_FAILED));
      }
    }
  }

  pub async fn load(&mut self) {
    if !self.begin_load() {
      return;
    }
    let result = Self::fetch(Arc::clone(&self.session), self.source_id).await;
    self.apply(result);
  }

  // ── Posting ───────────────────────────────────────────────────────────

  /// Admit the current draft. Only a signed-in viewer may post, and blank
  /// drafts are dropped without a word.
  pub fn begin_submit(&mut self) -> Submission {
    if self.submitting {
      return Submission::Skip;
    }
    let Some(user_id) = self.session.user_id() else {
      return Submission::LoginRequired;
    };
    let Some(content) = validation::insight_content(&self.draft) else {
      return Submission::Skip;
    };
    self.submitting = true;
    Submission::Send(NewInsight {
      content: content.to_owned(),
      user_id,
      source_id: self.source_id,
    })
  }

  pub async fn send(gateway: Arc<G>, input: NewInsight) -> Result<Insight, G::Error> {
    gateway.create_insight(input).await
  }

  /// Prepend a posted insight without reloading the list.
  pub fn finish_submit(&mut self, result: Result<Insight, G::Error>) -> Outcome {
    self.submitting = false;
    match result {
      Ok(insight) => {
        let insight = insight.freshly_created(self.viewer.as_ref());
        self.list.insights.insert(0, insight);
        self.draft.clear();
        Outcome::Stay
      }
      Err(e) => {
        error!(source_id = %self.source_id, "failed to post insight: {e}");
        Outcome::Alert(messages::INSIGHT_SUBMIT_FAILED.to_owned())
      }
    }
  }

  pub async fn submit_insight(&mut self) -> Outcome {
    match self.begin_submit() {
      Submission::Skip => Outcome::Stay,
      Submission::LoginRequired => Outcome::Navigate(Route::Login),
      Submission::Send(input) => {
        let result = Self::send(Arc::clone(self.session.gateway()), input).await;
        self.finish_submit(result)
      }
    }
  }

  // ── Likes ─────────────────────────────────────────────────────────────

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
