//! The sources list page.

use std::sync::Arc;

use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use torahav_core::{
  gateway::Gateway,
  model::{Category, Source},
};
use tracing::error;

use super::LoadState;
use crate::{messages, session::SessionStore};

pub struct SourcesList<G: Gateway> {
  session:      Arc<SessionStore<G>>,
  pub category: Option<Category>,
  pub sources:  Vec<Source>,
  pub state:    LoadState,
  /// Fuzzy title filter; empty shows everything.
  pub query:    String,
}

impl<G: Gateway> SourcesList<G> {
  pub fn new(session: Arc<SessionStore<G>>) -> Self {
    Self {
      session,
      category: None,
      sources: Vec::new(),
      state: LoadState::default(),
      query: String::new(),
    }
  }

  /// Whether the "add source" action is offered.
  pub fn can_add(&self) -> bool { self.session.is_authenticated() }

  // ── Loading ───────────────────────────────────────────────────────────

  pub fn begin_load(&mut self) -> Option<Category> {
    self.state.begin();
    self.category
  }

  pub async fn fetch(gateway: Arc<G>, category: Option<Category>) -> Result<Vec<Source>, G::Error> {
    gateway.list_sources(category).await
  }

  /// Apply a fetch issued for `category`. Results for a filter that has
  /// since changed are dropped; returns whether this one was kept.
  pub fn apply(
    &mut self,
    category: Option<Category>,
    result: Result<Vec<Source>, G::Error>,
  ) -> bool {
    if category != self.category {
      return false;
    }
    match result {
      Ok(sources) => {
        self.sources = sources;
        self.state.finish(None);
      }
      Err(e) => {
        error!("failed to load sources: {e}");
        self.state.finish(Some(messages::SOURCES_LOAD_FAILED));
      }
    }
    true
  }

  pub async fn load(&mut self) {
    let category = self.begin_load();
    let result = Self::fetch(Arc::clone(self.session.gateway()), category).await;
    self.apply(category, result);
  }

  /// Change the category filter and reload.
  pub async fn set_category(&mut self, category: Option<Category>) {
    self.category = category;
    self.load().await;
  }

  // ── Filtering ─────────────────────────────────────────────────────────

  /// Sources whose title matches the fuzzy query.
  pub fn filtered(&self) -> Vec<&Source> {
    if self.query.is_empty() {
      return self.sources.iter().collect();
    }
    let matcher = SkimMatcherV2::default();
    self
      .sources
      .iter()
      .filter(|s| matcher.fuzzy_match(&s.title, &self.query).is_some())
      .collect()
  }
}
