//! The "add source" form.

use std::sync::Arc;

use torahav_core::{
  gateway::Gateway,
  model::{Category, NewSource},
  route::Route,
};
use tracing::{error, info};

use super::Outcome;
use crate::{messages, session::SessionStore};

pub struct NewSourceForm<G: Gateway> {
  session:        Arc<SessionStore<G>>,
  pub title:      String,
  pub content:    String,
  pub category:   Category,
  pub error:      Option<String>,
  pub submitting: bool,
}

impl<G: Gateway> NewSourceForm<G> {
  pub fn new(session: Arc<SessionStore<G>>) -> Self {
    Self {
      session,
      title: String::new(),
      content: String::new(),
      category: Category::Tanakh,
      error: None,
      submitting: false,
    }
  }

  /// Where to go when the form is opened: only signed-in users may add.
  pub fn guard(&self) -> Outcome {
    if self.session.is_authenticated() {
      Outcome::Stay
    } else {
      Outcome::Navigate(Route::Login)
    }
  }

  /// Insert the source and move to its page. Title and content are both
  /// required.
  pub async fn submit(&mut self) -> Outcome {
    if !self.session.is_authenticated() {
      return Outcome::Navigate(Route::Login);
    }
    if self.title.trim().is_empty() || self.content.trim().is_empty() {
      return Outcome::Stay;
    }

    self.error = None;
    self.submitting = true;
    let input = NewSource {
      title:    self.title.clone(),
      content:  self.content.clone(),
      category: self.category,
    };
    let result = self.session.gateway().create_source(input).await;
    self.submitting = false;

    match result {
      Ok(source) => {
        info!(source_id = %source.id, "source added");
        Outcome::Navigate(Route::SourceDetail(source.id))
      }
      Err(e) => {
        error!("failed to add source: {e}");
        self.error = Some(messages::NEW_SOURCE_FAILED.to_owned());
        Outcome::Stay
      }
    }
  }
}
