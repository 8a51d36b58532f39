//! The sign-in form.

use std::sync::Arc;

use torahav_core::{
  gateway::{Gateway, GatewayError},
  route::Route,
};
use tracing::{error, info};

use super::Outcome;
use crate::messages;

pub struct LoginForm<G: Gateway> {
  gateway:        Arc<G>,
  pub email:      String,
  pub password:   String,
  pub error:      Option<String>,
  pub submitting: bool,
}

impl<G: Gateway> LoginForm<G> {
  pub fn new(gateway: Arc<G>) -> Self {
    Self {
      gateway,
      email: String::new(),
      password: String::new(),
      error: None,
      submitting: false,
    }
  }

  /// Sign in; the service's own message is shown verbatim on failure.
  pub async fn submit(&mut self) -> Outcome {
    self.error = None;
    self.submitting = true;
    let result = self
      .gateway
      .sign_in_with_password(self.email.clone(), self.password.clone())
      .await;
    self.submitting = false;

    match result {
      Ok(session) => {
        info!(user_id = %session.user_id(), "signed in");
        Outcome::Navigate(Route::Home)
      }
      Err(e) => {
        error!("sign-in failed: {e}");
        self.error = Some(e.server_message().unwrap_or(messages::LOGIN_FAILED).to_owned());
        Outcome::Stay
      }
    }
  }
}
