//! The sign-up form.

use std::sync::Arc;

use torahav_core::{
  gateway::{Gateway, GatewayError},
  validation,
};
use tracing::error;

use crate::messages;

pub struct SignupForm<G: Gateway> {
  gateway:          Arc<G>,
  redirect_to:      String,
  pub email:        String,
  pub password:     String,
  pub confirmation: String,
  pub error:        Option<String>,
  /// Shown once the verification email is on its way.
  pub notice:       Option<String>,
  pub submitting:   bool,
}

impl<G: Gateway> SignupForm<G> {
  /// `redirect_to` is where the verification link lands, normally
  /// `<site origin>/auth/callback`.
  pub fn new(gateway: Arc<G>, redirect_to: impl Into<String>) -> Self {
    Self {
      gateway,
      redirect_to: redirect_to.into(),
      email: String::new(),
      password: String::new(),
      confirmation: String::new(),
      error: None,
      notice: None,
      submitting: false,
    }
  }

  /// Validate locally, then register. Validation failures never reach the
  /// gateway.
  pub async fn submit(&mut self) {
    self.error = None;
    self.notice = None;

    if let Err(e) = validation::validate_signup(&self.password, &self.confirmation) {
      self.error = Some(e.to_string());
      return;
    }

    self.submitting = true;
    let result = self
      .gateway
      .sign_up(self.email.clone(), self.password.clone(), self.redirect_to.clone())
      .await;
    self.submitting = false;

    match result {
      Ok(_) => self.notice = Some(messages::SIGNUP_CHECK_EMAIL.to_owned()),
      Err(e) => {
        error!("sign-up failed: {e}");
        self.error = Some(
          e.server_message()
            .unwrap_or(messages::SIGNUP_FAILED)
            .to_owned(),
        );
      }
    }
  }
}
