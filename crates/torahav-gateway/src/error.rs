//! Error type for `torahav-gateway`.

use thiserror::Error;
use torahav_core::gateway::GatewayError;

#[derive(Debug, Error)]
pub enum Error {
  #[error("missing configuration value: {0}")]
  MissingConfig(&'static str),

  #[error("invalid gateway url {0:?}")]
  InvalidUrl(String),

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// The service answered with an error status. `message` is the service's
  /// own text.
  #[error("{message}")]
  Api { status: u16, message: String },

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("core error: {0}")]
  Core(#[from] torahav_core::Error),

  #[error("not signed in")]
  NotAuthenticated,

  #[error("no pending sign-up to complete")]
  MissingCodeVerifier,

  #[error("the service returned no row")]
  EmptyResponse,
}

impl Error {
  pub fn api(status: u16, message: impl Into<String>) -> Self {
    Self::Api { status, message: message.into() }
  }
}

impl GatewayError for Error {
  fn server_message(&self) -> Option<&str> {
    match self {
      Self::Api { message, .. } => Some(message),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
