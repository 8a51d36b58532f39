//! Wire shapes of the `/auth/v1` endpoints.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use torahav_core::session::{AuthUser, Session};

#[derive(Debug, Serialize)]
pub struct PasswordGrant<'a> {
  pub email:    &'a str,
  pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SignUpBody<'a> {
  pub email:                 &'a str,
  pub password:              &'a str,
  pub code_challenge:        &'a str,
  pub code_challenge_method: &'static str,
}

#[derive(Debug, Serialize)]
pub struct PkceGrant<'a> {
  pub auth_code:     &'a str,
  pub code_verifier: &'a str,
}

#[derive(Debug, Serialize)]
pub struct RefreshGrant<'a> {
  pub refresh_token: &'a str,
}

/// Response of every `/token` grant, and of `/signup` when the account is
/// confirmed immediately.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
  pub access_token:  String,
  pub refresh_token: String,
  #[serde(default)]
  pub expires_in:    Option<i64>,
  #[serde(default)]
  pub expires_at:    Option<i64>,
  pub user:          AuthUser,
}

impl TokenResponse {
  /// Older service versions only send `expires_in`.
  pub fn into_session(self) -> Session {
    let expires_at = self
      .expires_at
      .or_else(|| self.expires_in.map(|secs| Utc::now().timestamp() + secs));
    Session {
      access_token: self.access_token,
      refresh_token: self.refresh_token,
      expires_at,
      user: self.user,
    }
  }
}

/// Pull a human-readable message out of an error body. The auth and REST
/// surfaces disagree on the field name; the first one present wins.
pub fn error_message(status: u16, body: &str) -> String {
  if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
    for key in ["msg", "message", "error_description", "error"] {
      if let Some(text) = value.get(key).and_then(|v| v.as_str())
        && !text.is_empty()
      {
        return text.to_owned();
      }
    }
  }
  let trimmed = body.trim();
  if trimmed.is_empty() {
    format!("request failed with status {status}")
  } else {
    trimmed.to_owned()
  }
}
