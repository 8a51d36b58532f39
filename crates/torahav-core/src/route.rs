//! The navigation surface.

use std::fmt;

use uuid::Uuid;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
  Home,
  Login,
  Signup,
  Profile,
  Sources,
  SourceDetail(Uuid),
  NewSource,
  Insights,
  AuthCallback,
}

impl Route {
  pub fn path(&self) -> String {
    match self {
      Self::Home => "/".into(),
      Self::Login => "/login".into(),
      Self::Signup => "/signup".into(),
      Self::Profile => "/profile".into(),
      Self::Sources => "/sources".into(),
      Self::SourceDetail(id) => format!("/sources/{id}"),
      Self::NewSource => "/sources/new".into(),
      Self::Insights => "/insights".into(),
      Self::AuthCallback => "/auth/callback".into(),
    }
  }

  /// Parse a path, ignoring any query string and trailing slash.
  pub fn parse(path: &str) -> Result<Self> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let trimmed = path.trim_end_matches('/');
    let route = match trimmed {
      "" => Self::Home,
      "/login" => Self::Login,
      "/signup" => Self::Signup,
      "/profile" => Self::Profile,
      "/sources" => Self::Sources,
      "/sources/new" => Self::NewSource,
      "/insights" => Self::Insights,
      "/auth/callback" => Self::AuthCallback,
      other => other
        .strip_prefix("/sources/")
        .and_then(|id| Uuid::parse_str(id).ok())
        .map(Self::SourceDetail)
        .ok_or_else(|| Error::UnknownRoute(path.to_owned()))?,
    };
    Ok(route)
  }
}

impl fmt::Display for Route {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.path()) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn paths_round_trip() {
    let id = Uuid::new_v4();
    for route in [
      Route::Home,
      Route::Login,
      Route::Signup,
      Route::Profile,
      Route::Sources,
      Route::SourceDetail(id),
      Route::NewSource,
      Route::Insights,
      Route::AuthCallback,
    ] {
      assert_eq!(Route::parse(&route.path()).unwrap(), route);
    }
  }

  #[test]
  fn new_source_is_not_a_detail_page() {
    assert_eq!(Route::parse("/sources/new/").unwrap(), Route::NewSource);
  }

  #[test]
  fn query_string_ignored() {
    assert_eq!(
      Route::parse("/auth/callback?code=abc").unwrap(),
      Route::AuthCallback
    );
  }

  #[test]
  fn unknown_paths_rejected() {
    assert!(Route::parse("/sources/not-a-uuid").is_err());
    assert!(Route::parse("/admin").is_err());
  }
}
