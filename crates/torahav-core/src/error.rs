//! Error types for `torahav-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown category: {0:?}")]
  UnknownCategory(String),

  #[error("unknown route: {0:?}")]
  UnknownRoute(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
