//! Connection settings for the hosted service.

use serde::Deserialize;

use crate::{Error, Result};

/// Base URL and public (anon) API key. Both are required; there is no
/// degraded mode without them.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
  pub url:      String,
  pub anon_key: String,
}

impl GatewayConfig {
  /// Validate and normalise. Empty values count as missing.
  pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Result<Self> {
    let url = url.into().trim().trim_end_matches('/').to_owned();
    let anon_key = anon_key.into().trim().to_owned();
    if url.is_empty() {
      return Err(Error::MissingConfig("gateway_url"));
    }
    if anon_key.is_empty() {
      return Err(Error::MissingConfig("gateway_anon_key"));
    }
    if !(url.starts_with("https://") || url.starts_with("http://")) {
      return Err(Error::InvalidUrl(url));
    }
    Ok(Self { url, anon_key })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_values_are_missing() {
    assert!(matches!(
      GatewayConfig::new("", "key"),
      Err(Error::MissingConfig("gateway_url"))
    ));
    assert!(matches!(
      GatewayConfig::new("https://x.supabase.co", "  "),
      Err(Error::MissingConfig("gateway_anon_key"))
    ));
  }

  #[test]
  fn trailing_slash_trimmed() {
    let cfg = GatewayConfig::new("https://x.supabase.co/", "key").unwrap();
    assert_eq!(cfg.url, "https://x.supabase.co");
  }

  #[test]
  fn scheme_required() {
    assert!(matches!(
      GatewayConfig::new("x.supabase.co", "key"),
      Err(Error::InvalidUrl(_))
    ));
  }
}
