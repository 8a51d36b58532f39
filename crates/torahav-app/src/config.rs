//! Runtime configuration.
//!
//! Layered with the `config` crate: an optional TOML file, then `TORAHAV_*`
//! environment variables (`TORAHAV_GATEWAY_URL`, `TORAHAV_GATEWAY_ANON_KEY`,
//! …). The gateway URL and key are mandatory; everything else has a default.

use std::{
  net::SocketAddr,
  path::{Path, PathBuf},
};

use anyhow::Context as _;
use serde::Deserialize;
use torahav_core::route::Route;
use torahav_gateway::GatewayConfig;

const DEFAULT_SITE_ORIGIN: &str = "http://localhost:3000";
const DEFAULT_SESSION_PATH: &str = "~/.config/torahav/session.json";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  #[serde(default)]
  pub gateway_url:      String,
  #[serde(default)]
  pub gateway_anon_key: String,
  /// Origin the verification email links back to.
  #[serde(default = "default_site_origin")]
  pub site_origin:      String,
  /// Where `torahav callback` listens.
  #[serde(default = "default_callback_addr")]
  pub callback_addr:    SocketAddr,
  #[serde(default = "default_session_path")]
  pub session_path:     PathBuf,
}

fn default_site_origin() -> String { DEFAULT_SITE_ORIGIN.to_owned() }

fn default_callback_addr() -> SocketAddr {
  SocketAddr::from(([127, 0, 0, 1], 3000))
}

fn default_session_path() -> PathBuf { PathBuf::from(DEFAULT_SESSION_PATH) }

impl AppConfig {
  /// Read `file` (if it exists) and the environment.
  pub fn load(file: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(file).required(false))
      .add_source(config::Environment::with_prefix("TORAHAV"))
      .build()
      .context("failed to read configuration")?;
    settings
      .try_deserialize()
      .context("failed to deserialise AppConfig")
  }

  /// The gateway settings. Missing values are fatal.
  pub fn gateway(&self) -> anyhow::Result<GatewayConfig> {
    GatewayConfig::new(&self.gateway_url, &self.gateway_anon_key).with_context(|| {
      "set TORAHAV_GATEWAY_URL and TORAHAV_GATEWAY_ANON_KEY (or the config file keys)"
    })
  }

  /// Redirect target carried by sign-up verification emails.
  pub fn callback_url(&self) -> String {
    format!(
      "{}{}",
      self.site_origin.trim_end_matches('/'),
      Route::AuthCallback.path()
    )
  }

  pub fn session_path(&self) -> PathBuf { expand_tilde(&self.session_path) }
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      gateway_url:      String::new(),
      gateway_anon_key: String::new(),
      site_origin:      default_site_origin(),
      callback_addr:    default_callback_addr(),
      session_path:     default_session_path(),
    }
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn callback_url_joins_origin_and_route() {
    let cfg = AppConfig {
      site_origin: "https://torahav.example/".into(),
      ..AppConfig::default()
    };
    assert_eq!(cfg.callback_url(), "https://torahav.example/auth/callback");
  }

  #[test]
  fn callback_listens_on_loopback_by_default() {
    assert_eq!(default_callback_addr().to_string(), "127.0.0.1:3000");
  }

  #[test]
  fn missing_gateway_settings_are_fatal() {
    let err = AppConfig::default().gateway().unwrap_err();
    assert!(format!("{err:#}").contains("TORAHAV_GATEWAY_URL"));
  }

  #[test]
  fn tilde_is_expanded_against_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    let cfg = AppConfig::default();
    assert_eq!(
      cfg.session_path(),
      PathBuf::from(home).join(".config/torahav/session.json")
    );
  }

  #[test]
  fn absolute_session_path_is_kept() {
    let cfg = AppConfig {
      session_path: PathBuf::from("/tmp/torahav.json"),
      ..AppConfig::default()
    };
    assert_eq!(cfg.session_path(), PathBuf::from("/tmp/torahav.json"));
  }
}
