//! On-disk copy of the gateway's auth state.
//!
//! The session and any pending PKCE verifier are kept as JSON so that a
//! sign-in from one invocation of `torahav` carries over to the next, and so
//! that `torahav callback` can finish a sign-up started by `torahav signup`.

use std::{
  fs,
  io::ErrorKind,
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use torahav_core::session::{AuthEvent, AuthListener, Session};
use torahav_gateway::supabase::AuthState;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct SessionFile {
  path: PathBuf,
}

impl SessionFile {
  pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }

  pub fn path(&self) -> &Path { &self.path }

  /// The stored state; a missing file is an empty state.
  pub fn load(&self) -> anyhow::Result<AuthState> {
    match fs::read(&self.path) {
      Ok(raw) => serde_json::from_slice(&raw)
        .with_context(|| format!("parsing session file {}", self.path.display())),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(AuthState::default()),
      Err(e) => {
        Err(e).with_context(|| format!("reading session file {}", self.path.display()))
      }
    }
  }

  pub fn save(&self, state: &AuthState) -> anyhow::Result<()> {
    if let Some(dir) = self.path.parent() {
      fs::create_dir_all(dir)
        .with_context(|| format!("creating {}", dir.display()))?;
    }
    let raw = serde_json::to_vec_pretty(state)?;
    fs::write(&self.path, raw)
      .with_context(|| format!("writing session file {}", self.path.display()))
  }

  pub fn clear(&self) -> anyhow::Result<()> {
    match fs::remove_file(&self.path) {
      Err(e) if e.kind() != ErrorKind::NotFound => {
        Err(e).with_context(|| format!("removing session file {}", self.path.display()))
      }
      _ => Ok(()),
    }
  }

  /// Apply one auth event: sign-out removes the file, anything else replaces
  /// the stored session and keeps the stored verifier.
  pub fn record(&self, event: AuthEvent, session: Option<&Session>) -> anyhow::Result<()> {
    if event == AuthEvent::SignedOut {
      return self.clear();
    }
    let mut state = self.load()?;
    state.session = session.cloned();
    if state.session.is_some() {
      state.code_verifier = None;
    }
    self.save(&state)
  }

  /// Persist the verifier of a sign-up awaiting confirmation.
  pub fn record_verifier(&self, verifier: Option<String>) -> anyhow::Result<()> {
    let mut state = self.load()?;
    state.code_verifier = verifier;
    self.save(&state)
  }

  /// A gateway listener that mirrors every auth event to disk.
  pub fn listener(self: Arc<Self>) -> AuthListener {
    Arc::new(move |event: AuthEvent, session: Option<&Session>| {
      debug!(?event, path = %self.path.display(), "persisting session");
      if let Err(e) = self.record(event, session) {
        warn!("failed to persist session: {e:#}");
      }
    })
  }
}
