//! One-shot subcommands. Each drives the same controller the TUI would and
//! prints the result.

use std::{
  fs,
  io::{self, BufRead, Read, Write},
  net::SocketAddr,
  path::PathBuf,
  sync::Arc,
};

use anyhow::{Context as _, bail};
use tokio::net::TcpListener;
use torahav_core::{gateway::Gateway, model::Category, route::Route};
use tracing::info;

use crate::{
  callback,
  controllers::{
    LoginForm, NewSourceForm, Outcome, ProfileForm, SignupForm,
    profile::{AvatarFile, Banner},
  },
  session::SessionStore,
};

const NOT_SIGNED_IN: &str = "not signed in; run `torahav login` first";

pub async fn signup<G: Gateway>(
  gateway: Arc<G>,
  redirect_to: String,
  email: String,
) -> anyhow::Result<()> {
  let mut form = SignupForm::new(gateway, redirect_to);
  form.email = email;
  form.password = prompt("Password: ")?;
  form.confirmation = prompt("Confirm password: ")?;
  form.submit().await;

  if let Some(error) = form.error {
    bail!(error);
  }
  if let Some(notice) = form.notice {
    println!("{notice}");
  }
  Ok(())
}

pub async fn login<G: Gateway>(gateway: Arc<G>, email: String) -> anyhow::Result<()> {
  let mut form = LoginForm::new(gateway);
  form.email = email;
  form.password = prompt("Password: ")?;

  match form.submit().await {
    Outcome::Navigate(_) => {
      println!("signed in as {}", form.email);
      Ok(())
    }
    _ => bail!(form.error.unwrap_or_default()),
  }
}

pub async fn logout<G: Gateway>(gateway: Arc<G>) -> anyhow::Result<()> {
  gateway.sign_out().await?;
  println!("signed out");
  Ok(())
}

pub async fn whoami<G: Gateway>(gateway: Arc<G>) -> anyhow::Result<()> {
  let session = SessionStore::attach(gateway).await;
  let Some(profile) = session.profile().await? else {
    bail!(NOT_SIGNED_IN);
  };
  println!("{} <{}>", profile.label(), profile.email);
  println!("username: {}", profile.username);
  if let Some(bio) = profile.bio.filter(|b| !b.is_empty()) {
    println!("bio: {bio}");
  }
  if let Some(url) = profile.avatar_url {
    println!("avatar: {url}");
  }
  Ok(())
}

pub async fn new_source<G: Gateway>(
  gateway: Arc<G>,
  title: String,
  category: Category,
  content: Option<PathBuf>,
) -> anyhow::Result<()> {
  let session = Arc::new(SessionStore::attach(gateway).await);
  let mut form = NewSourceForm::new(session);
  if form.guard() != Outcome::Stay {
    bail!(NOT_SIGNED_IN);
  }

  form.title = title;
  form.category = category;
  form.content = match content {
    Some(path) => fs::read_to_string(&path)
      .with_context(|| format!("reading {}", path.display()))?,
    None => {
      let mut text = String::new();
      io::stdin().read_to_string(&mut text).context("reading stdin")?;
      text
    }
  };

  match form.submit().await {
    Outcome::Navigate(Route::SourceDetail(id)) => {
      println!("{id}");
      Ok(())
    }
    _ => match form.error {
      Some(error) => bail!(error),
      None => bail!("a source needs both a title and some text"),
    },
  }
}

pub async fn profile_show<G: Gateway>(gateway: Arc<G>) -> anyhow::Result<()> {
  whoami(gateway).await
}

pub async fn profile_update<G: Gateway>(
  gateway: Arc<G>,
  display_name: Option<String>,
  bio: Option<String>,
  avatar: Option<PathBuf>,
) -> anyhow::Result<()> {
  let session = Arc::new(SessionStore::attach(gateway).await);
  let mut form = ProfileForm::new(session);
  if form.load().await != Outcome::Stay || form.profile.is_none() {
    bail!(NOT_SIGNED_IN);
  }

  if let Some(display_name) = display_name {
    form.display_name = display_name;
  }
  if let Some(bio) = bio {
    form.bio = bio;
  }
  if let Some(path) = avatar {
    let data = fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
    let name = path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default();
    form.avatar = Some(AvatarFile::new(name, data));
  }

  form.submit().await;
  match form.banner {
    Some(Banner::Success(message)) => {
      println!("{message}");
      Ok(())
    }
    Some(Banner::Error(message)) => bail!(message),
    None => Ok(()),
  }
}

/// Serve the auth callback until interrupted.
pub async fn serve_callback<G: Gateway + 'static>(
  gateway: Arc<G>,
  address: SocketAddr,
) -> anyhow::Result<()> {
  let app = callback::router(gateway);

  info!("listening on http://{address}{}", Route::AuthCallback.path());
  let listener = TcpListener::bind(address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(async {
      tokio::signal::ctrl_c().await.ok();
    })
    .await
    .context("server error")?;

  Ok(())
}

/// Read one line from stdin after printing `label`.
fn prompt(label: &str) -> anyhow::Result<String> {
  print!("{label}");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
}
