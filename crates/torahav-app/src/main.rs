//! `torahav` — terminal client for Torah Av.
//!
//! # Usage
//!
//! ```text
//! torahav                                  # browse sources and insights
//! torahav signup --email you@example.com   # then follow the emailed link
//! torahav callback                         # serves that link locally
//! torahav login --email you@example.com
//! torahav --offline                        # sample data, no network
//! ```
//!
//! Configuration comes from `torahav.toml` (or `--config`) and `TORAHAV_*`
//! environment variables; see [`config::AppConfig`].

mod app;
mod callback;
mod commands;
mod config;
mod controllers;
mod demo;
mod messages;
mod persist;
mod session;
mod ui;

use std::{
  io,
  path::PathBuf,
  sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
  },
  time::Duration,
};

use anyhow::Context as _;
use app::{App, AppEvent};
use clap::{Parser, Subcommand};
use config::AppConfig;
use crossterm::{
  event::{self, Event},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use persist::SessionFile;
use ratatui::{Terminal, backend::CrosstermBackend};
use session::SessionStore;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use torahav_core::{gateway::Gateway, model::Category};
use torahav_gateway::SupabaseGateway;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt::writer::MakeWriterExt};

/// Set while the TUI owns the terminal; log output is suppressed meanwhile.
static TUI_ACTIVE: AtomicBool = AtomicBool::new(false);

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "torahav", version, about = "Terminal client for Torah Av")]
struct Cli {
  /// Path to a TOML config file.
  #[arg(short, long, value_name = "FILE", default_value = "torahav.toml")]
  config: PathBuf,

  /// Use an in-memory gateway with sample data instead of the service.
  #[arg(long)]
  offline: bool,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Browse sources and insights (the default).
  Browse,
  /// Create an account; the password is read from stdin.
  Signup {
    #[arg(long)]
    email: String,
  },
  /// Sign in; the password is read from stdin.
  Login {
    #[arg(long)]
    email: String,
  },
  Logout,
  /// Show the signed-in user.
  Whoami,
  /// Add a source.
  NewSource {
    #[arg(long)]
    title:    String,
    /// One of: תנ"ך, משנה, תלמוד, הלכה, מחשבה, מוסר, חסידות.
    #[arg(long, value_parser = parse_category)]
    category: Category,
    /// Read the text from FILE instead of stdin.
    #[arg(long, value_name = "FILE")]
    content:  Option<PathBuf>,
  },
  /// Show or edit your profile.
  Profile {
    #[command(subcommand)]
    action: ProfileAction,
  },
  /// Serve the sign-up verification link at `callback_addr`.
  Callback,
}

#[derive(Subcommand, Debug)]
enum ProfileAction {
  Show,
  Update {
    #[arg(long)]
    display_name: Option<String>,
    #[arg(long)]
    bio:          Option<String>,
    /// Image file to upload as the avatar.
    #[arg(long, value_name = "FILE")]
    avatar:       Option<PathBuf>,
  },
}

fn parse_category(s: &str) -> Result<Category, String> {
  Category::parse(s).map_err(|e| e.to_string())
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(io::stderr.with_filter(|_| !TUI_ACTIVE.load(Ordering::Relaxed)))
    .init();

  let cli = Cli::parse();
  let config = AppConfig::load(&cli.config)?;
  let command = cli.command.unwrap_or(Command::Browse);

  if cli.offline {
    return run(command, Arc::new(demo::gateway().await?), &config).await;
  }

  let gateway = SupabaseGateway::new(config.gateway()?).context("building gateway client")?;

  // Restore the stored session and mirror every auth event back to disk.
  let file = Arc::new(SessionFile::new(config.session_path()));
  gateway.restore(file.load()?);
  let _persisting = gateway.on_auth_state_change(Arc::clone(&file).listener());

  run(command, Arc::new(gateway.clone()), &config).await?;

  // A sign-up leaves a PKCE verifier behind for `torahav callback`.
  if let Some(verifier) = gateway.auth_state().code_verifier {
    file.record_verifier(Some(verifier))?;
  }
  Ok(())
}

async fn run<G: Gateway + 'static>(
  command: Command,
  gateway: Arc<G>,
  config: &AppConfig,
) -> anyhow::Result<()> {
  match command {
    Command::Browse => {
      let session = Arc::new(SessionStore::attach(gateway).await);
      let result = run_tui(Arc::clone(&session));
      session.close();
      result
    }
    Command::Signup { email } => commands::signup(gateway, config.callback_url(), email).await,
    Command::Login { email } => commands::login(gateway, email).await,
    Command::Logout => commands::logout(gateway).await,
    Command::Whoami => commands::whoami(gateway).await,
    Command::NewSource { title, category, content } => {
      commands::new_source(gateway, title, category, content).await
    }
    Command::Profile { action: ProfileAction::Show } => commands::profile_show(gateway).await,
    Command::Profile { action: ProfileAction::Update { display_name, bio, avatar } } => {
      commands::profile_update(gateway, display_name, bio, avatar).await
    }
    Command::Callback => commands::serve_callback(gateway, config.callback_addr).await,
  }
}

// ─── Terminal UI ──────────────────────────────────────────────────────────────

fn run_tui<G: Gateway + 'static>(session: Arc<SessionStore<G>>) -> anyhow::Result<()> {
  let (tx, mut rx) = mpsc::unbounded_channel();
  let mut app = App::new(session, tx);
  app.load_sources();

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  TUI_ACTIVE.store(true, Ordering::Relaxed);
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  let run_result = run_event_loop(&mut terminal, &mut app, &mut rx);

  // Restore terminal regardless of result.
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();
  TUI_ACTIVE.store(false, Ordering::Relaxed);

  run_result
}

fn run_event_loop<G: Gateway + 'static>(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App<G>,
  rx: &mut UnboundedReceiver<AppEvent<G::Error>>,
) -> anyhow::Result<()> {
  loop {
    // Fold in whatever spawned calls have finished.
    while let Ok(event) = rx.try_recv() {
      app.handle_event(event);
    }

    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    if let Some(Event::Key(key)) = maybe_event
      && !app.handle_key(key)
    {
      break;
    }
  }

  Ok(())
}
