//! Page controllers.
//!
//! Each controller owns one page's state: loading and error flags, form
//! fields, and the lists it renders. They talk to the gateway only through
//! the [`Gateway`](torahav_core::gateway::Gateway) trait and report what the
//! caller should do next as an [`Outcome`].
//!
//! Pages that load data expose `begin_load` / `fetch` / `apply` so that a UI
//! can run the fetch on a spawned task, alongside a `load` that does all
//! three in sequence.

pub mod insights;
pub mod likes;
pub mod login;
pub mod new_source;
pub mod profile;
pub mod signup;
pub mod source_detail;
pub mod sources;

pub use insights::InsightsFeed;
pub use login::LoginForm;
pub use new_source::NewSourceForm;
pub use profile::ProfileForm;
pub use signup::SignupForm;
pub use source_detail::SourceDetail;
pub use sources::SourcesList;

use torahav_core::route::Route;

/// What the caller should do after a controller action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
  /// Nothing beyond re-rendering.
  Stay,
  Navigate(Route),
  /// Show a blocking message.
  Alert(String),
}

/// A page's load state. `error` holds a message ready for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadState {
  pub loading: bool,
  pub error:   Option<String>,
}

impl LoadState {
  fn begin(&mut self) {
    self.loading = true;
    self.error = None;
  }

  fn finish(&mut self, error: Option<&str>) {
    self.loading = false;
    self.error = error.map(str::to_owned);
  }
}
