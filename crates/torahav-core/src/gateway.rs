//! The `Gateway` trait: everything the application asks of the hosted
//! authentication, database and storage service.
//!
//! Implemented by `torahav-gateway` (the HTTP client and an in-memory
//! double). Controllers depend on this abstraction, not on any concrete
//! backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  model::{
    Blob, Category, Insight, NewInsight, NewSource, Profile, ProfileUpdate,
    Source,
  },
  session::{AuthListener, Session, Subscription},
};

/// Errors a gateway reports. `server_message` distinguishes a message the
/// service sent back (shown to the user verbatim) from transport or decoding
/// failures (shown as a generic message).
pub trait GatewayError: std::error::Error + Send + Sync + 'static {
  fn server_message(&self) -> Option<&str>;
}

/// Abstraction over the remote data gateway.
///
/// All methods return `Send` futures so the trait can be driven from spawned
/// tasks in a multi-threaded runtime. No method retries.
pub trait Gateway: Send + Sync {
  type Error: GatewayError;

  // ── Auth ──────────────────────────────────────────────────────────────

  /// The current session, if any. May refresh a session that is about to
  /// expire.
  fn get_session(
    &self,
  ) -> impl Future<Output = Result<Option<Session>, Self::Error>> + Send + '_;

  fn sign_in_with_password(
    &self,
    email: String,
    password: String,
  ) -> impl Future<Output = Result<Session, Self::Error>> + Send + '_;

  /// Register a new account. The service emails a verification link that
  /// lands on `redirect_to`. Returns a session only when the service
  /// confirms accounts without email verification.
  fn sign_up(
    &self,
    email: String,
    password: String,
    redirect_to: String,
  ) -> impl Future<Output = Result<Option<Session>, Self::Error>> + Send + '_;

  fn sign_out(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Exchange the authorization code from the verification redirect for a
  /// session.
  fn exchange_code_for_session(
    &self,
    code: String,
  ) -> impl Future<Output = Result<Session, Self::Error>> + Send + '_;

  /// Register `listener` for session changes. The listener stays registered
  /// until the returned [`Subscription`] is released.
  fn on_auth_state_change(&self, listener: AuthListener) -> Subscription;

  // ── Sources ───────────────────────────────────────────────────────────

  /// All sources ordered by title, optionally restricted to one category.
  fn list_sources(
    &self,
    category: Option<Category>,
  ) -> impl Future<Output = Result<Vec<Source>, Self::Error>> + Send + '_;

  fn get_source(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Source>, Self::Error>> + Send + '_;

  /// Insert a source and return the stored row.
  fn create_source(
    &self,
    input: NewSource,
  ) -> impl Future<Output = Result<Source, Self::Error>> + Send + '_;

  // ── Insights ──────────────────────────────────────────────────────────

  /// Insights on one source, newest first, with authors embedded.
  fn list_insights_for_source(
    &self,
    source_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Insight>, Self::Error>> + Send + '_;

  /// The newest `limit` insights across all sources, with authors and
  /// sources embedded.
  fn list_recent_insights(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Insight>, Self::Error>> + Send + '_;

  /// Insert an insight and return the stored row with its author embedded.
  fn create_insight(
    &self,
    input: NewInsight,
  ) -> impl Future<Output = Result<Insight, Self::Error>> + Send + '_;

  // ── Profiles ──────────────────────────────────────────────────────────

  fn get_profile(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + '_;

  fn update_profile(
    &self,
    user_id: Uuid,
    update: ProfileUpdate,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Likes ─────────────────────────────────────────────────────────────

  /// The subset of `insight_ids` that `user_id` has liked.
  fn liked_insight_ids(
    &self,
    user_id: Uuid,
    insight_ids: Vec<Uuid>,
  ) -> impl Future<Output = Result<Vec<Uuid>, Self::Error>> + Send + '_;

  fn insert_like(
    &self,
    user_id: Uuid,
    insight_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Delete by the composite `(user_id, insight_id)` key.
  fn delete_like(
    &self,
    user_id: Uuid,
    insight_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Storage ───────────────────────────────────────────────────────────

  /// Store an avatar image at `path` inside the avatars bucket. With
  /// `upsert`, an existing object at the same path is overwritten.
  fn upload_avatar(
    &self,
    path: String,
    blob: Blob,
    upsert: bool,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// The public URL of an object in the avatars bucket.
  fn avatar_public_url(&self, path: &str) -> String;
}
