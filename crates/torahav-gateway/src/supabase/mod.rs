//! [`SupabaseGateway`] — the HTTP implementation of [`Gateway`].

mod auth;
mod pkce;
pub mod rest;
mod storage;

use std::{
  sync::{Arc, Mutex, MutexGuard, PoisonError},
  time::Duration,
};

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use torahav_core::{
  gateway::Gateway,
  mapper,
  model::{
    Blob, Category, Insight, NewInsight, NewSource, Profile, ProfileUpdate, Source,
  },
  row::{InsightRow, LikedRow, ProfileRow, SourceRow},
  session::{AuthEvent, AuthListener, AuthListeners, Session, Subscription},
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{Error, GatewayConfig, Result};
use auth::{PasswordGrant, PkceGrant, RefreshGrant, SignUpBody, TokenResponse};
use rest::{INSIGHT_FEED, INSIGHT_WITH_AUTHOR, Query};
use storage::AVATAR_BUCKET;

/// Sessions this close to expiry are refreshed before use.
const REFRESH_MARGIN_SECS: i64 = 60;

/// Client-side auth state: the current session and the PKCE verifier of a
/// sign-up awaiting email confirmation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthState {
  pub session:       Option<Session>,
  pub code_verifier: Option<String>,
}

/// Async HTTP client for the hosted auth, REST and storage APIs.
///
/// Cheap to clone: the inner [`reqwest::Client`] and auth state are
/// `Arc`-based, so clones share one session.
#[derive(Clone)]
pub struct SupabaseGateway {
  http:      Client,
  config:    Arc<GatewayConfig>,
  state:     Arc<Mutex<AuthState>>,
  listeners: AuthListeners,
}

impl SupabaseGateway {
  pub fn new(config: GatewayConfig) -> Result<Self> {
    let http = Client::builder().timeout(Duration::from_secs(30)).build()?;
    Ok(Self {
      http,
      config: Arc::new(config),
      state: Arc::new(Mutex::new(AuthState::default())),
      listeners: AuthListeners::new(),
    })
  }

  /// Seed the auth state, e.g. from disk. Emits no event.
  pub fn restore(&self, state: AuthState) { *self.auth() = state; }

  pub fn auth_state(&self) -> AuthState { self.auth().clone() }

  fn auth(&self) -> MutexGuard<'_, AuthState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn url(&self, path: &str) -> String { format!("{}{}", self.config.url, path) }

  /// Every request carries the API key; the bearer is the session's access
  /// token when signed in and the anon key otherwise.
  fn request(&self, method: Method, path: &str) -> RequestBuilder {
    let bearer = self
      .auth()
      .session
      .as_ref()
      .map(|s| s.access_token.clone())
      .unwrap_or_else(|| self.config.anon_key.clone());
    self
      .http
      .request(method, self.url(path))
      .header("apikey", &self.config.anon_key)
      .bearer_auth(bearer)
  }

  fn rest(&self, method: Method, query: &Query) -> RequestBuilder {
    self.request(method, &query.path()).query(query.params())
  }

  async fn checked(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(Error::api(status.as_u16(), auth::error_message(status.as_u16(), &body)))
  }

  async fn send_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T> {
    let resp = Self::checked(req.send().await?).await?;
    Ok(resp.json().await?)
  }

  async fn send(req: RequestBuilder) -> Result<()> {
    Self::checked(req.send().await?).await?;
    Ok(())
  }

  /// Insert one row and return the representation the service sends back.
  async fn insert_returning<B, R>(&self, query: &Query, body: &B) -> Result<R>
  where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
  {
    let rows: Vec<R> = Self::send_json(
      self
        .rest(Method::POST, query)
        .header("Prefer", "return=representation")
        .json(body),
    )
    .await?;
    rows.into_iter().next().ok_or(Error::EmptyResponse)
  }

  async fn token_grant<B: Serialize>(&self, grant_type: &str, body: &B) -> Result<Session> {
    let token: TokenResponse = Self::send_json(
      self
        .request(Method::POST, "/auth/v1/token")
        .query(&[("grant_type", grant_type)])
        .json(body),
    )
    .await?;
    Ok(token.into_session())
  }

  /// Store `session` and notify listeners.
  fn install(&self, session: Session, event: AuthEvent) -> Session {
    self.auth().session = Some(session.clone());
    self.listeners.emit(event, Some(&session));
    session
  }

  async fn refresh(&self, refresh_token: String) -> Result<Session> {
    debug!("refreshing session");
    let session = self
      .token_grant("refresh_token", &RefreshGrant { refresh_token: &refresh_token })
      .await?;
    Ok(self.install(session, AuthEvent::TokenRefreshed))
  }
}

impl Gateway for SupabaseGateway {
  type Error = Error;

  // ── Auth ──────────────────────────────────────────────────────────────

  async fn get_session(&self) -> Result<Option<Session>> {
    let current = self.auth().session.clone();
    match current {
      Some(s)
        if s.expires_within(
          chrono::Utc::now(),
          chrono::Duration::seconds(REFRESH_MARGIN_SECS),
        ) =>
      {
        Ok(Some(self.refresh(s.refresh_token).await?))
      }
      other => Ok(other),
    }
  }

  async fn sign_in_with_password(&self, email: String, password: String) -> Result<Session> {
    let session = self
      .token_grant("password", &PasswordGrant { email: &email, password: &password })
      .await?;
    Ok(self.install(session, AuthEvent::SignedIn))
  }

  async fn sign_up(
    &self,
    email: String,
    password: String,
    redirect_to: String,
  ) -> Result<Option<Session>> {
    let verifier = pkce::code_verifier();
    let challenge = pkce::code_challenge(&verifier);
    let body = SignUpBody {
      email:                 &email,
      password:              &password,
      code_challenge:        &challenge,
      code_challenge_method: "s256",
    };
    let value: serde_json::Value = Self::send_json(
      self
        .request(Method::POST, "/auth/v1/signup")
        .query(&[("redirect_to", redirect_to.as_str())])
        .json(&body),
    )
    .await?;

    // With email confirmation switched off the service signs the user in
    // straight away.
    if value.get("access_token").is_some() {
      let token: TokenResponse = serde_json::from_value(value)?;
      return Ok(Some(self.install(token.into_session(), AuthEvent::SignedIn)));
    }
    self.auth().code_verifier = Some(verifier);
    Ok(None)
  }

  async fn sign_out(&self) -> Result<()> {
    let had_session = self.auth().session.is_some();
    let remote = if had_session {
      Self::send(self.request(Method::POST, "/auth/v1/logout")).await
    } else {
      Ok(())
    };
    self.auth().session = None;
    self.listeners.emit(AuthEvent::SignedOut, None);
    match remote {
      // The token was already dead; the local sign-out is what matters.
      Err(Error::Api { status: 401 | 403 | 404, .. }) => Ok(()),
      other => other,
    }
  }

  async fn exchange_code_for_session(&self, code: String) -> Result<Session> {
    let verifier = self
      .auth()
      .code_verifier
      .clone()
      .ok_or(Error::MissingCodeVerifier)?;
    let session = self
      .token_grant("pkce", &PkceGrant { auth_code: &code, code_verifier: &verifier })
      .await?;
    self.auth().code_verifier = None;
    Ok(self.install(session, AuthEvent::SignedIn))
  }

  fn on_auth_state_change(&self, listener: AuthListener) -> Subscription {
    self.listeners.subscribe(listener)
  }

  // ── Sources ───────────────────────────────────────────────────────────

  async fn list_sources(&self, category: Option<Category>) -> Result<Vec<Source>> {
    let mut query = Query::table("sources").select("*").order("title", true);
    if let Some(c) = category {
      query = query.eq("category", c);
    }
    let rows: Vec<SourceRow> = Self::send_json(self.rest(Method::GET, &query)).await?;
    Ok(rows.into_iter().map(mapper::source).collect::<std::result::Result<Vec<_>, _>>()?)
  }

  async fn get_source(&self, id: Uuid) -> Result<Option<Source>> {
    let query = Query::table("sources").select("*").eq("id", id).limit(1);
    let rows: Vec<SourceRow> = Self::send_json(self.rest(Method::GET, &query)).await?;
    Ok(rows.into_iter().next().map(mapper::source).transpose()?)
  }

  async fn create_source(&self, input: NewSource) -> Result<Source> {
    let query = Query::table("sources").select("*");
    let row: SourceRow = self.insert_returning(&query, &input).await?;
    Ok(mapper::source(row)?)
  }

  // ── Insights ──────────────────────────────────────────────────────────

  async fn list_insights_for_source(&self, source_id: Uuid) -> Result<Vec<Insight>> {
    let query = Query::table("insights")
      .select(INSIGHT_WITH_AUTHOR)
      .eq("source_id", source_id)
      .order("created_at", false);
    let rows: Vec<InsightRow> = Self::send_json(self.rest(Method::GET, &query)).await?;
    Ok(rows.into_iter().map(mapper::insight).collect::<std::result::Result<Vec<_>, _>>()?)
  }

  async fn list_recent_insights(&self, limit: usize) -> Result<Vec<Insight>> {
    let query = Query::table("insights")
      .select(INSIGHT_FEED)
      .order("created_at", false)
      .limit(limit);
    let rows: Vec<InsightRow> = Self::send_json(self.rest(Method::GET, &query)).await?;
    Ok(rows.into_iter().map(mapper::insight).collect::<std::result::Result<Vec<_>, _>>()?)
  }

  async fn create_insight(&self, input: NewInsight) -> Result<Insight> {
    let query = Query::table("insights").select(INSIGHT_WITH_AUTHOR);
    let row: InsightRow = self.insert_returning(&query, &input).await?;
    Ok(mapper::insight(row)?)
  }

  // ── Profiles ──────────────────────────────────────────────────────────

  async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>> {
    let query = Query::table("profiles").select("*").eq("id", user_id).limit(1);
    let rows: Vec<ProfileRow> = Self::send_json(self.rest(Method::GET, &query)).await?;
    let email = self
      .auth()
      .session
      .as_ref()
      .filter(|s| s.user_id() == user_id)
      .and_then(|s| s.user.email.clone());
    Ok(rows.into_iter().next().map(|row| mapper::profile(row, email.as_deref())))
  }

  async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> Result<()> {
    let query = Query::table("profiles").eq("id", user_id);
    Self::send(
      self
        .rest(Method::PATCH, &query)
        .header("Prefer", "return=minimal")
        .json(&update),
    )
    .await
  }

  // ── Likes ─────────────────────────────────────────────────────────────

  async fn liked_insight_ids(&self, user_id: Uuid, insight_ids: Vec<Uuid>) -> Result<Vec<Uuid>> {
    if insight_ids.is_empty() {
      return Ok(Vec::new());
    }
    let query = Query::table("likes")
      .select("insight_id")
      .eq("user_id", user_id)
      .in_list("insight_id", insight_ids);
    let rows: Vec<LikedRow> = Self::send_json(self.rest(Method::GET, &query)).await?;
    Ok(rows.into_iter().map(|r| r.insight_id).collect())
  }

  async fn insert_like(&self, user_id: Uuid, insight_id: Uuid) -> Result<()> {
    let query = Query::table("likes");
    let body = serde_json::json!({ "user_id": user_id, "insight_id": insight_id });
    Self::send(
      self
        .rest(Method::POST, &query)
        .header("Prefer", "return=minimal")
        .json(&body),
    )
    .await
  }

  async fn delete_like(&self, user_id: Uuid, insight_id: Uuid) -> Result<()> {
    let query = Query::table("likes")
      .eq("user_id", user_id)
      .eq("insight_id", insight_id);
    Self::send(self.rest(Method::DELETE, &query)).await
  }

  // ── Storage ───────────────────────────────────────────────────────────

  async fn upload_avatar(&self, path: String, blob: Blob, upsert: bool) -> Result<()> {
    if self.auth().session.is_none() {
      warn!(%path, "uploading avatar without a session");
    }
    Self::send(
      self
        .request(Method::POST, &storage::upload_path(AVATAR_BUCKET, &path))
        .header("x-upsert", upsert.to_string())
        .header(reqwest::header::CONTENT_TYPE, blob.content_type)
        .body(blob.data),
    )
    .await
  }

  fn avatar_public_url(&self, path: &str) -> String {
    storage::public_url(&self.config.url, AVATAR_BUCKET, path)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn gateway() -> SupabaseGateway {
    SupabaseGateway::new(GatewayConfig::new("https://demo.supabase.co", "anon").unwrap()).unwrap()
  }

  #[test]
  fn restore_and_snapshot_share_state_across_clones() {
    let g = gateway();
    let clone = g.clone();
    g.restore(AuthState { session: None, code_verifier: Some("v".into()) });
    assert_eq!(clone.auth_state().code_verifier.as_deref(), Some("v"));
  }

  #[test]
  fn public_avatar_url_uses_configured_base() {
    assert_eq!(
      gateway().avatar_public_url("abc/avatar.jpg"),
      "https://demo.supabase.co/storage/v1/object/public/avatars/abc/avatar.jpg"
    );
  }

  #[tokio::test]
  async fn exchange_without_pending_signup_fails_locally() {
    let err = gateway()
      .exchange_code_for_session("code".into())
      .await
      .unwrap_err();
    assert!(matches!(err, Error::MissingCodeVerifier));
  }

  #[tokio::test]
  async fn sign_out_without_session_emits_signed_out() {
    let g = gateway();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let _sub = g.on_auth_state_change(Arc::new(move |event: AuthEvent, _: Option<&Session>| {
      sink.lock().unwrap().push(event);
    }));
    g.sign_out().await.unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![AuthEvent::SignedOut]);
  }
}
