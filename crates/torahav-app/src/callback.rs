//! The auth callback endpoint.
//!
//! Verification emails link to `/auth/callback?code=…`. The code is
//! exchanged for a session through the gateway and the browser is sent to
//! the site root whether or not the exchange worked.

use std::sync::Arc;

use axum::{
  Router,
  extract::{Query, State},
  response::Redirect,
  routing::get,
};
use serde::Deserialize;
use torahav_core::{gateway::Gateway, route::Route};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
  code: Option<String>,
}

/// Build the callback router for `gateway`.
pub fn router<G>(gateway: Arc<G>) -> Router
where
  G: Gateway + 'static,
{
  Router::new()
    .route(&Route::AuthCallback.path(), get(auth_callback::<G>))
    .with_state(gateway)
    .layer(TraceLayer::new_for_http())
}

async fn auth_callback<G>(
  State(gateway): State<Arc<G>>,
  Query(params): Query<CallbackParams>,
) -> Redirect
where
  G: Gateway + 'static,
{
  if let Some(code) = params.code {
    match gateway.exchange_code_for_session(code).await {
      Ok(session) => info!(user_id = %session.user_id(), "email confirmed"),
      Err(e) => error!("code exchange failed: {e}"),
    }
  }
  Redirect::temporary(&Route::Home.path())
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use torahav_gateway::{MemoryGateway, memory::Call};
  use tower::ServiceExt;

  use super::*;

  async fn get_uri(gw: Arc<MemoryGateway>, uri: &str) -> axum::response::Response {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    router(gw).oneshot(req).await.unwrap()
  }

  fn location(resp: &axum::response::Response) -> &str {
    resp.headers().get(header::LOCATION).unwrap().to_str().unwrap()
  }

  #[tokio::test]
  async fn valid_code_signs_in_and_redirects_home() {
    let gw = Arc::new(MemoryGateway::new());
    gw.sign_up("new@example.com".into(), "password123".into(), String::new())
      .await
      .unwrap();
    let code = gw.confirmation_code("new@example.com").unwrap();

    let resp = get_uri(Arc::clone(&gw), &format!("/auth/callback?code={code}")).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&resp), "/");
    assert!(gw.get_session().await.unwrap().is_some());
  }

  #[tokio::test]
  async fn bad_code_still_redirects() {
    let gw = Arc::new(MemoryGateway::new());
    let resp = get_uri(Arc::clone(&gw), "/auth/callback?code=nope").await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&resp), "/");
    assert!(gw.get_session().await.unwrap().is_none());
  }

  #[tokio::test]
  async fn missing_code_skips_the_exchange() {
    let gw = Arc::new(MemoryGateway::new());
    let resp = get_uri(Arc::clone(&gw), "/auth/callback").await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(gw.count_calls(|c| matches!(c, Call::ExchangeCode { .. })), 0);
  }

  #[tokio::test]
  async fn other_paths_are_not_found() {
    let gw = Arc::new(MemoryGateway::new());
    let resp = get_uri(gw, "/auth/other").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }
}
