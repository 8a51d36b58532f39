//! Behavioural tests for `MemoryGateway`.

use std::sync::{Arc, Mutex};

use bytes::Bytes;
use torahav_core::{
  gateway::{Gateway, GatewayError},
  model::{Blob, Category, NewInsight, NewSource, ProfileUpdate},
  session::{AuthEvent, Session},
};
use uuid::Uuid;

use crate::{MemoryGateway, memory::Call};

async fn signed_in(gw: &MemoryGateway) -> Uuid {
  let profile = gw.seed_user("rivka@example.com", "correct-horse", "rivka");
  gw.sign_in_with_password("rivka@example.com".into(), "correct-horse".into())
    .await
    .unwrap();
  profile.id
}

fn png(bytes: &'static [u8]) -> Blob {
  Blob { data: Bytes::from_static(bytes), content_type: "image/png".into() }
}

// ─── Auth ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn sign_up_without_auto_confirm_returns_no_session() {
  let gw = MemoryGateway::new();
  let session = gw
    .sign_up(
      "new@example.com".into(),
      "longenough".into(),
      "http://localhost:3000/auth/callback".into(),
    )
    .await
    .unwrap();
  assert!(session.is_none());
  assert!(gw.get_session().await.unwrap().is_none());
  assert!(gw.confirmation_code("new@example.com").is_some());
}

#[tokio::test]
async fn unconfirmed_account_cannot_sign_in() {
  let gw = MemoryGateway::new();
  gw.sign_up("new@example.com".into(), "longenough".into(), String::new())
    .await
    .unwrap();

  let err = gw
    .sign_in_with_password("new@example.com".into(), "longenough".into())
    .await
    .unwrap_err();
  assert_eq!(err.server_message(), Some("Email not confirmed"));
}

#[tokio::test]
async fn exchanging_the_code_confirms_and_signs_in() {
  let gw = MemoryGateway::new();
  gw.sign_up("new@example.com".into(), "longenough".into(), String::new())
    .await
    .unwrap();
  let code = gw.confirmation_code("new@example.com").unwrap();

  let seen = Arc::new(Mutex::new(Vec::new()));
  let sink = Arc::clone(&seen);
  let _sub = gw.on_auth_state_change(Arc::new(move |event: AuthEvent, _: Option<&Session>| {
    sink.lock().unwrap().push(event);
  }));

  let session = gw.exchange_code_for_session(code.clone()).await.unwrap();
  assert_eq!(session.user.email.as_deref(), Some("new@example.com"));
  assert_eq!(*seen.lock().unwrap(), vec![AuthEvent::SignedIn]);

  // Codes are single-use.
  assert!(gw.exchange_code_for_session(code).await.is_err());
}

#[tokio::test]
async fn sign_up_creates_profile_from_email_local_part() {
  let gw = MemoryGateway::new().with_auto_confirm();
  let session = gw
    .sign_up("moshe@example.com".into(), "longenough".into(), String::new())
    .await
    .unwrap()
    .expect("auto-confirmed session");

  let profile = gw.get_profile(session.user_id()).await.unwrap().unwrap();
  assert_eq!(profile.username, "moshe");
  assert_eq!(profile.email, "moshe@example.com");
}

#[tokio::test]
async fn duplicate_sign_up_is_rejected() {
  let gw = MemoryGateway::new();
  gw.seed_user("taken@example.com", "whatever1", "taken");
  let err = gw
    .sign_up("taken@example.com".into(), "longenough".into(), String::new())
    .await
    .unwrap_err();
  assert_eq!(err.server_message(), Some("User already registered"));
}

#[tokio::test]
async fn wrong_password_reports_server_message() {
  let gw = MemoryGateway::new();
  gw.seed_user("rivka@example.com", "correct-horse", "rivka");
  let err = gw
    .sign_in_with_password("rivka@example.com".into(), "nope".into())
    .await
    .unwrap_err();
  assert_eq!(err.server_message(), Some("Invalid login credentials"));
}

#[tokio::test]
async fn sign_out_clears_session_and_notifies() {
  let gw = MemoryGateway::new();
  signed_in(&gw).await;

  let seen = Arc::new(Mutex::new(Vec::new()));
  let sink = Arc::clone(&seen);
  let _sub = gw.on_auth_state_change(Arc::new(move |event: AuthEvent, session: Option<&Session>| {
    sink.lock().unwrap().push((event, session.is_some()));
  }));

  gw.sign_out().await.unwrap();
  assert!(gw.get_session().await.unwrap().is_none());
  assert_eq!(*seen.lock().unwrap(), vec![(AuthEvent::SignedOut, false)]);
}

#[tokio::test]
async fn subscription_release_is_recorded_once() {
  let gw = MemoryGateway::new();
  let sub = gw.on_auth_state_change(Arc::new(|_: AuthEvent, _: Option<&Session>| {}));
  assert_eq!(gw.listener_count(), 1);

  sub.unsubscribe();
  assert_eq!(gw.listener_count(), 0);
  assert_eq!(gw.count_calls(|c| *c == Call::Unsubscribe), 1);

  {
    let _dropped = gw.on_auth_state_change(Arc::new(|_: AuthEvent, _: Option<&Session>| {}));
  }
  assert_eq!(gw.listener_count(), 0);
  assert_eq!(gw.count_calls(|c| *c == Call::Unsubscribe), 2);
}

// ─── Sources ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn sources_are_ordered_by_title_and_filterable() {
  let gw = MemoryGateway::new();
  gw.seed_source("ברכות", "", Category::Talmud);
  gw.seed_source("בראשית", "", Category::Tanakh);
  gw.seed_source("אבות", "", Category::Mishnah);

  let titles: Vec<_> = gw
    .list_sources(None)
    .await
    .unwrap()
    .into_iter()
    .map(|s| s.title)
    .collect();
  assert_eq!(titles, ["אבות", "בראשית", "ברכות"]);

  let talmud = gw.list_sources(Some(Category::Talmud)).await.unwrap();
  assert_eq!(talmud.len(), 1);
  assert_eq!(talmud[0].category, Category::Talmud);
}

#[tokio::test]
async fn get_source_missing_returns_none() {
  let gw = MemoryGateway::new();
  assert!(gw.get_source(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn create_source_requires_a_session() {
  let gw = MemoryGateway::new();
  let input = NewSource {
    title:    "שמות".into(),
    content:  "ואלה שמות".into(),
    category: Category::Tanakh,
  };
  assert!(gw.create_source(input.clone()).await.is_err());

  signed_in(&gw).await;
  let created = gw.create_source(input).await.unwrap();
  assert_eq!(created.title, "שמות");
  assert!(gw.get_source(created.id).await.unwrap().is_some());
}

// ─── Insights ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn insights_for_source_are_newest_first_with_authors() {
  let gw = MemoryGateway::new();
  let author = gw.seed_user("a@example.com", "password1", "a");
  let source = gw.seed_source("בראשית", "בראשית ברא", Category::Tanakh);
  let first = gw.seed_insight(author.id, source.id, "ראשון");
  let second = gw.seed_insight(author.id, source.id, "שני");

  let insights = gw.list_insights_for_source(source.id).await.unwrap();
  let ids: Vec<_> = insights.iter().map(|i| i.id).collect();
  assert_eq!(ids, [second, first]);
  assert_eq!(insights[0].author.as_ref().map(|a| a.id), Some(author.id));
  assert!(insights[0].source.is_none());
}

#[tokio::test]
async fn recent_feed_is_limited_and_embeds_sources() {
  let gw = MemoryGateway::new();
  let author = gw.seed_user("a@example.com", "password1", "a");
  let source = gw.seed_source("בראשית", "", Category::Tanakh);
  for n in 0..5 {
    gw.seed_insight(author.id, source.id, &format!("חידוש {n}"));
  }

  let feed = gw.list_recent_insights(3).await.unwrap();
  assert_eq!(feed.len(), 3);
  assert_eq!(feed[0].content, "חידוש 4");
  assert_eq!(feed[0].source.as_ref().map(|s| s.title.as_str()), Some("בראשית"));
}

#[tokio::test]
async fn create_insight_checks_owner_and_source() {
  let gw = MemoryGateway::new();
  let user = signed_in(&gw).await;
  let source = gw.seed_source("בראשית", "", Category::Tanakh);

  let forged = NewInsight {
    content:   "לא שלי".into(),
    user_id:   Uuid::new_v4(),
    source_id: source.id,
  };
  assert!(gw.create_insight(forged).await.is_err());

  let dangling = NewInsight {
    content:   "אין מקור".into(),
    user_id:   user,
    source_id: Uuid::new_v4(),
  };
  assert!(gw.create_insight(dangling).await.is_err());

  let created = gw
    .create_insight(NewInsight {
      content: "חידוש".into(),
      user_id: user,
      source_id: source.id,
    })
    .await
    .unwrap();
  assert_eq!(created.likes, 0);
  assert_eq!(created.author.map(|a| a.username), Some("rivka".to_owned()));
}

// ─── Likes ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn likes_keep_count_in_step() {
  let gw = MemoryGateway::new();
  let user = signed_in(&gw).await;
  let source = gw.seed_source("בראשית", "", Category::Tanakh);
  let insight = gw.seed_insight(user, source.id, "חידוש");
  gw.seed_likes(insight, 2);

  gw.insert_like(user, insight).await.unwrap();
  assert_eq!(gw.like_count(insight), Some(3));
  assert!(gw.has_like(user, insight));

  let err = gw.insert_like(user, insight).await.unwrap_err();
  assert!(err.server_message().is_some_and(|m| m.contains("duplicate key")));
  assert_eq!(gw.like_count(insight), Some(3));

  gw.delete_like(user, insight).await.unwrap();
  assert_eq!(gw.like_count(insight), Some(2));

  // Deleting an absent like is not an error.
  gw.delete_like(user, insight).await.unwrap();
  assert_eq!(gw.like_count(insight), Some(2));
}

#[tokio::test]
async fn liked_ids_are_restricted_to_the_requested_set() {
  let gw = MemoryGateway::new();
  let user = signed_in(&gw).await;
  let source = gw.seed_source("בראשית", "", Category::Tanakh);
  let a = gw.seed_insight(user, source.id, "א");
  let b = gw.seed_insight(user, source.id, "ב");
  let c = gw.seed_insight(user, source.id, "ג");
  gw.seed_like(user, a);
  gw.seed_like(user, c);

  let liked = gw.liked_insight_ids(user, vec![a, b]).await.unwrap();
  assert_eq!(liked, [a]);
}

// ─── Profiles and storage ────────────────────────────────────────────────────

#[tokio::test]
async fn update_profile_is_owner_only() {
  let gw = MemoryGateway::new();
  let user = signed_in(&gw).await;
  let other = gw.seed_user("b@example.com", "password1", "b");
  let update = ProfileUpdate {
    display_name: "רבקה".into(),
    bio:          "לומדת".into(),
    avatar_url:   None,
  };

  assert!(gw.update_profile(other.id, update.clone()).await.is_err());

  gw.update_profile(user, update).await.unwrap();
  let row = gw.profile_row(user).unwrap();
  assert_eq!(row.display_name.as_deref(), Some("רבקה"));
  assert_eq!(row.bio.as_deref(), Some("לומדת"));
}

#[tokio::test]
async fn avatar_upload_respects_upsert() {
  let gw = MemoryGateway::new();
  let user = signed_in(&gw).await;
  let path = format!("{user}/avatar.png");

  gw.upload_avatar(path.clone(), png(b"one"), false).await.unwrap();
  assert!(gw.upload_avatar(path.clone(), png(b"two"), false).await.is_err());

  gw.upload_avatar(path.clone(), png(b"two"), true).await.unwrap();
  assert_eq!(gw.blob(&path).unwrap().data, Bytes::from_static(b"two"));
  assert!(gw.avatar_public_url(&path).ends_with(&path));
}

// ─── Failure injection ───────────────────────────────────────────────────────

#[tokio::test]
async fn armed_failure_fires_once() {
  let gw = MemoryGateway::new();
  gw.fail_next(|c| matches!(c, Call::ListSources { .. }), "boom");

  let err = gw.list_sources(None).await.unwrap_err();
  assert_eq!(err.server_message(), Some("boom"));
  assert!(gw.list_sources(None).await.is_ok());
  assert_eq!(gw.count_calls(|c| matches!(c, Call::ListSources { .. })), 2);
}
