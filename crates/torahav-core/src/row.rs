//! Raw row shapes as the gateway returns them: snake_case columns, with
//! related rows embedded under the related table's name.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A `profiles` row, selected whole or embedded as
/// `profiles (id, username, display_name, avatar_url)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRow {
  pub id:           Uuid,
  #[serde(default)]
  pub username:     String,
  #[serde(default)]
  pub display_name: Option<String>,
  #[serde(default)]
  pub bio:          Option<String>,
  #[serde(default)]
  pub avatar_url:   Option<String>,
}

/// A full `sources` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRow {
  pub id:         Uuid,
  pub title:      String,
  #[serde(default)]
  pub content:    String,
  pub category:   String,
  pub created_at: DateTime<Utc>,
}

/// A `sources` row embedded as `sources (id, title, category)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEmbed {
  pub id:       Uuid,
  pub title:    String,
  pub category: String,
}

/// An `insights` row with optional embedded author and source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightRow {
  pub id:         Uuid,
  pub content:    String,
  pub user_id:    Uuid,
  pub source_id:  Uuid,
  pub created_at: DateTime<Utc>,
  /// Derived aggregate maintained by the gateway; may be absent.
  #[serde(default)]
  pub likes:      Option<i64>,
  #[serde(default)]
  pub profiles:   Option<ProfileRow>,
  #[serde(default)]
  pub sources:    Option<SourceEmbed>,
}

/// A `likes` row projected to `insight_id`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LikedRow {
  pub insight_id: Uuid,
}
