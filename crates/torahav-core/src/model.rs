//! Application view types.
//!
//! These are the flattened shapes the controllers hold and the UI renders.
//! Raw gateway rows live in [`crate::row`]; [`crate::mapper`] converts
//! between the two.

use std::borrow::Cow;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Category ────────────────────────────────────────────────────────────────

/// The fixed set of source categories. The display string is also the value
/// stored in the `category` column.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  IntoStaticStr,
)]
pub enum Category {
  #[strum(serialize = "תנ\"ך")]
  #[serde(rename = "תנ\"ך")]
  Tanakh,
  #[strum(serialize = "משנה")]
  #[serde(rename = "משנה")]
  Mishnah,
  #[strum(serialize = "תלמוד")]
  #[serde(rename = "תלמוד")]
  Talmud,
  #[strum(serialize = "הלכה")]
  #[serde(rename = "הלכה")]
  Halakhah,
  #[strum(serialize = "מחשבה")]
  #[serde(rename = "מחשבה")]
  Machshavah,
  #[strum(serialize = "מוסר")]
  #[serde(rename = "מוסר")]
  Musar,
  #[strum(serialize = "חסידות")]
  #[serde(rename = "חסידות")]
  Chasidut,
}

impl Category {
  pub fn as_str(&self) -> &'static str { self.into() }

  /// Parse the stored display string.
  pub fn parse(s: &str) -> Result<Self> {
    s.parse().map_err(|_| Error::UnknownCategory(s.to_owned()))
  }

  /// All categories in display order.
  pub fn all() -> impl Iterator<Item = Category> { Self::iter() }

  /// Step through the filter cycle `None → first → … → last → None`.
  pub fn cycle(current: Option<Category>) -> Option<Category> {
    let mut all = Self::iter();
    match current {
      None => all.next(),
      Some(c) => all.skip_while(|x| *x != c).nth(1),
    }
  }
}

// ─── Profile ─────────────────────────────────────────────────────────────────

/// A registered user as the application sees them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
  pub id:           Uuid,
  /// Empty when the profile was embedded in another row.
  pub email:        String,
  pub username:     String,
  pub display_name: String,
  pub bio:          Option<String>,
  pub avatar_url:   Option<String>,
}

impl Profile {
  /// Display name, falling back to the username.
  pub fn label(&self) -> &str {
    if self.display_name.is_empty() {
      &self.username
    } else {
      &self.display_name
    }
  }

  /// The avatar placeholder letter.
  pub fn initial(&self) -> char { self.label().chars().next().unwrap_or('?') }
}

// ─── Source ──────────────────────────────────────────────────────────────────

/// A canonical text open for commentary. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
  pub id:         Uuid,
  pub title:      String,
  pub content:    String,
  pub category:   Category,
  pub created_at: DateTime<Utc>,
}

impl Source {
  pub fn summary(&self) -> SourceSummary {
    SourceSummary {
      id:       self.id,
      title:    self.title.clone(),
      category: self.category,
    }
  }

  /// Body split into display paragraphs.
  pub fn paragraphs(&self) -> impl Iterator<Item = &str> { self.content.split('\n') }
}

/// The slice of a source embedded into feed entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSummary {
  pub id:       Uuid,
  pub title:    String,
  pub category: Category,
}

// ─── Insight ─────────────────────────────────────────────────────────────────

/// User-authored commentary on exactly one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
  pub id:         Uuid,
  pub content:    String,
  pub user_id:    Uuid,
  pub source_id:  Uuid,
  pub created_at: DateTime<Utc>,
  /// Displayed like count. Patched locally after like/unlike; never
  /// reconciled against the gateway aggregate until the next fetch.
  pub likes:      u32,
  pub author:     Option<Profile>,
  pub source:     Option<SourceSummary>,
}

impl Insight {
  /// Prepare an insight returned by an insert for display at the top of a
  /// list: no likes yet, and the submitting viewer stands in for a missing
  /// embedded author.
  pub fn freshly_created(mut self, viewer: Option<&Profile>) -> Self {
    self.likes = 0;
    if self.author.is_none() {
      self.author = viewer.cloned();
    }
    self
  }

  /// The first `limit` characters followed by `...`, or the whole content if
  /// it is short enough.
  pub fn excerpt(&self, limit: usize) -> Cow<'_, str> {
    match self.content.char_indices().nth(limit) {
      Some((cut, _)) => Cow::Owned(format!("{}...", &self.content[..cut])),
      None => Cow::Borrowed(&self.content),
    }
  }

  pub fn author_label(&self) -> &str {
    self.author.as_ref().map(Profile::label).unwrap_or_default()
  }
}

/// The join fact recording that a user liked an insight. At most one per
/// `(user_id, insight_id)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Like {
  pub user_id:    Uuid,
  pub insight_id: Uuid,
}

// ─── Write inputs ────────────────────────────────────────────────────────────

/// Body of a source insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewSource {
  pub title:    String,
  pub content:  String,
  pub category: Category,
}

/// Body of an insight insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewInsight {
  pub content:   String,
  pub user_id:   Uuid,
  pub source_id: Uuid,
}

/// Body of a profile update; every field is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
  pub display_name: String,
  pub bio:          String,
  pub avatar_url:   Option<String>,
}

/// An uploaded file body and its media type.
#[derive(Debug, Clone)]
pub struct Blob {
  pub data:         Bytes,
  pub content_type: String,
}
