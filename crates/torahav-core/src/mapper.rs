//! View Model Mapper: shape translation from [`crate::row`] types into
//! [`crate::model`] types. No business logic beyond defaulting.

use crate::{
  Result,
  model::{Category, Insight, Profile, Source, SourceSummary},
  row::{InsightRow, ProfileRow, SourceEmbed, SourceRow},
};

/// Map a profile row. `email` is only known for the signed-in user's own
/// profile; embedded profiles get an empty string.
pub fn profile(row: ProfileRow, email: Option<&str>) -> Profile {
  Profile {
    id:           row.id,
    email:        email.unwrap_or_default().to_owned(),
    username:     row.username,
    display_name: row.display_name.unwrap_or_default(),
    bio:          row.bio,
    avatar_url:   row.avatar_url,
  }
}

pub fn source(row: SourceRow) -> Result<Source> {
  Ok(Source {
    id:         row.id,
    title:      row.title,
    content:    row.content,
    category:   Category::parse(&row.category)?,
    created_at: row.created_at,
  })
}

pub fn source_summary(row: SourceEmbed) -> Result<SourceSummary> {
  Ok(SourceSummary {
    id:       row.id,
    title:    row.title,
    category: Category::parse(&row.category)?,
  })
}

pub fn insight(row: InsightRow) -> Result<Insight> {
  Ok(Insight {
    id:         row.id,
    content:    row.content,
    user_id:    row.user_id,
    source_id:  row.source_id,
    created_at: row.created_at,
    likes:      like_count(row.likes),
    author:     row.profiles.map(|p| profile(p, None)),
    source:     row.sources.map(source_summary).transpose()?,
  })
}

/// Missing counts read as zero; the column is never negative in practice but
/// the clamp keeps the conversion total.
fn like_count(raw: Option<i64>) -> u32 {
  u32::try_from(raw.unwrap_or(0).max(0)).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use uuid::Uuid;

  use super::*;

  fn row(likes: Option<i64>) -> InsightRow {
    InsightRow {
      id:         Uuid::new_v4(),
      content:    "דבר תורה".into(),
      user_id:    Uuid::new_v4(),
      source_id:  Uuid::new_v4(),
      created_at: Utc::now(),
      likes,
      profiles:   None,
      sources:    None,
    }
  }

  #[test]
  fn missing_like_count_defaults_to_zero() {
    assert_eq!(insight(row(None)).unwrap().likes, 0);
    assert_eq!(insight(row(Some(-3))).unwrap().likes, 0);
    assert_eq!(insight(row(Some(12))).unwrap().likes, 12);
  }

  #[test]
  fn embedded_relations_are_flattened() {
    let mut r = row(Some(1));
    let author_id = r.user_id;
    r.profiles = Some(ProfileRow {
      id:           author_id,
      username:     "moshe".into(),
      display_name: Some("משה".into()),
      bio:          None,
      avatar_url:   None,
    });
    r.sources = Some(SourceEmbed {
      id:       r.source_id,
      title:    "בראשית א".into(),
      category: "תנ\"ך".into(),
    });

    let i = insight(r).unwrap();
    let author = i.author.as_ref().unwrap();
    assert_eq!(author.id, author_id);
    assert_eq!(author.email, "");
    assert_eq!(author.label(), "משה");
    assert_eq!(i.source.unwrap().category, Category::Tanakh);
  }

  #[test]
  fn unknown_category_is_an_error() {
    let r = SourceRow {
      id:         Uuid::new_v4(),
      title:      "t".into(),
      content:    "c".into(),
      category:   "other".into(),
      created_at: Utc::now(),
    };
    assert!(source(r).is_err());
  }

  #[test]
  fn own_profile_carries_email() {
    let p = profile(
      ProfileRow {
        id:           Uuid::new_v4(),
        username:     "dina".into(),
        display_name: None,
        bio:          Some("".into()),
        avatar_url:   None,
      },
      Some("dina@example.com"),
    );
    assert_eq!(p.email, "dina@example.com");
    assert_eq!(p.display_name, "");
    assert_eq!(p.label(), "dina");
  }
}
