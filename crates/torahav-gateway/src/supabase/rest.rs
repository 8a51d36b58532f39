//! PostgREST query strings.
//!
//! Only the operators the application uses: column selection with embedded
//! relations, `eq` and `in` filters, ordering and a row limit.

use std::fmt::Display;

/// Every insight column plus its author.
pub const INSIGHT_WITH_AUTHOR: &str = "*, profiles (id, username, display_name, avatar_url)";

/// Every insight column plus its author and a summary of its source.
pub const INSIGHT_FEED: &str =
  "*, profiles (id, username, display_name, avatar_url), sources (id, title, category)";

/// A request against one table under `/rest/v1`.
#[derive(Debug, Clone)]
pub struct Query {
  table:  &'static str,
  params: Vec<(String, String)>,
}

impl Query {
  pub fn table(table: &'static str) -> Self {
    Self { table, params: Vec::new() }
  }

  /// Column list, with whitespace stripped so embedding syntax reads the same
  /// as it does in source.
  pub fn select(mut self, columns: &str) -> Self {
    let compact: String = columns.chars().filter(|c| !c.is_whitespace()).collect();
    self.params.push(("select".into(), compact));
    self
  }

  pub fn eq(mut self, column: &str, value: impl Display) -> Self {
    self.params.push((column.into(), format!("eq.{value}")));
    self
  }

  pub fn in_list<V: Display>(mut self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
    let joined = values
      .into_iter()
      .map(|v| v.to_string())
      .collect::<Vec<_>>()
      .join(",");
    self.params.push((column.into(), format!("in.({joined})")));
    self
  }

  pub fn order(mut self, column: &str, ascending: bool) -> Self {
    let dir = if ascending { "asc" } else { "desc" };
    self.params.push(("order".into(), format!("{column}.{dir}")));
    self
  }

  pub fn limit(mut self, n: usize) -> Self {
    self.params.push(("limit".into(), n.to_string()));
    self
  }

  pub fn path(&self) -> String { format!("/rest/v1/{}", self.table) }

  pub fn params(&self) -> &[(String, String)] { &self.params }
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;

  fn pairs(q: &Query) -> Vec<(&str, &str)> {
    q.params()
      .iter()
      .map(|(k, v)| (k.as_str(), v.as_str()))
      .collect()
  }

  #[test]
  fn sources_by_category() {
    let q = Query::table("sources")
      .select("*")
      .order("title", true)
      .eq("category", "משנה");
    assert_eq!(q.path(), "/rest/v1/sources");
    assert_eq!(
      pairs(&q),
      vec![
        ("select", "*"),
        ("order", "title.asc"),
        ("category", "eq.משנה"),
      ]
    );
  }

  #[test]
  fn embedding_is_compacted() {
    let q = Query::table("insights")
      .select(INSIGHT_FEED)
      .order("created_at", false)
      .limit(20);
    assert_eq!(
      pairs(&q),
      vec![
        (
          "select",
          "*,profiles(id,username,display_name,avatar_url),sources(id,title,category)"
        ),
        ("order", "created_at.desc"),
        ("limit", "20"),
      ]
    );
  }

  #[test]
  fn in_filter_joins_values() {
    let a = Uuid::nil();
    let q = Query::table("likes").in_list("insight_id", [a, a]);
    let expected = format!("in.({a},{a})");
    assert_eq!(pairs(&q), vec![("insight_id", expected.as_str())]);
  }
}
