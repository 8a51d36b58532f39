//! The like/unlike state machine.
//!
//! Per `(viewer, insight)` pair the state is liked or not liked. A single
//! in-flight flag covers the whole page: while one like call is outstanding
//! every further toggle is dropped. Local state changes only after the call
//! has succeeded, so a failure needs no rollback.

use std::collections::HashSet;

use uuid::Uuid;

use crate::model::Insight;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeAction {
  /// Insert a like row.
  Like,
  /// Delete the like row.
  Unlike,
}

/// A toggle that has been admitted and must now be sent to the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingLike {
  pub user_id:    Uuid,
  pub insight_id: Uuid,
  pub action:     LikeAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleDecision {
  /// Another like call is in flight.
  Ignored,
  /// Nobody is signed in; send the user to the login page.
  LoginRequired,
  /// The in-flight flag is now set; issue the call and then
  /// [`LikeBook::settle`] it.
  Issue(PendingLike),
}

/// The viewer's liked set plus the page-wide in-flight call.
#[derive(Debug, Clone, Default)]
pub struct LikeBook {
  liked:     HashSet<Uuid>,
  in_flight: Option<PendingLike>,
}

impl LikeBook {
  pub fn new() -> Self { Self::default() }

  pub fn with_liked(ids: impl IntoIterator<Item = Uuid>) -> Self {
    Self {
      liked:     ids.into_iter().collect(),
      in_flight: None,
    }
  }

  pub fn is_liked(&self, insight_id: Uuid) -> bool { self.liked.contains(&insight_id) }

  pub fn in_flight(&self) -> bool { self.in_flight.is_some() }

  /// Replace the liked set after a reload. An outstanding call stays
  /// outstanding.
  pub fn reset_liked(&mut self, ids: impl IntoIterator<Item = Uuid>) {
    self.liked = ids.into_iter().collect();
  }

  pub fn request_toggle(&mut self, viewer: Option<Uuid>, insight_id: Uuid) -> ToggleDecision {
    if self.in_flight.is_some() {
      return ToggleDecision::Ignored;
    }
    let Some(user_id) = viewer else {
      return ToggleDecision::LoginRequired;
    };
    let action = if self.is_liked(insight_id) {
      LikeAction::Unlike
    } else {
      LikeAction::Like
    };
    let pending = PendingLike { user_id, insight_id, action };
    self.in_flight = Some(pending);
    ToggleDecision::Issue(pending)
  }

  /// Clear the in-flight call and, if it succeeded, flip the pair and patch
  /// the displayed count in `insights`. Decrements floor at zero.
  ///
  /// A `pending` that is not this book's in-flight call (one issued by an
  /// earlier page) changes nothing; returns whether it was this book's.
  pub fn settle(
    &mut self,
    pending: &PendingLike,
    succeeded: bool,
    insights: &mut [Insight],
  ) -> bool {
    if self.in_flight != Some(*pending) {
      return false;
    }
    self.in_flight = None;
    if !succeeded {
      return true;
    }
    let target = insights.iter_mut().find(|i| i.id == pending.insight_id);
    match pending.action {
      LikeAction::Like => {
        self.liked.insert(pending.insight_id);
        if let Some(insight) = target {
          insight.likes = insight.likes.saturating_add(1);
        }
      }
      LikeAction::Unlike => {
        self.liked.remove(&pending.insight_id);
        if let Some(insight) = target {
          insight.likes = insight.likes.saturating_sub(1);
        }
      }
    }
    true
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;

  fn insight(likes: u32) -> Insight {
    Insight {
      id: Uuid::new_v4(),
      content: "x".into(),
      user_id: Uuid::new_v4(),
      source_id: Uuid::new_v4(),
      created_at: Utc::now(),
      likes,
      author: None,
      source: None,
    }
  }

  fn issue(book: &mut LikeBook, viewer: Uuid, id: Uuid) -> PendingLike {
    match book.request_toggle(Some(viewer), id) {
      ToggleDecision::Issue(p) => p,
      other => panic!("expected Issue, got {other:?}"),
    }
  }

  #[test]
  fn like_increments_after_success() {
    let viewer = Uuid::new_v4();
    let mut list = vec![insight(4)];
    let id = list[0].id;
    let mut book = LikeBook::new();

    let pending = issue(&mut book, viewer, id);
    assert_eq!(pending.action, LikeAction::Like);
    assert!(book.in_flight());

    book.settle(&pending, true, &mut list);
    assert!(book.is_liked(id));
    assert!(!book.in_flight());
    assert_eq!(list[0].likes, 5);
  }

  #[test]
  fn unlike_floors_at_zero() {
    let viewer = Uuid::new_v4();
    let mut list = vec![insight(0)];
    let id = list[0].id;
    let mut book = LikeBook::with_liked([id]);

    let pending = issue(&mut book, viewer, id);
    assert_eq!(pending.action, LikeAction::Unlike);
    book.settle(&pending, true, &mut list);
    assert!(!book.is_liked(id));
    assert_eq!(list[0].likes, 0);
  }

  #[test]
  fn toggle_while_in_flight_is_ignored() {
    let viewer = Uuid::new_v4();
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let mut book = LikeBook::new();

    let _pending = issue(&mut book, viewer, a);
    assert_eq!(book.request_toggle(Some(viewer), a), ToggleDecision::Ignored);
    // Single-flight is page-wide, not per insight.
    assert_eq!(book.request_toggle(Some(viewer), b), ToggleDecision::Ignored);
  }

  #[test]
  fn anonymous_toggle_needs_login_and_changes_nothing() {
    let mut book = LikeBook::new();
    let id = Uuid::new_v4();
    assert_eq!(book.request_toggle(None, id), ToggleDecision::LoginRequired);
    assert!(!book.in_flight());
    assert!(!book.is_liked(id));
  }

  #[test]
  fn failure_leaves_state_unchanged() {
    let viewer = Uuid::new_v4();
    let mut list = vec![insight(2)];
    let id = list[0].id;
    let mut book = LikeBook::new();

    let pending = issue(&mut book, viewer, id);
    book.settle(&pending, false, &mut list);
    assert!(!book.in_flight());
    assert!(!book.is_liked(id));
    assert_eq!(list[0].likes, 2);
  }

  #[test]
  fn reset_liked_keeps_the_outstanding_call() {
    let viewer = Uuid::new_v4();
    let mut list = vec![insight(5)];
    let id = list[0].id;
    let mut book = LikeBook::new();

    let pending = issue(&mut book, viewer, id);
    book.reset_liked([]);
    assert!(book.in_flight());
    assert_eq!(book.request_toggle(Some(viewer), id), ToggleDecision::Ignored);

    assert!(book.settle(&pending, true, &mut list));
    assert_eq!(list[0].likes, 6);
  }

  #[test]
  fn settling_a_call_from_another_book_changes_nothing() {
    let viewer = Uuid::new_v4();
    let mut list = vec![insight(3)];
    let id = list[0].id;

    let mut earlier = LikeBook::new();
    let stale = issue(&mut earlier, viewer, id);

    let mut book = LikeBook::new();
    assert!(!book.settle(&stale, true, &mut list));
    assert!(!book.is_liked(id));
    assert_eq!(list[0].likes, 3);
  }
}
